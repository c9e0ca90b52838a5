use crate::cell::{Cell, Position};
use crate::error::{FireError, FireResult};

/// Orthogonal (von Neumann) neighbour offsets: left, right, down, up.
const NEIGHBOR_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Fixed-size, non-toroidal grid holding at most one cell per position.
/// Storage is row-major: index = y * width + x.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    slots: Vec<Option<Cell>>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let num_slots = width as usize * height as usize;
        Self { width, height, slots: vec![None; num_slots] }
    }

    // Calculates the 1D slot index for a position, or None if off the grid
    #[inline(always)]
    fn slot_idx(&self, pos: Position) -> Option<usize> {
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Inserts `cell` at its own position, returning whatever was there before.
    pub fn place(&mut self, cell: Cell) -> FireResult<Option<Cell>> {
        let pos = cell.position();
        let idx = self.slot_idx(pos).ok_or(FireError::OutOfBoundsPlacement {
            x: pos.x,
            y: pos.y,
            width: self.width,
            height: self.height,
        })?;
        Ok(self.slots[idx].replace(cell))
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.slot_idx(pos).and_then(|idx| self.slots[idx].as_ref())
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        match self.slot_idx(pos) {
            Some(idx) => self.slots[idx].as_mut(),
            None => None,
        }
    }

    /// Cells at the up to four orthogonally adjacent in-bounds positions.
    /// Edges have no wraparound neighbours.
    pub fn neighbors_of(&self, pos: Position) -> impl Iterator<Item = &Cell> + '_ {
        let (width, height) = (self.width as i64, self.height as i64);
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = pos.x as i64 + dx;
            let ny = pos.y as i64 + dy;
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                return None;
            }
            self.get(Position::new(nx as u32, ny as u32))
        })
    }

    /// All occupied cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.slots.iter().flatten()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.slots.iter_mut().flatten()
    }

    pub fn occupied(&self) -> usize {
        self.cells().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.place(Cell::new(Position::new(x, y), 0.0)).unwrap();
            }
        }
        grid
    }

    fn neighbor_positions(grid: &Grid, x: u32, y: u32) -> Vec<Position> {
        let mut positions: Vec<Position> = grid.neighbors_of(Position::new(x, y)).map(Cell::position).collect();
        positions.sort();
        positions
    }

    #[test]
    fn place_rejects_out_of_bounds() {
        let mut grid = Grid::new(3, 2);
        let err = grid.place(Cell::new(Position::new(3, 0), 0.0)).unwrap_err();
        assert!(matches!(err, FireError::OutOfBoundsPlacement { x: 3, y: 0, width: 3, height: 2 }));
        assert!(grid.place(Cell::new(Position::new(0, 2), 0.0)).is_err());
        assert_eq!(grid.occupied(), 0);
    }

    #[test]
    fn place_replaces_existing_cell() {
        let mut grid = Grid::new(2, 2);
        assert!(grid.place(Cell::new(Position::new(1, 1), 0.2)).unwrap().is_none());
        let previous = grid.place(Cell::new(Position::new(1, 1), 0.7)).unwrap();
        assert_eq!(previous.map(|c| c.survival_probability()), Some(0.2));
        assert_eq!(grid.occupied(), 1);
    }

    #[test]
    fn corner_edge_and_interior_neighbors() {
        let grid = full_grid(3, 3);
        assert_eq!(neighbor_positions(&grid, 0, 0), vec![Position::new(0, 1), Position::new(1, 0)]);
        assert_eq!(neighbor_positions(&grid, 1, 0).len(), 3);
        assert_eq!(neighbor_positions(&grid, 1, 1).len(), 4);
        assert_eq!(neighbor_positions(&grid, 2, 2), vec![Position::new(1, 2), Position::new(2, 1)]);
    }

    #[test]
    fn empty_positions_contribute_no_neighbor() {
        let mut grid = Grid::new(3, 1);
        grid.place(Cell::new(Position::new(0, 0), 0.0)).unwrap();
        grid.place(Cell::new(Position::new(1, 0), 0.0)).unwrap();
        assert_eq!(neighbor_positions(&grid, 1, 0), vec![Position::new(0, 0)]);
        assert_eq!(neighbor_positions(&grid, 2, 0), vec![Position::new(1, 0)]);
    }

    #[test]
    fn cells_iterate_row_major() {
        let grid = full_grid(2, 2);
        let order: Vec<Position> = grid.cells().map(Cell::position).collect();
        assert_eq!(
            order,
            vec![Position::new(0, 0), Position::new(1, 0), Position::new(0, 1), Position::new(1, 1)]
        );
    }
}
