use forest_fire_common::Condition;
use rand::Rng;

/// Integer grid coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A tree occupying one grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    position: Position,
    pub condition: Condition,
    survival_probability: f64,
}

/// The outcome of one cell's step, computed against the start-of-step state
/// and applied later in the commit phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub position: Position,
    /// The cell's own condition after the step.
    pub next: Condition,
    /// Neighbours that start burning on this step.
    pub ignites: Vec<Position>,
}

impl Cell {
    pub fn new(position: Position, survival_probability: f64) -> Self {
        Self { position, condition: Condition::Fine, survival_probability }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn survival_probability(&self) -> f64 {
        self.survival_probability
    }

    /// Applies the fire spread rule. Only burning cells change: they resolve to
    /// `Survivor` with the survival probability, otherwise `BurnedOut`, and mark
    /// every `Fine` neighbour for ignition. Returns `None` for cells that do not
    /// change on their own, so no randomness is consumed for them.
    pub fn step<'a, I, R>(&self, neighbors: I, rng: &mut R) -> Option<Transition>
    where
        I: IntoIterator<Item = &'a Cell>,
        R: Rng,
    {
        if self.condition != Condition::Burning {
            return None;
        }
        let next = if rng.random::<f64>() < self.survival_probability {
            Condition::Survivor
        } else {
            Condition::BurnedOut
        };
        let ignites = neighbors
            .into_iter()
            .filter(|neighbor| neighbor.condition == Condition::Fine)
            .map(Cell::position)
            .collect();
        Some(Transition { position: self.position, next, ignites })
    }
}
