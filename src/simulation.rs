use crate::cell::{Cell, Position, Transition};
use crate::error::FireResult;
use crate::grid::Grid;
use crate::params::ModelParams;
use forest_fire_common::{Condition, ConditionCounts};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of a call to [`ForestFire::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran; holds the counts after the commit.
    Advanced(ConditionCounts),
    /// The fire was already out. Nothing changed; holds the current counts.
    AfterTermination(ConditionCounts),
}

/// A single forest fire run: the grid, its RNG and the per-step counts.
pub struct ForestFire {
    grid: Grid,
    /// Host-side RNG for occupancy and survival draws.
    rng: StdRng,
    running: bool,
    /// Number of state-changing steps executed so far.
    current_step: u32,
    /// Counts after initialisation (index 0) and after every step.
    history: Vec<ConditionCounts>,
}

impl ForestFire {
    /// Seeds the grid and lights the leftmost column.
    pub fn new(params: ModelParams) -> FireResult<Self> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(params.seed);
        let grid = plant_forest(&params, &mut rng)?;

        let counts = ConditionCounts::tally(grid.cells().map(|cell| cell.condition));
        debug!(
            "Planted {} trees on a {}x{} grid ({} burning).",
            counts.total(),
            params.width,
            params.height,
            counts.burning
        );

        Ok(Self {
            grid,
            rng,
            running: counts.burning > 0,
            current_step: 0,
            history: vec![counts],
        })
    }

    /// Advances the fire by one step.
    ///
    /// Every burning cell computes its transition against the conditions as
    /// they stood at the start of the step; all transitions are then committed
    /// together, so a tree ignited on this step only spreads on the next one.
    pub fn step(&mut self) -> StepOutcome {
        if !self.running {
            warn!(
                "step() called after the fire went out (step {}); state unchanged.",
                self.current_step
            );
            return StepOutcome::AfterTermination(self.counts());
        }

        // --- 1. Compute phase: grid is read-only ---
        let grid = &self.grid;
        let rng = &mut self.rng;
        let transitions: Vec<Transition> = grid
            .cells()
            .filter_map(|cell| cell.step(grid.neighbors_of(cell.position()), &mut *rng))
            .collect();

        // --- 2. Commit phase ---
        let mut ignited = 0usize;
        for transition in &transitions {
            self.set_condition(transition.position, transition.next);
        }
        for position in transitions.iter().flat_map(|t| t.ignites.iter()) {
            if let Some(cell) = self.grid.get_mut(*position) {
                if cell.condition == Condition::Fine {
                    cell.condition = Condition::Burning;
                    ignited += 1;
                }
            }
        }

        self.current_step += 1;
        let counts = self.record_snapshot();
        trace!(
            "Step {} | resolved {} | ignited {} | {:?}",
            self.current_step,
            transitions.len(),
            ignited,
            counts
        );

        if counts.burning == 0 {
            self.running = false;
            debug!("Fire extinguished after {} steps.", self.current_step);
        }
        StepOutcome::Advanced(counts)
    }

    /// Steps until the fire is out or `max_steps` steps have run this call.
    /// Returns the number of steps taken.
    pub fn run_until_extinguished(&mut self, max_steps: u32) -> u32 {
        let mut taken = 0;
        while self.running && taken < max_steps {
            self.step();
            taken += 1;
        }
        taken
    }

    fn set_condition(&mut self, position: Position, condition: Condition) {
        if let Some(cell) = self.grid.get_mut(position) {
            cell.condition = condition;
        }
    }

    /// Tallies the current conditions and appends them to the history.
    fn record_snapshot(&mut self) -> ConditionCounts {
        let counts = self.counts();
        self.history.push(counts);
        counts
    }

    /// Current condition counts over all occupied cells.
    pub fn counts(&self) -> ConditionCounts {
        ConditionCounts::tally(self.grid.cells().map(|cell| cell.condition))
    }

    /// True while at least one tree is burning.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn history(&self) -> &[ConditionCounts] {
        &self.history
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

/// Places a tree at each position with probability `density`, in row-major
/// order, then sets every tree in column 0 burning.
fn plant_forest(params: &ModelParams, rng: &mut StdRng) -> FireResult<Grid> {
    let mut grid = Grid::new(params.width, params.height);
    for y in 0..params.height {
        for x in 0..params.width {
            if rng.random::<f64>() < params.density {
                grid.place(Cell::new(Position::new(x, y), params.survival_factor))?;
            }
        }
    }
    for cell in grid.cells_mut().filter(|cell| cell.position().x == 0) {
        cell.condition = Condition::Burning;
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fire(width: u32, height: u32, density: f64, survival: f64, seed: u64) -> ForestFire {
        ForestFire::new(ModelParams::new(width, height, density, survival, seed).unwrap()).unwrap()
    }

    #[test]
    fn five_by_five_full_forest_burns_out_completely() {
        let mut sim = fire(5, 5, 1.0, 0.0, 11);
        assert_eq!(sim.counts().burning, 5);
        let steps = sim.run_until_extinguished(100);
        assert_eq!(steps, 5);
        assert!(!sim.is_running());
        let counts = sim.counts();
        assert_eq!(counts.burned_out, 25);
        assert_eq!(counts.fine + counts.burning + counts.survivor, 0);
    }

    #[test]
    fn fire_advances_one_column_per_step() {
        let mut sim = fire(4, 3, 1.0, 0.0, 5);
        for step in 1..=3 {
            sim.step();
            for cell in sim.grid().cells() {
                let x = cell.position().x;
                let expected = if x < step {
                    Condition::BurnedOut
                } else if x == step {
                    Condition::Burning
                } else {
                    Condition::Fine
                };
                assert_eq!(cell.condition, expected, "cell {:?} after step {}", cell.position(), step);
            }
        }
    }

    #[test]
    fn single_cell_resolves_in_one_step() {
        let mut burned = fire(1, 1, 1.0, 0.0, 3);
        assert_eq!(burned.counts().burning, 1);
        burned.step();
        assert!(!burned.is_running());
        assert_eq!(burned.counts().burned_out, 1);

        let mut survived = fire(1, 1, 1.0, 1.0, 3);
        survived.step();
        assert!(!survived.is_running());
        assert_eq!(survived.counts().survivor, 1);
    }

    #[test]
    fn empty_forest_terminates_immediately() {
        let mut sim = fire(10, 10, 0.0, 0.5, 1);
        assert!(!sim.is_running());
        assert_eq!(sim.counts(), ConditionCounts::default());
        assert_eq!(sim.run_until_extinguished(50), 0);
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn step_after_termination_is_a_flagged_no_op() {
        let mut sim = fire(2, 2, 1.0, 0.0, 8);
        sim.run_until_extinguished(10);
        let before = sim.counts();
        let history_len = sim.history().len();
        assert_eq!(sim.step(), StepOutcome::AfterTermination(before));
        assert_eq!(sim.counts(), before);
        assert_eq!(sim.history().len(), history_len);
        assert!(!sim.is_running());
    }

    #[test]
    fn no_survivors_without_survival_factor() {
        for seed in 0..10 {
            let mut sim = fire(20, 20, 1.0, 0.0, seed);
            sim.run_until_extinguished(100);
            let counts = sim.counts();
            assert_eq!(counts.survivor, 0);
            assert_eq!(counts.burned_out, 400);
        }
    }

    #[test]
    fn counts_are_conserved_and_resolved_cells_stay_resolved() {
        for seed in 0..20 {
            let mut sim = fire(15, 12, 0.6, 0.3, seed);
            let total = sim.counts().total();
            let mut resolved: HashMap<Position, Condition> = HashMap::new();
            while sim.is_running() {
                sim.step();
                assert_eq!(sim.counts().total(), total);
                for cell in sim.grid().cells() {
                    if let Some(previous) = resolved.get(&cell.position()) {
                        assert_eq!(*previous, cell.condition);
                    } else if cell.condition.is_resolved() {
                        resolved.insert(cell.position(), cell.condition);
                    }
                }
            }
            for counts in sim.history() {
                assert_eq!(counts.total(), total);
            }
            sim.step();
            assert!(!sim.is_running());
        }
    }

    #[test]
    fn terminates_for_any_parameters() {
        for seed in 0..10 {
            for &density in &[0.0, 0.3, 0.59, 0.8, 1.0] {
                for &survival in &[0.0, 0.5, 1.0] {
                    let mut sim = fire(12, 9, density, survival, seed);
                    // Every burning tree is consumed on its step, so each tree burns at most once.
                    let bound = sim.counts().total() + 1;
                    sim.run_until_extinguished(bound);
                    assert!(!sim.is_running());
                }
            }
        }
    }

    #[test]
    fn full_density_terminates_within_width_plus_height() {
        for &(width, height) in &[(1, 1), (5, 5), (9, 3), (2, 14)] {
            let mut sim = fire(width, height, 1.0, 0.4, 17);
            let steps = sim.run_until_extinguished(width + height);
            assert!(!sim.is_running());
            assert!(steps <= width + height);
        }
    }

    #[test]
    fn same_seed_same_history() {
        let mut a = fire(30, 30, 0.65, 0.1, 42);
        let mut b = fire(30, 30, 0.65, 0.1, 42);
        a.run_until_extinguished(200);
        b.run_until_extinguished(200);
        assert_eq!(a.history(), b.history());
        assert_eq!(a.current_step(), b.current_step());
    }

    #[test]
    fn ignition_does_not_cascade_within_a_step() {
        // Only (0,0) is burning; the rest of the row must catch fire one cell per step.
        let mut sim = fire(6, 1, 1.0, 0.0, 0);
        sim.step();
        let burning: Vec<u32> = sim
            .grid()
            .cells()
            .filter(|cell| cell.condition == Condition::Burning)
            .map(|cell| cell.position().x)
            .collect();
        assert_eq!(burning, vec![1]);
    }
}
