//! Forest fire cellular automaton and parameter sweep engine.
//!
//! A [`simulation::ForestFire`] seeds trees on a grid, lights the leftmost
//! column and steps the fire until it burns out. [`sweep::ExperimentRunner`]
//! repeats that over a Cartesian product of parameters and [`output`] writes
//! the resulting table.

pub mod cell;
pub mod error;
pub mod grid;
pub mod output;
pub mod params;
pub mod simulation;
pub mod sweep;

pub use error::{FireError, FireResult};
pub use params::ModelParams;
pub use simulation::{ForestFire, StepOutcome};
pub use sweep::{ExperimentRunner, RunRecord, RunSummary};
