pub mod config;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{
    FailurePolicy, OutputConfig, OutputFormat, ParamName, SweepConfig, SweepSection,
    DEFAULT_DENSITY, DEFAULT_HEIGHT, DEFAULT_SURVIVAL_FACTOR, DEFAULT_WIDTH,
};
pub use snapshot::{Condition, ConditionCounts, Snapshot};
