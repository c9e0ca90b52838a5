use crate::error::{FireError, FireResult};
use forest_fire_common::ParamName;
use std::collections::BTreeMap;

/// Largest grid a run may allocate (positions, i.e. width * height).
pub const MAX_POSITIONS: usize = 1_000_000;

/// Validated construction parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub width: u32,
    pub height: u32,
    /// Probability that a position holds a tree.
    pub density: f64,
    /// Probability that a burning tree survives instead of burning out.
    pub survival_factor: f64,
    /// Seed for the run's RNG.
    pub seed: u64,
}

impl ModelParams {
    pub fn new(width: u32, height: u32, density: f64, survival_factor: f64, seed: u64) -> FireResult<Self> {
        let params = Self { width, height, density, survival_factor, seed };
        params.validate()?;
        Ok(params)
    }

    /// Builds parameters from a sweep assignment. Names missing from the
    /// assignment take their model defaults.
    pub fn from_assignment(assignment: &BTreeMap<ParamName, f64>, seed: u64) -> FireResult<Self> {
        let value = |name: ParamName| assignment.get(&name).copied().unwrap_or_else(|| name.default_value());
        let width = grid_dimension(ParamName::Width, value(ParamName::Width))?;
        let height = grid_dimension(ParamName::Height, value(ParamName::Height))?;
        Self::new(width, height, value(ParamName::Density), value(ParamName::SurvivalFactor), seed)
    }

    pub fn validate(&self) -> FireResult<()> {
        if self.width == 0 {
            return Err(FireError::invalid(ParamName::Width, 0.0, "must be positive"));
        }
        if self.height == 0 {
            return Err(FireError::invalid(ParamName::Height, 0.0, "must be positive"));
        }
        if self.num_positions() > MAX_POSITIONS {
            return Err(FireError::invalid(
                ParamName::Width,
                self.width as f64,
                "width * height exceeds the 1,000,000 position limit",
            ));
        }
        check_probability(ParamName::Density, self.density)?;
        check_probability(ParamName::SurvivalFactor, self.survival_factor)?;
        Ok(())
    }

    pub fn num_positions(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn check_probability(name: ParamName, value: f64) -> FireResult<()> {
    // NaN fails the range check too
    if !(0.0..=1.0).contains(&value) {
        return Err(FireError::invalid(name, value, "must lie in [0, 1]"));
    }
    Ok(())
}

fn grid_dimension(name: ParamName, value: f64) -> FireResult<u32> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(FireError::invalid(name, value, "must be a whole number"));
    }
    if value < 1.0 {
        return Err(FireError::invalid(name, value, "must be positive"));
    }
    if value > u32::MAX as f64 {
        return Err(FireError::invalid(name, value, "is too large"));
    }
    Ok(value as u32)
}
