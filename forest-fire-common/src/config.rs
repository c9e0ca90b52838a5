use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const DEFAULT_WIDTH: f64 = 100.0;
pub const DEFAULT_HEIGHT: f64 = 100.0;
pub const DEFAULT_DENSITY: f64 = 0.65;
pub const DEFAULT_SURVIVAL_FACTOR: f64 = 0.1;

/// Names of the model parameters a sweep can fix or vary.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    Width,
    Height,
    Density,
    SurvivalFactor,
}

impl ParamName {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Width => "width",
            ParamName::Height => "height",
            ParamName::Density => "density",
            ParamName::SurvivalFactor => "survival_factor",
        }
    }

    /// Value used when a sweep names the parameter nowhere.
    pub fn default_value(self) -> f64 {
        match self {
            ParamName::Width => DEFAULT_WIDTH,
            ParamName::Height => DEFAULT_HEIGHT,
            ParamName::Density => DEFAULT_DENSITY,
            ParamName::SurvivalFactor => DEFAULT_SURVIVAL_FACTOR,
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the runner does when a single run cannot be built.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the run as a failed row and keep sweeping.
    #[default]
    Continue,
    /// Stop the sweep with the first failing run's error. Serial sweeps stop
    /// immediately; parallel sweeps report it once the workers drain.
    Abort,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    Messagepack,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::Messagepack => "msgpack",
        }
    }
}

// Batch settings, loaded from the [sweep] table
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SweepSection {
    pub iterations: u32,
    pub max_steps: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub on_error: FailurePolicy,
    #[serde(default)]
    pub fixed: BTreeMap<ParamName, f64>,
    #[serde(default)]
    pub variable: BTreeMap<ParamName, Vec<f64>>,
}

// Configuration for output settings, loaded from the [output] table
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default)]
    pub save_history: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_parallel() -> bool {
    true
}

/// Full sweep configuration, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SweepConfig {
    pub sweep: SweepSection,
    pub output: OutputConfig,
}

impl Default for SweepConfig {
    /// The reference batch: a 100x100 forest swept over three survival
    /// factors and three densities, ten repeats each, at most 50 steps.
    fn default() -> Self {
        let fixed = BTreeMap::from([(ParamName::Width, 100.0), (ParamName::Height, 100.0)]);
        let variable = BTreeMap::from([
            (ParamName::SurvivalFactor, vec![0.01, 0.1, 0.3]),
            (ParamName::Density, vec![0.5, 0.65, 0.8]),
        ]);
        SweepConfig {
            sweep: SweepSection {
                iterations: 10,
                max_steps: 50,
                seed: 0,
                parallel: true,
                on_error: FailurePolicy::Continue,
                fixed,
                variable,
            },
            output: OutputConfig {
                base_filename: "model_data".to_string(),
                save_history: false,
                format: OutputFormat::Json,
            },
        }
    }
}

impl SweepConfig {
    /// Loads the sweep configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and structurally validates a TOML document.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SweepConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks only; numeric ranges are checked when a run is built.
    pub fn validate(&self) -> Result<()> {
        for name in self.sweep.variable.keys() {
            if self.sweep.fixed.contains_key(name) {
                anyhow::bail!("parameter '{}' is both fixed and variable.", name);
            }
        }
        for (name, values) in &self.sweep.variable {
            if values.is_empty() {
                anyhow::bail!("variable parameter '{}' has no candidate values.", name);
            }
        }
        if self.output.base_filename.trim().is_empty() {
            anyhow::bail!("output.base_filename must not be empty.");
        }
        Ok(())
    }

    /// Every parameter name that appears in the sweep, fixed or variable, sorted.
    pub fn parameter_names(&self) -> Vec<ParamName> {
        let mut names: Vec<ParamName> = self
            .sweep
            .fixed
            .keys()
            .chain(self.sweep.variable.keys())
            .copied()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Cartesian product of the variable axes, each merged over the fixed values.
    /// The last axis (in name order) varies fastest.
    pub fn combinations(&self) -> Vec<BTreeMap<ParamName, f64>> {
        let mut combos = vec![self.sweep.fixed.clone()];
        for (name, values) in &self.sweep.variable {
            combos = combos
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |value| {
                        let mut next = base.clone();
                        next.insert(*name, *value);
                        next
                    })
                })
                .collect();
        }
        combos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[sweep]
iterations = 2
max_steps = 20
seed = 7
on_error = "abort"

[sweep.fixed]
width = 3
height = 3

[sweep.variable]
survival_factor = [0.0, 1.0]
density = [1.0]

[output]
base_filename = "fire"
save_history = true
format = "messagepack"
"#;

    #[test]
    fn parses_sample_document() {
        let config = SweepConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.sweep.iterations, 2);
        assert_eq!(config.sweep.max_steps, 20);
        assert_eq!(config.sweep.seed, 7);
        assert!(config.sweep.parallel);
        assert_eq!(config.sweep.on_error, FailurePolicy::Abort);
        assert_eq!(config.sweep.fixed[&ParamName::Width], 3.0);
        assert_eq!(config.sweep.variable[&ParamName::SurvivalFactor], vec![0.0, 1.0]);
        assert_eq!(config.output.format, OutputFormat::Messagepack);
        assert!(config.output.save_history);
    }

    #[test]
    fn unknown_parameter_names_are_rejected() {
        let doc = SAMPLE.replace("survival_factor = [0.0, 1.0]", "surival_factor = [0.0, 1.0]");
        assert!(SweepConfig::from_toml_str(&doc).is_err());
    }

    #[test]
    fn parameter_cannot_be_fixed_and_variable() {
        let doc = SAMPLE.replace("density = [1.0]", "density = [1.0]\nwidth = [3.0]");
        let err = SweepConfig::from_toml_str(&doc).unwrap_err();
        assert!(err.to_string().contains("both fixed and variable"));
    }

    #[test]
    fn empty_axis_is_rejected() {
        let doc = SAMPLE.replace("density = [1.0]", "density = []");
        assert!(SweepConfig::from_toml_str(&doc).is_err());
    }

    #[test]
    fn combinations_cover_cartesian_product() {
        let config = SweepConfig::from_toml_str(SAMPLE).unwrap();
        let combos = config.combinations();
        assert_eq!(combos.len(), 2);
        for combo in &combos {
            assert_eq!(combo.len(), 4);
            assert_eq!(combo[&ParamName::Density], 1.0);
        }
        assert_eq!(combos[0][&ParamName::SurvivalFactor], 0.0);
        assert_eq!(combos[1][&ParamName::SurvivalFactor], 1.0);
        assert_eq!(
            config.parameter_names(),
            vec![ParamName::Width, ParamName::Height, ParamName::Density, ParamName::SurvivalFactor]
        );
    }

    #[test]
    fn default_matches_reference_batch() {
        let config = SweepConfig::default();
        config.validate().unwrap();
        assert_eq!(config.combinations().len(), 9);
        assert_eq!(config.sweep.iterations, 10);
        assert_eq!(config.sweep.max_steps, 50);
    }
}
