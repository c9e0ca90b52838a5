//! Parameter sweep driver.
//!
//! Expands the configured fixed and variable parameters into a Cartesian
//! product, runs every combination `iterations` times and collects one
//! [`RunRecord`] per run. Runs share no state, so they may execute on rayon
//! workers; records always come back in job order (combination-major,
//! iteration-minor).

use crate::error::{FireError, FireResult};
use crate::params::ModelParams;
use crate::simulation::ForestFire;
use forest_fire_common::{ConditionCounts, FailurePolicy, ParamName, Snapshot, SweepConfig};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// State-changing steps executed.
    pub steps: u32,
    /// True if the fire went out before the step bound.
    pub halted: bool,
    pub counts: ConditionCounts,
    /// Per-step counts, kept only when history collection is on.
    pub history: Option<Vec<ConditionCounts>>,
}

/// One row of the sweep output.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run: usize,
    pub iteration: u32,
    pub params: BTreeMap<ParamName, f64>,
    /// The run's summary, or the message of the error that prevented it.
    pub outcome: Result<RunSummary, String>,
}

impl RunRecord {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Per-step history as snapshot rows; empty for failed runs or when
    /// history was not collected.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        match &self.outcome {
            Ok(RunSummary { history: Some(history), .. }) => history
                .iter()
                .enumerate()
                .map(|(step, counts)| Snapshot {
                    run: self.run,
                    iteration: self.iteration,
                    step: step as u32,
                    counts: *counts,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A unit of work: one parameter combination, one iteration.
#[derive(Debug, Clone)]
struct Job {
    run: usize,
    iteration: u32,
    params: BTreeMap<ParamName, f64>,
}

pub struct ExperimentRunner {
    combinations: Vec<BTreeMap<ParamName, f64>>,
    parameter_names: Vec<ParamName>,
    iterations: u32,
    max_steps: u32,
    seed: u64,
    parallel: bool,
    policy: FailurePolicy,
    collect_history: bool,
}

impl ExperimentRunner {
    /// Validates the sweep layout and bounds, then expands the parameter grid.
    pub fn new(config: &SweepConfig) -> FireResult<Self> {
        config.validate().map_err(|e| FireError::InvalidConfig(e.to_string()))?;
        let sweep = &config.sweep;
        if sweep.iterations == 0 {
            return Err(FireError::InvalidParameter {
                name: "iterations".to_string(),
                value: 0.0,
                reason: "must be positive",
            });
        }
        if sweep.max_steps == 0 {
            return Err(FireError::InvalidParameter {
                name: "max_steps".to_string(),
                value: 0.0,
                reason: "must be positive",
            });
        }
        Ok(Self {
            combinations: config.combinations(),
            parameter_names: config.parameter_names(),
            iterations: sweep.iterations,
            max_steps: sweep.max_steps,
            seed: sweep.seed,
            parallel: sweep.parallel,
            policy: sweep.on_error,
            collect_history: config.output.save_history,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parameter columns of the output table.
    pub fn parameter_names(&self) -> &[ParamName] {
        &self.parameter_names
    }

    /// Number of rows the sweep produces.
    pub fn total_runs(&self) -> usize {
        self.combinations.len() * self.iterations as usize
    }

    pub fn run(&self) -> FireResult<Vec<RunRecord>> {
        self.run_with(|_| {})
    }

    /// Runs the whole sweep, calling `on_complete` after every run (from
    /// whichever worker ran it). Under `FailurePolicy::Abort` a serial sweep
    /// stops at the first failing run; a parallel one lets in-flight workers
    /// finish and then reports the first failure in row order.
    pub fn run_with<F>(&self, on_complete: F) -> FireResult<Vec<RunRecord>>
    where
        F: Fn(&RunRecord) + Sync,
    {
        let jobs = self.jobs();
        info!(
            "Sweeping {} combinations x {} iterations ({} runs, max {} steps, {}).",
            self.combinations.len(),
            self.iterations,
            jobs.len(),
            self.max_steps,
            if self.parallel { "parallel" } else { "serial" }
        );

        let execute = |job: &Job| {
            let (record, error) = self.execute(job);
            on_complete(&record);
            (record, error)
        };
        let outcomes: Vec<(RunRecord, Option<FireError>)> = if self.parallel {
            jobs.par_iter().map(execute).collect()
        } else {
            let mut outcomes = Vec::with_capacity(jobs.len());
            for job in &jobs {
                match (execute(job), self.policy) {
                    ((record, Some(error)), FailurePolicy::Abort) => {
                        warn!("Run {} failed; aborting the sweep.", record.run);
                        return Err(error);
                    }
                    (outcome, _) => outcomes.push(outcome),
                }
            }
            outcomes
        };

        let mut records = Vec::with_capacity(outcomes.len());
        let mut first_error = None;
        for (record, error) in outcomes {
            if let Some(error) = error {
                first_error.get_or_insert(error);
            }
            records.push(record);
        }

        let failed = records.iter().filter(|r| !r.is_ok()).count();
        if let Some(error) = first_error {
            match self.policy {
                FailurePolicy::Continue => {
                    warn!("{} of {} runs failed; recorded as failed rows.", failed, records.len());
                }
                FailurePolicy::Abort => return Err(error),
            }
        }
        info!("Sweep finished: {} rows ({} failed).", records.len(), failed);
        Ok(records)
    }

    fn jobs(&self) -> Vec<Job> {
        self.combinations
            .iter()
            .flat_map(|params| (0..self.iterations).map(move |iteration| (params, iteration)))
            .enumerate()
            .map(|(run, (params, iteration))| Job { run, iteration, params: params.clone() })
            .collect()
    }

    /// Deterministic per-run seed, independent of worker scheduling.
    fn seed_for(&self, run: usize) -> u64 {
        self.seed ^ (run as u64 + 1).wrapping_mul(MIXING_CONSTANT)
    }

    /// Runs one job. A failure becomes the record's error message; the typed
    /// error is handed back alongside for the abort policy.
    fn execute(&self, job: &Job) -> (RunRecord, Option<FireError>) {
        let (outcome, error) = match self.simulate(job) {
            Ok(summary) => (Ok(summary), None),
            Err(e) => {
                warn!("Run {} (iteration {}) failed: {}", job.run, job.iteration, e);
                (Err(e.to_string()), Some(e))
            }
        };
        let record = RunRecord {
            run: job.run,
            iteration: job.iteration,
            params: job.params.clone(),
            outcome,
        };
        (record, error)
    }

    fn simulate(&self, job: &Job) -> FireResult<RunSummary> {
        let params = ModelParams::from_assignment(&job.params, self.seed_for(job.run))?;
        let mut sim = ForestFire::new(params)?;
        let steps = sim.run_until_extinguished(self.max_steps);
        let summary = RunSummary {
            steps,
            halted: !sim.is_running(),
            counts: sim.counts(),
            history: self.collect_history.then(|| sim.history().to_vec()),
        };
        debug!(
            "Run {} iteration {}: {} steps, halted={}, {:?}",
            job.run, job.iteration, summary.steps, summary.halted, summary.counts
        );
        Ok(summary)
    }
}
