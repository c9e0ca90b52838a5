//! Sweep output: the results table as CSV and, optionally, the per-step
//! history as JSON, bincode or MessagePack.

use crate::error::{FireError, FireResult};
use crate::sweep::RunRecord;
use forest_fire_common::{Condition, OutputFormat, ParamName, Snapshot};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header row: run ids, parameter columns, step count, the four condition
/// counts and the run status.
pub fn table_header(parameter_names: &[ParamName]) -> Vec<String> {
    let mut header = vec!["run".to_string(), "iteration".to_string()];
    header.extend(parameter_names.iter().map(|name| name.as_str().to_string()));
    header.push("steps".to_string());
    header.extend(Condition::ALL.iter().map(|condition| condition.label().to_string()));
    header.push("status".to_string());
    header.push("error".to_string());
    header
}

fn table_row(record: &RunRecord, parameter_names: &[ParamName]) -> Vec<String> {
    let mut row = vec![record.run.to_string(), record.iteration.to_string()];
    row.extend(
        parameter_names
            .iter()
            .map(|name| record.params.get(name).map(f64::to_string).unwrap_or_default()),
    );
    match &record.outcome {
        Ok(summary) => {
            row.push(summary.steps.to_string());
            row.extend(Condition::ALL.iter().map(|c| summary.counts.get(*c).to_string()));
            row.push("ok".to_string());
            row.push(String::new());
        }
        Err(message) => {
            // numeric columns stay empty for failed runs
            row.extend(std::iter::repeat(String::new()).take(1 + Condition::ALL.len()));
            row.push("failed".to_string());
            row.push(message.clone());
        }
    }
    row
}

/// Writes the results table to any writer.
pub fn write_table<W: Write>(writer: W, records: &[RunRecord], parameter_names: &[ParamName]) -> FireResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table_header(parameter_names))?;
    for record in records {
        csv_writer.write_record(table_row(record, parameter_names))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// `<dir>/<base>_iter_<iterations>_steps_<max_steps>.csv`
pub fn table_path(dir: &Path, base_filename: &str, iterations: u32, max_steps: u32) -> PathBuf {
    dir.join(format!("{}_iter_{}_steps_{}.csv", base_filename, iterations, max_steps))
}

pub fn save_table(path: &Path, records: &[RunRecord], parameter_names: &[ParamName]) -> FireResult<()> {
    let file = File::create(path)?;
    write_table(BufWriter::new(file), records, parameter_names)?;
    info!("Results table ({} rows) saved to {}", records.len(), path.display());
    Ok(())
}

pub fn history_path(dir: &Path, base_filename: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}_history.{}", base_filename, format.extension()))
}

/// Serialises the snapshots of every run in the chosen format.
pub fn write_history<W: Write>(mut writer: W, snapshots: &[Snapshot], format: OutputFormat) -> FireResult<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .map_err(|e| FireError::Serialize(e.to_string()))?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .map_err(|e| FireError::Serialize(e.to_string()))?,
        OutputFormat::Messagepack => rmp_serde::encode::write(&mut writer, snapshots)
            .map_err(|e| FireError::Serialize(e.to_string()))?,
    }
    writer.flush()?;
    Ok(())
}

pub fn save_history(path: &Path, records: &[RunRecord], format: OutputFormat) -> FireResult<()> {
    let snapshots: Vec<Snapshot> = records.iter().flat_map(RunRecord::snapshots).collect();
    let file = File::create(path)?;
    write_history(BufWriter::new(file), &snapshots, format)?;
    info!("History ({} snapshots) saved to {}", snapshots.len(), path.display());
    Ok(())
}
