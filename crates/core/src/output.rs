//! Rendering of matching summaries to files.

use crate::result::MatchingSummary;
use crate::{MatchError, MatchResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct MatchRow<'a> {
    #[serde(rename = "Patient ID")]
    patient_id: &'a str,
    #[serde(rename = "Trial ID")]
    trial_id: &'a str,
    #[serde(rename = "Trial Name")]
    trial_name: &'a str,
}

/// Writes `summaries` as a pretty-printed JSON array.
pub fn write_json(path: &Path, summaries: &[MatchingSummary]) -> MatchResult<()> {
    let json = serde_json::to_string_pretty(summaries).map_err(MatchError::Serialization)?;
    fs::write(path, json).map_err(MatchError::FileWrite)?;
    tracing::info!(path = %path.display(), patients = summaries.len(), "wrote JSON matchings");
    Ok(())
}

/// Writes one row per (patient, eligible trial) pair.
pub fn write_csv(path: &Path, summaries: &[MatchingSummary]) -> MatchResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(MatchError::Csv)?;
    let mut rows = 0usize;

    for summary in summaries {
        for trial in &summary.eligible_trials {
            writer
                .serialize(MatchRow {
                    patient_id: &summary.patient_id,
                    trial_id: &trial.trial_id,
                    trial_name: &trial.trial_name,
                })
                .map_err(MatchError::Csv)?;
            rows += 1;
        }
    }

    writer.flush().map_err(MatchError::FileWrite)?;
    tracing::info!(path = %path.display(), rows, "wrote CSV matchings");
    Ok(())
}
