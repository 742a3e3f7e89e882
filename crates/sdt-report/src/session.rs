#![forbid(unsafe_code)]

//! Session metadata and the per-trial records an experiment driver emits.

use std::fs;
use std::path::Path;

use sdt_core::{IngestedLog, RawObservation, ResponseRule, ingest_log};
use sdt_runtime::RuntimeMode;
use serde::{Deserialize, Serialize};

use crate::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub participant: String,
    pub session: String,
}

impl SessionMetadata {
    #[must_use]
    pub fn new(participant: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            session: session.into(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> String {
        format!("{}_sess{}", self.participant, self.session)
    }
}

/// One line of a JSON-lines trial log.
///
/// `response_positive` is omitted by rating-only tasks; `correct` is the
/// driver's own flag and is checked against the derived value on ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: u32,
    pub signal_present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_positive: Option<bool>,
    pub confidence: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<String>,
}

impl TrialRecord {
    #[must_use]
    pub fn raw(&self) -> RawObservation {
        RawObservation {
            signal_present: self.signal_present,
            response_positive: self.response_positive,
            confidence: self.confidence,
            recorded_correct: self.correct,
        }
    }
}

/// Parse a JSON-lines trial log. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn parse_trial_records(input: &str) -> Result<Vec<TrialRecord>, ReportError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ReportError::RecordParse {
                line: index + 1,
                source,
            })
        })
        .collect()
}

pub fn load_trial_records(path: &Path) -> Result<Vec<TrialRecord>, ReportError> {
    let input = fs::read_to_string(path).map_err(|source| ReportError::LogRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trial_records(&input)
}

/// Validate records into an observation log, position for position.
pub fn ingest_records(
    records: &[TrialRecord],
    rule: ResponseRule,
    mode: RuntimeMode,
) -> Result<IngestedLog, ReportError> {
    Ok(ingest_log(records.iter().map(TrialRecord::raw), rule, mode)?)
}
