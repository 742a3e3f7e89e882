#![forbid(unsafe_code)]

//! Persistence for analysed SDT sessions.
//!
//! Reads a JSON-lines trial log, runs [`sdt_core::analyze_session`] over it
//! and writes the trial, summary and ROC tables as CSV next to a JSON-lines
//! copy of the evidence ledger.

pub mod session;
pub mod tables;

pub use session::{
    SessionMetadata, TrialRecord, ingest_records, load_trial_records, parse_trial_records,
};
pub use tables::{
    MISSING, SummaryRow, TableLayout, render_roc_table, render_summary_table, render_trial_table,
};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sdt_core::{
    AnalyzeOptions, IngestWarning, ResponseRule, SdtValidationError, SessionAnalysis,
    analyze_session,
};
use sdt_runtime::{AnalysisEvidenceEntry, AnalysisLedger, AnalysisStage, StageOutcome, now_unix_ms};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("trial log read failed for {path}: {source}")]
    LogRead { path: PathBuf, source: io::Error },
    #[error("trial log line {line} is not a valid record: {source}")]
    RecordParse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("trial log rejected: {0}")]
    Validation(#[from] SdtValidationError),
    #[error("artifact write failed for {path}: {source}")]
    ArtifactIo { path: PathBuf, source: io::Error },
    #[error("analysis serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub layout: TableLayout,
    /// File-name stamp; defaults to the current Unix time in milliseconds.
    pub timestamp: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("sdt_data"),
            layout: TableLayout::SignalDetection,
            timestamp: None,
        }
    }
}

impl ReportConfig {
    #[must_use]
    pub fn paths_for(&self, metadata: &SessionMetadata) -> ReportPaths {
        let stamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| now_unix_ms().to_string());
        ReportPaths::new(&self.output_dir, self.layout, metadata, &stamp)
    }
}

/// Output files for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPaths {
    pub trials: PathBuf,
    pub summary: PathBuf,
    pub roc: PathBuf,
    pub analysis: PathBuf,
}

impl ReportPaths {
    #[must_use]
    pub fn new(
        dir: &Path,
        layout: TableLayout,
        metadata: &SessionMetadata,
        timestamp: &str,
    ) -> Self {
        match layout {
            TableLayout::SignalDetection => {
                let stem = format!("{}_{timestamp}", metadata.session_id());
                Self {
                    trials: dir.join(format!("{stem}_trials.csv")),
                    summary: dir.join(format!("{stem}_summary.csv")),
                    roc: dir.join(format!("{stem}_ROC.csv")),
                    analysis: dir.join(format!("{stem}_analysis.jsonl")),
                }
            }
            TableLayout::WordRecognition { set_size } => {
                let stem = format!("{}_Set{set_size}_{timestamp}", metadata.participant);
                Self {
                    trials: dir.join(format!("WM_{stem}.csv")),
                    summary: dir.join(format!("WM_{stem}_summary.csv")),
                    roc: dir.join(format!("ROC_Summary_{stem}.csv")),
                    analysis: dir.join(format!("WM_{stem}_analysis.jsonl")),
                }
            }
        }
    }

    #[must_use]
    pub fn all(&self) -> [&Path; 4] {
        [&self.trials, &self.summary, &self.roc, &self.analysis]
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub paths: ReportPaths,
    pub analysis: SessionAnalysis,
    /// Ingest warnings keyed by zero-based record position.
    pub warnings: Vec<(usize, IngestWarning)>,
}

impl SessionReport {
    /// The analysis as pretty-printed JSON, missing values as `null`.
    pub fn analysis_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.analysis)?)
    }
}

fn ingest_evidence(
    options: &AnalyzeOptions,
    admitted: usize,
    warnings: &[(usize, IngestWarning)],
) -> AnalysisLedger {
    let mut ledger = AnalysisLedger::new(options.ledger_capacity);
    ledger.record(AnalysisEvidenceEntry::new(
        AnalysisStage::Ingest,
        options.mode,
        StageOutcome::Computed,
        format!("{admitted} records admitted"),
    ));
    for (index, warning) in warnings {
        let IngestWarning::CorrectFlagRecomputed { recorded, derived } = warning;
        ledger.record(AnalysisEvidenceEntry::new(
            AnalysisStage::Ingest,
            options.mode,
            StageOutcome::Corrected,
            format!("record {index}: correct flag {recorded} recomputed as {derived}"),
        ));
    }
    ledger
}

fn write_artifact(path: &Path, contents: &str) -> Result<(), ReportError> {
    fs::write(path, contents).map_err(|source| ReportError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Ingest, analyse and persist one session.
///
/// `options` is used as given; [`TableLayout::analyze_defaults`] supplies the
/// scoring the layout's experiment used. Nothing is written when ingestion
/// rejects a record.
pub fn write_session_report(
    config: &ReportConfig,
    metadata: &SessionMetadata,
    records: &[TrialRecord],
    options: &AnalyzeOptions,
    rule: ResponseRule,
) -> Result<SessionReport, ReportError> {
    let ingested = ingest_records(records, rule, options.mode)?;
    let analysis = analyze_session(&ingested.log, options);

    fs::create_dir_all(&config.output_dir).map_err(|source| ReportError::ArtifactIo {
        path: config.output_dir.clone(),
        source,
    })?;
    let paths = config.paths_for(metadata);

    write_artifact(
        &paths.trials,
        &render_trial_table(config.layout, metadata, records, &ingested.log),
    )?;
    write_artifact(&paths.summary, &render_summary_table(&analysis, config.layout))?;
    write_artifact(&paths.roc, &render_roc_table(&analysis.roc))?;

    let mut evidence =
        ingest_evidence(options, ingested.log.len(), &ingested.warnings).serialize_jsonl();
    evidence.push('\n');
    evidence.push_str(&analysis.ledger.serialize_jsonl());
    evidence.push('\n');
    write_artifact(&paths.analysis, &evidence)?;

    Ok(SessionReport {
        paths,
        analysis,
        warnings: ingested.warnings,
    })
}
