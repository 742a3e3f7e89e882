#![forbid(unsafe_code)]

//! Runtime support shared by the SDT analysis crates.
//!
//! ## Module layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | `mode`      | [`RuntimeMode`] enum (Strict / Hardened)                     |
//! | `evidence`  | [`AnalysisLedger`], [`AnalysisEvidenceEntry`], stages        |
//!
//! The crate root carries the structured log entry type and float
//! comparison helpers used by the test suites.

pub mod evidence;
pub mod mode;

pub use evidence::{AnalysisEvidenceEntry, AnalysisLedger, AnalysisStage, StageOutcome};
pub use mode::RuntimeMode;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Timestamp utility for log entries.
#[must_use]
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

// ═══════════════════════════════════════════════════════════════════
// Structured logging
// ═══════════════════════════════════════════════════════════════════

/// Structured log entry, emitted as one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisLogEntry {
    pub event_id: String,
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub module: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RuntimeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<AnalysisStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<LogResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_refs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogResult {
    Ok,
    Degraded,
    Failed,
}

impl AnalysisLogEntry {
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp_ms: now_unix_ms(),
            level: LogLevel::Info,
            module: module.into(),
            message: message.into(),
            session_id: None,
            mode: None,
            stage: None,
            result: None,
            artifact_refs: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_result(mut self, result: LogResult) -> Self {
        self.result = Some(result);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_stage(mut self, stage: AnalysisStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Log line for one ledger entry. An unavailable stage logs as degraded.
    #[must_use]
    pub fn from_evidence(
        event_id: impl Into<String>,
        module: impl Into<String>,
        evidence: &AnalysisEvidenceEntry,
    ) -> Self {
        let result = match evidence.outcome {
            StageOutcome::Computed | StageOutcome::Corrected => LogResult::Ok,
            StageOutcome::Unavailable => LogResult::Degraded,
        };
        Self::new(event_id, module, evidence.detail.clone())
            .with_stage(evidence.stage)
            .with_mode(evidence.mode)
            .with_result(result)
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_artifacts(mut self, refs: Vec<String>) -> Self {
        self.artifact_refs = Some(refs);
        self
    }

    /// Serialize to JSON line for structured logging.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

// ═══════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════

/// Assert two f64 values are close within combined absolute and relative tolerance.
///
/// Uses the formula: |actual - expected| <= atol + rtol * |expected|
pub fn assert_close(actual: f64, expected: f64, atol: f64, rtol: f64) {
    let tol = atol + rtol * expected.abs();
    assert!(
        (actual - expected).abs() <= tol,
        "assert_close failed: actual={actual} expected={expected} diff={} tol={tol} (atol={atol}, rtol={rtol})",
        (actual - expected).abs()
    );
}

/// Assert two f64 slices are element-wise close within tolerance.
pub fn assert_close_slice(actual: &[f64], expected: &[f64], atol: f64, rtol: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "assert_close_slice: length mismatch: actual={} expected={}",
        actual.len(),
        expected.len()
    );
    for (idx, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let tol = atol + rtol * e.abs();
        assert!(
            (a - e).abs() <= tol,
            "assert_close_slice[{idx}]: actual={a} expected={e} diff={} tol={tol} (atol={atol}, rtol={rtol})",
            (a - e).abs()
        );
    }
}

/// Check if a value is within tolerance of expected.
#[must_use]
pub fn within_tolerance(actual: f64, expected: f64, atol: f64, rtol: f64) -> bool {
    let tol = atol + rtol * expected.abs();
    (actual - expected).abs() <= tol
}
