#![forbid(unsafe_code)]

use sdt_runtime::{AnalysisEvidenceEntry, AnalysisLedger, AnalysisStage, RuntimeMode, StageOutcome};
use serde::{Deserialize, Serialize};

use crate::binomial::{BinomialTest, binomial_test};
use crate::observation::{ObservationLog, SdtCounts};
use crate::rate::{RateCorrection, RateEstimate, estimate_rate};
use crate::roc::{RocSweep, RocTable, build_roc};
use crate::sensitivity::SdtResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    pub mode: RuntimeMode,
    pub correction: RateCorrection,
    pub roc_sweep: RocSweep,
    pub ledger_capacity: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Strict,
            correction: RateCorrection::LogLinear,
            roc_sweep: RocSweep::PositiveResponses,
            ledger_capacity: 64,
        }
    }
}

/// Every statistic derived from one frozen session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub mode: RuntimeMode,
    pub correction: RateCorrection,
    pub counts: SdtCounts,
    pub hit: RateEstimate,
    pub false_alarm: RateEstimate,
    pub sdt: SdtResult,
    pub roc: RocTable,
    pub binomial: Option<BinomialTest>,
    /// Proportion correct; `None` for an empty log.
    pub accuracy: Option<f64>,
    pub ledger: AnalysisLedger,
}

impl SessionAnalysis {
    #[must_use]
    pub fn p_value(&self) -> Option<f64> {
        self.binomial.map(|test| test.p_value)
    }

    /// Anything the session could not support.
    #[must_use]
    pub fn has_missing_values(&self) -> bool {
        !self.sdt.is_available() || self.binomial.is_none() || self.accuracy.is_none()
    }
}

fn record_rate(
    ledger: &mut AnalysisLedger,
    mode: RuntimeMode,
    label: &str,
    estimate: &RateEstimate,
) {
    let (outcome, detail) = if estimate.is_degenerate() {
        (
            StageOutcome::Unavailable,
            format!("{label} rate: no trials in class, reported as 0"),
        )
    } else if estimate.was_corrected() {
        (
            StageOutcome::Corrected,
            format!(
                "{label} rate {}/{} = {} corrected to {}",
                estimate.count, estimate.n, estimate.raw_rate, estimate.adjusted_rate
            ),
        )
    } else {
        (
            StageOutcome::Computed,
            format!("{label} rate {}/{} = {}", estimate.count, estimate.n, estimate.raw_rate),
        )
    };
    ledger.record(AnalysisEvidenceEntry::new(
        AnalysisStage::RateEstimate,
        mode,
        outcome,
        detail,
    ));
}

/// Run rate estimation, d′/c, the ROC sweep and the binomial test over `log`.
///
/// # Contract
/// - Pure: `log` is read once per stage and never retained.
/// - Never fails. Degenerate inputs surface as `None` values with a
///   [`crate::MissingReason`] and an `Unavailable` ledger entry.
#[must_use]
pub fn analyze_session(log: &ObservationLog, options: &AnalyzeOptions) -> SessionAnalysis {
    let mode = options.mode;
    let mut ledger = AnalysisLedger::new(options.ledger_capacity);
    let counts = log.counts();

    let hit = estimate_rate(counts.hits, counts.n_signal, options.correction);
    let false_alarm = estimate_rate(counts.false_alarms, counts.n_noise, options.correction);
    record_rate(&mut ledger, mode, "hit", &hit);
    record_rate(&mut ledger, mode, "false-alarm", &false_alarm);

    let sdt = SdtResult::from_estimates(&hit, &false_alarm);
    ledger.record(match (sdt.d_prime, sdt.criterion_c, sdt.missing) {
        (Some(d_prime), Some(c), _) => AnalysisEvidenceEntry::new(
            AnalysisStage::SensitivityBias,
            mode,
            StageOutcome::Computed,
            format!("d' = {d_prime}, c = {c}"),
        ),
        (_, _, reason) => AnalysisEvidenceEntry::new(
            AnalysisStage::SensitivityBias,
            mode,
            StageOutcome::Unavailable,
            reason.map_or_else(|| String::from("unavailable"), |r| r.to_string()),
        ),
    });

    let roc = build_roc(log, counts.n_signal, counts.n_noise, options.roc_sweep);
    let roc_outcome = if roc.signal_class_empty || roc.noise_class_empty {
        StageOutcome::Unavailable
    } else {
        StageOutcome::Computed
    };
    ledger.record(AnalysisEvidenceEntry::new(
        AnalysisStage::Roc,
        mode,
        roc_outcome,
        format!(
            "{} thresholds, sweep {:?}, signal class empty: {}, noise class empty: {}",
            roc.points.len(),
            roc.sweep,
            roc.signal_class_empty,
            roc.noise_class_empty
        ),
    ));

    let binomial = binomial_test(counts.correct as u64, counts.total as u64);
    ledger.record(match binomial {
        Some(test) => AnalysisEvidenceEntry::new(
            AnalysisStage::Significance,
            mode,
            StageOutcome::Computed,
            format!(
                "{}/{} correct, one-sided p = {}",
                test.successes, test.trials, test.p_value
            ),
        ),
        None => AnalysisEvidenceEntry::new(
            AnalysisStage::Significance,
            mode,
            StageOutcome::Unavailable,
            "binomial test not run: no trials",
        ),
    });

    let accuracy = (counts.total > 0).then(|| counts.correct as f64 / counts.total as f64);

    SessionAnalysis {
        mode,
        correction: options.correction,
        counts,
        hit,
        false_alarm,
        sdt,
        roc,
        binomial,
        accuracy,
        ledger,
    }
}
