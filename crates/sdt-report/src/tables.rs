#![forbid(unsafe_code)]

//! CSV rendering for the trial, summary and ROC tables.
//!
//! Column order is fixed per layout. Missing values become [`MISSING`] here
//! and nowhere else.

use sdt_core::{AnalyzeOptions, ObservationLog, RateCorrection, RocSweep, RocTable, SessionAnalysis};
use serde::{Deserialize, Serialize};

use crate::session::{SessionMetadata, TrialRecord};

pub const MISSING: &str = "NA";

pub const SIGNAL_DETECTION_TRIAL_COLUMNS: [&str; 9] = [
    "participant",
    "session",
    "trial",
    "signal_present",
    "response",
    "correct",
    "confidence",
    "rt_seconds",
    "timestamp",
];

pub const WORD_RECOGNITION_TRIAL_COLUMNS: [&str; 8] = [
    "Participant_ID",
    "SetSize",
    "Trial",
    "Probe",
    "IsTarget",
    "Response",
    "Confidence",
    "Correct",
];

pub const SUMMARY_COLUMNS: [&str; 11] = [
    "n_signal",
    "n_noise",
    "hits",
    "false_alarms",
    "H_rate",
    "FA_rate",
    "dprime",
    "c",
    "overall_correct",
    "total_trials",
    "binomial_p",
];

pub const ROC_COLUMNS: [&str; 3] = ["Threshold", "HitRate", "FARate"];

const SUMMARY_RATE_PLACES: i32 = 4;
const WORD_SUMMARY_PLACES: i32 = 3;
const ROC_RATE_PLACES: i32 = 3;
const RT_PLACES: i32 = 3;

/// Which experiment produced the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableLayout {
    /// Yes/no detection with a separate confidence rating.
    #[default]
    SignalDetection,
    /// Old/new word recognition; the response comes from the rating.
    WordRecognition { set_size: u32 },
}

impl TableLayout {
    #[must_use]
    pub fn trial_columns(&self) -> &'static [&'static str] {
        match self {
            Self::SignalDetection => &SIGNAL_DETECTION_TRIAL_COLUMNS,
            Self::WordRecognition { .. } => &WORD_RECOGNITION_TRIAL_COLUMNS,
        }
    }

    /// Analysis settings the layout's experiment was scored with.
    ///
    /// Word recognition clamps extreme rates and sweeps every rating;
    /// detection keeps [`AnalyzeOptions::default`].
    #[must_use]
    pub fn analyze_defaults(&self) -> AnalyzeOptions {
        match self {
            Self::SignalDetection => AnalyzeOptions::default(),
            Self::WordRecognition { .. } => AnalyzeOptions {
                correction: RateCorrection::Clamp,
                roc_sweep: RocSweep::RatingScale,
                ..AnalyzeOptions::default()
            },
        }
    }
}

/// The single data row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub n_signal: usize,
    pub n_noise: usize,
    pub hits: usize,
    pub false_alarms: usize,
    /// Hit rate, rounded: raw for detection, corrected for word recognition.
    pub hit_rate: f64,
    pub false_alarm_rate: f64,
    pub d_prime: Option<f64>,
    pub criterion_c: Option<f64>,
    pub overall_correct: usize,
    pub total_trials: usize,
    pub binomial_p: Option<f64>,
}

impl SummaryRow {
    #[must_use]
    pub fn from_analysis(analysis: &SessionAnalysis, layout: TableLayout) -> Self {
        let counts = analysis.counts;
        let (hit_rate, false_alarm_rate, sdt_places) = match layout {
            TableLayout::SignalDetection => (
                round_to(analysis.hit.raw_rate, SUMMARY_RATE_PLACES),
                round_to(analysis.false_alarm.raw_rate, SUMMARY_RATE_PLACES),
                None,
            ),
            TableLayout::WordRecognition { .. } => (
                round_to(analysis.hit.adjusted_rate, WORD_SUMMARY_PLACES),
                round_to(analysis.false_alarm.adjusted_rate, WORD_SUMMARY_PLACES),
                Some(WORD_SUMMARY_PLACES),
            ),
        };
        let sdt_value =
            |value: Option<f64>| value.map(|v| sdt_places.map_or(v, |places| round_to(v, places)));
        Self {
            n_signal: counts.n_signal,
            n_noise: counts.n_noise,
            hits: counts.hits,
            false_alarms: counts.false_alarms,
            hit_rate,
            false_alarm_rate,
            d_prime: sdt_value(analysis.sdt.d_prime),
            criterion_c: sdt_value(analysis.sdt.criterion_c),
            overall_correct: counts.correct,
            total_trials: counts.total,
            binomial_p: analysis.p_value(),
        }
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.n_signal.to_string(),
            self.n_noise.to_string(),
            self.hits.to_string(),
            self.false_alarms.to_string(),
            format_float(self.hit_rate),
            format_float(self.false_alarm_rate),
            format_optional(self.d_prime),
            format_optional(self.criterion_c),
            self.overall_correct.to_string(),
            self.total_trials.to_string(),
            format_optional(self.binomial_p),
        ]
    }
}

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Shortest round-trip form, always with a fractional part (`0.8`, `1.0`).
fn format_float(value: f64) -> String {
    format!("{value:?}")
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| String::from(MISSING), format_float)
}

fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line: Vec<String> = fields.iter().map(|f| csv_field(f.as_ref())).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Render the per-trial table. `records` and `log` must be position-aligned,
/// as produced by [`crate::session::ingest_records`]; the observation supplies
/// the validated response and correctness.
#[must_use]
pub fn render_trial_table(
    layout: TableLayout,
    metadata: &SessionMetadata,
    records: &[TrialRecord],
    log: &ObservationLog,
) -> String {
    let mut out = String::new();
    push_row(&mut out, layout.trial_columns());
    for (record, observation) in records.iter().zip(log.iter()) {
        let row = match layout {
            TableLayout::SignalDetection => vec![
                metadata.participant.clone(),
                metadata.session.clone(),
                record.trial.to_string(),
                format_bool(observation.signal_present).to_owned(),
                String::from(if observation.response_positive { "yes" } else { "no" }),
                u8::from(observation.correct()).to_string(),
                observation.confidence.to_string(),
                record
                    .rt_seconds
                    .map_or_else(|| String::from(MISSING), |rt| format_float(round_to(rt, RT_PLACES))),
                record.timestamp.clone().unwrap_or_else(|| String::from(MISSING)),
            ],
            TableLayout::WordRecognition { set_size } => vec![
                metadata.participant.clone(),
                set_size.to_string(),
                record.trial.to_string(),
                record.probe.clone().unwrap_or_else(|| String::from(MISSING)),
                format_bool(observation.signal_present).to_owned(),
                String::from(if observation.response_positive { "y" } else { "n" }),
                observation.confidence.to_string(),
                u8::from(observation.correct()).to_string(),
            ],
        };
        push_row(&mut out, &row);
    }
    out
}

#[must_use]
pub fn render_summary_table(analysis: &SessionAnalysis, layout: TableLayout) -> String {
    let mut out = String::new();
    push_row(&mut out, &SUMMARY_COLUMNS);
    push_row(&mut out, &SummaryRow::from_analysis(analysis, layout).fields());
    out
}

#[must_use]
pub fn render_roc_table(roc: &RocTable) -> String {
    let mut out = String::new();
    push_row(&mut out, &ROC_COLUMNS);
    for point in roc.iter() {
        push_row(
            &mut out,
            &[
                point.threshold.to_string(),
                format_float(round_to(point.hit_rate, ROC_RATE_PLACES)),
                format_float(round_to(point.false_alarm_rate, ROC_RATE_PLACES)),
            ],
        );
    }
    out
}
