#![forbid(unsafe_code)]

//! Five-point ROC tables swept over the confidence scale.

use serde::{Deserialize, Serialize};

use crate::observation::{Confidence, ObservationLog, TrialObservation};

/// Which trials count toward a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RocSweep {
    /// Positive responses with confidence at or above the threshold.
    #[default]
    PositiveResponses,
    /// Any trial rated at or above the threshold, ignoring the binary
    /// response. Suited to rating-only tasks where the rating is the response.
    RatingScale,
}

impl RocSweep {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "positive" | "positive-responses" => Some(Self::PositiveResponses),
            "rating" | "rating-scale" => Some(Self::RatingScale),
            _ => None,
        }
    }

    fn admits(self, observation: &TrialObservation, threshold: Confidence) -> bool {
        let rated = observation.confidence >= threshold;
        match self {
            Self::PositiveResponses => observation.response_positive && rated,
            Self::RatingScale => rated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: Confidence,
    pub hit_rate: f64,
    pub false_alarm_rate: f64,
}

/// ROC points in ascending threshold order.
///
/// A rate whose class had no trials is reported as `0.0`; the matching
/// `*_class_empty` flag marks it as a placeholder rather than a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocTable {
    pub sweep: RocSweep,
    pub points: Vec<RocPoint>,
    pub signal_class_empty: bool,
    pub noise_class_empty: bool,
}

impl RocTable {
    pub fn iter(&self) -> std::slice::Iter<'_, RocPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn point(&self, threshold: Confidence) -> Option<&RocPoint> {
        self.points.iter().find(|p| p.threshold == threshold)
    }

    /// Both rate sequences are non-increasing as the threshold rises.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        self.points.windows(2).all(|pair| {
            pair[1].hit_rate <= pair[0].hit_rate
                && pair[1].false_alarm_rate <= pair[0].false_alarm_rate
        })
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Sweep thresholds 1..=5 over `log`, dividing by the given class totals.
#[must_use]
pub fn build_roc(log: &ObservationLog, n_signal: usize, n_noise: usize, sweep: RocSweep) -> RocTable {
    let points = Confidence::LEVELS
        .iter()
        .map(|&threshold| {
            let (hits, false_alarms) = log
                .iter()
                .filter(|obs| sweep.admits(obs, threshold))
                .fold((0usize, 0usize), |(h, f), obs| {
                    if obs.signal_present {
                        (h + 1, f)
                    } else {
                        (h, f + 1)
                    }
                });
            RocPoint {
                threshold,
                hit_rate: rate(hits, n_signal),
                false_alarm_rate: rate(false_alarms, n_noise),
            }
        })
        .collect();

    RocTable {
        sweep,
        points,
        signal_class_empty: n_signal == 0,
        noise_class_empty: n_noise == 0,
    }
}

/// [`build_roc`] with class totals taken from the log itself.
#[must_use]
pub fn build_roc_from_log(log: &ObservationLog, sweep: RocSweep) -> RocTable {
    let counts = log.counts();
    build_roc(log, counts.n_signal, counts.n_noise, sweep)
}
