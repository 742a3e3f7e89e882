#![forbid(unsafe_code)]

//! Hit and false-alarm rate estimation with boundary correction.
//!
//! The probit transform is undefined at 0 and 1, so a rate computed from `n`
//! trials is pulled half a trial away from the boundary before it reaches
//! [`crate::sensitivity`].

use serde::{Deserialize, Serialize};

/// Boundary correction applied to raw rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateCorrection {
    /// `1 → (n - 0.5) / n`, `0 → 0.5 / n`, interior rates untouched.
    #[default]
    LogLinear,
    /// Clamp into `[1 / 2n, 1 - 1 / 2n]`.
    Clamp,
}

impl RateCorrection {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "log-linear" | "log_linear" => Some(Self::LogLinear),
            "clamp" => Some(Self::Clamp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    pub count: usize,
    pub n: usize,
    pub raw_rate: f64,
    pub adjusted_rate: f64,
}

impl RateEstimate {
    /// No trials of this class were presented.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.n == 0
    }

    #[must_use]
    pub fn was_corrected(&self) -> bool {
        self.n > 0 && self.adjusted_rate != self.raw_rate
    }
}

/// Rate correction for one stimulus class. `n == 0` yields `0.0`.
#[must_use]
pub fn adjust_rate(raw_rate: f64, n: usize, correction: RateCorrection) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    match correction {
        RateCorrection::LogLinear => {
            if raw_rate >= 1.0 {
                (n - 0.5) / n
            } else if raw_rate <= 0.0 {
                0.5 / n
            } else {
                raw_rate
            }
        }
        RateCorrection::Clamp => {
            let edge = 1.0 / (2.0 * n);
            raw_rate.min(1.0 - edge).max(edge)
        }
    }
}

/// `count` positive responses out of `n` opportunities.
#[must_use]
pub fn estimate_rate(count: usize, n: usize, correction: RateCorrection) -> RateEstimate {
    let raw_rate = if n > 0 { count as f64 / n as f64 } else { 0.0 };
    RateEstimate {
        count,
        n,
        raw_rate,
        adjusted_rate: adjust_rate(raw_rate, n, correction),
    }
}
