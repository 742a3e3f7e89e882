#![forbid(unsafe_code)]

//! Sensitivity (d′) and response bias (criterion c) from adjusted rates.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::rate::RateEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusClass {
    Signal,
    Noise,
}

/// Why a statistic could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingReason {
    /// The class had no trials, so it has no rate.
    DegenerateRate { class: StimulusClass },
    /// The probit was not defined for the supplied rates.
    DomainUnavailable,
    /// The session produced no observations at all.
    EmptyLog,
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateRate {
                class: StimulusClass::Signal,
            } => write!(f, "no signal trials"),
            Self::DegenerateRate {
                class: StimulusClass::Noise,
            } => write!(f, "no noise trials"),
            Self::DomainUnavailable => write!(f, "probit undefined for the supplied rates"),
            Self::EmptyLog => write!(f, "no trials recorded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SdtResult {
    pub d_prime: Option<f64>,
    pub criterion_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingReason>,
}

impl SdtResult {
    #[must_use]
    pub const fn unavailable(reason: MissingReason) -> Self {
        Self {
            d_prime: None,
            criterion_c: None,
            missing: Some(reason),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.d_prime.is_some() && self.criterion_c.is_some()
    }

    /// d′ and c from the two class estimates; an empty class is reported
    /// as a degenerate rate rather than run through the probit.
    #[must_use]
    pub fn from_estimates(hit: &RateEstimate, false_alarm: &RateEstimate) -> Self {
        if hit.is_degenerate() && false_alarm.is_degenerate() {
            return Self::unavailable(MissingReason::EmptyLog);
        }
        if hit.is_degenerate() {
            return Self::unavailable(MissingReason::DegenerateRate {
                class: StimulusClass::Signal,
            });
        }
        if false_alarm.is_degenerate() {
            return Self::unavailable(MissingReason::DegenerateRate {
                class: StimulusClass::Noise,
            });
        }
        sensitivity_bias(hit.adjusted_rate, false_alarm.adjusted_rate)
    }
}

/// Standard-normal inverse CDF, defined on the open interval (0, 1).
#[must_use]
pub fn probit(p: f64) -> Option<f64> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }
    let standard = Normal::new(0.0, 1.0).ok()?;
    let z = standard.inverse_cdf(p);
    z.is_finite().then_some(z)
}

/// `d′ = zH − zF`, `c = −(zH + zF) / 2`.
#[must_use]
pub fn sensitivity_bias(hit_rate: f64, false_alarm_rate: f64) -> SdtResult {
    match (probit(hit_rate), probit(false_alarm_rate)) {
        (Some(z_hit), Some(z_fa)) => SdtResult {
            d_prime: Some(z_hit - z_fa),
            criterion_c: Some(-0.5 * (z_hit + z_fa)),
            missing: None,
        },
        _ => SdtResult::unavailable(MissingReason::DomainUnavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::{RateCorrection, estimate_rate};
    use sdt_runtime::assert_close;

    #[test]
    fn chance_is_zero_sensitivity_and_neutral_bias() {
        let result = sensitivity_bias(0.5, 0.5);
        assert_close(result.d_prime.expect("available"), 0.0, 1e-12, 0.0);
        assert_close(result.criterion_c.expect("available"), 0.0, 1e-12, 0.0);
        assert!(result.missing.is_none());
    }

    #[test]
    fn probit_reference_values() {
        assert_close(probit(0.5).expect("defined"), 0.0, 1e-12, 0.0);
        assert_close(probit(0.8).expect("defined"), 0.841_621_233_572_914_3, 1e-9, 0.0);
        assert_close(probit(0.975).expect("defined"), 1.959_963_984_540_054, 1e-9, 0.0);
        assert_close(probit(0.025).expect("defined"), -1.959_963_984_540_054, 1e-9, 0.0);
    }

    #[test]
    fn probit_undefined_on_boundaries() {
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert_eq!(probit(p), None, "p = {p}");
        }
    }

    #[test]
    fn out_of_domain_rates_are_unavailable_not_zero() {
        let result = sensitivity_bias(1.0, 0.2);
        assert_eq!(result.d_prime, None);
        assert_eq!(result.criterion_c, None);
        assert_eq!(result.missing, Some(MissingReason::DomainUnavailable));
    }

    #[test]
    fn liberal_bias_is_negative_c() {
        let result = sensitivity_bias(0.9, 0.6);
        assert!(result.criterion_c.expect("available") < 0.0);
        let conservative = sensitivity_bias(0.4, 0.1);
        assert!(conservative.criterion_c.expect("available") > 0.0);
    }

    #[test]
    fn empty_classes_are_degenerate() {
        let hit = estimate_rate(3, 4, RateCorrection::LogLinear);
        let none = estimate_rate(0, 0, RateCorrection::LogLinear);
        assert_eq!(
            SdtResult::from_estimates(&hit, &none).missing,
            Some(MissingReason::DegenerateRate {
                class: StimulusClass::Noise
            })
        );
        assert_eq!(
            SdtResult::from_estimates(&none, &hit).missing,
            Some(MissingReason::DegenerateRate {
                class: StimulusClass::Signal
            })
        );
        assert_eq!(
            SdtResult::from_estimates(&none, &none).missing,
            Some(MissingReason::EmptyLog)
        );
    }

    #[test]
    fn perfect_session_uses_corrected_rates() {
        let hit = estimate_rate(10, 10, RateCorrection::LogLinear);
        let fa = estimate_rate(0, 10, RateCorrection::LogLinear);
        let result = SdtResult::from_estimates(&hit, &fa);
        let z = probit(0.95).expect("defined");
        assert_close(result.d_prime.expect("available"), 2.0 * z, 1e-12, 1e-12);
        assert_close(result.criterion_c.expect("available"), 0.0, 1e-12, 0.0);
    }

    #[test]
    fn missing_reason_serializes_with_kind_tag() {
        let json = serde_json::to_string(&MissingReason::DegenerateRate {
            class: StimulusClass::Noise,
        })
        .expect("serializes");
        assert_eq!(json, r#"{"kind":"degenerate_rate","class":"noise"}"#);
    }
}
