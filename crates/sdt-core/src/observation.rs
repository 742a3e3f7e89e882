#![forbid(unsafe_code)]

//! Trial observations and the append-only session log.

use serde::{Deserialize, Serialize};

use crate::validation::SdtValidationError;

/// Self-reported certainty on the closed integer scale [1, 5].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Every level in ascending order; also the ROC thresholds.
    pub const LEVELS: [Self; 5] = [Self(1), Self(2), Self(3), Self(4), Self(5)];

    pub fn new(value: u8) -> Result<Self, SdtValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SdtValidationError::ConfidenceOutOfRange {
                value: i64::from(value),
            })
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = SdtValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives a binary response from a rating when only a rating was collected.
///
/// Ratings at or above `min_positive` count as "yes/old".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRule {
    pub min_positive: Confidence,
}

impl ResponseRule {
    #[must_use]
    pub const fn new(min_positive: Confidence) -> Self {
        Self { min_positive }
    }

    #[must_use]
    pub fn is_positive(&self, rating: Confidence) -> bool {
        rating >= self.min_positive
    }
}

impl Default for ResponseRule {
    /// 4 = "probably old", 5 = "sure old".
    fn default() -> Self {
        Self {
            min_positive: Confidence::LEVELS[3],
        }
    }
}

/// One decision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialObservation {
    pub signal_present: bool,
    pub response_positive: bool,
    pub confidence: Confidence,
}

impl TrialObservation {
    #[must_use]
    pub const fn new(signal_present: bool, response_positive: bool, confidence: Confidence) -> Self {
        Self {
            signal_present,
            response_positive,
            confidence,
        }
    }

    #[must_use]
    pub fn from_rating(signal_present: bool, rating: Confidence, rule: ResponseRule) -> Self {
        Self::new(signal_present, rule.is_positive(rating), rating)
    }

    #[must_use]
    pub const fn correct(&self) -> bool {
        self.signal_present == self.response_positive
    }

    #[must_use]
    pub const fn is_hit(&self) -> bool {
        self.signal_present && self.response_positive
    }

    #[must_use]
    pub const fn is_false_alarm(&self) -> bool {
        !self.signal_present && self.response_positive
    }
}

/// Outcome tallies of a log, gathered in a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdtCounts {
    pub n_signal: usize,
    pub n_noise: usize,
    pub hits: usize,
    pub false_alarms: usize,
    pub correct: usize,
    pub total: usize,
}

impl SdtCounts {
    #[must_use]
    pub const fn misses(&self) -> usize {
        self.n_signal - self.hits
    }

    #[must_use]
    pub const fn correct_rejections(&self) -> usize {
        self.n_noise - self.false_alarms
    }
}

/// Append-only ordered sequence of observations for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationLog {
    observations: Vec<TrialObservation>,
}

impl ObservationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observations: Vec::new(),
        }
    }

    pub fn push(&mut self, observation: TrialObservation) {
        self.observations.push(observation);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrialObservation> {
        self.observations.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TrialObservation] {
        &self.observations
    }

    #[must_use]
    pub fn counts(&self) -> SdtCounts {
        self.observations
            .iter()
            .fold(SdtCounts::default(), |mut counts, obs| {
                counts.total += 1;
                if obs.signal_present {
                    counts.n_signal += 1;
                } else {
                    counts.n_noise += 1;
                }
                counts.hits += usize::from(obs.is_hit());
                counts.false_alarms += usize::from(obs.is_false_alarm());
                counts.correct += usize::from(obs.correct());
                counts
            })
    }
}

impl FromIterator<TrialObservation> for ObservationLog {
    fn from_iter<I: IntoIterator<Item = TrialObservation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<TrialObservation>> for ObservationLog {
    fn from(observations: Vec<TrialObservation>) -> Self {
        Self { observations }
    }
}

impl<'a> IntoIterator for &'a ObservationLog {
    type Item = &'a TrialObservation;
    type IntoIter = std::slice::Iter<'a, TrialObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
