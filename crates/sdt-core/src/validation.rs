#![forbid(unsafe_code)]

use sdt_runtime::RuntimeMode;

use crate::observation::{Confidence, ObservationLog, ResponseRule, TrialObservation};

/// A trial record exactly as the experiment driver produced it.
///
/// `response_positive` is absent for rating-only tasks, where the response is
/// derived from the rating. `recorded_correct` is the driver's own
/// correctness flag, if it kept one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawObservation {
    pub signal_present: bool,
    pub response_positive: Option<bool>,
    pub confidence: i64,
    pub recorded_correct: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestWarning {
    CorrectFlagRecomputed { recorded: bool, derived: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedObservation {
    pub observation: TrialObservation,
    pub mode: RuntimeMode,
    pub warnings: Vec<IngestWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedLog {
    pub log: ObservationLog,
    pub mode: RuntimeMode,
    /// Warnings keyed by zero-based trial position.
    pub warnings: Vec<(usize, IngestWarning)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdtValidationError {
    ConfidenceOutOfRange {
        value: i64,
    },
    InconsistentCorrectFlag {
        recorded: bool,
        derived: bool,
    },
    AtObservation {
        index: usize,
        error: Box<SdtValidationError>,
    },
}

impl std::fmt::Display for SdtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfidenceOutOfRange { value } => write!(
                f,
                "confidence {value} is outside [{}, {}]",
                Confidence::MIN,
                Confidence::MAX
            ),
            Self::InconsistentCorrectFlag { recorded, derived } => write!(
                f,
                "recorded correct flag {recorded} disagrees with derived value {derived}"
            ),
            Self::AtObservation { index, error } => write!(f, "observation {index}: {error}"),
        }
    }
}

impl std::error::Error for SdtValidationError {}

/// Admit one driver record into the observation model.
///
/// Strict mode recomputes a disagreeing `correct` flag and reports it as a
/// warning; Hardened mode rejects the record.
pub fn ingest_observation(
    raw: RawObservation,
    rule: ResponseRule,
    mode: RuntimeMode,
) -> Result<IngestedObservation, SdtValidationError> {
    let confidence = u8::try_from(raw.confidence)
        .map_err(|_| SdtValidationError::ConfidenceOutOfRange {
            value: raw.confidence,
        })
        .and_then(Confidence::new)?;

    let observation = match raw.response_positive {
        Some(response_positive) => {
            TrialObservation::new(raw.signal_present, response_positive, confidence)
        }
        None => TrialObservation::from_rating(raw.signal_present, confidence, rule),
    };

    let mut warnings = Vec::new();
    if let Some(recorded) = raw.recorded_correct {
        let derived = observation.correct();
        if recorded != derived {
            if mode.is_hardened() {
                return Err(SdtValidationError::InconsistentCorrectFlag { recorded, derived });
            }
            warnings.push(IngestWarning::CorrectFlagRecomputed { recorded, derived });
        }
    }

    Ok(IngestedObservation {
        observation,
        mode,
        warnings,
    })
}

/// Admit a whole session; the first rejected record aborts with its position.
pub fn ingest_log<I>(
    records: I,
    rule: ResponseRule,
    mode: RuntimeMode,
) -> Result<IngestedLog, SdtValidationError>
where
    I: IntoIterator<Item = RawObservation>,
{
    let mut log = ObservationLog::new();
    let mut warnings = Vec::new();
    for (index, raw) in records.into_iter().enumerate() {
        let ingested =
            ingest_observation(raw, rule, mode).map_err(|error| SdtValidationError::AtObservation {
                index,
                error: Box::new(error),
            })?;
        warnings.extend(ingested.warnings.into_iter().map(|w| (index, w)));
        log.push(ingested.observation);
    }
    Ok(IngestedLog {
        log,
        mode,
        warnings,
    })
}
