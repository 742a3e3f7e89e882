#![forbid(unsafe_code)]

//! Signal detection analysis over a frozen session log.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | `observation` | [`TrialObservation`], [`ObservationLog`], [`Confidence`] |
//! | `validation`  | driver-record ingestion and [`SdtValidationError`]     |
//! | `rate`        | [`estimate_rate`], boundary corrections               |
//! | `sensitivity` | [`probit`], d′ and criterion c                         |
//! | `roc`         | [`build_roc`] over confidence thresholds 1..=5        |
//! | `binomial`    | one-sided exact [`binomial_test`]                     |
//! | `api`         | [`analyze_session`]                                   |

pub mod api;
pub mod binomial;
pub mod observation;
pub mod rate;
pub mod roc;
pub mod sensitivity;
pub mod validation;

pub use api::{AnalyzeOptions, SessionAnalysis, analyze_session};
pub use binomial::{BinomialTest, CHANCE_PROBABILITY, binomial_tail_ge, binomial_test};
pub use observation::{Confidence, ObservationLog, ResponseRule, SdtCounts, TrialObservation};
pub use rate::{RateCorrection, RateEstimate, adjust_rate, estimate_rate};
pub use roc::{RocPoint, RocSweep, RocTable, build_roc, build_roc_from_log};
pub use sensitivity::{MissingReason, SdtResult, StimulusClass, probit, sensitivity_bias};
pub use validation::{
    IngestWarning, IngestedLog, IngestedObservation, RawObservation, SdtValidationError,
    ingest_log, ingest_observation,
};
