#![no_main]

use arbitrary::Arbitrary;
use sdt_core::{
    AnalyzeOptions, RateCorrection, RawObservation, ResponseRule, RocSweep, analyze_session,
    ingest_log,
};
use sdt_runtime::RuntimeMode;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct RawTrial {
    signal_present: bool,
    response_positive: Option<bool>,
    confidence: i8,
    recorded_correct: Option<bool>,
}

#[derive(Debug, Arbitrary)]
struct SessionInput {
    hardened: bool,
    clamp: bool,
    rating_sweep: bool,
    ledger_capacity: u8,
    trials: Vec<RawTrial>,
}

fuzz_target!(|input: SessionInput| {
    let mode = if input.hardened {
        RuntimeMode::Hardened
    } else {
        RuntimeMode::Strict
    };
    let options = AnalyzeOptions {
        mode,
        correction: if input.clamp {
            RateCorrection::Clamp
        } else {
            RateCorrection::LogLinear
        },
        roc_sweep: if input.rating_sweep {
            RocSweep::RatingScale
        } else {
            RocSweep::PositiveResponses
        },
        ledger_capacity: usize::from(input.ledger_capacity),
    };
    let records = input.trials.iter().take(512).map(|trial| RawObservation {
        signal_present: trial.signal_present,
        response_positive: trial.response_positive,
        confidence: i64::from(trial.confidence),
        recorded_correct: trial.recorded_correct,
    });
    let Ok(ingested) = ingest_log(records, ResponseRule::default(), mode) else {
        return;
    };

    let analysis = analyze_session(&ingested.log, &options);
    assert_eq!(analysis.counts.total, ingested.log.len());
    assert!(analysis.roc.is_monotone());
    assert!((0.0..=1.0).contains(&analysis.hit.adjusted_rate));
    assert!((0.0..=1.0).contains(&analysis.false_alarm.adjusted_rate));
    if let Some(p) = analysis.p_value() {
        assert!((0.0..=1.0).contains(&p));
    }
});
