#![no_main]

use libfuzzer_sys::fuzz_target;
use sdt_core::ResponseRule;
use sdt_report::{ingest_records, parse_trial_records};
use sdt_runtime::RuntimeMode;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(records) = parse_trial_records(text) {
        if let Ok(ingested) = ingest_records(&records, ResponseRule::default(), RuntimeMode::Strict) {
            assert_eq!(ingested.log.len(), records.len());
        }
    }
});
