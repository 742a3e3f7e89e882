#![forbid(unsafe_code)]

use sdt_core::{AnalyzeOptions, ResponseRule, RocSweep};
use sdt_report::{
    ReportConfig, ReportError, SessionMetadata, TableLayout, TrialRecord, parse_trial_records,
    write_session_report,
};
use sdt_runtime::{RuntimeMode, assert_close};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(suffix: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    std::env::temp_dir().join(format!(
        "sdt_report_{suffix}_{}_{}",
        std::process::id(),
        nonce
    ))
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|error| {
        panic!("failed to read {}: {error}", path.display());
    })
}

fn record(trial: u32, signal: bool, response: bool, confidence: i64) -> TrialRecord {
    TrialRecord {
        trial,
        signal_present: signal,
        response_positive: Some(response),
        confidence,
        correct: Some(signal == response),
        rt_seconds: Some(0.5),
        timestamp: None,
        probe: None,
    }
}

/// 10 signal trials with 8 "yes", 10 noise trials with 2 "yes".
fn symmetric_records() -> Vec<TrialRecord> {
    (0..10u32)
        .flat_map(|i| {
            let confidence = 1 + i64::from(i % 5);
            [
                record(2 * i + 1, true, i < 8, confidence),
                record(2 * i + 2, false, i < 2, confidence),
            ]
        })
        .collect()
}

fn config(dir: &Path, layout: TableLayout) -> ReportConfig {
    ReportConfig {
        output_dir: dir.to_path_buf(),
        layout,
        timestamp: Some(String::from("20240301_100000")),
    }
}

#[test]
fn writer_emits_all_tables_for_a_detection_session() {
    let dir = unique_temp_dir("detection");
    let metadata = SessionMetadata::new("P01", "1");
    let report = write_session_report(
        &config(&dir, TableLayout::SignalDetection),
        &metadata,
        &symmetric_records(),
        &AnalyzeOptions::default(),
        ResponseRule::default(),
    )
    .expect("report written");

    assert_eq!(
        report.paths.summary,
        dir.join("P01_sess1_20240301_100000_summary.csv")
    );
    for path in report.paths.all() {
        assert!(path.exists(), "missing artifact {}", path.display());
    }

    let trials = read(&report.paths.trials);
    assert_eq!(trials.lines().count(), 21);
    assert_eq!(
        trials.lines().nth(1),
        Some("P01,1,1,True,yes,1,1,0.5,NA")
    );

    let summary = read(&report.paths.summary);
    let row: Vec<&str> = summary
        .lines()
        .nth(1)
        .expect("summary data row")
        .split(',')
        .collect();
    assert_eq!(&row[..6], &["10", "10", "8", "2", "0.8", "0.2"]);
    let d_prime: f64 = row[6].parse().expect("numeric d'");
    let criterion: f64 = row[7].parse().expect("numeric c");
    assert_close(d_prime, 1.683_242_467_145_828_6, 1e-9, 0.0);
    assert_close(criterion, 0.0, 1e-9, 0.0);
    assert_eq!(&row[8..10], &["16", "20"]);
    let p_value: f64 = row[10].parse().expect("numeric p");
    assert_close(p_value, 6196.0 / 1_048_576.0, 0.0, 1e-10);

    let roc = read(&report.paths.roc);
    assert_eq!(roc.lines().count(), 6);
    assert_eq!(roc.lines().nth(1), Some("1,0.8,0.2"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn analysis_jsonl_starts_with_ingest_evidence() {
    let dir = unique_temp_dir("ledger");
    let mut records = symmetric_records();
    records[0].correct = Some(false);
    let report = write_session_report(
        &config(&dir, TableLayout::SignalDetection),
        &SessionMetadata::new("P02", "3"),
        &records,
        &AnalyzeOptions::default(),
        ResponseRule::default(),
    )
    .expect("strict mode repairs the flag");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].0, 0);

    let lines: Vec<Value> = read(&report.paths.analysis)
        .lines()
        .map(|line| serde_json::from_str(line).expect("ledger line is json"))
        .collect();
    assert_eq!(lines.len(), 2 + 5);
    assert_eq!(lines[0]["stage"], "ingest");
    assert_eq!(lines[0]["outcome"], "computed");
    assert_eq!(lines[1]["stage"], "ingest");
    assert_eq!(lines[1]["outcome"], "corrected");
    assert_eq!(lines[2]["stage"], "rate_estimate");
    assert_eq!(lines[6]["stage"], "significance");
    assert!(lines.iter().all(|line| line["mode"] == "Strict"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn hardened_mode_rejects_before_writing() {
    let dir = unique_temp_dir("hardened");
    let mut records = symmetric_records();
    records[3].correct = Some(true);
    let err = write_session_report(
        &config(&dir, TableLayout::SignalDetection),
        &SessionMetadata::new("P01", "1"),
        &records,
        &AnalyzeOptions {
            mode: RuntimeMode::Hardened,
            ..AnalyzeOptions::default()
        },
        ResponseRule::default(),
    )
    .expect_err("hardened rejects inconsistent flag");
    assert!(matches!(err, ReportError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "trial log rejected: observation 3: recorded correct flag true disagrees with derived value false"
    );
    assert!(!dir.exists());
}

#[test]
fn word_recognition_session_derives_responses_from_ratings() {
    let dir = unique_temp_dir("word");
    let input = r#"{"trial":1,"signal_present":true,"confidence":5,"probe":"River"}
{"trial":2,"signal_present":true,"confidence":3,"probe":"Candle"}
{"trial":3,"signal_present":false,"confidence":4,"probe":"Stone"}
{"trial":4,"signal_present":false,"confidence":1,"probe":"Garden"}
"#;
    let records = parse_trial_records(input).expect("valid log");
    let report = write_session_report(
        &config(&dir, TableLayout::WordRecognition { set_size: 6 }),
        &SessionMetadata::new("P07", "1"),
        &records,
        &AnalyzeOptions {
            roc_sweep: RocSweep::RatingScale,
            ..AnalyzeOptions::default()
        },
        ResponseRule::default(),
    )
    .expect("report written");

    assert_eq!(report.paths.trials, dir.join("WM_P07_Set6_20240301_100000.csv"));
    let trials = read(&report.paths.trials);
    let rows: Vec<&str> = trials.lines().collect();
    assert_eq!(
        rows,
        vec![
            "Participant_ID,SetSize,Trial,Probe,IsTarget,Response,Confidence,Correct",
            "P07,6,1,River,True,y,5,1",
            "P07,6,2,Candle,True,n,3,0",
            "P07,6,3,Stone,False,y,4,0",
            "P07,6,4,Garden,False,n,1,1",
        ]
    );

    let roc = read(&report.paths.roc);
    let roc_rows: Vec<&str> = roc.lines().collect();
    assert_eq!(roc_rows[1], "1,1.0,1.0");
    assert_eq!(roc_rows[4], "4,0.5,0.5");
    assert_eq!(roc_rows[5], "5,0.5,0.0");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn word_layout_defaults_score_like_the_recognition_task() {
    let dir = unique_temp_dir("word_defaults");
    let layout = TableLayout::WordRecognition { set_size: 2 };
    let input = r#"{"trial":1,"signal_present":true,"confidence":3,"probe":"River"}
{"trial":2,"signal_present":true,"confidence":3,"probe":"Candle"}
{"trial":3,"signal_present":false,"confidence":1,"probe":"Stone"}
{"trial":4,"signal_present":false,"confidence":1,"probe":"Garden"}
"#;
    let records = parse_trial_records(input).expect("valid log");
    let report = write_session_report(
        &config(&dir, layout),
        &SessionMetadata::new("P08", "1"),
        &records,
        &layout.analyze_defaults(),
        ResponseRule::default(),
    )
    .expect("report written");

    let roc = read(&report.paths.roc);
    assert_eq!(
        roc.lines().collect::<Vec<_>>(),
        vec![
            "Threshold,HitRate,FARate",
            "1,1.0,1.0",
            "2,1.0,0.0",
            "3,1.0,0.0",
            "4,0.0,0.0",
            "5,0.0,0.0",
        ]
    );

    let summary = read(&report.paths.summary);
    let row: Vec<&str> = summary
        .lines()
        .nth(1)
        .expect("summary data row")
        .split(',')
        .collect();
    assert_eq!(
        &row[..10],
        &["2", "2", "0", "0", "0.25", "0.25", "0.0", "0.674", "2", "4"]
    );

    let json: Value = serde_json::from_str(&report.analysis_json().expect("serializes"))
        .expect("analysis json parses");
    assert_eq!(json["correction"], "clamp");
    assert_eq!(json["roc"]["sweep"], "rating_scale");
    assert_eq!(json["counts"]["total"], 4);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_session_writes_missing_markers() {
    let dir = unique_temp_dir("empty");
    let report = write_session_report(
        &config(&dir, TableLayout::SignalDetection),
        &SessionMetadata::new("P09", "1"),
        &[],
        &AnalyzeOptions::default(),
        ResponseRule::default(),
    )
    .expect("empty session still reports");
    let summary = read(&report.paths.summary);
    assert_eq!(summary.lines().nth(1), Some("0,0,0,0,0.0,0.0,NA,NA,0,0,NA"));
    assert_eq!(read(&report.paths.trials).lines().count(), 1);
    assert!(report.analysis.has_missing_values());

    fs::remove_dir_all(&dir).ok();
}
