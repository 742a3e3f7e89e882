#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use sdt_core::{RateCorrection, ResponseRule, RocSweep};
use sdt_report::{
    ReportConfig, SessionMetadata, TableLayout, load_trial_records, write_session_report,
};
use sdt_runtime::{AnalysisLogEntry, LogLevel, LogResult, RuntimeMode};

#[derive(Debug, Clone)]
struct CliArgs {
    input: PathBuf,
    output_dir: PathBuf,
    participant: String,
    session: String,
    set_size: Option<u32>,
    timestamp: Option<String>,
    layout: String,
    mode: RuntimeMode,
    correction: Option<RateCorrection>,
    roc_sweep: Option<RocSweep>,
}

#[derive(Debug, Clone)]
enum CliParseError {
    Help,
    Message(String),
}

fn value_for<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, CliParseError> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| CliParseError::Message(format!("missing value for {flag}")))
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, CliParseError> {
    let defaults = ReportConfig::default();
    let mut input = None;
    let mut output_dir = defaults.output_dir;
    let mut participant = String::from("P01");
    let mut session = String::from("1");
    let mut set_size = None;
    let mut timestamp = None;
    let mut layout = String::from("detection");
    let mut mode = RuntimeMode::default();
    let mut correction = None;
    let mut roc_sweep = None;

    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "-h" | "--help" => return Err(CliParseError::Help),
            "--input" => input = Some(PathBuf::from(value_for(args, index, flag)?)),
            "--out-dir" => output_dir = PathBuf::from(value_for(args, index, flag)?),
            "--participant" => participant = value_for(args, index, flag)?.to_owned(),
            "--session" => session = value_for(args, index, flag)?.to_owned(),
            "--timestamp" => timestamp = Some(value_for(args, index, flag)?.to_owned()),
            "--layout" => layout = value_for(args, index, flag)?.to_owned(),
            "--set-size" => {
                let value = value_for(args, index, flag)?;
                set_size = Some(value.parse().map_err(|_| {
                    CliParseError::Message(format!("invalid --set-size `{value}`"))
                })?);
            }
            "--mode" => {
                let value = value_for(args, index, flag)?;
                mode = RuntimeMode::from_name(value).ok_or_else(|| {
                    CliParseError::Message(format!("unknown mode `{value}` (strict|hardened)"))
                })?;
            }
            "--correction" => {
                let value = value_for(args, index, flag)?;
                correction = Some(RateCorrection::from_name(value).ok_or_else(|| {
                    CliParseError::Message(format!(
                        "unknown correction `{value}` (log-linear|clamp)"
                    ))
                })?);
            }
            "--roc-sweep" => {
                let value = value_for(args, index, flag)?;
                roc_sweep = Some(RocSweep::from_name(value).ok_or_else(|| {
                    CliParseError::Message(format!("unknown ROC sweep `{value}` (positive|rating)"))
                })?);
            }
            unknown => {
                return Err(CliParseError::Message(format!(
                    "unrecognized argument `{unknown}`"
                )));
            }
        }
        index += 2;
    }

    let Some(input) = input else {
        return Err(CliParseError::Message(String::from("--input is required")));
    };

    Ok(CliArgs {
        input,
        output_dir,
        participant,
        session,
        set_size,
        timestamp,
        layout,
        mode,
        correction,
        roc_sweep,
    })
}

fn resolve_layout(name: &str, set_size: Option<u32>) -> Result<TableLayout, String> {
    match name {
        "detection" | "signal-detection" => Ok(TableLayout::SignalDetection),
        "word" | "word-recognition" => set_size
            .map(|set_size| TableLayout::WordRecognition { set_size })
            .ok_or_else(|| String::from("--layout word requires --set-size")),
        other => Err(format!("unknown layout `{other}` (detection|word)")),
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {program} --input <trials.jsonl> [--out-dir <path>] [--participant <id>] [--session <id>] [--layout detection|word] [--set-size <n>] [--timestamp <stamp>] [--mode strict|hardened] [--correction log-linear|clamp] [--roc-sweep positive|rating]"
    );
    eprintln!("  --input <path>        JSON-lines trial log, one record per line");
    eprintln!("  --out-dir <path>      directory for CSV and ledger output (default sdt_data)");
    eprintln!("  --participant <id>    participant identifier (default P01)");
    eprintln!("  --session <id>        session identifier (default 1)");
    eprintln!("  --layout <name>       trial table layout (default detection)");
    eprintln!("  --set-size <n>        study-list size, required for the word layout");
    eprintln!("  --timestamp <stamp>   file-name stamp (default current unix ms)");
    eprintln!("  --mode <mode>         strict recomputes bad correct flags, hardened rejects them");
    eprintln!("  --correction <name>   boundary correction for extreme rates (word layout: clamp)");
    eprintln!("  --roc-sweep <name>    count positive responses only, or every rating (word layout: rating)");
}

fn log_line(event_id: &str, message: String, session_id: &str, mode: RuntimeMode) -> AnalysisLogEntry {
    AnalysisLogEntry::new(event_id, "sdt_report", message)
        .with_session(session_id)
        .with_mode(mode)
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let program = argv
        .first()
        .cloned()
        .unwrap_or_else(|| String::from("sdt_report"));

    let args = match parse_cli_args(argv.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(CliParseError::Help) => {
            print_usage(&program);
            return ExitCode::SUCCESS;
        }
        Err(CliParseError::Message(message)) => {
            eprintln!("{message}");
            print_usage(&program);
            return ExitCode::from(2);
        }
    };

    let layout = match resolve_layout(&args.layout, args.set_size) {
        Ok(layout) => layout,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let mut options = layout.analyze_defaults();
    options.mode = args.mode;
    if let Some(correction) = args.correction {
        options.correction = correction;
    }
    if let Some(roc_sweep) = args.roc_sweep {
        options.roc_sweep = roc_sweep;
    }

    let metadata = SessionMetadata::new(args.participant, args.session);
    let session_id = metadata.session_id();
    let mode = options.mode;
    let config = ReportConfig {
        output_dir: args.output_dir,
        layout,
        timestamp: args.timestamp,
    };

    let result = load_trial_records(&args.input)
        .and_then(|records| {
            write_session_report(&config, &metadata, &records, &options, ResponseRule::default())
        })
        .and_then(|report| report.analysis_json().map(|json| (report, json)));

    match result {
        Ok((report, json)) => {
            for (index, warning) in &report.warnings {
                eprintln!(
                    "{}",
                    log_line("ingest.warning", format!("record {index}: {warning:?}"), &session_id, mode)
                        .with_level(LogLevel::Warn)
                        .to_json_line()
                );
            }
            for evidence in report.analysis.ledger.iter() {
                eprintln!(
                    "{}",
                    AnalysisLogEntry::from_evidence("analysis.stage", "sdt_report", evidence)
                        .with_session(session_id.as_str())
                        .to_json_line()
                );
            }
            let outcome = if report.analysis.has_missing_values() {
                LogResult::Degraded
            } else {
                LogResult::Ok
            };
            let artifacts = report
                .paths
                .all()
                .iter()
                .map(|path| path.display().to_string())
                .collect();
            eprintln!(
                "{}",
                log_line(
                    "report.written",
                    format!("analysed {} trials", report.analysis.counts.total),
                    &session_id,
                    mode
                )
                .with_result(outcome)
                .with_artifacts(artifacts)
                .to_json_line()
            );
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!(
                "{}",
                log_line("report.failed", error.to_string(), &session_id, mode)
                    .with_level(LogLevel::Error)
                    .with_result(LogResult::Failed)
                    .to_json_line()
            );
            ExitCode::from(1)
        }
    }
}
