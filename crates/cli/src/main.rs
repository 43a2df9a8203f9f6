// logmerge - merge and deduplicate ADIF logbooks reported back by
// different services (WSJT-X, LoTW, eQSL, ...) into one field-complete log.

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use logmerge_cli::load::{load_file, LoadError};
use logmerge_engine::{MergeConfig, MergeInput, SourceRecords};

use exit_codes::{EXIT_CONFLICTS, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_PARSE, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "logmerge")]
#[command(about = "Merge ADIF ham radio logbooks from multiple sources")]
#[command(version)]
#[command(after_help = "\
Examples:
  logmerge wsjtx_log.adi lotw_report.adi
  logmerge -o merged.adi -p problems.json *.adi
  logmerge --merge-window 115 --csv wsjtx.log *.adi
  logmerge --config merge.toml *.adi

Exit status is 0 for a clean merge and 5 when unresolved conflicts were
reported; outputs are written either way.")]
struct Cli {
    /// Input ADIF files
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Merged ADIF output file
    #[arg(long, short = 'o', default_value = "qso_merged.adif")]
    output: PathBuf,

    /// Unresolved-conflict report (.json); only written when conflicts exist
    #[arg(long, short = 'p')]
    problems: Option<PathBuf>,

    /// WSJT-X compatible .log CSV output
    #[arg(long, short = 'c')]
    csv: Option<PathBuf>,

    /// Only output the preferred (WSJT-X) field set
    #[arg(long, short = 'm')]
    minimal: bool,

    /// Time window in seconds for merging discrepant log entries
    #[arg(long, value_name = "SECONDS")]
    merge_window: Option<i64>,

    /// TOML merge policy config (window, epsilon, resolution classes)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Config first: a bad policy table must abort before any processing.
    let mut config = match cli.config {
        Some(ref path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(EXIT_ERROR, format!("cannot read {}: {e}", path.display()))
            })?;
            MergeConfig::from_toml(&text)
                .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?
        }
        None => MergeConfig::default(),
    };
    if let Some(window) = cli.merge_window {
        config.window_seconds = window;
    }
    config
        .validate()
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

    // Load all inputs before the engine runs; computation never touches IO.
    let mut sources = Vec::with_capacity(cli.input.len());
    let mut unmatchable = 0usize;
    for path in &cli.input {
        let loaded = load_file(path, &config).map_err(|e| match e {
            LoadError::Io { .. } => CliError::new(EXIT_ERROR, e.to_string()),
            LoadError::Parse { .. } => CliError::new(EXIT_PARSE, e.to_string()),
        })?;
        if !loaded.malformed.is_empty() {
            eprintln!(
                "warning: {}: {} unmatchable record(s) excluded (missing call/band/mode or timestamp)",
                loaded.source.name,
                loaded.malformed.len()
            );
            unmatchable += loaded.malformed.len();
        }
        sources.push(SourceRecords {
            source: loaded.source,
            records: loaded.records,
        });
    }

    let input = MergeInput { sources };
    let result = logmerge_engine::run(&config, &input)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

    let adif_out = logmerge_adif::write(&result.merged, cli.minimal);
    std::fs::write(&cli.output, adif_out).map_err(|e| {
        CliError::new(
            EXIT_ERROR,
            format!("cannot write {}: {e}", cli.output.display()),
        )
    })?;

    if let Some(ref path) = cli.csv {
        let csv_out = logmerge_adif::write_wsjtx_csv(&result.merged)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        std::fs::write(path, csv_out)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot write {}: {e}", path.display())))?;
    }

    if let Some(ref path) = cli.problems {
        if !result.problems.is_empty() {
            let json = result
                .problems
                .to_json_pretty()
                .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
            std::fs::write(path, json).map_err(|e| {
                CliError::new(EXIT_ERROR, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
    }

    let s = &result.summary;
    eprintln!(
        "merged {} record(s) from {} file(s) into {} QSO(s); {} conflict(s) on {} field(s), {} unmatchable",
        s.records, s.sources, s.merged, s.conflicts, s.conflicted_fields, unmatchable,
    );

    if !result.problems.is_empty() {
        let err = CliError::new(EXIT_CONFLICTS, "unresolved conflicts found");
        return Err(match cli.problems {
            Some(_) => err,
            None => err.with_hint("re-run with --problems report.json for details"),
        });
    }

    Ok(())
}
