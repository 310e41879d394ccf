use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trace_core::{
    Diagnostic, Processor, ProcessorConfig, ValidationReport, find_pattern, validate_all,
};

#[derive(Parser)]
#[command(
    name = "trace-cli",
    version,
    about = "Render [m], [?] and [+] bracket patterns in HTML fragments"
)]
struct Cli {
    /// HTML fragment to process (reads stdin when omitted)
    input: Option<PathBuf>,

    /// TOML processor configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate patterns only; print diagnostics and no HTML
    #[arg(long)]
    check: bool,

    /// Print validation diagnostics to stderr while processing
    #[arg(long, value_enum, value_name = "FORMAT")]
    diagnostics: Option<DiagnosticsMode>,

    /// Sanitize section content regardless of the configuration
    #[arg(long)]
    sanitized: bool,

    /// Dump raw matches for a trigger as JSON instead of rendering
    #[arg(long, value_name = "TRIGGER")]
    matches: Option<String>,

    /// Number of sections the --matches trigger expects
    #[arg(long, default_value_t = 2, requires = "matches")]
    sections: usize,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "trace_core=debug,trace_cli=debug"
        } else {
            "warn"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ProcessorConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ProcessorConfig::default(),
    };
    if cli.sanitized {
        config.sanitize = true;
    }

    let source = read_source(cli.input.as_ref())?;
    debug!(bytes = source.len(), "read input");

    if let Some(trigger) = &cli.matches {
        let matches = find_pattern(&source, trigger, cli.sections);
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(ExitCode::SUCCESS);
    }

    let report = validate_all(&source, config.scan_limit);
    if cli.check {
        emit_diagnostics(&report, cli.diagnostics.unwrap_or(DiagnosticsMode::Pretty))?;
        return Ok(exit_code(&report));
    }

    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&report, mode)?;
    }

    let result = Processor::new(config).process(&source);
    debug!(rendered = result.stats.total(), "rendered patterns");
    print!("{}", result.html);

    Ok(exit_code(&report))
}

fn read_source(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn exit_code(report: &ValidationReport) -> ExitCode {
    if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn emit_diagnostics(report: &ValidationReport, mode: DiagnosticsMode) -> Result<()> {
    match mode {
        DiagnosticsMode::Json => {
            let diagnostics: Vec<&Diagnostic> = report.diagnostics().collect();
            eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
        DiagnosticsMode::Pretty => {
            for diagnostic in report.diagnostics() {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    let start = diagnostic.range.start;
    format!(
        "{}:{}: {} {} {}",
        start.line + 1,
        start.character + 1,
        diagnostic.severity.label(),
        diagnostic.code,
        diagnostic.message
    )
}
