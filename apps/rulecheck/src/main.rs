//! rulecheck — run the attribute validation rules from the command line.
//!
//! Checks the records in a JSON fixture against the rules it registers, or
//! checks ad-hoc values against the URL rule.
//!
//! Run:
//! ```bash
//! cargo run -p rulecheck -- check fixture.json
//! cargo run -p rulecheck -- url https://example.com /relative
//!
//! # IDN-aware parsing, JSON logs at debug level
//! RULECHECK_URI_PARSER=idn LOG_FORMAT=json RUST_LOG=debug \
//!   cargo run -p rulecheck --features idn -- url https://bücher.example
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod fixture;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use domain::adapters::memory_record::MemoryRecord;
use domain::uri::UriParser;
use domain::url_validator::UrlValidator;
use domain::validations::Validations;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogFormat, OutputFormat};
use crate::fixture::Fixture;
use crate::report::RecordReport;

#[derive(Parser, Debug)]
#[command(name = "rulecheck", version, about = "Check records against attribute validation rules")]
struct Cli {
    /// Report format (overrides RULECHECK_OUTPUT)
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every record in a JSON fixture
    Check {
        /// Path to the fixture file
        fixture: PathBuf,
    },
    /// Check values against the URL rule
    Url {
        #[arg(required = true)]
        values: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    init_tracing(&cfg);
    debug!(?cfg, "configuration loaded");

    match run(cli, &cfg) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "rulecheck failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every checked record was valid.
fn run(cli: Cli, cfg: &Config) -> anyhow::Result<bool> {
    let parser = cfg.uri_parser.build();
    let reports = match cli.command {
        Command::Check { fixture } => check_fixture(&fixture, &parser)?,
        Command::Url { values } => check_urls(&values, &parser)?,
    };

    let output = match cli.format.unwrap_or(cfg.output) {
        OutputFormat::Text => report::render_text(&reports),
        OutputFormat::Json => {
            let mut json = report::render_json(&reports).context("rendering json report")?;
            json.push('\n');
            json
        }
    };
    print!("{}", output);

    let invalid = reports.iter().filter(|r| !r.valid).count();
    info!(checked = reports.len(), invalid, "validation finished");
    Ok(invalid == 0)
}

fn check_fixture(path: &Path, parser: &Arc<dyn UriParser>) -> anyhow::Result<Vec<RecordReport>> {
    let fixture = Fixture::load(path)?;
    let validations = fixture
        .validations(parser)
        .context("registering fixture rules")?;
    debug!(rules = validations.len(), records = fixture.records.len(), "fixture loaded");

    let reports = fixture
        .records
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut record = entry.to_record();
            record.validate(&validations);
            RecordReport::new(entry.label(i), record.errors())
        })
        .collect();
    Ok(reports)
}

fn check_urls(values: &[String], parser: &Arc<dyn UriParser>) -> anyhow::Result<Vec<RecordReport>> {
    let mut validations = Validations::new();
    validations.validates("url", UrlValidator::with_parser(Arc::clone(parser)))?;

    let reports = values
        .iter()
        .map(|value| {
            let mut record = MemoryRecord::new();
            record.set("url", value.as_str());
            record.validate(&validations);
            RecordReport::new(value.as_str(), record.errors())
        })
        .collect();
    Ok(reports)
}

fn init_tracing(cfg: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::uri::Rfc3986Parser;
    use std::io::Write;

    fn strict() -> Arc<dyn UriParser> {
        Arc::new(Rfc3986Parser::new())
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["rulecheck", "--format", "json", "url", "https://a"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Command::Url { ref values } if values.len() == 1));

        assert!(Cli::try_parse_from(["rulecheck", "url"]).is_err());
    }

    #[test]
    fn url_command_reports_each_value() {
        let values = vec![
            "https://example.com".to_string(),
            "ftp://example.com".to_string(),
            "/foo/bar".to_string(),
        ];
        let reports = check_urls(&values, &strict()).unwrap();
        let valid: Vec<bool> = reports.iter().map(|r| r.valid).collect();
        assert_eq!(valid, vec![true, false, false]);
        assert_eq!(reports[1].errors[0].message, "Url is not a valid URL");
    }

    #[test]
    fn check_command_reads_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "rules": [{{"attribute": "slug", "rule": "write_once"}}],
                "records": [
                    {{"name": "kept", "persisted": true, "attributes": {{"slug": "a"}}}},
                    {{"name": "cleared", "persisted": true, "attributes": {{"slug": "a"}},
                      "changes": {{"slug": null}}}}
                ]
            }}"#
        )
        .unwrap();

        let reports = check_fixture(file.path(), &strict()).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].valid);
        assert!(!reports[1].valid);
        assert_eq!(reports[1].errors[0].code, "unchangeable");
    }
}
