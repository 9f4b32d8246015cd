//! Centralized configuration for rulecheck.
//!
//! Environment variables are read once at startup so a bad value fails fast
//! instead of surfacing halfway through a run.

use std::env;
use std::sync::Arc;

use domain::uri::{Rfc3986Parser, UriParser};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Report output format. `--format` overrides the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// URI parser used by the `url` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserChoice {
    /// Built-in ASCII RFC 3986 parser.
    Strict,
    /// WHATWG parser with IDN support (requires the `idn` feature).
    #[cfg(feature = "idn")]
    Idn,
}

#[cfg(feature = "idn")]
fn idn_choice() -> Result<ParserChoice, ConfigError> {
    Ok(ParserChoice::Idn)
}

#[cfg(not(feature = "idn"))]
fn idn_choice() -> Result<ParserChoice, ConfigError> {
    Err(ConfigError {
        field: PARSER_VAR,
        message: "the idn parser requires building with `--features idn`".into(),
    })
}

impl ParserChoice {
    fn from_str(s: &str) -> Result<Self, ConfigError> {
        if s.is_empty() || s.eq_ignore_ascii_case("strict") {
            return Ok(Self::Strict);
        }
        if s.eq_ignore_ascii_case("idn") {
            return idn_choice();
        }
        Err(ConfigError {
            field: PARSER_VAR,
            message: format!("unknown parser '{}', expected 'strict' or 'idn'", s),
        })
    }

    pub fn build(&self) -> Arc<dyn UriParser> {
        match self {
            Self::Strict => Arc::new(Rfc3986Parser::new()),
            #[cfg(feature = "idn")]
            Self::Idn => Arc::new(idn_parser::IdnParser::new()),
        }
    }
}

const PARSER_VAR: &str = "RULECHECK_URI_PARSER";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[error("Configuration error for {field}: {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

/// Settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log format (LOG_FORMAT, default: pretty)
    pub log_format: LogFormat,
    /// URI parser (RULECHECK_URI_PARSER, default: strict)
    pub uri_parser: ParserChoice,
    /// Report format (RULECHECK_OUTPUT, default: text)
    pub output: OutputFormat,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        let uri_parser = ParserChoice::from_str(lookup(PARSER_VAR).unwrap_or_default().trim())?;

        let output =
            OutputFormat::from_str(&lookup("RULECHECK_OUTPUT").unwrap_or_else(|| "text".into()));

        Ok(Self {
            log_format,
            uri_parser,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("anything"), LogFormat::Pretty);
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("yaml"), OutputFormat::Text);
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.uri_parser, ParserChoice::Strict);
        assert_eq!(cfg.output, OutputFormat::Text);
    }

    #[test]
    fn unknown_parser_fails_fast() {
        let err = Config::from_lookup(lookup_from(&[(PARSER_VAR, "magic")])).unwrap_err();
        assert_eq!(err.field, PARSER_VAR);
        assert!(err.to_string().contains("magic"));
    }

    #[cfg(not(feature = "idn"))]
    #[test]
    fn idn_parser_requires_feature() {
        let err = Config::from_lookup(lookup_from(&[(PARSER_VAR, "idn")])).unwrap_err();
        assert!(err.message.contains("--features idn"));
    }

    #[cfg(feature = "idn")]
    #[test]
    fn idn_parser_selected() {
        let cfg = Config::from_lookup(lookup_from(&[(PARSER_VAR, "IDN")])).unwrap();
        assert_eq!(cfg.uri_parser, ParserChoice::Idn);
        let parser = cfg.uri_parser.build();
        assert!(parser.parse("https://bücher.example").is_ok());
    }

    #[test]
    fn strict_parser_built() {
        let parser = ParserChoice::Strict.build();
        assert!(parser.parse("https://bücher.example").is_err());
    }
}
