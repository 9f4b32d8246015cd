//! URL format rule: the value must be an absolute `http` or `https` URL.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::uri::{ParsedUri, Rfc3986Parser, UriParser};
use crate::{ErrorKind, Errors, MessageOptions, Record, Rule, Value};

/// Schemes accepted by [`UrlValidator`]. Compared case-sensitively against
/// the token the parser returns; [`Rfc3986Parser`] lowercases it.
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Options for [`UrlValidator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOptions {
    #[serde(flatten)]
    pub messages: MessageOptions,
}

/// Records `invalid_url` when a value is not an absolute HTTP(S) URL.
///
/// The parser is chosen by whoever builds the rule; the default is the strict
/// ASCII [`Rfc3986Parser`].
#[derive(Clone, Debug, Default)]
pub struct UrlValidator<P = Rfc3986Parser> {
    parser: P,
    options: UrlOptions,
}

impl UrlValidator<Rfc3986Parser> {
    pub fn new() -> Self {
        Self::with_parser(Rfc3986Parser::new())
    }
}

impl<P: UriParser> UrlValidator<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            options: UrlOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UrlOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse `value` and return the URI only if it passes the rule.
    pub fn accepted_uri(&self, value: &Value) -> Option<ParsedUri> {
        let text = value.to_text()?;
        let uri = match self.parser.parse(&text) {
            Ok(uri) => uri,
            Err(e) => {
                debug!(error = %e, "url: parse failed");
                return None;
            }
        };
        let scheme_ok = uri
            .scheme
            .as_deref()
            .is_some_and(|s| ALLOWED_SCHEMES.contains(&s));
        if uri.is_relative() || !scheme_ok {
            return None;
        }
        Some(uri)
    }

    pub fn is_valid_url(&self, value: &Value) -> bool {
        self.accepted_uri(value).is_some()
    }
}

impl<P: UriParser> Rule for UrlValidator<P> {
    fn name(&self) -> &'static str {
        "url"
    }

    fn validate_each(
        &self,
        _record: &dyn Record,
        attribute: &str,
        value: &Value,
        errors: &mut Errors,
    ) {
        if self.is_valid_url(value) {
            return;
        }
        debug!(attribute, rule = self.name(), "rejected value");
        errors.add(
            attribute,
            ErrorKind::InvalidUrl,
            value.clone(),
            &self.options.messages,
        );
    }
}
