//! idn-parser — `UriParser` backed by the WHATWG `url` crate.
//!
//! Purpose
//! - Accept internationalized host names (`https://bücher.example`) that the
//!   strict ASCII parser in `domain` rejects. Hosts come back IDNA-encoded.
//! - Schemes are lowercased by the backend, so `HTTP://x` reports `http`.
//!
//! Notes
//! - `url` has no notion of a relative reference. Inputs it refuses for lack
//!   of a base are resolved against a placeholder base to check their syntax,
//!   then reported without a scheme.

use std::sync::LazyLock;

use domain::uri::{ParsedUri, UriParseError, UriParser};
use tracing::trace;
use url::Url;

static RELATIVE_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("http://relative.invalid/").expect("placeholder base url is valid")
});

#[derive(Clone, Copy, Debug, Default)]
pub struct IdnParser;

impl IdnParser {
    pub fn new() -> Self {
        Self
    }
}

fn map_error(input: &str, err: url::ParseError) -> UriParseError {
    use url::ParseError as E;
    match err {
        E::InvalidPort => UriParseError::InvalidPort(input.to_string()),
        E::EmptyHost
        | E::IdnaError
        | E::InvalidIpv4Address
        | E::InvalidIpv6Address
        | E::InvalidDomainCharacter => UriParseError::InvalidHost(err.to_string()),
        other => UriParseError::Backend(other.to_string()),
    }
}

fn userinfo(url: &Url) -> Option<String> {
    match (url.username(), url.password()) {
        ("", None) => None,
        (user, None) => Some(user.to_string()),
        (user, Some(pw)) => Some(format!("{}:{}", user, pw)),
    }
}

impl UriParser for IdnParser {
    fn parse(&self, input: &str) -> Result<ParsedUri, UriParseError> {
        match Url::parse(input) {
            Ok(url) => Ok(ParsedUri {
                scheme: Some(url.scheme().to_string()),
                userinfo: userinfo(&url),
                host: url.host_str().map(str::to_string),
                port: url.port(),
                path: url.path().to_string(),
                query: url.query().map(str::to_string),
                fragment: url.fragment().map(str::to_string),
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let joined = RELATIVE_BASE
                    .join(input)
                    .map_err(|e| map_error(input, e))?;
                trace!(input, "idn-parser: relative reference");
                // Only a network-path reference ("//host/...") names its own host.
                let host = if input.starts_with("//") {
                    joined.host_str().map(str::to_string)
                } else {
                    None
                };
                Ok(ParsedUri {
                    scheme: None,
                    userinfo: None,
                    host,
                    port: None,
                    path: joined.path().to_string(),
                    query: joined.query().map(str::to_string),
                    fragment: joined.fragment().map(str::to_string),
                })
            }
            Err(e) => Err(map_error(input, e)),
        }
    }
}
