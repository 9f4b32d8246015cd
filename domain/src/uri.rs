//! URI parsing port and the built-in strict parser.
//!
//! [`UrlValidator`](crate::url_validator::UrlValidator) is handed a
//! [`UriParser`] when it is built. [`Rfc3986Parser`] is the default: ASCII
//! only, RFC 3986 generic syntax, with the scheme lowercased as the RFC's
//! normal form asks. Parsers that understand internationalized host names live in
//! adapter crates.

use std::net::Ipv6Addr;
use std::sync::Arc;

/// Components of a parsed URI reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedUri {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ParsedUri {
    /// A reference without a scheme.
    pub fn is_relative(&self) -> bool {
        self.scheme.is_none()
    }

    pub fn is_absolute(&self) -> bool {
        !self.is_relative()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriParseError {
    #[error("invalid character {ch:?} in {component}")]
    InvalidCharacter { ch: char, component: &'static str },
    #[error("malformed percent-encoding at byte {position}")]
    InvalidPercentEncoding { position: usize },
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("first path segment of a relative reference contains ':'")]
    ColonInFirstSegment,
    #[error("rejected by parser backend: {0}")]
    Backend(String),
}

/// URI parsing capability injected into rules.
pub trait UriParser: Send + Sync {
    fn parse(&self, input: &str) -> Result<ParsedUri, UriParseError>;
}

impl<T: UriParser + ?Sized> UriParser for Box<T> {
    fn parse(&self, input: &str) -> Result<ParsedUri, UriParseError> {
        (**self).parse(input)
    }
}

impl<T: UriParser + ?Sized> UriParser for Arc<T> {
    fn parse(&self, input: &str) -> Result<ParsedUri, UriParseError> {
        (**self).parse(input)
    }
}

/// Strict RFC 3986 parser over ASCII input.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rfc3986Parser;

impl Rfc3986Parser {
    pub fn new() -> Self {
        Self
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn is_sub_delim(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
    )
}

fn is_gen_delim(b: u8) -> bool {
    matches!(b, b':' | b'/' | b'?' | b'#' | b'[' | b']' | b'@')
}

// '%' is admitted everywhere a pct-encoded triplet may appear; the triplets
// themselves are checked once over the whole input.
fn is_pchar(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || matches!(b, b':' | b'@' | b'%')
}

fn is_path_char(b: u8) -> bool {
    is_pchar(b) || b == b'/'
}

fn is_query_char(b: u8) -> bool {
    is_pchar(b) || b == b'/' || b == b'?'
}

fn is_userinfo_char(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || b == b':' || b == b'%'
}

fn is_reg_name_char(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || b == b'%'
}

/// Bracketed host contents: an IPv6 address or `v<hex>.<chars>` (IPvFuture).
fn is_ip_literal(inner: &str) -> bool {
    if inner.parse::<Ipv6Addr>().is_ok() {
        return true;
    }
    let Some(rest) = inner.strip_prefix(['v', 'V']) else {
        return false;
    };
    let Some((version, addr)) = rest.split_once('.') else {
        return false;
    };
    !version.is_empty()
        && version.bytes().all(|b| b.is_ascii_hexdigit())
        && !addr.is_empty()
        && addr
            .bytes()
            .all(|b| is_unreserved(b) || is_sub_delim(b) || b == b':')
}

fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

fn check_component(
    s: &str,
    component: &'static str,
    allowed: fn(u8) -> bool,
) -> Result<(), UriParseError> {
    match s.bytes().find(|b| !allowed(*b)) {
        Some(b) => Err(UriParseError::InvalidCharacter {
            ch: b as char,
            component,
        }),
        None => Ok(()),
    }
}

/// Reject anything outside the RFC 3986 character repertoire and validate
/// every `%HH` triplet.
fn check_repertoire(input: &str) -> Result<(), UriParseError> {
    let bytes = input.as_bytes();
    for (position, ch) in input.char_indices() {
        if !ch.is_ascii() {
            return Err(UriParseError::InvalidCharacter { ch, component: "uri" });
        }
        let b = ch as u8;
        if b == b'%' {
            let hex = bytes.get(position + 1..position + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return Err(UriParseError::InvalidPercentEncoding { position });
            }
        } else if !(is_unreserved(b) || is_sub_delim(b) || is_gen_delim(b)) {
            return Err(UriParseError::InvalidCharacter { ch, component: "uri" });
        }
    }
    Ok(())
}

fn split_scheme(input: &str) -> (Option<&str>, &str) {
    let end = input.find([':', '/', '?', '#']);
    match end {
        Some(i) if input[i..].starts_with(':') && is_scheme(&input[..i]) => {
            (Some(&input[..i]), &input[i + 1..])
        }
        _ => (None, input),
    }
}

struct Authority {
    userinfo: Option<String>,
    host: String,
    port: Option<u16>,
}

fn parse_port(raw: &str) -> Result<Option<u16>, UriParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UriParseError::InvalidPort(raw.to_string()));
    }
    raw.parse::<u16>()
        .map(Some)
        .map_err(|_| UriParseError::InvalidPort(raw.to_string()))
}

fn parse_authority(raw: &str) -> Result<Authority, UriParseError> {
    let (userinfo, host_port) = match raw.split_once('@') {
        Some((info, rest)) => {
            check_component(info, "userinfo", is_userinfo_char)?;
            (Some(info.to_string()), rest)
        }
        None => (None, raw),
    };

    if let Some(literal) = host_port.strip_prefix('[') {
        let Some((inner, after)) = literal.split_once(']') else {
            return Err(UriParseError::InvalidHost(host_port.to_string()));
        };
        if !is_ip_literal(inner) {
            return Err(UriParseError::InvalidHost(host_port.to_string()));
        }
        let port = match after {
            "" => None,
            _ => match after.strip_prefix(':') {
                Some(p) => parse_port(p)?,
                None => return Err(UriParseError::InvalidHost(host_port.to_string())),
            },
        };
        return Ok(Authority {
            userinfo,
            host: format!("[{}]", inner),
            port,
        });
    }

    let (host, port) = match host_port.rsplit_once(':') {
        Some((h, p)) => (h, parse_port(p)?),
        None => (host_port, None),
    };
    if !host.bytes().all(is_reg_name_char) {
        return Err(UriParseError::InvalidHost(host.to_string()));
    }
    Ok(Authority {
        userinfo,
        host: host.to_string(),
        port,
    })
}

impl UriParser for Rfc3986Parser {
    fn parse(&self, input: &str) -> Result<ParsedUri, UriParseError> {
        check_repertoire(input)?;

        let (scheme, rest) = split_scheme(input);
        let (rest, fragment) = match rest.split_once('#') {
            Some((r, f)) => (r, Some(f)),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, Some(q)),
            None => (rest, None),
        };

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(parse_authority(&after[..end])?), &after[end..])
            }
            None => (None, rest),
        };

        check_component(path, "path", is_path_char)?;
        if let Some(q) = query {
            check_component(q, "query", is_query_char)?;
        }
        if let Some(f) = fragment {
            check_component(f, "fragment", is_query_char)?;
        }
        if scheme.is_none() && authority.is_none() {
            let first = path.split('/').next().unwrap_or_default();
            if first.contains(':') {
                return Err(UriParseError::ColonInFirstSegment);
            }
        }

        let (userinfo, host, port) = match authority {
            Some(a) => (a.userinfo, Some(a.host), a.port),
            None => (None, None, None),
        };
        Ok(ParsedUri {
            scheme: scheme.map(str::to_ascii_lowercase),
            userinfo,
            host,
            port,
            path: path.to_string(),
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        })
    }
}
