//! Error message rendering.
//!
//! Each rule carries a [`MessageOptions`] that is copied onto every error it
//! records. A custom message may use `%{attribute}` and `%{value}`
//! placeholders.

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, ValidationError};

/// Message customization carried through to recorded errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOptions {
    /// Replaces the default message for the error kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MessageOptions {
    pub fn with_message<S: Into<String>>(message: S) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Default message for an error kind.
pub fn default_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidUrl => "is not a valid URL",
        ErrorKind::Unchangeable => "cannot be changed",
    }
}

/// Turn an attribute name into a label: `home_page` -> `Home page`,
/// `user_id` -> `User`.
pub fn humanize(attribute: &str) -> String {
    let base = attribute.strip_suffix("_id").unwrap_or(attribute);
    let spaced = base.replace('_', " ");
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn interpolate(template: &str, attribute: &str, value: &str) -> String {
    template
        .replace("%{attribute}", attribute)
        .replace("%{value}", value)
}

impl ValidationError {
    /// The message without the attribute prefix.
    pub fn message(&self) -> String {
        match self.options.message {
            Some(ref custom) => {
                interpolate(custom, &humanize(&self.attribute), &self.value.to_string())
            }
            None => default_message(self.kind).to_string(),
        }
    }

    pub fn full_message(&self) -> String {
        format!("{} {}", humanize(&self.attribute), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Errors, Value};

    #[test]
    fn humanize_attribute_names() {
        assert_eq!(humanize("website"), "Website");
        assert_eq!(humanize("home_page"), "Home page");
        assert_eq!(humanize("user_id"), "User");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn default_messages() {
        let mut errors = Errors::new();
        errors.add(
            "home_page",
            ErrorKind::InvalidUrl,
            Value::from("nope"),
            &MessageOptions::default(),
        );
        errors.add(
            "user_id",
            ErrorKind::Unchangeable,
            Value::from(3_i64),
            &MessageOptions::default(),
        );
        assert_eq!(
            errors.full_messages(),
            vec![
                "Home page is not a valid URL".to_string(),
                "User cannot be changed".to_string()
            ]
        );
    }

    #[test]
    fn custom_message_interpolates() {
        let mut errors = Errors::new();
        errors.add(
            "website",
            ErrorKind::InvalidUrl,
            Value::from("ftp://x"),
            &MessageOptions::with_message("must be http(s), got %{value}"),
        );
        let err = errors.iter().next().unwrap();
        assert_eq!(err.message(), "must be http(s), got ftp://x");
        assert_eq!(err.full_message(), "Website must be http(s), got ftp://x");
    }
}
