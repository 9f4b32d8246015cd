//! JSON fixture describing rule registrations and the records to check.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use domain::adapters::memory_record::MemoryRecord;
use domain::uri::UriParser;
use domain::url_validator::{UrlOptions, UrlValidator};
use domain::validations::{Policy, Validations};
use domain::write_once::{WriteOnceOptions, WriteOnceValidator};
use domain::{CoreError, MessageOptions, Rule, Value};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Url,
    WriteOnce,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    pub attribute: String,
    pub rule: RuleKind,
    #[serde(default)]
    pub allow_nil: bool,
    #[serde(default)]
    pub allow_blank: bool,
    /// Only meaningful for `write_once`.
    #[serde(default)]
    pub ignore_identical: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl RuleEntry {
    fn build(&self, parser: &Arc<dyn UriParser>) -> Arc<dyn Rule> {
        let messages = MessageOptions {
            message: self.message.clone(),
        };
        match self.rule {
            RuleKind::Url => Arc::new(
                UrlValidator::with_parser(Arc::clone(parser)).with_options(UrlOptions { messages }),
            ),
            RuleKind::WriteOnce => Arc::new(WriteOnceValidator::with_options(WriteOnceOptions {
                ignore_identical: self.ignore_identical,
                messages,
            })),
        }
    }

    fn policy(&self) -> Policy {
        Policy {
            allow_nil: self.allow_nil,
            allow_blank: self.allow_blank,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub persisted: bool,
    /// Values as loaded (persisted) or as first assigned (new records).
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Assignments applied afterwards; these drive change tracking.
    #[serde(default)]
    pub changes: BTreeMap<String, Value>,
}

impl RecordEntry {
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("record[{}]", index))
    }

    pub fn to_record(&self) -> MemoryRecord {
        let mut record = if self.persisted {
            MemoryRecord::persisted(self.attributes.clone())
        } else {
            let mut r = MemoryRecord::new();
            for (k, v) in &self.attributes {
                r.set(k, v.clone());
            }
            r
        };
        for (k, v) in &self.changes {
            record.set(k, v.clone());
        }
        record
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    #[serde(default)]
    pub records: Vec<RecordEntry>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn validations(&self, parser: &Arc<dyn UriParser>) -> Result<Validations, CoreError> {
        let mut validations = Validations::new();
        for entry in &self.rules {
            validations.validates_shared(
                entry.attribute.clone(),
                entry.build(parser),
                entry.policy(),
            )?;
        }
        Ok(validations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::uri::Rfc3986Parser;
    use domain::{ChangeTracker, ErrorKind, Record};
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "rules": [
            {"attribute": "website", "rule": "url", "allow_blank": true},
            {"attribute": "user_id", "rule": "write_once", "ignore_identical": true,
             "message": "is locked"}
        ],
        "records": [
            {"name": "moved", "persisted": true,
             "attributes": {"website": "https://a.example", "user_id": 7},
             "changes": {"user_id": 8}},
            {"attributes": {"website": "", "user_id": 1}}
        ]
    }"#;

    fn strict() -> Arc<dyn UriParser> {
        Arc::new(Rfc3986Parser::new())
    }

    #[test]
    fn parses_rules_and_records() {
        let fx = Fixture::parse(SAMPLE).unwrap();
        assert_eq!(fx.rules.len(), 2);
        assert_eq!(fx.rules[0].rule, RuleKind::Url);
        assert!(fx.rules[0].allow_blank);
        assert!(fx.rules[1].ignore_identical);
        assert_eq!(fx.records[0].label(0), "moved");
        assert_eq!(fx.records[1].label(1), "record[1]");
    }

    #[test]
    fn builds_records_with_change_tracking() {
        let fx = Fixture::parse(SAMPLE).unwrap();
        let moved = fx.records[0].to_record();
        assert!(moved.is_persisted());
        assert!(moved.was_changed("user_id"));
        assert_eq!(moved.prior_value("user_id"), Value::Integer(7));
        assert!(!moved.was_changed("website"));

        let fresh = fx.records[1].to_record();
        assert!(!fresh.is_persisted());
    }

    #[test]
    fn validates_fixture_records() {
        let fx = Fixture::parse(SAMPLE).unwrap();
        let validations = fx.validations(&strict()).unwrap();
        assert_eq!(validations.len(), 2);

        let errors = validations.run(&fx.records[0].to_record());
        assert_eq!(errors.kinds_on("user_id"), vec![ErrorKind::Unchangeable]);
        assert_eq!(errors.full_messages(), vec!["User is locked".to_string()]);

        assert!(validations.is_valid(&fx.records[1].to_record()));
    }

    #[test]
    fn rejects_unknown_rule_name() {
        let err = Fixture::parse(r#"{"rules": [{"attribute": "a", "rule": "email"}]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_attribute() {
        let fx = Fixture::parse(r#"{"rules": [{"attribute": "", "rule": "url"}]}"#).unwrap();
        assert!(matches!(
            fx.validations(&strict()),
            Err(CoreError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let fx = Fixture::load(file.path()).unwrap();
        assert_eq!(fx.records.len(), 2);

        let missing = Fixture::load(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(format!("{:#}", missing).contains("reading fixture"));
    }
}
