//! Write-once, read-many.
//!
//! Once a persisted record holds a non-null value for the attribute, any
//! change is rejected, including a change back to null. Pair it with a
//! presence check to get a read-only attribute that reports an error instead
//! of silently dropping the write.
//!
//! With `ignore_identical`, rewriting the value already stored is tolerated,
//! which suits blind-update flows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ErrorKind, Errors, MessageOptions, Record, Rule, Value};

/// Options for [`WriteOnceValidator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOnceOptions {
    /// Allow re-assigning the exact value already stored. Default: `false`.
    #[serde(default)]
    pub ignore_identical: bool,
    #[serde(flatten)]
    pub messages: MessageOptions,
}

#[derive(Clone, Debug, Default)]
pub struct WriteOnceValidator {
    options: WriteOnceOptions,
}

impl WriteOnceValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOnceOptions) -> Self {
        Self { options }
    }

    pub fn ignoring_identical() -> Self {
        Self::with_options(WriteOnceOptions {
            ignore_identical: true,
            ..WriteOnceOptions::default()
        })
    }

    fn violates(&self, record: &dyn Record, attribute: &str, value: &Value) -> bool {
        if !record.is_persisted() || !record.was_changed(attribute) {
            return false;
        }
        let prior = record.prior_value(attribute);
        if prior.is_null() {
            return false;
        }
        !(self.options.ignore_identical && *value == prior)
    }
}

impl Rule for WriteOnceValidator {
    fn name(&self) -> &'static str {
        "write_once"
    }

    fn validate_each(
        &self,
        record: &dyn Record,
        attribute: &str,
        value: &Value,
        errors: &mut Errors,
    ) {
        if !self.violates(record, attribute, value) {
            return;
        }
        debug!(attribute, rule = self.name(), "rejected change");
        errors.add(
            attribute,
            ErrorKind::Unchangeable,
            value.clone(),
            &self.options.messages,
        );
    }

    // A non-null -> null transition must still reach `validate_each`.
    fn honors_nil_shortcut(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_record::MemoryRecord;
    use crate::AttributeSource;

    fn check(rule: &WriteOnceValidator, record: &MemoryRecord, attribute: &str) -> Errors {
        let mut errors = Errors::new();
        let value = record.read_attribute(attribute);
        rule.validate_each(record, attribute, &value, &mut errors);
        errors
    }

    fn stored_user() -> MemoryRecord {
        MemoryRecord::persisted([("user_id", Value::from(1_i64))])
    }

    #[test]
    fn rejects_change_to_different_value() {
        for rule in [WriteOnceValidator::new(), WriteOnceValidator::ignoring_identical()] {
            let mut record = stored_user();
            record.set("user_id", 2_i64);
            assert_eq!(
                check(&rule, &record, "user_id").kinds_on("user_id"),
                vec![ErrorKind::Unchangeable]
            );
        }
    }

    // A tracker that reports every assignment as a change, the way a blind
    // update marks each assigned column dirty.
    struct BlindUpdate {
        prior: Value,
        current: Value,
    }

    impl AttributeSource for BlindUpdate {
        fn read_attribute(&self, _attribute: &str) -> Value {
            self.current.clone()
        }
    }

    impl crate::ChangeTracker for BlindUpdate {
        fn was_changed(&self, _attribute: &str) -> bool {
            true
        }
        fn prior_value(&self, _attribute: &str) -> Value {
            self.prior.clone()
        }
    }

    impl Record for BlindUpdate {
        fn is_persisted(&self) -> bool {
            true
        }
    }

    fn blind_check(rule: &WriteOnceValidator, prior: Value, current: Value) -> Errors {
        let record = BlindUpdate { prior, current };
        let mut errors = Errors::new();
        rule.validate_each(&record, "token", &record.current, &mut errors);
        errors
    }

    #[test]
    fn identical_rewrite_depends_on_option() {
        let strict = blind_check(&WriteOnceValidator::new(), "abc".into(), "abc".into());
        assert_eq!(strict.kinds_on("token"), vec![ErrorKind::Unchangeable]);

        let lenient = blind_check(
            &WriteOnceValidator::ignoring_identical(),
            "abc".into(),
            "abc".into(),
        );
        assert!(lenient.is_empty());
    }

    #[test]
    fn integer_and_float_of_same_number_are_identical() {
        let rule = WriteOnceValidator::ignoring_identical();
        assert!(blind_check(&rule, Value::Integer(7), Value::Float(7.0)).is_empty());
        assert_eq!(
            blind_check(&rule, Value::Integer(7), Value::Float(7.5)).kinds_on("token"),
            vec![ErrorKind::Unchangeable]
        );
    }

    #[test]
    fn rejects_change_to_null() {
        let mut record = stored_user();
        record.set("user_id", Value::Null);
        let errors = check(&WriteOnceValidator::ignoring_identical(), &record, "user_id");
        assert_eq!(errors.kinds_on("user_id"), vec![ErrorKind::Unchangeable]);
    }

    #[test]
    fn new_records_are_never_rejected() {
        let mut record = MemoryRecord::new();
        record.set("user_id", 1_i64);
        record.set("user_id", 2_i64);
        assert!(check(&WriteOnceValidator::new(), &record, "user_id").is_empty());
    }

    #[test]
    fn unchanged_attribute_passes() {
        let record = stored_user();
        assert!(check(&WriteOnceValidator::new(), &record, "user_id").is_empty());
    }

    #[test]
    fn first_write_after_null_passes() {
        let mut record = MemoryRecord::persisted([("user_id", Value::Null)]);
        record.set("user_id", 5_i64);
        assert!(check(&WriteOnceValidator::new(), &record, "user_id").is_empty());
    }

    #[test]
    fn opts_out_of_nil_shortcut() {
        assert!(!WriteOnceValidator::new().honors_nil_shortcut());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: WriteOnceOptions =
            serde_json::from_str(r#"{"ignore_identical": true, "message": "is locked"}"#).unwrap();
        assert!(opts.ignore_identical);
        assert_eq!(opts.messages.message.as_deref(), Some("is locked"));

        let defaults: WriteOnceOptions = serde_json::from_str("{}").unwrap();
        assert!(!defaults.ignore_identical);
    }
}
