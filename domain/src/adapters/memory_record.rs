use std::collections::BTreeMap;

use crate::validations::Validations;
use crate::{AttributeSource, ChangeTracker, Errors, Record, Value};

/// Simple in-memory record with dirty tracking.
///
/// `original` holds the prior value of every attribute changed since the
/// last load or `save()`. Assigning the original value back clears the
/// change.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecord {
    attributes: BTreeMap<String, Value>,
    original: BTreeMap<String, Value>,
    persisted: bool,
    errors: Errors,
}

impl MemoryRecord {
    /// A new record that has not been stored yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A record loaded from storage, with no pending changes.
    pub fn persisted<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            persisted: true,
            ..Self::default()
        }
    }

    pub fn set<V: Into<Value>>(&mut self, attribute: &str, value: V) {
        let value = value.into();
        let current = self.read_attribute(attribute);
        if value == current {
            return;
        }
        match self.original.get(attribute) {
            Some(orig) if *orig == value => {
                self.original.remove(attribute);
            }
            Some(_) => {}
            None => {
                self.original.insert(attribute.to_string(), current);
            }
        }
        self.attributes.insert(attribute.to_string(), value);
    }

    /// Names of attributes with pending changes.
    pub fn changed(&self) -> Vec<&str> {
        self.original.keys().map(String::as_str).collect()
    }

    /// Mark the record stored and start a fresh change set.
    pub fn save(&mut self) {
        self.persisted = true;
        self.original.clear();
    }

    /// Run `validations` and keep the result on the record.
    pub fn validate(&mut self, validations: &Validations) -> bool {
        self.errors = validations.run(self);
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }
}

impl AttributeSource for MemoryRecord {
    fn read_attribute(&self, attribute: &str) -> Value {
        self.attributes.get(attribute).cloned().unwrap_or_default()
    }
}

impl ChangeTracker for MemoryRecord {
    fn was_changed(&self, attribute: &str) -> bool {
        self.original.contains_key(attribute)
    }

    fn prior_value(&self, attribute: &str) -> Value {
        match self.original.get(attribute) {
            Some(v) => v.clone(),
            None => self.read_attribute(attribute),
        }
    }
}

impl Record for MemoryRecord {
    fn is_persisted(&self) -> bool {
        self.persisted
    }
}
