//! Rule registry and validation pass.
//!
//! [`Validations`] plays the host orchestrator: it maps attributes to rules,
//! reads each attribute from the record, applies the per-registration
//! [`Policy`] shortcut and collects what the rules append.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{CoreError, Errors, Record, Rule, Value};

/// Generic skip policy applied before a rule runs.
///
/// Rules that return `false` from [`Rule::honors_nil_shortcut`] are always
/// run regardless of the policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub allow_nil: bool,
    #[serde(default)]
    pub allow_blank: bool,
}

impl Policy {
    pub fn allow_nil() -> Self {
        Self {
            allow_nil: true,
            allow_blank: false,
        }
    }

    pub fn allow_blank() -> Self {
        Self {
            allow_nil: false,
            allow_blank: true,
        }
    }

    fn skips(&self, value: &Value) -> bool {
        (self.allow_nil && value.is_null()) || (self.allow_blank && value.is_blank())
    }
}

#[derive(Clone)]
struct Registration {
    attribute: String,
    rule: Arc<dyn Rule>,
    policy: Policy,
}

/// Attribute-to-rule registrations for one kind of record.
///
/// Cheap to clone and safe to share across threads; rules are held behind
/// `Arc` and carry no per-record state.
#[derive(Clone, Default)]
pub struct Validations {
    registrations: Vec<Registration>,
}

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` for `attribute` with the default policy.
    pub fn validates<R: Rule + 'static>(
        &mut self,
        attribute: impl Into<String>,
        rule: R,
    ) -> Result<&mut Self, CoreError> {
        self.validates_with(attribute, rule, Policy::default())
    }

    pub fn validates_with<R: Rule + 'static>(
        &mut self,
        attribute: impl Into<String>,
        rule: R,
        policy: Policy,
    ) -> Result<&mut Self, CoreError> {
        self.validates_shared(attribute, Arc::new(rule), policy)
    }

    /// Register an already shared rule, e.g. one instance for many attributes.
    pub fn validates_shared(
        &mut self,
        attribute: impl Into<String>,
        rule: Arc<dyn Rule>,
        policy: Policy,
    ) -> Result<&mut Self, CoreError> {
        let attribute = attribute.into();
        if attribute.trim().is_empty() {
            return Err(CoreError::InvalidAttribute(attribute));
        }
        self.registrations.push(Registration {
            attribute,
            rule,
            policy,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every registered rule against `record`, in registration order.
    pub fn run(&self, record: &dyn Record) -> Errors {
        let mut errors = Errors::new();
        for reg in &self.registrations {
            let value = record.read_attribute(&reg.attribute);
            if reg.rule.honors_nil_shortcut() && reg.policy.skips(&value) {
                trace!(attribute = %reg.attribute, rule = reg.rule.name(), "skipped by policy");
                continue;
            }
            trace!(attribute = %reg.attribute, rule = reg.rule.name(), "running rule");
            reg.rule
                .validate_each(record, &reg.attribute, &value, &mut errors);
        }
        errors
    }

    pub fn is_valid(&self, record: &dyn Record) -> bool {
        self.run(record).is_empty()
    }
}

impl fmt::Debug for Validations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.registrations
                    .iter()
                    .map(|r| format!("{}: {}", r.attribute, r.rule.name())),
            )
            .finish()
    }
}
