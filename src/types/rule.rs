use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::selector::{FieldSelector, LabelSelector};
use super::template::Template;

/// How label-selector and field-selector outcomes combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOperator {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
    #[serde(alias = "xor")]
    Xor,
}

impl BooleanOperator {
    /// Combine the two selector categories.
    ///
    /// `None` means the rule has no selectors of that kind. An absent
    /// category is vacuously satisfied for `And`/`Or` but enters `Xor` as
    /// `false`.
    #[must_use]
    pub fn combine(self, labels: Option<bool>, fields: Option<bool>) -> bool {
        match self {
            Self::And => labels.unwrap_or(true) && fields.unwrap_or(true),
            Self::Or => labels.unwrap_or(true) || fields.unwrap_or(true),
            Self::Xor => labels.unwrap_or(false) != fields.unwrap_or(false),
        }
    }
}

/// Selection criteria of a [`Rule`]. All empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Matchers {
    pub label_selectors: Vec<String>,
    pub field_selectors: Vec<String>,
    pub namespace_selector: Option<String>,
    pub boolean_operator: BooleanOperator,
}

impl Matchers {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label_selectors.is_empty()
            && self.field_selectors.is_empty()
            && self.namespace_selector().is_none()
    }

    /// The namespace selector, with blank values treated as unset.
    #[must_use]
    pub fn namespace_selector(&self) -> Option<&str> {
        self.namespace_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// Labels and annotations to add when a rule matches. Values are templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl Payload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }
}

/// A named policy unit: what to select and what to paint onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub matchers: Matchers,
    #[serde(default)]
    pub payload: Payload,
}

/// A rule whose selectors and templates have been parsed once, up front.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    pub(crate) matchers: CompiledMatchers,
    pub(crate) payload: CompiledPayload,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledMatchers {
    pub(crate) label_selectors: Vec<LabelSelector>,
    pub(crate) field_selectors: Vec<FieldSelector>,
    pub(crate) namespace_selector: Option<LabelSelector>,
    pub(crate) operator: BooleanOperator,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledPayload {
    pub(crate) labels: BTreeMap<String, Template>,
    pub(crate) annotations: BTreeMap<String, Template>,
}

impl CompiledPayload {
    /// True when any value references the object's fields.
    pub(crate) fn needs_context(&self) -> bool {
        self.labels
            .values()
            .chain(self.annotations.values())
            .any(Template::has_variables)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }
}
