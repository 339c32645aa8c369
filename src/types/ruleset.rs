use std::fmt;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::decision::Decision;
use super::error::CompileError;
use super::object::CandidateObject;
use super::rule::{BooleanOperator, CompiledRule, Matchers, Payload, Rule};
use super::verdict::Verdict;
use crate::namespace::NamespaceLookup;

/// Builder for constructing a [`RuleSet`].
///
/// Rules are defined via closures and compiled into an immutable, thread-safe
/// structure with every selector and template parsed up front.
///
/// # Example
///
/// ```
/// use graffiti::{BooleanOperator, RuleSetBuilder};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("paint-web", |r| {
///         r.label_selector("app=web")
///             .field_selector("metadata.namespace=shop")
///             .operator(BooleanOperator::Or)
///             .label("painted", "true")
///             .annotation("example.com/owner", "{{ .metadata.name }}")
///     })
///     .compile()
///     .unwrap();
/// assert_eq!(ruleset.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    matchers: Matchers,
    payload: Payload,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure must add at least one label or annotation,
    /// otherwise compilation fails with [`CompileError::EmptyPayload`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.rules.push(Rule {
            name: name.to_owned(),
            matchers: builder.matchers,
            payload: builder.payload,
        });
        self
    }

    /// Add an already-assembled rule, e.g. one deserialized elsewhere.
    #[must_use]
    pub fn push(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if validation fails.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(&self.rules)
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn label_selector(mut self, selector: &str) -> Self {
        self.matchers.label_selectors.push(selector.to_owned());
        self
    }

    #[must_use]
    pub fn field_selector(mut self, selector: &str) -> Self {
        self.matchers.field_selectors.push(selector.to_owned());
        self
    }

    #[must_use]
    pub fn namespace_selector(mut self, selector: &str) -> Self {
        self.matchers.namespace_selector = Some(selector.to_owned());
        self
    }

    #[must_use]
    pub fn operator(mut self, operator: BooleanOperator) -> Self {
        self.matchers.boolean_operator = operator;
        self
    }

    /// Add a label; `value` may contain `{{ .field.path }}` references.
    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.payload.labels.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Add an annotation; `value` may contain `{{ .field.path }}` references.
    #[must_use]
    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.payload
            .annotations
            .insert(key.to_owned(), value.to_owned());
        self
    }
}

#[derive(Debug, Deserialize)]
struct RuleSetDocument {
    rules: Vec<Rule>,
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind `Arc`.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Apply every rule, in definition order, to `object`.
    ///
    /// One verdict is returned per rule. A rule that fails reports
    /// [`Decision::Error`] and does not stop the remaining rules.
    #[instrument(skip_all, fields(object = %object.name(), namespace = %object.namespace()))]
    pub async fn apply(
        &self,
        object: &CandidateObject<'_>,
        lookup: &dyn NamespaceLookup,
    ) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let decision = crate::evaluate::apply_compiled(rule, object, lookup).await;
            verdicts.push(Verdict::new(rule.name.as_str(), decision));
        }
        debug!(
            matched = verdicts.iter().filter(|v| v.decision().is_match()).count(),
            "rule set applied"
        );
        verdicts
    }

    /// Apply the single rule called `rule_name`.
    ///
    /// Returns `None` if no such rule exists.
    pub async fn apply_rule(
        &self,
        rule_name: &str,
        object: &CandidateObject<'_>,
        lookup: &dyn NamespaceLookup,
    ) -> Option<Decision> {
        let rule = self.rules.iter().find(|r| r.name == rule_name)?;
        Some(crate::evaluate::apply_compiled(rule, object, lookup).await)
    }

    /// Parse a YAML (or JSON) document with a top-level `rules:` list and
    /// compile it.
    ///
    /// # Errors
    ///
    /// Returns [`GraffitiError`](crate::GraffitiError) on decode or compile failure.
    pub fn from_yaml(input: &str) -> Result<Self, crate::GraffitiError> {
        let document: RuleSetDocument = serde_yaml::from_str(input)?;
        let ruleset = crate::compile::compile(&document.rules)?;
        Ok(ruleset)
    }

    /// Read a rules file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`GraffitiError`](crate::GraffitiError) on I/O, decode, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::GraffitiError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_yaml(&input)
    }

    /// Rule names in application order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({} rules: {})", self.rules.len(), self.rule_names().join(", "))
    }
}
