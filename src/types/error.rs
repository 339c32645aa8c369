use std::time::Duration;

use thiserror::Error;

use crate::parse::ParseError;

/// Errors raised while validating and compiling a rule set.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("rule '{rule}' has an empty payload; it must add at least one label or annotation")]
    EmptyPayload { rule: String },

    #[error("invalid {kind} selector in rule '{rule}': {source}")]
    InvalidSelector {
        rule: String,
        kind: &'static str,
        source: ParseError,
    },

    #[error("invalid template for '{key}' in rule '{rule}': {source}")]
    InvalidTemplate {
        rule: String,
        key: String,
        source: ParseError,
    },

    #[error("no rules defined; at least one rule is required")]
    NoRules,
}

/// Errors raised while evaluating one rule against one object.
///
/// None of these are fatal: they are reported per (rule, object) pair and
/// never stop evaluation of other rules or other objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("object is empty, no fields found")]
    EmptyInput,

    #[error("failed to decode object: {0}")]
    Decode(String),

    #[error("object has no metadata")]
    NoMetadata,

    #[error("object has no kind")]
    NoKind,

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("lookup of namespace '{namespace}' failed: {message}")]
    CacheLookup { namespace: String, message: String },

    #[error("invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}

impl From<CompileError> for EvalError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::InvalidSelector { .. } => EvalError::InvalidSelector(err.to_string()),
            CompileError::InvalidTemplate { .. } => EvalError::Template(err.to_string()),
            CompileError::EmptyPayload { ref rule } => EvalError::InvalidRule {
                rule: rule.clone(),
                reason: "payload is empty".to_owned(),
            },
            CompileError::DuplicateRule { ref name } => EvalError::InvalidRule {
                rule: name.clone(),
                reason: "duplicate rule name".to_owned(),
            },
            CompileError::NoRules => EvalError::InvalidRule {
                rule: String::new(),
                reason: err.to_string(),
            },
        }
    }
}

/// Errors returned by a [`NamespaceFetcher`](crate::NamespaceFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out after {timeout:?} fetching namespace '{namespace}'")]
    Timeout { namespace: String, timeout: Duration },

    #[error("failed to fetch namespace '{namespace}': {message}")]
    Failed { namespace: String, message: String },
}
