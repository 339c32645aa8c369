use std::str::FromStr;

use tracing::debug;

use crate::compile::invalid_selector;
use crate::namespace::{resolve_namespace_labels, NamespaceLookup, NamespaceScope};
use crate::parse::ParseError;
use crate::types::{
    BooleanOperator, CandidateObject, CompiledMatchers, EvalError, FieldSelector, LabelSelector,
    Labels, Rule,
};

/// Decide whether `rule` selects `object`.
///
/// Selectors are parsed as they are reached: the first selector in a list
/// that matches ends that list, so a malformed selector after it is never
/// looked at. [`RuleSet`](crate::RuleSet) parses everything up front instead.
/// The payload is not consulted.
///
/// # Errors
///
/// Returns [`EvalError::InvalidSelector`] for a malformed selector that is
/// reached, and any error raised while resolving the namespace or flattening
/// the object.
pub async fn matches(
    rule: &Rule,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Result<bool, EvalError> {
    let matchers = &rule.matchers;
    let namespace_selector = matchers
        .namespace_selector()
        .map(|s| {
            s.parse::<LabelSelector>().map_err(|source| {
                EvalError::from(invalid_selector(&rule.name, "namespace", source))
            })
        })
        .transpose()?;

    let selectors = Selectors {
        rule_name: &rule.name,
        operator: matchers.boolean_operator,
        namespace: namespace_selector.as_ref(),
        labels: SelectorList::Raw {
            kind: "label",
            sources: &matchers.label_selectors,
        },
        fields: SelectorList::Raw {
            kind: "field",
            sources: &matchers.field_selectors,
        },
    };
    selectors.evaluate(object, lookup).await
}

pub(crate) async fn matches_compiled(
    rule_name: &str,
    matchers: &CompiledMatchers,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Result<bool, EvalError> {
    let selectors = Selectors {
        rule_name,
        operator: matchers.operator,
        namespace: matchers.namespace_selector.as_ref(),
        labels: SelectorList::Compiled(&matchers.label_selectors),
        fields: SelectorList::Compiled(&matchers.field_selectors),
    };
    selectors.evaluate(object, lookup).await
}

/// Selectors either parsed ahead of time or still in source form.
enum SelectorList<'a, S> {
    Compiled(&'a [S]),
    Raw {
        kind: &'static str,
        sources: &'a [String],
    },
}

impl<S: FromStr<Err = ParseError>> SelectorList<'_, S> {
    fn is_empty(&self) -> bool {
        match self {
            Self::Compiled(selectors) => selectors.is_empty(),
            Self::Raw { sources, .. } => sources.is_empty(),
        }
    }

    /// First match wins.
    fn any(&self, rule_name: &str, pred: impl Fn(&S) -> bool) -> Result<bool, EvalError> {
        match self {
            Self::Compiled(selectors) => Ok(selectors.iter().any(pred)),
            Self::Raw { kind, sources } => {
                for source in sources.iter() {
                    let selector = source
                        .parse::<S>()
                        .map_err(|err| EvalError::from(invalid_selector(rule_name, *kind, err)))?;
                    if pred(&selector) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

struct Selectors<'a> {
    rule_name: &'a str,
    operator: BooleanOperator,
    namespace: Option<&'a LabelSelector>,
    labels: SelectorList<'a, LabelSelector>,
    fields: SelectorList<'a, FieldSelector>,
}

impl Selectors<'_> {
    async fn evaluate(
        &self,
        object: &CandidateObject<'_>,
        lookup: &dyn NamespaceLookup,
    ) -> Result<bool, EvalError> {
        let rule_name = self.rule_name;
        if self.namespace.is_none() && self.labels.is_empty() && self.fields.is_empty() {
            debug!(rule = %rule_name, "no selectors, unconditional match");
            return Ok(true);
        }

        if let Some(selector) = self.namespace {
            let gate = match resolve_namespace_labels(object, lookup).await? {
                NamespaceScope::Labels(labels) => selector.matches(&labels),
                NamespaceScope::NotNamespaced => false,
            };
            if !gate {
                debug!(rule = %rule_name, selector = %selector, "namespace selector did not match");
                return Ok(false);
            }
        }

        let label_matches = if self.labels.is_empty() {
            None
        } else {
            let labels = identity_labels(object);
            Some(self.labels.any(rule_name, |s| s.matches(&labels))?)
        };

        let field_matches = if self.fields.is_empty() {
            None
        } else {
            let fields = crate::flatten::flatten(object.raw())?;
            Some(self.fields.any(rule_name, |s| s.matches(&fields))?)
        };

        let matched = self.operator.combine(label_matches, field_matches);
        debug!(
            rule = %rule_name,
            operator = ?self.operator,
            labels = ?label_matches,
            fields = ?field_matches,
            matched,
            "selectors evaluated"
        );
        Ok(matched)
    }
}

/// The object's labels plus synthetic `name` and `namespace` entries, so
/// selectors can match on identity.
fn identity_labels(object: &CandidateObject<'_>) -> Labels {
    let mut labels = object
        .meta()
        .map(|m| m.labels.clone())
        .unwrap_or_default();
    labels.insert("name".to_owned(), object.name().to_owned());
    labels.insert("namespace".to_owned(), object.namespace().to_owned());
    labels
}
