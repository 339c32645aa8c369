use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::types::{
    CompileError, CompiledMatchers, CompiledPayload, CompiledRule, FieldSelector, LabelSelector,
    Matchers, Payload, Rule, RuleSet, Template,
};

pub(crate) fn compile(rules: &[Rule]) -> Result<RuleSet, CompileError> {
    if rules.is_empty() {
        return Err(CompileError::NoRules);
    }
    check_duplicates(rules)?;

    let compiled = rules
        .iter()
        .map(compile_rule)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rules = compiled.len(), "rule set compiled");
    Ok(RuleSet { rules: compiled })
}

fn check_duplicates(rules: &[Rule]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(&rule.name) {
            return Err(CompileError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate one rule and parse its selectors and templates.
fn compile_rule(rule: &Rule) -> Result<CompiledRule, CompileError> {
    if rule.payload.is_empty() {
        return Err(CompileError::EmptyPayload {
            rule: rule.name.clone(),
        });
    }

    Ok(CompiledRule {
        name: rule.name.clone(),
        matchers: compile_matchers(&rule.name, &rule.matchers)?,
        payload: compile_payload(&rule.name, &rule.payload)?,
    })
}

/// Parse the selectors of one rule.
fn compile_matchers(
    rule_name: &str,
    matchers: &Matchers,
) -> Result<CompiledMatchers, CompileError> {
    let label_selectors = matchers
        .label_selectors
        .iter()
        .map(|s| {
            s.parse::<LabelSelector>()
                .map_err(|source| invalid_selector(rule_name, "label", source))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let field_selectors = matchers
        .field_selectors
        .iter()
        .map(|s| {
            s.parse::<FieldSelector>()
                .map_err(|source| invalid_selector(rule_name, "field", source))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let namespace_selector = matchers
        .namespace_selector()
        .map(|s| {
            s.parse::<LabelSelector>()
                .map_err(|source| invalid_selector(rule_name, "namespace", source))
        })
        .transpose()?;

    Ok(CompiledMatchers {
        label_selectors,
        field_selectors,
        namespace_selector,
        operator: matchers.boolean_operator,
    })
}

pub(crate) fn compile_payload(
    rule_name: &str,
    payload: &Payload,
) -> Result<CompiledPayload, CompileError> {
    Ok(CompiledPayload {
        labels: compile_templates(rule_name, &payload.labels)?,
        annotations: compile_templates(rule_name, &payload.annotations)?,
    })
}

fn compile_templates(
    rule_name: &str,
    values: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Template>, CompileError> {
    values
        .iter()
        .map(|(key, value)| {
            let template = value.parse::<Template>().map_err(|source| {
                CompileError::InvalidTemplate {
                    rule: rule_name.to_owned(),
                    key: key.clone(),
                    source,
                }
            })?;
            Ok((key.clone(), template))
        })
        .collect()
}

pub(crate) fn invalid_selector(
    rule_name: &str,
    kind: &'static str,
    source: crate::parse::ParseError,
) -> CompileError {
    CompileError::InvalidSelector {
        rule: rule_name.to_owned(),
        kind,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleSetBuilder;

    fn rule(name: &str, matchers: Matchers) -> Rule {
        Rule {
            name: name.to_owned(),
            matchers,
            payload: Payload {
                labels: [("painted".to_owned(), "true".to_owned())].into(),
                annotations: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn no_rules_is_an_error() {
        assert!(matches!(compile(&[]), Err(CompileError::NoRules)));
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = RuleSetBuilder::new()
            .rule("a", |r| r.label("x", "1"))
            .rule("a", |r| r.label("y", "2"))
            .compile();
        assert!(matches!(result, Err(CompileError::DuplicateRule { name }) if name == "a"));
    }

    #[test]
    fn selectors_compiled_in_order() {
        let compiled = compile_rule(&rule(
            "r",
            Matchers {
                label_selectors: vec!["app=web".into(), "app=api".into()],
                field_selectors: vec!["metadata.name=nginx".into()],
                namespace_selector: Some("team=shop".into()),
                ..Matchers::default()
            },
        ))
        .unwrap()
        .matchers;
        assert_eq!(compiled.label_selectors.len(), 2);
        assert_eq!(compiled.label_selectors[1].to_string(), "app=api");
        assert_eq!(compiled.field_selectors.len(), 1);
        assert!(compiled.namespace_selector.is_some());
    }

    #[test]
    fn blank_namespace_selector_is_dropped() {
        let compiled = compile_rule(&rule(
            "r",
            Matchers {
                namespace_selector: Some(String::new()),
                ..Matchers::default()
            },
        ))
        .unwrap()
        .matchers;
        assert!(compiled.namespace_selector.is_none());
        assert!(compiled.label_selectors.is_empty() && compiled.field_selectors.is_empty());
    }

    #[test]
    fn bad_field_selector_names_kind() {
        let err = compile_rule(&rule(
            "r",
            Matchers {
                field_selectors: vec!["metadata.name in (a,b)".into()],
                ..Matchers::default()
            },
        ))
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidSelector { kind: "field", .. }));
    }

    #[test]
    fn bad_template_names_key() {
        let result = RuleSetBuilder::new()
            .rule("r", |r| r.annotation("owner", "{{ .metadata.name"))
            .compile();
        assert!(matches!(
            result,
            Err(CompileError::InvalidTemplate { key, .. }) if key == "owner"
        ));
    }

    #[test]
    fn payload_context_detection() {
        let plain = compile_payload("r", &rule("r", Matchers::default()).payload).unwrap();
        assert!(!plain.needs_context());
        assert!(!plain.is_empty());

        let payload = Payload {
            labels: BTreeMap::new(),
            annotations: [("owner".to_owned(), "{{.metadata.name}}".to_owned())].into(),
        };
        assert!(compile_payload("r", &payload).unwrap().needs_context());
    }
}
