use tracing::{debug, info, instrument, warn};

use crate::compile::compile_payload;
use crate::flatten::flatten;
use crate::matcher::{matches, matches_compiled};
use crate::namespace::NamespaceLookup;
use crate::patch::build_compiled_patch;
use crate::types::{
    CandidateObject, CompiledPayload, CompiledRule, Decision, EvalError, FieldMap, Labels, Rule,
};

/// Apply one rule to one object.
///
/// Never fails outright: every problem is reported as [`Decision::Error`].
/// A rule with an empty payload yields [`EvalError::InvalidRule`]. Selectors
/// are parsed as matching reaches them and templates only once the rule has
/// matched, so an object the rule does not select is always
/// [`Decision::NoMatch`].
#[instrument(skip_all, fields(rule = %rule.name))]
pub async fn apply(
    rule: &Rule,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Decision {
    into_decision(try_apply(rule, object, lookup).await)
}

#[instrument(skip_all, fields(rule = %rule.name))]
pub(crate) async fn apply_compiled(
    rule: &CompiledRule,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Decision {
    into_decision(try_apply_compiled(rule, object, lookup).await)
}

fn into_decision(result: Result<Decision, EvalError>) -> Decision {
    match result {
        Ok(decision) => decision,
        Err(err) => {
            warn!(error = %err, "rule evaluation failed");
            Decision::Error(err)
        }
    }
}

fn empty_payload(rule_name: &str) -> EvalError {
    EvalError::InvalidRule {
        rule: rule_name.to_owned(),
        reason: "payload is empty".to_owned(),
    }
}

async fn try_apply(
    rule: &Rule,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Result<Decision, EvalError> {
    if rule.payload.is_empty() {
        return Err(empty_payload(&rule.name));
    }

    if !matches(rule, object, lookup).await? {
        debug!("object not selected");
        return Ok(Decision::NoMatch);
    }

    let payload = compile_payload(&rule.name, &rule.payload)?;
    paint(&payload, object)
}

async fn try_apply_compiled(
    rule: &CompiledRule,
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Result<Decision, EvalError> {
    if rule.payload.is_empty() {
        return Err(empty_payload(&rule.name));
    }

    if !matches_compiled(&rule.name, &rule.matchers, object, lookup).await? {
        debug!("object not selected");
        return Ok(Decision::NoMatch);
    }

    paint(&rule.payload, object)
}

/// Render `payload` against a selected object and diff it with what the
/// object already carries.
fn paint(payload: &CompiledPayload, object: &CandidateObject<'_>) -> Result<Decision, EvalError> {
    let context = if payload.needs_context() {
        flatten(object.raw())?
    } else {
        FieldMap::new()
    };

    let empty = Labels::new();
    let (labels, annotations) = object
        .meta()
        .map_or((&empty, &empty), |m| (&m.labels, &m.annotations));

    match build_compiled_patch(labels, annotations, payload, &context)? {
        Some(patch) => {
            info!(operations = patch.operations().len(), "patch created");
            Ok(Decision::MatchWithPatch(patch))
        }
        None => {
            debug!("object already painted");
            Ok(Decision::MatchNoChange)
        }
    }
}
