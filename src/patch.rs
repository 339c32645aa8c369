use std::collections::BTreeMap;

use crate::types::{
    CompiledPayload, EvalError, FieldMap, Labels, PatchDocument, PatchOp, PatchOperation, Payload,
    Template, ANNOTATIONS_PATH, LABELS_PATH,
};

/// Build the JSON Patch that paints `payload` onto an object.
///
/// Payload values are templates rendered against `context`. Rendered values
/// are merged over the existing maps, additions winning. A map that the merge
/// leaves unchanged produces no operation, so applying the same payload twice
/// yields `None` the second time.
///
/// # Errors
///
/// Returns [`EvalError::Template`] if a value is not a valid template or
/// references a field missing from `context`. No partial patch is produced.
pub fn build_patch(
    existing_labels: &Labels,
    existing_annotations: &Labels,
    payload: &Payload,
    context: &FieldMap,
) -> Result<Option<PatchDocument>, EvalError> {
    let compiled = CompiledPayload {
        labels: parse_templates(&payload.labels)?,
        annotations: parse_templates(&payload.annotations)?,
    };
    build_compiled_patch(existing_labels, existing_annotations, &compiled, context)
}

pub(crate) fn build_compiled_patch(
    existing_labels: &Labels,
    existing_annotations: &Labels,
    payload: &CompiledPayload,
    context: &FieldMap,
) -> Result<Option<PatchDocument>, EvalError> {
    let labels = render_all(&payload.labels, context)?;
    let annotations = render_all(&payload.annotations, context)?;

    let operations = [
        patch_operation(LABELS_PATH, existing_labels, labels),
        patch_operation(ANNOTATIONS_PATH, existing_annotations, annotations),
    ]
    .into_iter()
    .flatten()
    .collect();
    Ok(PatchDocument::new(operations))
}

fn parse_templates(
    values: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Template>, EvalError> {
    values
        .iter()
        .map(|(key, value)| {
            let template = value.parse::<Template>().map_err(|err| {
                EvalError::Template(format!("invalid template for '{key}': {err}"))
            })?;
            Ok((key.clone(), template))
        })
        .collect()
}

fn render_all(
    templates: &BTreeMap<String, Template>,
    context: &FieldMap,
) -> Result<Labels, EvalError> {
    templates
        .iter()
        .map(|(key, template)| Ok((key.clone(), sanitize(&template.render(context)?))))
        .collect()
}

/// Label and annotation values are single-line; embedded line breaks are
/// dropped before comparison so reapplying a payload stays a no-op.
fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r'], "")
}

/// Replace the whole map at `path`, or nothing if the merge changes nothing.
fn patch_operation(path: &str, existing: &Labels, additions: Labels) -> Option<PatchOperation> {
    if additions.is_empty() {
        return None;
    }
    let mut merged = existing.clone();
    merged.extend(additions);
    if merged == *existing {
        return None;
    }
    let op = if existing.is_empty() {
        PatchOp::Add
    } else {
        PatchOp::Replace
    };
    Some(PatchOperation::new(op, path, merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn labels_payload(pairs: &[(&str, &str)]) -> Payload {
        Payload {
            labels: map(pairs),
            annotations: BTreeMap::new(),
        }
    }

    #[test]
    fn replace_when_labels_exist() {
        let patch = build_patch(
            &map(&[("fruit", "pear")]),
            &Labels::new(),
            &labels_payload(&[("fruit", "apple")]),
            &FieldMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            patch.operations(),
            &[PatchOperation::new(
                PatchOp::Replace,
                LABELS_PATH,
                map(&[("fruit", "apple")])
            )]
        );
    }

    #[test]
    fn add_when_no_labels() {
        let patch = build_patch(
            &Labels::new(),
            &Labels::new(),
            &labels_payload(&[("fruit", "apple")]),
            &FieldMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(patch.operations()[0].op, PatchOp::Add);
        assert_eq!(patch.operations()[0].value, map(&[("fruit", "apple")]));
    }

    #[test]
    fn merge_keeps_existing_keys() {
        let patch = build_patch(
            &map(&[("app", "web")]),
            &Labels::new(),
            &labels_payload(&[("painted", "true")]),
            &FieldMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            patch.operations()[0].value,
            map(&[("app", "web"), ("painted", "true")])
        );
    }

    #[test]
    fn unchanged_merge_is_no_patch() {
        let patch = build_patch(
            &map(&[("fruit", "apple"), ("app", "web")]),
            &Labels::new(),
            &labels_payload(&[("fruit", "apple")]),
            &FieldMap::new(),
        )
        .unwrap();
        assert_eq!(patch, None);
    }

    #[test]
    fn templates_render_from_context() {
        let payload = Payload {
            labels: BTreeMap::new(),
            annotations: map(&[("example.com/owner", "{{ .metadata.name }}\n")]),
        };
        let ctx = FieldMap::new().set("metadata.name", "nginx");
        let patch = build_patch(&Labels::new(), &Labels::new(), &payload, &ctx)
            .unwrap()
            .unwrap();
        let op = patch.operation(ANNOTATIONS_PATH).unwrap();
        assert_eq!(op.value, map(&[("example.com/owner", "nginx")]));
        assert!(patch.operation(LABELS_PATH).is_none());
    }

    #[test]
    fn template_failure_aborts_whole_patch() {
        let payload = Payload {
            labels: map(&[("painted", "true")]),
            annotations: map(&[("owner", "{{ .metadata.owner }}")]),
        };
        let err = build_patch(&Labels::new(), &Labels::new(), &payload, &FieldMap::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::Template(_)));

        let payload = labels_payload(&[("owner", "{{ .metadata.name")]);
        let err = build_patch(&Labels::new(), &Labels::new(), &payload, &FieldMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::Template(msg) if msg.starts_with("invalid template for 'owner'")
        ));
    }

    #[test]
    fn second_application_is_empty() {
        let payload = labels_payload(&[("fruit", "apple")]);
        let existing = map(&[("fruit", "pear")]);
        let first = build_patch(&existing, &Labels::new(), &payload, &FieldMap::new())
            .unwrap()
            .unwrap();
        let patched = first.operations()[0].value.clone();
        let second = build_patch(&patched, &Labels::new(), &payload, &FieldMap::new()).unwrap();
        assert_eq!(second, None);
    }
}
