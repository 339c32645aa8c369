use std::collections::BTreeMap;

use serde_json::Value;

use super::error::EvalError;

/// A label or annotation set, normalised to string keys and string values.
pub type Labels = BTreeMap<String, String>;

/// Decoded metadata view of a candidate object.
///
/// Label and annotation maps are normalised when the view is built, so the
/// matching core only ever sees [`Labels`], whichever decoder produced the
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub kind: Option<String>,
    pub name: String,
    /// Empty for cluster-scoped objects.
    pub namespace: String,
    pub labels: Labels,
    pub annotations: Labels,
}

impl ObjectMeta {
    /// Build a metadata view from a JSON-decoded object.
    ///
    /// Returns `None` when the object has no `metadata` mapping.
    #[must_use]
    pub fn from_json(object: &Value) -> Option<Self> {
        let metadata = object.get("metadata")?;
        if !metadata.is_object() {
            return None;
        }
        Some(Self {
            kind: object
                .get("kind")
                .and_then(Value::as_str)
                .map(str::to_owned),
            name: json_str(metadata, "name"),
            namespace: json_str(metadata, "namespace"),
            labels: lookup_labels(metadata),
            annotations: json_string_map(metadata.get("annotations")),
        })
    }

    /// Build a metadata view from a YAML-decoded object.
    ///
    /// YAML mappings may carry non-string keys; those entries are dropped.
    #[must_use]
    pub fn from_yaml(object: &serde_yaml::Value) -> Option<Self> {
        let metadata = object.get("metadata")?;
        if !metadata.is_mapping() {
            return None;
        }
        Some(Self {
            kind: object
                .get("kind")
                .and_then(serde_yaml::Value::as_str)
                .map(str::to_owned),
            name: yaml_str(metadata, "name"),
            namespace: yaml_str(metadata, "namespace"),
            labels: lookup_yaml_labels(metadata),
            annotations: yaml_string_map(metadata.get("annotations")),
        })
    }

    /// Start a metadata view for an object of the given kind.
    #[must_use]
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: Some(kind.to_owned()),
            name: name.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_owned();
        self
    }

    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// The resource under evaluation: its serialized JSON form plus a decoded
/// metadata view. Borrowed for the duration of one evaluation only.
#[derive(Debug, Clone)]
pub struct CandidateObject<'a> {
    raw: &'a [u8],
    meta: Option<ObjectMeta>,
}

impl<'a> CandidateObject<'a> {
    pub fn new(raw: &'a [u8], meta: Option<ObjectMeta>) -> Self {
        Self { raw, meta }
    }

    /// Decode the metadata view from the raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::EmptyInput`] for zero-length input and
    /// [`EvalError::Decode`] when the bytes are not well-formed JSON.
    pub fn from_json(raw: &'a [u8]) -> Result<Self, EvalError> {
        if raw.is_empty() {
            return Err(EvalError::EmptyInput);
        }
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| EvalError::Decode(e.to_string()))?;
        Ok(Self {
            raw,
            meta: ObjectMeta::from_json(&value),
        })
    }

    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    #[must_use]
    pub fn meta(&self) -> Option<&ObjectMeta> {
        self.meta.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.meta.as_ref().map_or("", |m| m.name.as_str())
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.meta.as_ref().map_or("", |m| m.namespace.as_str())
    }
}

/// Extract the `labels` mapping from a JSON metadata section.
///
/// Never fails: an absent field, a field that is not a mapping, or a
/// metadata value that is not an object all yield an empty set.
#[must_use]
pub fn lookup_labels(metadata: &Value) -> Labels {
    json_string_map(metadata.get("labels"))
}

/// Extract the `labels` mapping from a YAML metadata section.
///
/// Entries whose key is not a string are skipped.
#[must_use]
pub fn lookup_yaml_labels(metadata: &serde_yaml::Value) -> Labels {
    yaml_string_map(metadata.get("labels"))
}

fn json_str(metadata: &Value, key: &str) -> String {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn json_string_map(value: Option<&Value>) -> Labels {
    let Some(Value::Object(map)) = value else {
        return Labels::new();
    };
    map.iter()
        .filter_map(|(k, v)| json_scalar(v).map(|v| (k.clone(), v)))
        .collect()
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn yaml_str(metadata: &serde_yaml::Value, key: &str) -> String {
    metadata
        .get(key)
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn yaml_string_map(value: Option<&serde_yaml::Value>) -> Labels {
    let Some(serde_yaml::Value::Mapping(map)) = value else {
        return Labels::new();
    };
    map.iter()
        .filter_map(|(k, v)| {
            let key = k.as_str()?;
            yaml_scalar(v).map(|v| (key.to_owned(), v))
        })
        .collect()
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
