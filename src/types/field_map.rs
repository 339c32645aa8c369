use std::collections::BTreeMap;

/// Flat mapping of dot-separated field paths to string-rendered values.
///
/// Produced by [`flatten`](crate::flatten) from a decoded object, e.g.
/// `spec.template.spec.containers.0.image`. Used both for field-selector
/// evaluation and as the variable source for payload templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    data: BTreeMap<String, String>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dotted path.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<String>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dotted path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: String) {
        self.data.insert(path.to_owned(), value);
    }

    /// Look up a value by its full dotted path. Intermediate paths are never
    /// present: `metadata` does not resolve when only `metadata.name` exists.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.data.get(path).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for FieldMap {
    fn from(data: BTreeMap<String, String>) -> Self {
        Self { data }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
