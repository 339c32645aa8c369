use std::fmt;

use serde::Serialize;

use super::object::Labels;

pub const LABELS_PATH: &str = "/metadata/labels";
pub const ANNOTATIONS_PATH: &str = "/metadata/annotations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

/// One JSON Patch entry. The path always addresses a whole label or
/// annotation map, never a single key, so keys containing `/` need no
/// pointer escaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Labels,
}

impl PatchOperation {
    #[must_use]
    pub fn new(op: PatchOp, path: &str, value: Labels) -> Self {
        Self {
            op,
            path: path.to_owned(),
            value,
        }
    }
}

/// A non-empty JSON Patch array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatchDocument {
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    /// Returns `None` for an empty operation list: "no patch" is not a patch.
    #[must_use]
    pub fn new(operations: Vec<PatchOperation>) -> Option<Self> {
        if operations.is_empty() {
            None
        } else {
            Some(Self { operations })
        }
    }

    #[must_use]
    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// The operation targeting `path`, if any.
    #[must_use]
    pub fn operation(&self, path: &str) -> Option<&PatchOperation> {
        self.operations.iter().find(|op| op.path == path)
    }

    /// Serialized JSON Patch text.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PatchDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
