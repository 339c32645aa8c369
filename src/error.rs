use thiserror::Error;

use crate::CompileError;

/// Unified error type covering rule decoding, compilation, and I/O.
///
/// Returned by convenience loaders like [`RuleSet::from_yaml()`](crate::RuleSet::from_yaml)
/// and [`RuleSet::from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum GraffitiError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
