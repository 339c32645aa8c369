use std::fmt;
use std::str::FromStr;

use super::error::EvalError;
use super::field_map::FieldMap;
use crate::parse::{self, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// A dotted field path, looked up verbatim in the [`FieldMap`].
    Variable(String),
}

/// A payload value with `{{ .field.path }}` substitutions.
///
/// Only variable substitution is supported. Every referenced variable must
/// exist in the render context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub(crate) fn new(source: &str, segments: Vec<Segment>) -> Self {
        Self {
            source: source.to_owned(),
            segments,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when rendering needs a field map at all.
    #[must_use]
    pub fn has_variables(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable(_)))
    }

    /// Substitute every variable from `context`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Template`] if a referenced variable is not present.
    pub fn render(&self, context: &FieldMap) -> Result<String, EvalError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(path) => {
                    let value = context.get(path).ok_or_else(|| {
                        EvalError::Template(format!(
                            "undefined variable '.{path}' in '{}'",
                            self.source
                        ))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_template(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
