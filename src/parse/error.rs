use std::fmt;

/// Errors produced when parsing selector or template input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    input: String,
    message: String,
}

impl ParseError {
    pub(crate) fn new(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: message.into(),
        }
    }

    /// The text that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for ParseError {}
