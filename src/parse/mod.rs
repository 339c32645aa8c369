mod error;
mod grammar;

pub use error::ParseError;

use winnow::error::{ContextError, ParseError as WinnowError};
use winnow::Parser;

use crate::types::{FieldSelector, LabelSelector, Segment, Template};

/// Parse a label selector such as `app=web,env in (prod,qa),!legacy`.
///
/// The empty string parses to the selector that matches everything.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid selector syntax.
pub fn parse_label_selector(input: &str) -> Result<LabelSelector, ParseError> {
    grammar::label_selector
        .parse(input)
        .map_err(|e| to_parse_error(input, &e))
}

/// Parse a field selector such as `metadata.name=web,status.phase!=Failed`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid selector syntax or uses
/// a set operator.
pub fn parse_field_selector(input: &str) -> Result<FieldSelector, ParseError> {
    grammar::field_selector
        .parse(input)
        .map_err(|e| to_parse_error(input, &e))
}

/// Parse a payload value template.
///
/// # Errors
///
/// Returns [`ParseError`] on an unterminated or malformed `{{ }}` action.
pub fn parse_template(input: &str) -> Result<Template, ParseError> {
    let segments: Vec<Segment> = grammar::template
        .parse(input)
        .map_err(|e| to_parse_error(input, &e))?;
    Ok(Template::new(input, segments))
}

fn to_parse_error(input: &str, err: &WinnowError<&str, ContextError>) -> ParseError {
    let message = err.inner().to_string();
    let message = if message.is_empty() {
        format!("unexpected input at offset {}", err.offset())
    } else {
        format!("{message} at offset {}", err.offset())
    };
    ParseError::new(input, message)
}
