use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{none_of, one_of, rest, take_until, take_while};

use crate::types::{
    FieldOp, FieldRequirement, FieldSelector, LabelSelector, Requirement, Segment, SelectorOp,
};

// -- Whitespace ---------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

// -- Label selectors ----------------------------------------------------------

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

fn is_value_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn label_key<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., is_key_char)
        .context(StrContext::Expected(StrContextValue::Description(
            "label key",
        )))
        .parse_next(input)
}

fn label_value<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(0.., is_value_char).parse_next(input)
}

fn value_set(input: &mut &str) -> ModalResult<Vec<String>> {
    delimited(
        ('(', ws),
        separated(
            1..,
            take_while(1.., is_value_char).map(str::to_owned),
            (ws, ',', ws),
        ),
        (ws, ')'),
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "value set like '(a,b)'",
    )))
    .parse_next(input)
}

#[derive(Debug, Clone, Copy)]
enum LabelOp {
    Eq,
    Neq,
    In,
    NotIn,
}

fn label_op(input: &mut &str) -> ModalResult<LabelOp> {
    alt((
        "==".value(LabelOp::Eq),
        "!=".value(LabelOp::Neq),
        "=".value(LabelOp::Eq),
        "notin".value(LabelOp::NotIn),
        "in".value(LabelOp::In),
    ))
    .parse_next(input)
}

fn requirement(input: &mut &str) -> ModalResult<Requirement> {
    ws.parse_next(input)?;

    if opt(('!', ws)).parse_next(input)?.is_some() {
        let key = cut_err(label_key).parse_next(input)?;
        return Ok(Requirement::new(key, SelectorOp::NotExists));
    }

    let key = label_key.parse_next(input)?;
    let Some(op) = opt(preceded(ws, label_op)).parse_next(input)? else {
        return Ok(Requirement::new(key, SelectorOp::Exists));
    };
    ws.parse_next(input)?;

    let op = match op {
        LabelOp::Eq => SelectorOp::Equals(label_value.parse_next(input)?.to_owned()),
        LabelOp::Neq => SelectorOp::NotEquals(label_value.parse_next(input)?.to_owned()),
        LabelOp::In => SelectorOp::In(cut_err(value_set).parse_next(input)?),
        LabelOp::NotIn => SelectorOp::NotIn(cut_err(value_set).parse_next(input)?),
    };
    Ok(Requirement::new(key, op))
}

pub(super) fn label_selector(input: &mut &str) -> ModalResult<LabelSelector> {
    let requirements: Vec<Requirement> =
        separated(0.., requirement, (ws, ',')).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(LabelSelector::new(requirements))
}

// -- Field selectors ----------------------------------------------------------

fn field_key<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        !matches!(c, '=' | '!' | ',') && !c.is_ascii_whitespace()
    })
    .parse_next(input)
}

fn field_op(input: &mut &str) -> ModalResult<FieldOp> {
    alt((
        "==".value(FieldOp::Equals),
        "!=".value(FieldOp::NotEquals),
        "=".value(FieldOp::Equals),
    ))
    .parse_next(input)
}

fn escaped_char(input: &mut &str) -> ModalResult<char> {
    preceded(
        '\\',
        cut_err(one_of(['\\', ',', '='])).context(StrContext::Expected(
            StrContextValue::Description("escape sequence '\\\\', '\\,' or '\\='"),
        )),
    )
    .parse_next(input)
}

fn plain_char(input: &mut &str) -> ModalResult<char> {
    none_of(['\\', ',']).parse_next(input)
}

/// Reads up to the next unescaped ','. `\\`, `\,` and `\=` are the only
/// escapes accepted.
fn field_value(input: &mut &str) -> ModalResult<String> {
    let value: String = repeat(0.., alt((escaped_char, plain_char))).parse_next(input)?;
    Ok(value.trim().to_owned())
}

fn field_requirement(input: &mut &str) -> ModalResult<FieldRequirement> {
    ws.parse_next(input)?;
    let field = field_key.parse_next(input)?;
    ws.parse_next(input)?;
    let op = cut_err(field_op)
        .context(StrContext::Expected(StrContextValue::Description(
            "'=', '==' or '!='",
        )))
        .parse_next(input)?;
    let value = field_value.parse_next(input)?;
    Ok(FieldRequirement {
        field: field.to_owned(),
        op,
        value,
    })
}

pub(super) fn field_selector(input: &mut &str) -> ModalResult<FieldSelector> {
    let requirements: Vec<FieldRequirement> =
        separated(0.., field_requirement, ',').parse_next(input)?;
    ws.parse_next(input)?;
    Ok(FieldSelector::new(requirements))
}

// -- Templates ----------------------------------------------------------------

fn variable(input: &mut &str) -> ModalResult<String> {
    preceded(
        opt('.'),
        take_while(1.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/')
        }),
    )
    .map(str::to_owned)
    .parse_next(input)
}

fn action(input: &mut &str) -> ModalResult<Segment> {
    preceded(
        "{{",
        cut_err(delimited(ws, variable, (ws, "}}"))).context(StrContext::Expected(
            StrContextValue::Description("variable reference like '{{ .metadata.name }}'"),
        )),
    )
    .map(Segment::Variable)
    .parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<Segment> {
    alt((
        take_until(1.., "{{"),
        rest.verify(|s: &str| !s.is_empty()),
    ))
    .map(|s: &str| Segment::Literal(s.to_owned()))
    .parse_next(input)
}

pub(super) fn template(input: &mut &str) -> ModalResult<Vec<Segment>> {
    repeat(0.., alt((action, literal))).parse_next(input)
}
