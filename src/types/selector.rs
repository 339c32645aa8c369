use std::fmt;
use std::str::FromStr;

use super::field_map::FieldMap;
use super::object::Labels;
use crate::parse::{self, ParseError};

/// Operator of a single label-selector requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorOp {
    /// `key=value` or `key==value`
    Equals(String),
    /// `key!=value`; also true when the key is absent.
    NotEquals(String),
    /// `key in (a,b)`
    In(Vec<String>),
    /// `key notin (a,b)`; also true when the key is absent.
    NotIn(Vec<String>),
    /// `key`
    Exists,
    /// `!key`
    NotExists,
}

/// One comma-separated term of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub op: SelectorOp,
}

impl Requirement {
    #[must_use]
    pub fn new(key: impl Into<String>, op: SelectorOp) -> Self {
        Self {
            key: key.into(),
            op,
        }
    }

    #[must_use]
    pub fn matches(&self, labels: &Labels) -> bool {
        let actual = labels.get(&self.key);
        match &self.op {
            SelectorOp::Equals(expected) => actual == Some(expected),
            SelectorOp::NotEquals(expected) => actual != Some(expected),
            SelectorOp::In(allowed) => actual.is_some_and(|v| allowed.contains(v)),
            SelectorOp::NotIn(denied) => actual.map_or(true, |v| !denied.contains(v)),
            SelectorOp::Exists => actual.is_some(),
            SelectorOp::NotExists => actual.is_none(),
        }
    }
}

/// A parsed label selector: a conjunction of [`Requirement`]s.
///
/// The empty selector matches every label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    #[must_use]
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    #[must_use]
    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for LabelSelector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_label_selector(s)
    }
}

/// Field selectors only support equality and inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    pub field: String,
    pub op: FieldOp,
    pub value: String,
}

impl FieldRequirement {
    /// A field missing from the map compares as the empty string.
    #[must_use]
    pub fn matches(&self, fields: &FieldMap) -> bool {
        let actual = fields.get(&self.field).unwrap_or_default();
        match self.op {
            FieldOp::Equals => actual == self.value,
            FieldOp::NotEquals => actual != self.value,
        }
    }
}

/// A parsed field selector: a conjunction of [`FieldRequirement`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    #[must_use]
    pub fn new(requirements: Vec<FieldRequirement>) -> Self {
        Self { requirements }
    }

    #[must_use]
    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    #[must_use]
    pub fn matches(&self, fields: &FieldMap) -> bool {
        self.requirements.iter().all(|r| r.matches(fields))
    }
}

impl FromStr for FieldSelector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_field_selector(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = &self.key;
        match &self.op {
            SelectorOp::Equals(v) => write!(f, "{key}={v}"),
            SelectorOp::NotEquals(v) => write!(f, "{key}!={v}"),
            SelectorOp::In(vs) => write!(f, "{key} in ({})", vs.join(",")),
            SelectorOp::NotIn(vs) => write!(f, "{key} notin ({})", vs.join(",")),
            SelectorOp::Exists => write!(f, "{key}"),
            SelectorOp::NotExists => write!(f, "!{key}"),
        }
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            FieldOp::Equals => "=",
            FieldOp::NotEquals => "!=",
        };
        let value = self
            .value
            .replace('\\', r"\\")
            .replace(',', r"\,")
            .replace('=', r"\=");
        write!(f, "{}{op}{value}", self.field)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn equals_requires_presence() {
        let r = Requirement::new("fruit", SelectorOp::Equals("apple".into()));
        assert!(r.matches(&labels(&[("fruit", "apple")])));
        assert!(!r.matches(&labels(&[("fruit", "pear")])));
        assert!(!r.matches(&labels(&[])));
    }

    #[test]
    fn not_equals_matches_absent_key() {
        let r = Requirement::new("fruit", SelectorOp::NotEquals("apple".into()));
        assert!(r.matches(&labels(&[])));
        assert!(r.matches(&labels(&[("fruit", "pear")])));
        assert!(!r.matches(&labels(&[("fruit", "apple")])));
    }

    #[test]
    fn set_membership() {
        let r = Requirement::new("env", SelectorOp::In(vec!["prod".into(), "qa".into()]));
        assert!(r.matches(&labels(&[("env", "qa")])));
        assert!(!r.matches(&labels(&[("env", "dev")])));
        assert!(!r.matches(&labels(&[])));

        let r = Requirement::new("env", SelectorOp::NotIn(vec!["prod".into()]));
        assert!(r.matches(&labels(&[("env", "qa")])));
        assert!(r.matches(&labels(&[])));
        assert!(!r.matches(&labels(&[("env", "prod")])));
    }

    #[test]
    fn existence() {
        let set = labels(&[("tier", "")]);
        assert!(Requirement::new("tier", SelectorOp::Exists).matches(&set));
        assert!(!Requirement::new("tier", SelectorOp::NotExists).matches(&set));
        assert!(Requirement::new("zone", SelectorOp::NotExists).matches(&set));
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(LabelSelector::default().matches(&labels(&[])));
        assert!(FieldSelector::default().matches(&FieldMap::new()));
    }

    #[test]
    fn field_missing_compares_as_empty() {
        let eq = FieldRequirement {
            field: "spec.nodeName".into(),
            op: FieldOp::Equals,
            value: String::new(),
        };
        assert!(eq.matches(&FieldMap::new()));
        let neq = FieldRequirement {
            field: "spec.nodeName".into(),
            op: FieldOp::NotEquals,
            value: "node-1".into(),
        };
        assert!(neq.matches(&FieldMap::new()));
    }

    #[test]
    fn display_round_trips_through_parser() {
        let selector: LabelSelector = "fruit=apple,env in (prod,qa),!legacy".parse().unwrap();
        assert_eq!(selector.to_string(), "fruit=apple,env in (prod,qa),!legacy");

        let selector: FieldSelector = r"metadata.name=web,spec.args=a\,b".parse().unwrap();
        assert_eq!(selector.to_string(), r"metadata.name=web,spec.args=a\,b");
    }
}
