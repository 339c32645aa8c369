use std::fmt;

use super::decision::Decision;

/// The decision one rule reached for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    rule: String,
    decision: Decision,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.decision)
    }
}

impl Verdict {
    pub fn new(rule: impl Into<String>, decision: Decision) -> Self {
        Self {
            rule: rule.into(),
            decision,
        }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    #[must_use]
    pub fn into_decision(self) -> Decision {
        self.decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvalError;

    #[test]
    fn new_verdict() {
        let v = Verdict::new("paint-web", Decision::MatchNoChange);
        assert_eq!(v.rule(), "paint-web");
        assert!(v.decision().is_match());
    }

    #[test]
    fn verdict_display() {
        let v = Verdict::new("paint-web", Decision::NoMatch);
        assert_eq!(v.to_string(), "paint-web: no match");

        let v = Verdict::new("paint-web", Decision::Error(EvalError::NoKind));
        assert_eq!(v.to_string(), "paint-web: error: object has no kind");
    }

    #[test]
    fn verdict_inequality() {
        let v1 = Verdict::new("a", Decision::NoMatch);
        let v2 = Verdict::new("b", Decision::NoMatch);
        assert_ne!(v1, v2);
    }
}
