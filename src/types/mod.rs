mod decision;
mod error;
mod field_map;
mod object;
mod patch;
mod rule;
mod ruleset;
mod selector;
mod template;
mod verdict;

pub use decision::Decision;
pub use error::{CompileError, EvalError, FetchError};
pub use field_map::FieldMap;
pub use object::{lookup_labels, lookup_yaml_labels, CandidateObject, Labels, ObjectMeta};
pub use patch::{PatchDocument, PatchOp, PatchOperation, ANNOTATIONS_PATH, LABELS_PATH};
pub(crate) use rule::{CompiledMatchers, CompiledPayload, CompiledRule};
pub use rule::{BooleanOperator, Matchers, Payload, Rule};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use selector::{
    FieldOp, FieldRequirement, FieldSelector, LabelSelector, Requirement, SelectorOp,
};
pub use template::{Segment, Template};
pub use verdict::Verdict;
