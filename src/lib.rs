//! Rule engine for a Kubernetes mutating admission webhook that paints
//! labels and annotations onto objects.
//!
//! A [`RuleSet`] selects objects with label, field and namespace selectors
//! and produces a JSON Patch adding the rule's payload. Namespace labels come
//! from a shared [`NamespaceCache`].

pub mod admission;
mod compile;
mod error;
mod evaluate;
mod flatten;
#[cfg(feature = "kube")]
mod kube_fetcher;
mod matcher;
pub mod namespace;
pub mod parse;
mod patch;
mod types;

pub use admission::{AdmissionOutcome, AdmissionReview, AdmissionStatus};
pub use error::GraffitiError;
pub use evaluate::apply;
pub use flatten::{flatten, flatten_value};
#[cfg(feature = "kube")]
pub use kube_fetcher::KubeNamespaceFetcher;
pub use matcher::matches;
pub use namespace::{
    resolve_namespace_labels, NamespaceCache, NamespaceFetcher, NamespaceLookup, NamespaceScope,
};
pub use patch::build_patch;
pub use types::{
    lookup_labels, lookup_yaml_labels, BooleanOperator, CandidateObject, CompileError, Decision,
    EvalError, FetchError, FieldMap, FieldOp, FieldRequirement, FieldSelector, LabelSelector,
    Labels, Matchers, ObjectMeta, PatchDocument, PatchOp, PatchOperation, Payload, Requirement,
    Rule, RuleBuilder, RuleSet, RuleSetBuilder, Segment, SelectorOp, Template, Verdict,
    ANNOTATIONS_PATH, LABELS_PATH,
};
