use miette::Diagnostic;
use thiserror::Error;

use crate::types::{Action, AttributeName, ConditionId, OperandShape, Operator, RuleId, SubjectType};

/// Rule-shape and evaluation errors. Everything except `MissingAttribute` is
/// caught at validation time; `MissingAttribute` is non-fatal and callers
/// treat it as a non-match.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum PolicyError {
    #[error("unknown subject type `{0}`")]
    #[diagnostic(
        code(palisade::unknown_subject_type),
        help("Only subject types present in the attribute registry may appear in rules")
    )]
    UnknownSubjectType(SubjectType),

    #[error("action `{action}` is not legal for subject type `{subject}`")]
    #[diagnostic(
        code(palisade::illegal_action),
        help("Query the registry's legal_actions for the set this subject type supports")
    )]
    IllegalAction { subject: SubjectType, action: Action },

    #[error("rule for `{0}` grants no actions")]
    #[diagnostic(
        code(palisade::empty_actions),
        help("A rule must name at least one action; delete the rule instead of emptying it")
    )]
    EmptyActions(SubjectType),

    #[error("attribute `{attribute}` cannot be used in conditions on `{subject}`")]
    #[diagnostic(
        code(palisade::illegal_attribute),
        help("Query the registry's legal_attributes for the names this subject type supports")
    )]
    IllegalAttribute {
        subject: SubjectType,
        attribute: AttributeName,
    },

    #[error("operator `{operator}` requires a {expected} value, got a {found}")]
    #[diagnostic(
        code(palisade::operand_shape_mismatch),
        help("$eq/$neq/$glob/$regex take one string; $in/$all take a set of strings, and pattern operators only apply to string-valued attributes")
    )]
    OperandShapeMismatch {
        operator: Operator,
        expected: OperandShape,
        found: OperandShape,
    },

    #[error("invalid regular expression `{pattern}`: {reason}")]
    #[diagnostic(
        code(palisade::invalid_regex_pattern),
        help("Patterns must compile under the regex crate's linear-time syntax (no backreferences or look-around)")
    )]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("invalid glob pattern `{pattern}`: {reason}")]
    #[diagnostic(
        code(palisade::invalid_glob_pattern),
        help("Globs support `*` and `?` wildcards and character classes like `[ab]`")
    )]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("resource attributes have no value for `{0}`")]
    #[diagnostic(
        code(palisade::missing_attribute),
        help("A condition on an absent attribute is a non-match, not an evaluation failure")
    )]
    MissingAttribute(AttributeName),
}

/// A validation error tied to the rule (and optionally the condition) that
/// caused it, so an editing surface can render it field-level.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("rule {rule} rejected: {error}")]
pub struct ValidationFailure {
    pub rule: RuleId,
    pub condition: Option<ConditionId>,
    #[source]
    pub error: PolicyError,
}

/// Errors surfaced by the rule set editor model.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum EditError {
    #[error("rule set has moved on from version {expected} (now at {actual})")]
    #[diagnostic(
        code(palisade::conflicting_edit),
        help("Re-fetch the rule set and re-apply the edit against the current version")
    )]
    ConflictingEdit { expected: u64, actual: u64 },

    #[error("position {position} is out of range for a rule set of {len} rules")]
    #[diagnostic(code(palisade::position_out_of_range))]
    PositionOutOfRange { position: usize, len: usize },

    #[error("no rule with id {0}")]
    #[diagnostic(code(palisade::unknown_rule))]
    UnknownRule(RuleId),

    #[error("rule {rule} has no condition with id {condition}")]
    #[diagnostic(code(palisade::unknown_condition))]
    UnknownCondition { rule: RuleId, condition: ConditionId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rejected(#[from] ValidationFailure),
}

/// Errors surfaced while ingesting a serialized rule set snapshot.
#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error("malformed rule set document: {0}")]
    #[diagnostic(
        code(palisade::malformed_snapshot),
        help("The persisted form is a JSON array of {{ subject, actions, inverted, conditions }} objects")
    )]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] ValidationFailure),
}
