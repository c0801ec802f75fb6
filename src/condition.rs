//! Condition evaluation for permission rules.
//!
//! Supported operators:
//! - `$eq` / `$neq`: exact, case-sensitive string comparison
//! - `$glob`: glob pattern match (`*`, `?` wildcards)
//! - `$regex`: regular expression match
//! - `$in`: membership of the attribute value in a set of strings
//! - `$all`: every required string present in the attribute's set of values

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::errors::PolicyError;
use crate::types::{AttributeValue, Condition, Operator, ResourceAttributes};

/// Evaluate one condition against a resource-attribute mapping.
///
/// The only error surface is `MissingAttribute`, raised when the mapping has
/// no value for the condition's attribute; callers must treat it as a
/// non-match. Shape surprises (a set-valued attribute under a scalar
/// operator, a pattern that fails to compile) are non-matches rather than
/// errors, keeping evaluation fail-closed.
pub fn evaluate(condition: &Condition, attributes: &ResourceAttributes) -> Result<bool, PolicyError> {
    let value = attributes
        .get(&condition.attribute)
        .ok_or(PolicyError::MissingAttribute(condition.attribute))?;

    let matched = match condition.operator {
        Operator::Equals => match (value, &condition.value) {
            (AttributeValue::Scalar(have), AttributeValue::Scalar(want)) => have == want,
            _ => false,
        },
        Operator::NotEquals => match (value, &condition.value) {
            (AttributeValue::Scalar(have), AttributeValue::Scalar(want)) => have != want,
            _ => false,
        },
        Operator::GlobMatch => match (value, &condition.value) {
            (AttributeValue::Scalar(have), AttributeValue::Scalar(pattern)) => {
                match compile_glob(pattern) {
                    Ok(matcher) => matcher.is_match(have),
                    Err(_) => false,
                }
            }
            _ => false,
        },
        Operator::RegexMatch => match (value, &condition.value) {
            (AttributeValue::Scalar(have), AttributeValue::Scalar(pattern)) => {
                match compile_regex(pattern) {
                    Ok(re) => re.is_match(have),
                    Err(_) => false,
                }
            }
            _ => false,
        },
        Operator::In => match &condition.value {
            // A scalar attribute is treated as a singleton set; a set-valued
            // attribute must be wholly contained in the right-hand set.
            AttributeValue::Set(allowed) => match value {
                AttributeValue::Scalar(have) => allowed.contains(have),
                AttributeValue::Set(have) => have.iter().all(|v| allowed.contains(v)),
            },
            AttributeValue::Scalar(_) => false,
        },
        Operator::AllOf => match &condition.value {
            // True only if every required string is present in the
            // attribute's value set.
            AttributeValue::Set(required) => match value {
                AttributeValue::Scalar(have) => required.iter().all(|r| r == have),
                AttributeValue::Set(have) => required.iter().all(|r| have.contains(r)),
            },
            AttributeValue::Scalar(_) => false,
        },
    };

    Ok(matched)
}

/// Compile a glob pattern, mapping failures to the validation error.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher, PolicyError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| PolicyError::InvalidGlobPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Compile a regular expression, mapping failures to the validation error.
pub fn compile_regex(pattern: &str) -> Result<Regex, PolicyError> {
    Regex::new(pattern).map_err(|e| PolicyError::InvalidRegexPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
