//! Rule validation against the attribute registry.
//!
//! Runs before a rule enters a rule set, so the engine only ever sees rules
//! whose shape is known to be legal. Checks run in a fixed order: subject
//! registered, actions non-empty and legal, condition attributes legal,
//! operand shapes consistent, patterns compile.

use crate::condition::{compile_glob, compile_regex};
use crate::errors::{PolicyError, ValidationFailure};
use crate::registry::Registry;
use crate::types::{AttributeValue, OperandShape, Operator, Rule};

/// Validate one rule, reporting the first failure.
pub fn validate(rule: &Rule, registry: &Registry) -> Result<(), ValidationFailure> {
    match validate_all(rule, registry).into_iter().next() {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

/// Validate one rule, collecting every failure so an editing surface can
/// render them all field-level at once.
pub fn validate_all(rule: &Rule, registry: &Registry) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    let spec = match registry.subject(rule.subject) {
        Ok(spec) => spec,
        Err(error) => {
            // Nothing else is checkable without a subject spec.
            failures.push(ValidationFailure {
                rule: rule.id,
                condition: None,
                error,
            });
            return failures;
        }
    };

    if rule.actions.is_empty() {
        failures.push(ValidationFailure {
            rule: rule.id,
            condition: None,
            error: PolicyError::EmptyActions(rule.subject),
        });
    }
    for action in &rule.actions {
        if !spec.actions.contains(action) {
            failures.push(ValidationFailure {
                rule: rule.id,
                condition: None,
                error: PolicyError::IllegalAction {
                    subject: rule.subject,
                    action: *action,
                },
            });
        }
    }

    // Each check category runs across all conditions before the next, so
    // the first reported failure follows the check order, not the condition
    // order: attribute legality, then operand shapes, then compilation.
    let mut attribute_shapes = Vec::with_capacity(rule.conditions.len());
    for condition in &rule.conditions {
        match spec.attributes.get(&condition.attribute) {
            Some(shape) => attribute_shapes.push(Some(*shape)),
            None => {
                failures.push(ValidationFailure {
                    rule: rule.id,
                    condition: Some(condition.id),
                    error: PolicyError::IllegalAttribute {
                        subject: rule.subject,
                        attribute: condition.attribute,
                    },
                });
                attribute_shapes.push(None);
            }
        }
    }

    let mut shape_ok = vec![false; rule.conditions.len()];
    for (index, condition) in rule.conditions.iter().enumerate() {
        let Some(attribute_shape) = attribute_shapes[index] else {
            continue;
        };

        let expected = condition.operator.operand_shape();
        let found = condition.value.shape();
        if expected != found {
            failures.push(ValidationFailure {
                rule: rule.id,
                condition: Some(condition.id),
                error: PolicyError::OperandShapeMismatch {
                    operator: condition.operator,
                    expected,
                    found,
                },
            });
            continue;
        }

        // Pattern operators only apply to string-valued attributes.
        if matches!(condition.operator, Operator::GlobMatch | Operator::RegexMatch)
            && attribute_shape != OperandShape::Scalar
        {
            failures.push(ValidationFailure {
                rule: rule.id,
                condition: Some(condition.id),
                error: PolicyError::OperandShapeMismatch {
                    operator: condition.operator,
                    expected: OperandShape::Scalar,
                    found: attribute_shape,
                },
            });
            continue;
        }

        shape_ok[index] = true;
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        if !shape_ok[index] {
            continue;
        }
        if let AttributeValue::Scalar(pattern) = &condition.value {
            let compiled = match condition.operator {
                Operator::GlobMatch => compile_glob(pattern).map(|_| ()),
                Operator::RegexMatch => compile_regex(pattern).map(|_| ()),
                _ => continue,
            };
            if let Err(error) = compiled {
                failures.push(ValidationFailure {
                    rule: rule.id,
                    condition: Some(condition.id),
                    error,
                });
            }
        }
    }

    failures
}
