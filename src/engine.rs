//! Permission engine: combines rule-level matches into a verdict.
//!
//! The combination policy is order-independent by design: explicit deny
//! overrides allow, and the absence of a matching allow rule is a deny.
//! Reordering rules never changes an authorization outcome.

use serde::Serialize;

use crate::condition;
use crate::types::{Action, ResourceAttributes, Rule, RuleId, RuleSet, SubjectType};

/// The outcome of evaluating a request against a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

/// Verdict plus the identity of the rule that decided it, for audit and
/// explain output. `matched_rule` is `None` when no rule matched and the
/// default deny applied. The authorization boundary reports only a
/// categorical "not permitted" to the caller; rule identities stay on the
/// audit side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub matched_rule: Option<RuleId>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}

/// Decide whether `action` on a resource with the given live attributes is
/// permitted for `subject` under the rule set.
///
/// Pure and synchronous: reads an immutable snapshot, touches no shared
/// state, and is safe to call concurrently from any number of tasks.
pub fn decide(
    rule_set: &RuleSet,
    subject: SubjectType,
    action: Action,
    attributes: &ResourceAttributes,
) -> Decision {
    let mut matched_allow: Option<RuleId> = None;

    for rule in rule_set.iter() {
        if rule.subject != subject || !rule.actions.contains(&action) {
            continue;
        }
        if !rule_matches(rule, attributes) {
            continue;
        }
        if rule.inverted {
            // Explicit deny wins over any matching allow rule.
            return Decision {
                verdict: Verdict::Deny,
                matched_rule: Some(rule.id),
            };
        }
        matched_allow.get_or_insert(rule.id);
    }

    match matched_allow {
        Some(id) => Decision {
            verdict: Verdict::Allow,
            matched_rule: Some(id),
        },
        // Fail-closed: no matching allow rule is not permission.
        None => Decision {
            verdict: Verdict::Deny,
            matched_rule: None,
        },
    }
}

/// A rule matches iff every one of its conditions evaluates true. An empty
/// condition list matches everything; a condition whose attribute is missing
/// from the mapping is a non-match.
fn rule_matches(rule: &Rule, attributes: &ResourceAttributes) -> bool {
    rule.conditions
        .iter()
        .all(|c| condition::evaluate(c, attributes).unwrap_or(false))
}
