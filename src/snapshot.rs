//! Rule set ingestion from the persistence layer.
//!
//! The persisted form is a JSON array of rules; the engine only ever sees a
//! snapshot that has passed validation wholesale, so evaluation can stay
//! error-free.

use crate::errors::SnapshotError;
use crate::registry::Registry;
use crate::types::RuleSet;
use crate::validate;

/// Deserialize a serialized rule set and validate every rule against the
/// registry.
pub fn from_json(document: &str, registry: &Registry) -> Result<RuleSet, SnapshotError> {
    let rule_set: RuleSet = serde_json::from_str(document)?;
    compile(rule_set, registry)
}

/// Validate an already-deserialized rule set before handing it to the engine.
pub fn compile(rule_set: RuleSet, registry: &Registry) -> Result<RuleSet, SnapshotError> {
    for rule in rule_set.iter() {
        validate::validate(rule, registry)?;
    }

    tracing::info!(
        rules = rule_set.len(),
        conditions = rule_set.iter().map(|r| r.conditions.len()).sum::<usize>(),
        "Loaded rule set snapshot"
    );

    Ok(rule_set)
}
