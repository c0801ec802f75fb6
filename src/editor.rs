//! In-memory rule set editor model.
//!
//! An ordered collection of rules with stable rule/condition identities:
//! structural edits address rules by position, condition edits address them
//! by id, so an interactive surface survives concurrent inserts and removals.
//! Every mutation validates the affected rule on a copy before committing; a
//! failed validation leaves the rule set untouched. Each mutation also takes
//! the caller's expected version for optimistic concurrency — a stale-version
//! edit fails with a conflict instead of silently overwriting.

use crate::errors::{EditError, ValidationFailure};
use crate::registry::Registry;
use crate::types::{Condition, ConditionId, Rule, RuleId, RuleSet};
use crate::validate;

#[derive(Debug, Clone)]
pub struct RuleSetEditor {
    registry: Registry,
    rules: Vec<Rule>,
    version: u64,
}

impl RuleSetEditor {
    /// An empty rule set, as created alongside a new role.
    pub fn new(registry: Registry) -> Self {
        RuleSetEditor {
            registry,
            rules: Vec::new(),
            version: 0,
        }
    }

    /// Start editing a persisted rule set. Every rule is re-validated so a
    /// snapshot that drifted from the registry cannot be edited blind.
    pub fn from_snapshot(registry: Registry, snapshot: RuleSet) -> Result<Self, ValidationFailure> {
        for rule in &snapshot.rules {
            validate::validate(rule, &registry)?;
        }
        Ok(RuleSetEditor {
            registry,
            rules: snapshot.rules,
            version: 0,
        })
    }

    /// Current version, advanced by one on every committed mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Immutable snapshot for the permission engine.
    pub fn snapshot(&self) -> RuleSet {
        RuleSet::new(self.rules.clone())
    }

    /// Insert a rule at a 0-based position. Positions are stable only until
    /// the next mutation; callers re-fetch after each edit.
    pub fn insert_at(
        &mut self,
        expected_version: u64,
        position: usize,
        rule: Rule,
    ) -> Result<RuleId, EditError> {
        self.guard(expected_version)?;
        if position > self.rules.len() {
            return Err(EditError::PositionOutOfRange {
                position,
                len: self.rules.len(),
            });
        }
        validate::validate(&rule, &self.registry)?;
        let id = rule.id;
        self.rules.insert(position, rule);
        self.version += 1;
        Ok(id)
    }

    /// Remove and return the rule at a 0-based position.
    pub fn remove_at(&mut self, expected_version: u64, position: usize) -> Result<Rule, EditError> {
        self.guard(expected_version)?;
        if position >= self.rules.len() {
            return Err(EditError::PositionOutOfRange {
                position,
                len: self.rules.len(),
            });
        }
        let removed = self.rules.remove(position);
        self.version += 1;
        Ok(removed)
    }

    /// Apply an arbitrary edit to a rule's condition list. The edit runs on a
    /// copy; if the edited rule fails validation the rule set is unchanged.
    pub fn update_conditions<F>(
        &mut self,
        expected_version: u64,
        rule: RuleId,
        edit: F,
    ) -> Result<(), EditError>
    where
        F: FnOnce(&mut Vec<Condition>),
    {
        self.guard(expected_version)?;
        let index = self.index_of(rule)?;

        let mut candidate = self.rules[index].clone();
        edit(&mut candidate.conditions);
        if let Err(failure) = validate::validate(&candidate, &self.registry) {
            tracing::debug!(rule = %rule, error = %failure, "condition edit rejected");
            return Err(failure.into());
        }

        self.rules[index] = candidate;
        self.version += 1;
        Ok(())
    }

    /// Append a condition to a rule, returning the condition's stable id.
    pub fn append_condition(
        &mut self,
        expected_version: u64,
        rule: RuleId,
        condition: Condition,
    ) -> Result<ConditionId, EditError> {
        let id = condition.id;
        self.update_conditions(expected_version, rule, |conditions| {
            conditions.push(condition);
        })?;
        Ok(id)
    }

    /// Remove a condition by id, returning it.
    pub fn remove_condition(
        &mut self,
        expected_version: u64,
        rule: RuleId,
        condition: ConditionId,
    ) -> Result<Condition, EditError> {
        self.guard(expected_version)?;
        let index = self.index_of(rule)?;
        let position = self.rules[index]
            .conditions
            .iter()
            .position(|c| c.id == condition)
            .ok_or(EditError::UnknownCondition { rule, condition })?;

        let mut candidate = self.rules[index].clone();
        let removed = candidate.conditions.remove(position);
        validate::validate(&candidate, &self.registry)?;

        self.rules[index] = candidate;
        self.version += 1;
        Ok(removed)
    }

    fn guard(&self, expected_version: u64) -> Result<(), EditError> {
        if expected_version != self.version {
            return Err(EditError::ConflictingEdit {
                expected: expected_version,
                actual: self.version,
            });
        }
        Ok(())
    }

    fn index_of(&self, rule: RuleId) -> Result<usize, EditError> {
        self.rules
            .iter()
            .position(|r| r.id == rule)
            .ok_or(EditError::UnknownRule(rule))
    }
}
