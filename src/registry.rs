//! Attribute registry: which actions and condition attributes are legal for
//! each subject type. Pure lookup, immutable after construction.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::PolicyError;
use crate::types::{Action, AttributeName, OperandShape, SubjectType};

/// Legal action set and condition attributes (with their declared value
/// shape) for one subject type.
#[derive(Debug, Clone)]
pub struct SubjectSpec {
    pub actions: BTreeSet<Action>,
    pub attributes: BTreeMap<AttributeName, OperandShape>,
}

impl SubjectSpec {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        SubjectSpec {
            actions: actions.into_iter().collect(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: AttributeName, shape: OperandShape) -> Self {
        self.attributes.insert(name, shape);
        self
    }
}

/// Registry of legal subject/action/attribute combinations.
#[derive(Debug, Clone)]
pub struct Registry {
    subjects: HashMap<SubjectType, SubjectSpec>,
}

impl Registry {
    /// Registry with no subjects. Useful for tests and restricted deployments.
    pub fn empty() -> Self {
        Registry {
            subjects: HashMap::new(),
        }
    }

    /// The built-in project catalog. Most subject types take the four CRUD
    /// actions; audit logs are read-only, secret rollback is read/create,
    /// and the workspace itself only supports edit/delete. Only secrets
    /// carry condition attributes.
    pub fn builtin() -> Self {
        use Action::*;

        let mut registry = Registry::empty();
        registry.register(
            SubjectType::Secrets,
            SubjectSpec::new([Create, Read, Edit, Delete])
                .with_attribute(AttributeName::Environment, OperandShape::Scalar)
                .with_attribute(AttributeName::SecretPath, OperandShape::Scalar)
                .with_attribute(AttributeName::SecretName, OperandShape::Scalar)
                .with_attribute(AttributeName::SecretTags, OperandShape::Set),
        );
        for subject in [
            SubjectType::Environments,
            SubjectType::Integrations,
            SubjectType::Role,
            SubjectType::Member,
            SubjectType::Tags,
            SubjectType::Webhooks,
            SubjectType::ServiceTokens,
            SubjectType::Settings,
            SubjectType::IpAllowlist,
        ] {
            registry.register(subject, SubjectSpec::new([Create, Read, Edit, Delete]));
        }
        registry.register(SubjectType::AuditLogs, SubjectSpec::new([Read]));
        registry.register(SubjectType::SecretRollback, SubjectSpec::new([Read, Create]));
        registry.register(SubjectType::Workspace, SubjectSpec::new([Edit, Delete]));
        registry
    }

    pub fn register(&mut self, subject: SubjectType, spec: SubjectSpec) {
        self.subjects.insert(subject, spec);
    }

    pub fn subject(&self, subject: SubjectType) -> Result<&SubjectSpec, PolicyError> {
        self.subjects
            .get(&subject)
            .ok_or(PolicyError::UnknownSubjectType(subject))
    }

    /// Actions a rule for this subject type may grant or deny.
    pub fn legal_actions(&self, subject: SubjectType) -> Result<&BTreeSet<Action>, PolicyError> {
        Ok(&self.subject(subject)?.actions)
    }

    /// Attribute names usable in conditions on this subject type, with each
    /// attribute's declared value shape.
    pub fn legal_attributes(
        &self,
        subject: SubjectType,
    ) -> Result<&BTreeMap<AttributeName, OperandShape>, PolicyError> {
        Ok(&self.subject(subject)?.attributes)
    }

    /// Declared value shape of one attribute on one subject type.
    pub fn attribute_shape(
        &self,
        subject: SubjectType,
        attribute: AttributeName,
    ) -> Result<OperandShape, PolicyError> {
        self.legal_attributes(subject)?
            .get(&attribute)
            .copied()
            .ok_or(PolicyError::IllegalAttribute { subject, attribute })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_secrets_actions() {
        let registry = Registry::builtin();
        let actions = registry.legal_actions(SubjectType::Secrets).unwrap();
        assert_eq!(actions.len(), 4);
        assert!(actions.contains(&Action::Create));
        assert!(actions.contains(&Action::Delete));
    }

    #[test]
    fn test_builtin_restricted_subjects() {
        let registry = Registry::builtin();

        let audit = registry.legal_actions(SubjectType::AuditLogs).unwrap();
        assert_eq!(audit.iter().copied().collect::<Vec<_>>(), vec![Action::Read]);

        let rollback = registry.legal_actions(SubjectType::SecretRollback).unwrap();
        assert!(rollback.contains(&Action::Read));
        assert!(rollback.contains(&Action::Create));
        assert!(!rollback.contains(&Action::Delete));

        let workspace = registry.legal_actions(SubjectType::Workspace).unwrap();
        assert!(!workspace.contains(&Action::Create));
        assert!(workspace.contains(&Action::Edit));
    }

    #[test]
    fn test_only_secrets_have_condition_attributes() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.legal_attributes(SubjectType::Secrets).unwrap().len(),
            4
        );
        assert!(registry
            .legal_attributes(SubjectType::Environments)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_attribute_shapes() {
        let registry = Registry::builtin();
        assert_eq!(
            registry
                .attribute_shape(SubjectType::Secrets, AttributeName::SecretPath)
                .unwrap(),
            OperandShape::Scalar
        );
        assert_eq!(
            registry
                .attribute_shape(SubjectType::Secrets, AttributeName::SecretTags)
                .unwrap(),
            OperandShape::Set
        );
    }

    #[test]
    fn test_illegal_attribute_lookup() {
        let registry = Registry::builtin();
        let err = registry
            .attribute_shape(SubjectType::Environments, AttributeName::Environment)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::IllegalAttribute {
                subject: SubjectType::Environments,
                attribute: AttributeName::Environment,
            }
        );
    }

    #[test]
    fn test_unknown_subject_type() {
        let registry = Registry::empty();
        let err = registry.legal_actions(SubjectType::Secrets).unwrap_err();
        assert_eq!(err, PolicyError::UnknownSubjectType(SubjectType::Secrets));
    }
}
