use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of project resource a rule governs. Closed set: the engine
/// checks subject types exhaustively rather than dispatching on open strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectType {
    Secrets,
    Environments,
    Integrations,
    Role,
    Member,
    Tags,
    Webhooks,
    ServiceTokens,
    Settings,
    AuditLogs,
    IpAllowlist,
    SecretRollback,
    Workspace,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Secrets => "secrets",
            SubjectType::Environments => "environments",
            SubjectType::Integrations => "integrations",
            SubjectType::Role => "role",
            SubjectType::Member => "member",
            SubjectType::Tags => "tags",
            SubjectType::Webhooks => "webhooks",
            SubjectType::ServiceTokens => "service-tokens",
            SubjectType::Settings => "settings",
            SubjectType::AuditLogs => "audit-logs",
            SubjectType::IpAllowlist => "ip-allowlist",
            SubjectType::SecretRollback => "secret-rollback",
            SubjectType::Workspace => "workspace",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation kind a rule grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute a condition may compare against. Which names are legal depends
/// on the rule's subject type (see the registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeName {
    Environment,
    SecretPath,
    SecretName,
    SecretTags,
}

impl AttributeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::Environment => "environment",
            AttributeName::SecretPath => "secretPath",
            AttributeName::SecretName => "secretName",
            AttributeName::SecretTags => "secretTags",
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a condition. Wire names match the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Equals,
    #[serde(rename = "$neq")]
    NotEquals,
    #[serde(rename = "$glob")]
    GlobMatch,
    #[serde(rename = "$regex")]
    RegexMatch,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$all")]
    AllOf,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "$eq",
            Operator::NotEquals => "$neq",
            Operator::GlobMatch => "$glob",
            Operator::RegexMatch => "$regex",
            Operator::In => "$in",
            Operator::AllOf => "$all",
        }
    }

    /// Shape the right-hand value of a condition must have for this operator.
    pub fn operand_shape(&self) -> OperandShape {
        match self {
            Operator::Equals
            | Operator::NotEquals
            | Operator::GlobMatch
            | Operator::RegexMatch => OperandShape::Scalar,
            Operator::In | Operator::AllOf => OperandShape::Set,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar vs. set: the shape of a condition operand or of a declared
/// attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    Scalar,
    Set,
}

impl fmt::Display for OperandShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandShape::Scalar => f.write_str("scalar"),
            OperandShape::Set => f.write_str("set"),
        }
    }
}

/// A condition right-hand side or a live resource-attribute value:
/// either one string or a set of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(String),
    Set(BTreeSet<String>),
}

impl AttributeValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        AttributeValue::Scalar(value.into())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn shape(&self) -> OperandShape {
        match self {
            AttributeValue::Scalar(_) => OperandShape::Scalar,
            AttributeValue::Set(_) => OperandShape::Set,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Scalar(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Scalar(value)
    }
}

/// Live attributes of the resource being authorized, supplied fresh on every
/// decision query.
pub type ResourceAttributes = HashMap<AttributeName, AttributeValue>;

/// Opaque, stable identity of a rule. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    pub fn new() -> Self {
        RuleId(Uuid::new_v4())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        RuleId::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque, stable identity of a condition within a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(Uuid);

impl ConditionId {
    pub fn new() -> Self {
        ConditionId(Uuid::new_v4())
    }
}

impl Default for ConditionId {
    fn default() -> Self {
        ConditionId::new()
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One attribute comparison narrowing a rule's applicability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    // Assigned locally at creation; the persisted form does not carry ids.
    #[serde(default = "ConditionId::new", skip_serializing)]
    pub id: ConditionId,
    pub attribute: AttributeName,
    pub operator: Operator,
    pub value: AttributeValue,
}

impl Condition {
    pub fn new(
        attribute: AttributeName,
        operator: Operator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Condition {
            id: ConditionId::new(),
            attribute,
            operator,
            value: value.into(),
        }
    }
}

/// Subject + actions + conditions + allow/deny polarity.
///
/// `inverted = true` marks an explicit DENY rule. An empty condition list
/// matches every resource of the rule's subject type; conditions within one
/// rule combine with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    // Assigned locally at creation; the persisted form does not carry ids.
    #[serde(default = "RuleId::new", skip_serializing)]
    pub id: RuleId,
    pub subject: SubjectType,
    pub actions: BTreeSet<Action>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn allow(subject: SubjectType, actions: impl IntoIterator<Item = Action>) -> Self {
        Rule {
            id: RuleId::new(),
            subject,
            actions: actions.into_iter().collect(),
            inverted: false,
            conditions: Vec::new(),
        }
    }

    pub fn deny(subject: SubjectType, actions: impl IntoIterator<Item = Action>) -> Self {
        Rule {
            inverted: true,
            ..Rule::allow(subject, actions)
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Ordered collection of rules forming one role's policy. Order is
/// significant only for audit output; the engine's combination policy is
/// order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&SubjectType::ServiceTokens).unwrap(),
            "\"service-tokens\""
        );
        assert_eq!(
            serde_json::from_str::<SubjectType>("\"audit-logs\"").unwrap(),
            SubjectType::AuditLogs
        );
        assert_eq!(SubjectType::SecretRollback.to_string(), "secret-rollback");
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(serde_json::to_string(&Operator::GlobMatch).unwrap(), "\"$glob\"");
        assert_eq!(
            serde_json::from_str::<Operator>("\"$neq\"").unwrap(),
            Operator::NotEquals
        );
    }

    #[test]
    fn test_operand_shapes() {
        assert_eq!(Operator::Equals.operand_shape(), OperandShape::Scalar);
        assert_eq!(Operator::RegexMatch.operand_shape(), OperandShape::Scalar);
        assert_eq!(Operator::In.operand_shape(), OperandShape::Set);
        assert_eq!(Operator::AllOf.operand_shape(), OperandShape::Set);
    }

    #[test]
    fn test_attribute_value_untagged() {
        let scalar: AttributeValue = serde_json::from_str("\"prod\"").unwrap();
        assert_eq!(scalar, AttributeValue::scalar("prod"));
        assert_eq!(scalar.shape(), OperandShape::Scalar);

        let set: AttributeValue = serde_json::from_str("[\"dev\",\"staging\"]").unwrap();
        assert_eq!(set, AttributeValue::set(["dev", "staging"]));
        assert_eq!(set.shape(), OperandShape::Set);
    }

    #[test]
    fn test_rule_deserialize_assigns_ids() {
        let json = r#"{
            "subject": "secrets",
            "actions": ["read", "edit"],
            "conditions": [
                { "attribute": "environment", "operator": "$eq", "value": "prod" }
            ]
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.subject, SubjectType::Secrets);
        assert!(rule.actions.contains(&Action::Read));
        assert!(rule.actions.contains(&Action::Edit));
        assert!(!rule.inverted);
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.conditions[0].attribute, AttributeName::Environment);
        assert_eq!(rule.conditions[0].operator, Operator::Equals);

        // Two parses of the same document get distinct identities.
        let again: Rule = serde_json::from_str(json).unwrap();
        assert_ne!(rule.id, again.id);
        assert_ne!(rule.conditions[0].id, again.conditions[0].id);
    }

    #[test]
    fn test_rule_set_transparent_wire_form() {
        let json = r#"[
            { "subject": "secrets", "actions": ["read"] },
            { "subject": "environments", "actions": ["create"], "inverted": true }
        ]"#;
        let set: RuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.rules[1].inverted);
        assert!(set.rules[0].conditions.is_empty());
    }

    #[test]
    fn test_serialized_rule_carries_no_ids() {
        let rule = Rule::deny(SubjectType::Secrets, [Action::Delete]).with_conditions(vec![
            Condition::new(
                AttributeName::SecretPath,
                Operator::GlobMatch,
                "/admin/*",
            ),
        ]);
        let wire: serde_json::Value = serde_json::to_value(&rule).unwrap();
        assert!(wire.get("id").is_none());
        assert!(wire["conditions"][0].get("id").is_none());
        assert_eq!(wire["subject"], "secrets");
        assert_eq!(wire["inverted"], true);

        // Round trip preserves content; identities are assigned afresh.
        let back: Rule = serde_json::from_value(wire).unwrap();
        assert_ne!(back.id, rule.id);
        assert_eq!(back.subject, rule.subject);
        assert_eq!(back.actions, rule.actions);
        assert_eq!(back.inverted, rule.inverted);
        assert_eq!(back.conditions[0].attribute, rule.conditions[0].attribute);
        assert_eq!(back.conditions[0].operator, rule.conditions[0].operator);
        assert_eq!(back.conditions[0].value, rule.conditions[0].value);
    }
}
