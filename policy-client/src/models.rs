//! Wire models for the administrative API.
//!
//! Records returned by the service carry many more fields than these
//! structs declare; unknown fields are ignored on purpose so that listing
//! keeps working across API revisions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Key of the implicit resource that user attributes hang off.
pub const USER_RESOURCE_KEY: &str = "__user";

/// Check a key against `^[a-z][a-z0-9_-]*$`.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionDef>,
}

impl Resource {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            actions: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an action whose display name is derived from its key.
    pub fn with_action(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        let name = title_case(&key);
        self.actions.insert(key, ActionDef::new(name));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            permissions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Bool,
    Array,
    /// Any type this tool does not manage (json, time, ...).
    #[serde(other)]
    Unknown,
}

impl AttributeType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "string" => Some(AttributeType::String),
            "number" => Some(AttributeType::Number),
            "bool" | "boolean" => Some(AttributeType::Bool),
            "array" => Some(AttributeType::Array),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Bool => "bool",
            AttributeType::Array => "array",
            AttributeType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Attribute on the implicit `__user` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttribute {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UserAttribute {
    pub fn new(key: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            key: key.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Comparison applied by a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    ArrayContains,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::ArrayContains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::ArrayContains => "array_contains",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == raw.trim())
    }
}

/// `{ "<scope>.<attribute>": { <operator>: <value> } }`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    /// Predicate over a subject attribute, always using the `user.` scope.
    pub fn user(attribute: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(format!("user.{}", attribute), operator, value)
    }

    /// Predicate over a resource attribute.
    pub fn resource(attribute: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(format!("resource.{}", attribute), operator, value)
    }

    fn to_value(&self) -> Value {
        json!({ self.attribute.as_str(): { self.operator.as_str(): self.value } })
    }
}

/// Conjunction of single-attribute predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub all_of: Vec<Predicate>,
}

impl Conditions {
    pub fn all_of(predicates: Vec<Predicate>) -> Self {
        Self { all_of: predicates }
    }

    pub fn to_value(&self) -> Value {
        let items: Vec<Value> = self.all_of.iter().map(Predicate::to_value).collect();
        json!({ "allOf": items })
    }

    /// Parse the flat `allOf` form. Nested trees are rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.get("allOf")?.as_array()?;
        let mut all_of = Vec::with_capacity(items.len());
        for item in items {
            let (attribute, comparison) = single_entry(item.as_object()?)?;
            let (op, operand) = single_entry(comparison.as_object()?)?;
            all_of.push(Predicate {
                attribute: attribute.clone(),
                operator: Operator::parse(op)?,
                value: operand.clone(),
            });
        }
        Some(Self { all_of })
    }
}

fn single_entry(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    if map.len() != 1 {
        return None;
    }
    map.iter().next()
}

impl Serialize for Conditions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Discriminant of a condition set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionSetKind {
    #[serde(rename = "userset")]
    UserSet,
    #[serde(rename = "resourceset")]
    ResourceSet,
}

impl fmt::Display for ConditionSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionSetKind::UserSet => f.write_str("userset"),
            ConditionSetKind::ResourceSet => f.write_str("resourceset"),
        }
    }
}

/// A user set or resource set.
///
/// `conditions` is kept as raw JSON so that sets built elsewhere with
/// nested trees still list cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ConditionSetKind,
    /// Resource a resource set is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub conditions: Value,
}

impl ConditionSet {
    pub fn user_set(key: impl Into<String>, name: impl Into<String>, conditions: Conditions) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            kind: ConditionSetKind::UserSet,
            resource_id: None,
            conditions: conditions.to_value(),
        }
    }

    pub fn resource_set(
        key: impl Into<String>,
        name: impl Into<String>,
        resource: impl Into<String>,
        conditions: Conditions,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            kind: ConditionSetKind::ResourceSet,
            resource_id: Some(resource.into()),
            conditions: conditions.to_value(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_user_set(&self) -> bool {
        self.kind == ConditionSetKind::UserSet
    }
}

/// `resource:action`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: String,
    pub action: String,
}

impl Permission {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (resource, action) = raw.trim().split_once(':')?;
        if is_valid_key(resource) && is_valid_key(action) {
            Some(Self::new(resource, action))
        } else {
            None
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Grant linking a user set, a resource set and a permission.
///
/// Identified only by the triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRule {
    pub user_set: String,
    pub permission: String,
    pub resource_set: String,
}

impl SetRule {
    pub fn new(
        user_set: impl Into<String>,
        resource_set: impl Into<String>,
        permission: &Permission,
    ) -> Self {
        Self {
            user_set: user_set.into(),
            permission: permission.to_string(),
            resource_set: resource_set.into(),
        }
    }
}

impl fmt::Display for SetRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.user_set, self.permission, self.resource_set)
    }
}

/// Resource set the service generates for every resource.
pub fn autogen_resource_set(resource: &str) -> String {
    format!("__autogen_{}", resource)
}

pub(crate) fn title_case(key: &str) -> String {
    key.split(|c| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("invoice"));
        assert!(is_valid_key("shift-plan_2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Invoice"));
        assert!(!is_valid_key("2fast"));
        assert!(!is_valid_key("__user"));
        assert!(!is_valid_key("has space"));
    }

    #[test]
    fn test_resource_body() {
        let resource = Resource::new("invoice", "Invoice")
            .with_action("read")
            .with_action("create");
        let body = serde_json::to_value(&resource).unwrap();
        assert_eq!(body["key"], "invoice");
        assert_eq!(body["actions"]["read"]["name"], "Read");
        assert_eq!(body["actions"]["create"]["name"], "Create");
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_resource_ignores_unknown_fields() {
        let resource: Resource = serde_json::from_value(json!({
            "key": "invoice",
            "name": "Invoice",
            "id": "b0f5",
            "created_at": "2024-01-01T00:00:00Z",
            "actions": {"read": {"name": "Read", "id": "a1"}}
        }))
        .unwrap();
        assert_eq!(resource.actions.len(), 1);
    }

    #[test]
    fn test_conditions_shape() {
        let conditions = Conditions::all_of(vec![
            Predicate::user("groups", Operator::ArrayContains, "admins"),
            Predicate::user("email", Operator::EndsWith, "@horaion.io"),
        ]);
        assert_eq!(
            conditions.to_value(),
            json!({"allOf": [
                {"user.groups": {"array_contains": "admins"}},
                {"user.email": {"ends_with": "@horaion.io"}}
            ]})
        );
        assert_eq!(Conditions::from_value(&conditions.to_value()), Some(conditions));
    }

    #[test]
    fn test_conditions_rejects_nested_tree() {
        let nested = json!({"allOf": [{"anyOf": [{"user.a": {"equals": 1}}]}]});
        assert_eq!(Conditions::from_value(&nested), None);
    }

    #[test]
    fn test_condition_set_discriminant() {
        let set = ConditionSet::user_set("admins", "Admins", Conditions::default());
        let body = serde_json::to_value(&set).unwrap();
        assert_eq!(body["type"], "userset");
        assert!(body.get("resource_id").is_none());

        let set = ConditionSet::resource_set("open", "Open", "invoice", Conditions::default());
        let body = serde_json::to_value(&set).unwrap();
        assert_eq!(body["type"], "resourceset");
        assert_eq!(body["resource_id"], "invoice");
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::parse("invoice:read"), Some(Permission::new("invoice", "read")));
        assert_eq!(Permission::parse("invoice"), None);
        assert_eq!(Permission::parse("invoice:"), None);
        assert_eq!(Permission::parse("Invoice:read"), None);
        assert_eq!(Permission::new("shift", "approve").to_string(), "shift:approve");
    }

    #[test]
    fn test_attribute_type_unknown_variant() {
        let attr: UserAttribute =
            serde_json::from_value(json!({"key": "meta", "type": "json"})).unwrap();
        assert_eq!(attr.kind, AttributeType::Unknown);
        assert_eq!(AttributeType::parse("Boolean"), Some(AttributeType::Bool));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("read"), "Read");
        assert_eq!(title_case("bulk_export"), "Bulk Export");
    }
}
