//! PlanOutput type definition
//!
//! PlanOutput is produced by the planner stage and consumed by the generator.
//! It is never persisted on its own.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Props;

/// Structured plan for one generation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutput {
    /// Brief description of what the user wants.
    pub intent: String,
    /// Description of the overall layout structure.
    pub layout: String,
    /// Components to place, in order.
    pub components: Vec<PlannedComponent>,
    /// Incremental changes against the previous tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<Modification>,
}

/// A component the planner intends to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Props::is_empty")]
    pub props: Props,
    /// Free-text description of the children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}

/// Kind of incremental change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationAction {
    Add,
    Remove,
    Update,
}

impl ModificationAction {
    /// Parse the action label used in planner output.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// One incremental change against the previous tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub action: ModificationAction,
    pub target: String,
    pub details: String,
}

impl PlannedComponent {
    /// Build a planned component from a loosely-typed JSON entry.
    ///
    /// Planner output is model text, so non-string descriptions are kept as
    /// their JSON rendering instead of being rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let component_type = obj.get("type")?.as_str()?.to_string();
        let props = obj
            .get("props")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self {
            component_type,
            props,
            children: obj.get("children").and_then(describe_value),
            placement: obj.get("placement").and_then(describe_value),
        })
    }
}

impl Modification {
    /// Build a modification from a loosely-typed JSON entry.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let action = ModificationAction::parse(obj.get("action")?.as_str()?)?;
        Some(Self {
            action,
            target: obj.get("target").and_then(describe_value).unwrap_or_default(),
            details: obj
                .get("details")
                .and_then(describe_value)
                .unwrap_or_default(),
        })
    }
}

fn describe_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_planned_component_from_loose_value() {
        let component = PlannedComponent::from_value(&json!({
            "type": "Card",
            "props": {"title": "Login"},
            "children": ["Input", "Button"],
            "placement": "center"
        }))
        .expect("component");
        assert_eq!(component.component_type, "Card");
        assert_eq!(component.children.as_deref(), Some(r#"["Input","Button"]"#));
        assert_eq!(component.placement.as_deref(), Some("center"));
    }

    #[test]
    fn test_modification_requires_known_action() {
        assert!(Modification::from_value(&json!({"action":"rename","target":"x"})).is_none());
        let m = Modification::from_value(&json!({"action":"Update","target":"Button","details":"fullWidth"}))
            .expect("modification");
        assert_eq!(m.action, ModificationAction::Update);
    }
}
