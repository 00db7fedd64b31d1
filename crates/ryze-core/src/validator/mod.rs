//! Tree validation and sanitization
//!
//! Model output is untrusted. The validator turns an arbitrary JSON value
//! into a [`ComponentNode`] tree that only uses whitelisted components and
//! carries no script-capable props. It never fails: problems are recorded
//! as errors and repaired in place.

use serde_json::Value;
use thiserror::Error;

use crate::schema::{SchemaRegistry, FALLBACK_COMPONENT};
use crate::types::{Child, ComponentNode, Modification, PlanOutput, PlannedComponent, Props};

/// Prop keys that can inject raw markup.
const RAW_MARKUP_KEYS: &[&str] = &["dangerouslySetInnerHTML", "innerHTML", "outerHTML"];

/// Outcome of validating one tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Human-readable problems, each prefixed with the node path.
    pub errors: Vec<String>,
    /// Repaired tree; `None` only when the root is not an object.
    pub sanitized_tree: Option<ComponentNode>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.sanitized_tree.is_some()
    }
}

/// Whitelist validator bound to a schema registry.
#[derive(Debug, Clone, Copy)]
pub struct TreeValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl Default for TreeValidator<'static> {
    fn default() -> Self {
        Self::new(SchemaRegistry::global())
    }
}

impl<'a> TreeValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, tree: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        let Some(root) = tree.as_object() else {
            errors.push("Component tree must be a non-null object".to_string());
            return ValidationReport {
                errors,
                sanitized_tree: None,
            };
        };
        let sanitized = self.validate_node(root, "root", &mut errors);
        ValidationReport {
            errors,
            sanitized_tree: Some(sanitized),
        }
    }

    fn validate_node(
        &self,
        node: &serde_json::Map<String, Value>,
        path: &str,
        errors: &mut Vec<String>,
    ) -> ComponentNode {
        let Some(component_type) = node.get("type").and_then(Value::as_str) else {
            errors.push(format!("{}: missing or invalid \"type\" field", path));
            return ComponentNode::new(FALLBACK_COMPONENT);
        };
        let Some(schema) = self.registry.get(component_type) else {
            errors.push(format!(
                "{}: unknown component \"{}\" is not in the whitelist",
                path, component_type
            ));
            return ComponentNode::new(FALLBACK_COMPONENT);
        };

        let mut result = ComponentNode::new(schema.name);
        if let Some(props) = node.get("props").and_then(Value::as_object) {
            result.props = sanitize_props(props);
        }

        let Some(children) = node.get("children").and_then(Value::as_array) else {
            return result;
        };
        if !schema.accepts_children {
            if !children.is_empty() {
                errors.push(format!(
                    "{}: component \"{}\" does not accept children, dropped {}",
                    path,
                    schema.name,
                    children.len()
                ));
            }
            return result;
        }

        for (idx, child) in children.iter().enumerate() {
            match child {
                Value::String(text) => result.children.push(Child::Text(text.clone())),
                Value::Object(obj) => {
                    let child_path = format!("{}.children[{}]", path, idx);
                    let node = self.validate_node(obj, &child_path, errors);
                    result.children.push(Child::Node(node));
                }
                _ => {}
            }
        }
        result
    }
}

/// Whether a prop key must never reach the rendered output.
pub fn is_dangerous_prop(key: &str) -> bool {
    key.starts_with("on") || RAW_MARKUP_KEYS.contains(&key)
}

/// Whether a prop key can be written as a plain attribute name.
pub fn is_attribute_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
}

/// Drop dangerous keys, non-attribute keys and null values; everything else
/// passes unchanged.
pub fn sanitize_props(props: &serde_json::Map<String, Value>) -> Props {
    props
        .iter()
        .filter(|(key, value)| {
            !is_dangerous_prop(key) && is_attribute_name(key) && !value.is_null()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Validate against the process-wide registry.
pub fn validate_component_tree(tree: &Value) -> ValidationReport {
    TreeValidator::default().validate(tree)
}

/// Plan output that does not have the minimal expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanShapeError {
    #[error("plan must be a JSON object")]
    NotAnObject,
    #[error("plan field '{0}' must be a string")]
    NotAString(&'static str),
    #[error("plan field 'components' must be an array")]
    ComponentsNotArray,
}

/// Check the plan shape and lift it into a typed [`PlanOutput`].
///
/// Entries of `components` and `modifications` that cannot be read are
/// skipped rather than failing the whole plan.
pub fn validate_plan_output(plan: &Value) -> Result<PlanOutput, PlanShapeError> {
    let obj = plan.as_object().ok_or(PlanShapeError::NotAnObject)?;
    let intent = obj
        .get("intent")
        .and_then(Value::as_str)
        .ok_or(PlanShapeError::NotAString("intent"))?;
    let layout = obj
        .get("layout")
        .and_then(Value::as_str)
        .ok_or(PlanShapeError::NotAString("layout"))?;
    let components = obj
        .get("components")
        .and_then(Value::as_array)
        .ok_or(PlanShapeError::ComponentsNotArray)?;

    let modifications = obj
        .get("modifications")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Modification::from_value).collect())
        .unwrap_or_default();

    Ok(PlanOutput {
        intent: intent.to_string(),
        layout: layout.to_string(),
        components: components
            .iter()
            .filter_map(PlannedComponent::from_value)
            .collect(),
        modifications,
    })
}
