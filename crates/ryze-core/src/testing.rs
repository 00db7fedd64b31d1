//! Proptest strategies for untrusted component trees.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::schema::SchemaRegistry;

/// Keys the sanitizer must strip, mixed into generated props.
const HOSTILE_KEYS: &[&str] = &[
    "onClick",
    "onmouseover",
    "onLoad",
    "on",
    "dangerouslySetInnerHTML",
    "innerHTML",
    "outerHTML",
];

/// Any prop value, including nulls and nested structures.
pub fn prop_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<String>().prop_map(Value::from),
        "[a-z \"\\\\{}<>/);]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(2, 12, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{0,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

pub fn prop_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z_][a-zA-Z0-9_:.-]{0,8}",
        2 => prop::sample::select(HOSTILE_KEYS).prop_map(str::to_string),
        1 => "on[A-Z][a-z]{0,6}",
        1 => "[ -~]{0,6}",
    ]
}

pub fn props() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec((prop_key(), prop_value()), 0..5)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Mostly whitelisted names, some unknown, some missing or non-string.
pub fn component_type() -> impl Strategy<Value = Value> {
    let names: Vec<&'static str> = SchemaRegistry::global().names().into_iter().collect();
    prop_oneof![
        6 => prop::sample::select(names).prop_map(Value::from),
        1 => "[a-z]{1,8}".prop_map(Value::from),
        1 => "[A-Z][a-z]{2,8}".prop_map(Value::from),
        1 => Just(Value::Null),
        1 => any::<i32>().prop_map(Value::from),
    ]
}

fn node(component_type: Value, props: Map<String, Value>, children: Option<Vec<Value>>) -> Value {
    let mut node = json!({ "props": props });
    if !component_type.is_null() {
        node["type"] = component_type;
    }
    if let Some(children) = children {
        node["children"] = Value::Array(children);
    }
    node
}

/// Raw model output: nested objects shaped roughly like component trees.
pub fn raw_tree() -> impl Strategy<Value = Value> {
    let leaf = (component_type(), props()).prop_map(|(t, p)| node(t, p, None));
    leaf.prop_recursive(4, 32, 5, |inner| {
        let child = prop_oneof![
            4 => inner,
            2 => any::<String>().prop_map(Value::from),
            1 => any::<i32>().prop_map(Value::from),
            1 => Just(Value::Null),
        ];
        (
            component_type(),
            props(),
            prop::collection::vec(child, 0..5),
        )
            .prop_map(|(t, p, c)| node(t, p, Some(c)))
    })
}

/// Nodes the validator visits that must be replaced by the fallback.
pub fn count_rejected_nodes(raw: &Value) -> usize {
    let Some(obj) = raw.as_object() else {
        return 0;
    };
    let registry = SchemaRegistry::global();
    let Some(schema) = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(|name| registry.get(name))
    else {
        return 1;
    };
    if !schema.accepts_children {
        return 0;
    }
    obj.get("children")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(count_rejected_nodes).sum())
        .unwrap_or(0)
}
