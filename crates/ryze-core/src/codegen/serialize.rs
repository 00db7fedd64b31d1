use std::collections::BTreeSet;

use serde_json::Value;

use super::COMPONENT_MODULE;
use crate::types::{Child, ComponentNode, Props};

/// Joined prop width above which props go one per line.
const MAX_INLINE_PROPS_WIDTH: usize = 60;
const INDENT: &str = "  ";
/// Depth of the root element inside `return (`.
const ROOT_DEPTH: usize = 2;

/// Render a tree as a JSX function component.
///
/// Output is deterministic: imports are sorted, props keep insertion order.
pub fn tree_to_code(tree: &ComponentNode) -> String {
    let imports: BTreeSet<&str> = tree
        .walk()
        .into_iter()
        .map(|n| n.component_type.as_str())
        .collect();

    let mut out = String::new();
    if !imports.is_empty() {
        out.push_str("import { ");
        out.push_str(&imports.into_iter().collect::<Vec<_>>().join(", "));
        out.push_str(" } from \"");
        out.push_str(COMPONENT_MODULE);
        out.push_str("\";\n\n");
    }
    out.push_str("export default function GeneratedUI() {\n  return (\n");
    write_node(tree, ROOT_DEPTH, &mut out);
    out.push_str("\n  );\n}");
    out
}

fn write_node(node: &ComponentNode, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    let name = &node.component_type;

    out.push_str(&indent);
    out.push('<');
    out.push_str(name);

    let wrapped = write_props(&node.props, &indent, out);
    if node.children.is_empty() {
        out.push_str(if wrapped { "/>" } else { " />" });
        return;
    }
    out.push('>');

    let child_indent = INDENT.repeat(depth + 1);
    for child in &node.children {
        out.push('\n');
        match child {
            Child::Text(text) => {
                out.push_str(&child_indent);
                out.push_str("{\"");
                out.push_str(&escape(text));
                out.push_str("\"}");
            }
            Child::Node(child) => write_node(child, depth + 1, out),
        }
    }
    out.push('\n');
    out.push_str(&indent);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Returns true when props were wrapped onto their own lines.
fn write_props(props: &Props, indent: &str, out: &mut String) -> bool {
    if props.is_empty() {
        return false;
    }
    let parts: Vec<String> = props
        .iter()
        .map(|(key, value)| format_prop(key, value))
        .collect();
    let inline = parts.join(" ");
    if inline.len() <= MAX_INLINE_PROPS_WIDTH {
        out.push(' ');
        out.push_str(&inline);
        return false;
    }
    for part in &parts {
        out.push('\n');
        out.push_str(indent);
        out.push_str(INDENT);
        out.push_str(part);
    }
    out.push('\n');
    out.push_str(indent);
    true
}

fn format_prop(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => format!("{}=\"{}\"", key, escape(s)),
        Value::Bool(true) => key.to_string(),
        Value::Bool(false) => format!("{}={{false}}", key),
        Value::Number(n) => format!("{}={{{}}}", key, n),
        other => format!("{}={{{}}}", key, other),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_tree_layout() {
        let tree = ComponentNode::new("Card")
            .with_prop("title", "Hi")
            .with_child(ComponentNode::new("Button").with_prop("text", "Go"))
            .with_text("say \"hi\"");
        let expected = "import { Button, Card } from \"@/components/ui\";\n\n\
export default function GeneratedUI() {\n  return (\n    <Card title=\"Hi\">\n      <Button text=\"Go\" />\n      {\"say \\\"hi\\\"\"}\n    </Card>\n  );\n}";
        assert_eq!(tree_to_code(&tree), expected);
    }

    #[test]
    fn test_prop_formatting() {
        assert_eq!(format_prop("fullWidth", &json!(true)), "fullWidth");
        assert_eq!(format_prop("disabled", &json!(false)), "disabled={false}");
        assert_eq!(format_prop("count", &json!(3)), "count={3}");
        assert_eq!(format_prop("ratio", &json!(0.5)), "ratio={0.5}");
        assert_eq!(format_prop("headers", &json!(["a", "b"])), "headers={[\"a\",\"b\"]}");
        assert_eq!(format_prop("path", &json!("C:\\x")), "path=\"C:\\\\x\"");
    }

    #[test]
    fn test_long_props_wrap_one_per_line() {
        let tree = ComponentNode::new("Input")
            .with_prop("label", "Email address")
            .with_prop("placeholder", "you@example.com")
            .with_prop("type", "email");
        let code = tree_to_code(&tree);
        assert!(code.contains(
            "    <Input\n      label=\"Email address\"\n      placeholder=\"you@example.com\"\n      type=\"email\"\n    />"
        ));
    }

    #[test]
    fn test_imports_are_distinct_and_sorted() {
        let tree = ComponentNode::new("Container")
            .with_child(ComponentNode::new("Text"))
            .with_child(ComponentNode::new("Button"))
            .with_child(ComponentNode::new("Text"));
        assert!(tree_to_code(&tree)
            .starts_with("import { Button, Container, Text } from \"@/components/ui\";"));
    }
}
