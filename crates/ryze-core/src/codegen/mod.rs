//! Tree <-> code transcoding
//!
//! `tree_to_code` renders a component tree as a single JSX-style function
//! component. `code_to_tree` reads that narrow grammar back:
//!
//! ```text
//! <Name prop="text" count={3} flag items={["a","b"]}>
//!   <Child />
//!   {"literal text"}
//! </Name>
//! ```

mod parse;
mod serialize;
mod tokenizer;

pub use parse::{code_to_tree, parse_code, ParseError};
pub use serialize::tree_to_code;
pub use tokenizer::{tokenize, Token};

/// Module every generated import refers to.
pub const COMPONENT_MODULE: &str = "@/components/ui";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentNode;
    use crate::validator::validate_component_tree;
    use crate::testing::raw_tree;
    use proptest::prelude::*;
    use serde_json::json;

    fn validated(value: serde_json::Value) -> ComponentNode {
        validate_component_tree(&value)
            .sanitized_tree
            .expect("tree")
    }

    #[test]
    fn test_round_trip_login_form() {
        let tree = validated(json!({
            "type": "Container",
            "props": {"direction": "column", "gap": "md", "padding": "lg", "align": "center"},
            "children": [
                {
                    "type": "Card",
                    "props": {"title": "Welcome back", "subtitle": "Sign in to \"continue\""},
                    "children": [
                        {"type": "Input", "props": {"label": "Email", "type": "email", "required": true}},
                        {"type": "Input", "props": {"label": "Password", "type": "password", "disabled": false}},
                        {"type": "Button", "props": {"text": "Sign in", "variant": "primary", "fullWidth": true}},
                        "Forgot your password? C:\\help"
                    ]
                }
            ]
        }));
        let code = tree_to_code(&tree);
        assert_eq!(code_to_tree(&code), Some(tree));
    }

    #[test]
    fn test_round_trip_structured_props() {
        let tree = validated(json!({
            "type": "Container",
            "children": [
                {"type": "Navbar", "props": {"title": "Acme", "links": [{"text": "Home", "href": "/"}, {"text": "{braces}"}]}},
                {"type": "Table", "props": {"headers": ["Name", "Qty"], "rows": [["a", 1], ["b}", 2.5]], "striped": true}},
                {"type": "Chart", "props": {"type": "bar", "data": [{"label": "Q1", "value": -3}], "meta": {}}}
            ]
        }));
        let code = tree_to_code(&tree);
        assert_eq!(code_to_tree(&code), Some(tree));
    }

    #[test]
    fn test_round_trip_single_leaf() {
        let tree = ComponentNode::new("Button").with_prop("text", "");
        assert_eq!(code_to_tree(&tree_to_code(&tree)), Some(tree));

        let bare = ComponentNode::new("Container");
        assert_eq!(code_to_tree(&tree_to_code(&bare)), Some(bare));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_validated_trees_round_trip(raw in raw_tree()) {
            let tree = validate_component_tree(&raw).sanitized_tree.unwrap();
            let code = tree_to_code(&tree);
            prop_assert_eq!(code_to_tree(&code), Some(tree), "code:\n{}", code);
        }
    }
}
