use thiserror::Error;

use super::tokenizer::{tokenize, Token};
use crate::types::{Child, ComponentNode};

/// Why a code string could not be read back into a tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no `return ( ... );` block found")]
    MissingReturnBlock,
    #[error("empty markup")]
    Empty,
    #[error("invalid tag name at offset {offset}")]
    InvalidTagName { offset: usize },
    #[error("unterminated tag starting at offset {offset}")]
    UnterminatedTag { offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("unterminated expression starting at offset {offset}")]
    UnterminatedExpression { offset: usize },
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("expected an opening tag at token {index}")]
    ExpectedOpenTag { index: usize },
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClose { expected: String, found: String },
    #[error("missing closing tag for <{name}>")]
    MissingClose { name: String },
    #[error("{count} unexpected token(s) after the root element")]
    TrailingTokens { count: usize },
}

/// Best-effort inverse of [`tree_to_code`](super::tree_to_code).
pub fn code_to_tree(code: &str) -> Option<ComponentNode> {
    parse_code(code).ok()
}

/// Parse generated code, reporting where it stopped making sense.
pub fn parse_code(code: &str) -> Result<ComponentNode, ParseError> {
    let markup = return_block(code).ok_or(ParseError::MissingReturnBlock)?;
    let tokens = tokenize(markup)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let root = parser.element()?;
    let rest = parser.tokens.len() - parser.pos;
    if rest > 0 {
        return Err(ParseError::TrailingTokens { count: rest });
    }
    Ok(root)
}

/// Markup between `return (` and the last `);`.
fn return_block(code: &str) -> Option<&str> {
    let mut search_from = 0;
    let open = loop {
        let idx = search_from + code[search_from..].find("return")?;
        let after = &code[idx + "return".len()..];
        let trimmed = after.trim_start();
        if trimmed.starts_with('(') {
            break code.len() - trimmed.len() + 1;
        }
        search_from = idx + "return".len();
    };
    let close = code.rfind(");")?;
    if close < open {
        return None;
    }
    Some(&code[open..close])
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn element(&mut self) -> Result<ComponentNode, ParseError> {
        let index = self.pos;
        let Some(Token::Open {
            name,
            props,
            self_closing,
        }) = self.tokens.get(index).cloned()
        else {
            return Err(ParseError::ExpectedOpenTag { index });
        };
        self.pos += 1;

        let mut node = ComponentNode {
            component_type: name,
            props,
            children: Vec::new(),
        };
        if self_closing {
            return Ok(node);
        }

        loop {
            match self.tokens.get(self.pos) {
                None => {
                    return Err(ParseError::MissingClose {
                        name: node.component_type,
                    })
                }
                Some(Token::Close { name }) if *name == node.component_type => {
                    self.pos += 1;
                    return Ok(node);
                }
                Some(Token::Close { name }) => {
                    return Err(ParseError::MismatchedClose {
                        expected: node.component_type,
                        found: name.clone(),
                    })
                }
                Some(Token::Text(text)) => {
                    node.children.push(Child::Text(text.clone()));
                    self.pos += 1;
                }
                Some(Token::Open { .. }) => {
                    let child = self.element()?;
                    node.children.push(Child::Node(child));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap(markup: &str) -> String {
        format!(
            "import {{ Card }} from \"@/components/ui\";\n\nexport default function GeneratedUI() {{\n  return (\n{}\n  );\n}}",
            markup
        )
    }

    #[test]
    fn test_parse_nested_markup() {
        let tree = parse_code(&wrap(
            "    <Card title=\"Hi\">\n      <Text content=\"a\" />\n      {\"plain\"}\n    </Card>",
        ))
        .unwrap();
        assert_eq!(tree.component_type, "Card");
        assert_eq!(tree.prop("title"), Some(&json!("Hi")));
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[1], Child::Text("plain".to_string()));
    }

    #[test]
    fn test_empty_open_close_pair_has_no_children() {
        let tree = parse_code(&wrap("<Container></Container>")).unwrap();
        assert_eq!(tree, ComponentNode::new("Container"));
    }

    #[test]
    fn test_structural_failures() {
        assert_eq!(
            parse_code("<Card />"),
            Err(ParseError::MissingReturnBlock)
        );
        assert_eq!(parse_code(&wrap("")), Err(ParseError::Empty));
        assert_eq!(
            parse_code(&wrap("<Card><Text /></Container>")),
            Err(ParseError::MismatchedClose {
                expected: "Card".to_string(),
                found: "Container".to_string()
            })
        );
        assert_eq!(
            parse_code(&wrap("<Card><Text />")),
            Err(ParseError::MissingClose {
                name: "Card".to_string()
            })
        );
        assert_eq!(
            parse_code(&wrap("<Card /><Card />")),
            Err(ParseError::TrailingTokens { count: 1 })
        );
        assert_eq!(
            parse_code(&wrap("</Card>")),
            Err(ParseError::ExpectedOpenTag { index: 0 })
        );
        assert!(code_to_tree("garbage").is_none());
    }

    #[test]
    fn test_return_block_skips_unrelated_return_words() {
        let code = "// returns UI\nexport default function GeneratedUI() {\n  return (\n    <Card />\n  );\n}";
        assert_eq!(code_to_tree(code), Some(ComponentNode::new("Card")));
    }
}
