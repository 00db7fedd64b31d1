use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::ParseError;
use crate::types::Props;

/// Lexical unit of the markup grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open {
        name: String,
        props: Props,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

/// Split markup into tags and text children.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: src.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_whitespace();
        let Some(c) = lexer.peek() else {
            break;
        };
        let token = match c {
            '<' if lexer.peek_at(1) == Some('/') => lexer.close_tag()?,
            '<' => lexer.open_tag()?,
            '{' => lexer.text_child()?,
            other => {
                return Err(ParseError::UnexpectedChar {
                    ch: other,
                    offset: lexer.pos,
                })
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn expect(&mut self, want: char, start: usize) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                ch: c,
                offset: self.pos,
            }),
            None => Err(ParseError::UnterminatedTag { offset: start }),
        }
    }

    fn tag_name(&mut self, start: usize) -> Result<String, ParseError> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if name.is_empty() {
            return Err(ParseError::InvalidTagName { offset: start });
        }
        Ok(name)
    }

    fn close_tag(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 2;
        self.skip_whitespace();
        let name = self.tag_name(start)?;
        self.skip_whitespace();
        self.expect('>', start)?;
        Ok(Token::Close { name })
    }

    fn open_tag(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.tag_name(start)?;
        let mut props = Props::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnterminatedTag { offset: start }),
                Some('/') => {
                    self.pos += 1;
                    self.expect('>', start)?;
                    return Ok(Token::Open {
                        name,
                        props,
                        self_closing: true,
                    });
                }
                Some('>') => {
                    self.pos += 1;
                    return Ok(Token::Open {
                        name,
                        props,
                        self_closing: false,
                    });
                }
                Some(_) => {
                    let (key, value) = self.prop(start)?;
                    props.insert(key, value);
                }
            }
        }
    }

    fn prop(&mut self, tag_start: usize) -> Result<(String, Value), ParseError> {
        let key = self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'));
        if key.is_empty() {
            return Err(ParseError::UnexpectedChar {
                ch: self.peek().unwrap_or_default(),
                offset: self.pos,
            });
        }
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((key, Value::Bool(true)));
        }
        self.pos += 1;
        self.skip_whitespace();
        match self.peek() {
            Some('"') => {
                let value = self.quoted()?;
                Ok((key, Value::String(value)))
            }
            Some('{') => {
                let expr = self.braced()?;
                Ok((key, expression_value(&expr)))
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                ch: c,
                offset: self.pos,
            }),
            None => Err(ParseError::UnterminatedTag { offset: tag_start }),
        }
    }

    /// Read a double-quoted string starting at the opening quote.
    fn quoted(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString { offset: start }),
                Some('\\') => {
                    let Some(escaped) = self.peek_at(1) else {
                        return Err(ParseError::UnterminatedString { offset: start });
                    };
                    value.push(escaped);
                    self.pos += 2;
                }
                Some('"') => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Read a `{...}` expression and return its trimmed inner text.
    ///
    /// Braces inside JSON string literals do not count towards nesting.
    fn braced(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut depth = 1usize;
        let mut in_string = false;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if in_string {
                match c {
                    '\\' => self.pos += 1,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner: String = self.chars[start + 1..self.pos - 1].iter().collect();
                        return Ok(inner.trim().to_string());
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnterminatedExpression { offset: start })
    }

    /// Read a `{"..."}` text child.
    fn text_child(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        self.skip_whitespace();
        if self.peek() != Some('"') {
            return Err(ParseError::UnexpectedChar {
                ch: self.peek().unwrap_or('{'),
                offset: self.pos,
            });
        }
        let text = self.quoted()?;
        self.skip_whitespace();
        self.expect('}', start)?;
        Ok(Token::Text(text))
    }
}

/// Decimal literals JSON rejects, such as `01` or `-007.50`.
static LOOSE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number regex must compile"));

/// Interpret the inside of a `{...}` prop value.
///
/// JSON first, then a loose decimal literal; anything else is kept verbatim
/// as a string.
fn expression_value(expr: &str) -> Value {
    if let Ok(value) = serde_json::from_str(expr) {
        return value;
    }
    let trimmed = expr.trim();
    if LOOSE_NUMBER.is_match(trimmed) {
        if let Some(number) = loose_number(trimmed) {
            return number;
        }
    }
    Value::String(expr.to_string())
}

fn loose_number(literal: &str) -> Option<Value> {
    if !literal.contains('.') {
        if let Ok(int) = literal.parse::<i64>() {
            return Some(Value::from(int));
        }
    }
    literal
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokenize_tags_and_text() {
        let tokens = tokenize("<Card title=\"A \\\"b\\\"\">\n  {\"hi\"}\n  <Button text=\"x\" fullWidth />\n</Card>")
            .unwrap();
        assert_eq!(tokens.len(), 4);
        match &tokens[0] {
            Token::Open {
                name,
                props,
                self_closing,
            } => {
                assert_eq!(name, "Card");
                assert_eq!(props.get("title"), Some(&json!("A \"b\"")));
                assert!(!self_closing);
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert_eq!(tokens[1], Token::Text("hi".to_string()));
        match &tokens[2] {
            Token::Open {
                props,
                self_closing,
                ..
            } => {
                assert_eq!(props.get("fullWidth"), Some(&json!(true)));
                assert!(self_closing);
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert_eq!(
            tokens[3],
            Token::Close {
                name: "Card".to_string()
            }
        );
    }

    #[test]
    fn test_expression_values() {
        let tokens =
            tokenize("<Chart a={1} b={false} c={[\"}\", {\"k\": \"{\"}]} d={someVar} />").unwrap();
        let Token::Open { props, .. } = &tokens[0] else {
            panic!("expected open tag");
        };
        assert_eq!(props.get("a"), Some(&json!(1)));
        assert_eq!(props.get("b"), Some(&json!(false)));
        assert_eq!(props.get("c"), Some(&json!(["}", {"k": "{"}])));
        assert_eq!(props.get("d"), Some(&json!("someVar")));
    }

    #[test]
    fn test_loose_numeric_literals() {
        assert_eq!(expression_value("01"), json!(1));
        assert_eq!(expression_value("-007"), json!(-7));
        assert_eq!(expression_value("00.50"), json!(0.5));
        assert_eq!(expression_value("1."), json!("1."));
        assert_eq!(expression_value("0x10"), json!("0x10"));
        assert_eq!(expression_value("12px"), json!("12px"));
    }

    #[test]
    fn test_unterminated_inputs_fail() {
        assert!(matches!(
            tokenize("<Button text=\"x\""),
            Err(ParseError::UnterminatedTag { .. })
        ));
        assert!(matches!(
            tokenize("<Button text=\"x />"),
            Err(ParseError::UnterminatedString { .. })
        ));
        assert!(matches!(
            tokenize("<Table rows={[1, 2] />"),
            Err(ParseError::UnterminatedExpression { .. })
        ));
        assert!(matches!(
            tokenize("<Card>stray</Card>"),
            Err(ParseError::UnexpectedChar { ch: 's', .. })
        ));
    }
}
