//! Parser for the ICU message subset understood by the reference formatter.
//!
//! Grammar, informally:
//!
//! ```text
//! message  := (text | '{' argument '}' | '#')*      // '#' only inside plural arms
//! argument := name
//!           | name ',' 'number' [',' style]
//!           | name ',' ('plural' | 'selectordinal') ',' ['offset:' int] arm+
//!           | name ',' 'select' ',' arm+
//! arm      := ('=' int | keyword) '{' message '}'
//! ```
//!
//! Apostrophes quote: `''` is a literal apostrophe, and an apostrophe
//! directly before `{`, `}` (or `#` in a plural arm) starts a quoted run
//! that ends at the next lone apostrophe. Any other apostrophe is literal.
//!
//! # Failure Modes
//!
//! | Failure | Result |
//! |---------|--------|
//! | Unbalanced braces | `FormatError::Syntax` |
//! | Plural/select without `other` | `FormatError::Syntax` |
//! | Unknown argument type (`date`, ...) | `FormatError::Unsupported` |
//! | Arguments nested deeper than [`MAX_NESTING`] | `FormatError::Syntax` |

use crate::error::FormatError;
use crate::pattern::{Node, PluralArm, PluralKey, SelectArm};
use crate::plural::PluralCategory;

/// Deepest argument nesting accepted. Parsing recurses per level, so
/// untrusted bundles must not control the depth.
pub const MAX_NESTING: usize = 64;

/// Parse ICU message text into nodes.
///
/// # Errors
///
/// Returns [`FormatError::Syntax`] with a byte offset for malformed input.
pub fn parse(source: &str) -> Result<Vec<Node>, FormatError> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        depth: 0,
    };
    let nodes = parser.message(false)?;
    if parser.pos < source.len() {
        return Err(parser.error("unexpected '}'"));
    }
    Ok(nodes)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Arguments currently open.
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: impl Into<String>) -> FormatError {
        FormatError::Syntax {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn expect(&mut self, expected: char, context: &str) -> Result<(), FormatError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}' {context}")))
        }
    }

    /// Text and placeholders up to an unmatched `}` or end of input.
    fn message(&mut self, in_plural: bool) -> Result<Vec<Node>, FormatError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            match c {
                '}' => break,
                '{' => {
                    flush(&mut text, &mut nodes);
                    if self.depth == MAX_NESTING {
                        return Err(self.error("nesting too deep"));
                    }
                    self.bump();
                    self.depth += 1;
                    let node = self.argument(in_plural);
                    self.depth -= 1;
                    nodes.push(node?);
                }
                '#' if in_plural => {
                    flush(&mut text, &mut nodes);
                    self.bump();
                    nodes.push(Node::Pound);
                }
                '\'' => self.apostrophe(&mut text, in_plural),
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        flush(&mut text, &mut nodes);
        Ok(nodes)
    }

    fn apostrophe(&mut self, text: &mut String, in_plural: bool) {
        self.bump();
        match self.peek() {
            Some('\'') => {
                self.bump();
                text.push('\'');
            }
            Some('{' | '}') => self.quoted_run(text),
            Some('#') if in_plural => self.quoted_run(text),
            _ => text.push('\''),
        }
    }

    /// Copy a quoted run verbatim; an unterminated run extends to the end.
    fn quoted_run(&mut self, text: &mut String) {
        while let Some(c) = self.bump() {
            if c == '\'' {
                if self.eat('\'') {
                    text.push('\'');
                } else {
                    return;
                }
            } else {
                text.push(c);
            }
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '{' | '}' | ',' | '#' | '\'' | '='))
        {
            self.bump();
        }
        self.src[start..self.pos].to_owned()
    }

    fn integer(&mut self) -> Result<i64, FormatError> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.src[start..self.pos].parse().map_err(|_| FormatError::Syntax {
            offset: start,
            reason: "expected an integer".into(),
        })
    }

    /// Body of `{ ... }` after the opening brace, including the closing one.
    fn argument(&mut self, in_plural: bool) -> Result<Node, FormatError> {
        self.skip_ws();
        let name = self.identifier();
        if name.is_empty() {
            return Err(self.error("expected argument name"));
        }
        self.skip_ws();
        if self.eat('}') {
            return Ok(Node::Argument(name));
        }
        self.expect(',', "after argument name")?;
        self.skip_ws();

        let kind_offset = self.pos;
        let kind = self.identifier();
        self.skip_ws();
        match kind.as_str() {
            "number" => self.number(name),
            "plural" | "selectordinal" => {
                self.expect(',', "after plural type")?;
                self.plural(name, kind == "selectordinal", kind_offset)
            }
            "select" => {
                self.expect(',', "after select type")?;
                self.select(name, in_plural, kind_offset)
            }
            "" => Err(self.error("expected argument type")),
            other => Err(FormatError::Unsupported(format!("argument type '{other}'"))),
        }
    }

    fn number(&mut self, name: String) -> Result<Node, FormatError> {
        let style = if self.eat(',') {
            let start = self.pos;
            while self.peek().is_some_and(|c| !matches!(c, '{' | '}')) {
                self.bump();
            }
            let style = self.src[start..self.pos].trim();
            if style.is_empty() {
                return Err(self.error("expected number style"));
            }
            Some(style.to_owned())
        } else {
            None
        };
        self.expect('}', "to close number argument")?;
        Ok(Node::Number { name, style })
    }

    fn plural(&mut self, name: String, ordinal: bool, start: usize) -> Result<Node, FormatError> {
        self.skip_ws();
        let mut offset = 0;
        if self.src[self.pos..].starts_with("offset:") {
            self.pos += "offset:".len();
            self.skip_ws();
            offset = self.integer()?;
        }

        let mut arms = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error("unterminated plural argument"));
            }
            let key_offset = self.pos;
            let key = if self.eat('=') {
                PluralKey::Exact(self.integer()?)
            } else {
                let word = self.identifier();
                PluralCategory::from_keyword(&word)
                    .map(PluralKey::Category)
                    .ok_or_else(|| FormatError::Syntax {
                        offset: key_offset,
                        reason: format!("invalid plural selector '{word}'"),
                    })?
            };
            self.skip_ws();
            self.expect('{', "after plural selector")?;
            let body = self.message(true)?;
            self.expect('}', "to close plural arm")?;
            arms.push(PluralArm { key, body });
        }

        if !arms
            .iter()
            .any(|arm| arm.key == PluralKey::Category(PluralCategory::Other))
        {
            return Err(FormatError::Syntax {
                offset: start,
                reason: "plural argument requires an 'other' arm".into(),
            });
        }
        Ok(Node::Plural {
            name,
            ordinal,
            offset,
            arms,
        })
    }

    fn select(&mut self, name: String, in_plural: bool, start: usize) -> Result<Node, FormatError> {
        let mut arms = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error("unterminated select argument"));
            }
            let key = self.identifier();
            if key.is_empty() {
                return Err(self.error("expected select key"));
            }
            self.skip_ws();
            self.expect('{', "after select key")?;
            let body = self.message(in_plural)?;
            self.expect('}', "to close select arm")?;
            arms.push(SelectArm { key, body });
        }

        if !arms.iter().any(|arm| arm.key == "other") {
            return Err(FormatError::Syntax {
                offset: start,
                reason: "select argument requires an 'other' arm".into(),
            });
        }
        Ok(Node::Select { name, arms })
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Literal(std::mem::take(text)));
    }
}
