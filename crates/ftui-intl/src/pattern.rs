//! Message patterns: raw ICU text or precompiled node sequences.
//!
//! The engine only ever looks inside a pattern for one reason: deciding
//! whether a value-less call can skip the formatter. A raw pattern is
//! returned with its `'{...}'` literal quoting undone; a compiled pattern
//! must be a single [`Node::Literal`]. Every other node kind belongs to the
//! formatter.

use core::fmt;
use std::borrow::Cow;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::plural::PluralCategory;

/// A message pattern for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// ICU message text, possibly containing quoting sequences.
    RawText(String),
    /// Output of an ahead-of-time parse.
    CompiledNodes(Vec<Node>),
}

impl Pattern {
    /// Whether the pattern counts as provided.
    ///
    /// An empty raw string is treated like a missing pattern; a compiled
    /// pattern is always present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::RawText(text) => !text.is_empty(),
            Self::CompiledNodes(_) => true,
        }
    }

    /// Borrow the text of a raw pattern.
    #[must_use]
    pub fn as_raw_text(&self) -> Option<&str> {
        match self {
            Self::RawText(text) => Some(text),
            Self::CompiledNodes(_) => None,
        }
    }

    /// Text of a pattern that needs no formatting.
    ///
    /// # Panics
    ///
    /// Panics if a compiled pattern is anything but a single literal node:
    /// such a message has placeholders, and rendering it without values
    /// would silently produce wrong text.
    #[must_use]
    pub fn literal_text(&self) -> Cow<'_, str> {
        match self {
            Self::RawText(text) => unescape_literals(text),
            Self::CompiledNodes(nodes) => match nodes.as_slice() {
                [Node::Literal(text)] => Cow::Borrowed(text),
                _ => panic!(
                    "message has placeholders but no values were provided (nodes: {})",
                    NodeKinds(nodes)
                ),
            },
        }
    }

    /// Source text used when the pattern itself becomes fallback output.
    ///
    /// Raw text is returned verbatim; compiled nodes are printed back to
    /// ICU syntax.
    #[must_use]
    pub fn source_text(&self) -> Cow<'_, str> {
        match self {
            Self::RawText(text) => Cow::Borrowed(text),
            Self::CompiledNodes(nodes) => Cow::Owned(print_nodes(nodes)),
        }
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Self::RawText(value.to_owned())
    }
}

impl From<String> for Pattern {
    fn from(value: String) -> Self {
        Self::RawText(value)
    }
}

impl From<Vec<Node>> for Pattern {
    fn from(value: Vec<Node>) -> Self {
        Self::CompiledNodes(value)
    }
}

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Verbatim text.
    Literal(String),
    /// `{name}`
    Argument(String),
    /// `{name, number[, style]}`
    Number { name: String, style: Option<String> },
    /// `{name, plural|selectordinal, [offset:n] arms...}`
    Plural {
        name: String,
        ordinal: bool,
        offset: i64,
        arms: Vec<PluralArm>,
    },
    /// `{name, select, arms...}`
    Select { name: String, arms: Vec<SelectArm> },
    /// `#` inside a plural arm.
    Pound,
}

impl Node {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Literal(_) => NodeKind::Literal,
            Self::Argument(_) => NodeKind::Argument,
            Self::Number { .. } => NodeKind::Number,
            Self::Plural { .. } => NodeKind::Plural,
            Self::Select { .. } => NodeKind::Select,
            Self::Pound => NodeKind::Pound,
        }
    }
}

/// Tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Argument,
    Number,
    Plural,
    Select,
    Pound,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Argument => "argument",
            Self::Number => "number",
            Self::Plural => "plural",
            Self::Select => "select",
            Self::Pound => "pound",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector of a plural arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralKey {
    /// `=N`, matched against the value before the offset is applied.
    Exact(i64),
    /// A CLDR category keyword.
    Category(PluralCategory),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluralArm {
    pub key: PluralKey,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectArm {
    pub key: String,
    pub body: Vec<Node>,
}

/// Comma-separated node kinds, for diagnostics.
struct NodeKinds<'a>(&'a [Node]);

impl fmt::Display for NodeKinds<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(node.kind().as_str())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Literal unescaping
// ---------------------------------------------------------------------------

/// Quoted brace group: the shortest `'{...}'` that stays on one line.
/// `\r`, U+2028 and U+2029 end a line as well as `\n`.
static QUOTED_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("'\\{([^\n\r\u{2028}\u{2029}]*?)\\}'").expect("quoted group regex")
});

/// Undo ICU literal quoting of brace groups: every `'{...}'` becomes
/// `{...}`. Other apostrophes are left alone.
#[must_use]
pub fn unescape_literals(text: &str) -> Cow<'_, str> {
    QUOTED_GROUP.replace_all(text, "{${1}}")
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

fn print_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    print_into(&mut out, nodes, false);
    out
}

fn print_into(out: &mut String, nodes: &[Node], in_plural: bool) {
    for node in nodes {
        match node {
            Node::Literal(text) => print_literal(out, text, in_plural),
            Node::Argument(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            Node::Number { name, style } => {
                out.push('{');
                out.push_str(name);
                out.push_str(", number");
                if let Some(style) = style {
                    out.push_str(", ");
                    out.push_str(style);
                }
                out.push('}');
            }
            Node::Plural {
                name,
                ordinal,
                offset,
                arms,
            } => {
                out.push('{');
                out.push_str(name);
                out.push_str(if *ordinal {
                    ", selectordinal,"
                } else {
                    ", plural,"
                });
                if *offset != 0 {
                    out.push_str(&format!(" offset:{offset}"));
                }
                for arm in arms {
                    match arm.key {
                        PluralKey::Exact(n) => out.push_str(&format!(" ={n} {{")),
                        PluralKey::Category(c) => out.push_str(&format!(" {c} {{")),
                    }
                    print_into(out, &arm.body, true);
                    out.push('}');
                }
                out.push('}');
            }
            Node::Select { name, arms } => {
                out.push('{');
                out.push_str(name);
                out.push_str(", select,");
                for arm in arms {
                    out.push(' ');
                    out.push_str(&arm.key);
                    out.push_str(" {");
                    print_into(out, &arm.body, in_plural);
                    out.push('}');
                }
                out.push('}');
            }
            Node::Pound => out.push('#'),
        }
    }
}

/// Quote syntax characters so the printed text parses back to `text`.
fn print_literal(out: &mut String, text: &str, in_plural: bool) {
    for c in text.chars() {
        match c {
            '\'' => out.push_str("''"),
            '{' | '}' => {
                out.push('\'');
                out.push(c);
                out.push('\'');
            }
            '#' if in_plural => out.push_str("'#'"),
            _ => out.push(c),
        }
    }
}
