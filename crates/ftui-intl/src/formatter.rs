//! Formatter collaborator contract and rendered output shapes.
//!
//! ```text
//! Pattern + locale + formats
//!     │
//!     ▼
//! ┌──────────────────┐
//! │ FormatterFactory │  compile (or fetch from a cache)
//! └────────┬─────────┘
//!          │ Arc<dyn Formatter>
//!          ▼
//! ┌──────────────────┐
//! │ Formatter        │  render_rich(values) -> Vec<Part>
//! └────────┬─────────┘
//!          ▼
//!     engine collapses parts into Rendered
//! ```
//!
//! Compiled formatters are shared across calls and threads, so they must be
//! immutable once built.

use std::sync::Arc;

use crate::config::FormatOptions;
use crate::error::FormatError;
use crate::pattern::Pattern;
use crate::value::{Embedded, Values};

/// One unit of formatted output.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Rich content passed through from the values.
    Embedded(Embedded),
}

impl Part {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Embedded(_) => None,
        }
    }
}

impl From<&str> for Part {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Part {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Final result of a formatting call.
///
/// A single plain-text result collapses to [`Rendered::Text`]; anything
/// carrying rich content stays a part sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Parts(Vec<Part>),
}

impl Rendered {
    /// The text of a collapsed result.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }

    /// View the result as parts, whatever its shape.
    #[must_use]
    pub fn into_parts(self) -> Vec<Part> {
        match self {
            Self::Text(text) => vec![Part::Text(text)],
            Self::Parts(parts) => parts,
        }
    }
}

/// A compiled, reusable pattern.
pub trait Formatter: Send + Sync {
    /// Render `values` into parts, keeping embedded content as separate
    /// parts.
    ///
    /// # Errors
    ///
    /// Missing or unusable arguments are reported as [`FormatError`].
    fn render_rich(&self, values: &Values) -> Result<Vec<Part>, FormatError>;

    /// Render `values` into plain text.
    ///
    /// # Errors
    ///
    /// Fails like [`render_rich`](Self::render_rich), and additionally when
    /// the output contains embedded content.
    fn render(&self, values: &Values) -> Result<String, FormatError> {
        let mut out = String::new();
        for part in self.render_rich(values)? {
            match part {
                Part::Text(text) => out.push_str(&text),
                Part::Embedded(e) => {
                    return Err(FormatError::Unsupported(format!(
                        "embedded content '{}' in plain-text output",
                        e.label()
                    )));
                }
            }
        }
        Ok(out)
    }
}

/// Compiles patterns into formatters.
///
/// Implementations backed by a cache must support concurrent lookups and
/// inserts.
pub trait FormatterFactory: Send + Sync {
    /// Compile `pattern` for `locale` with the given named formats.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when the pattern cannot be compiled.
    fn compile(
        &self,
        pattern: &Pattern,
        locale: &str,
        formats: &FormatOptions,
    ) -> Result<Arc<dyn Formatter>, FormatError>;
}

impl<F: FormatterFactory + ?Sized> FormatterFactory for Arc<F> {
    fn compile(
        &self,
        pattern: &Pattern,
        locale: &str,
        formats: &FormatOptions,
    ) -> Result<Arc<dyn Formatter>, FormatError> {
        (**self).compile(pattern, locale, formats)
    }
}
