//! Formatting configuration: locales, messages, formats and the error sink.
//!
//! [`IntlConfig`] is immutable once built and cheap to share; message
//! tables sit behind an `Arc` so a config can be cloned per render pass
//! without copying translations.
//!
//! # Example
//!
//! ```
//! use ftui_intl::config::{IntlConfig, Messages, RenderMode};
//!
//! let mut messages = Messages::new();
//! messages.insert("greeting", "Bonjour {name}");
//!
//! let config = IntlConfig::new("fr")
//!     .with_default_locale("en")
//!     .with_messages(messages)
//!     .with_mode(RenderMode::Optimized);
//!
//! assert_eq!(config.locale, "fr");
//! assert!(config.messages.get("greeting").is_some());
//! ```

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{ErrorSink, IntlError, TracingSink};
use crate::pattern::{Node, Pattern};

/// Default locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Rendering mode.
///
/// `Optimized` lets the engine skip the formatter for calls without
/// values. `Diagnostic` always runs the full pipeline so a message with
/// placeholders but no values is caught by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    Optimized,
    #[default]
    Diagnostic,
}

impl RenderMode {
    #[inline]
    #[must_use]
    pub const fn is_optimized(self) -> bool {
        matches!(self, Self::Optimized)
    }
}

/// Named format styles, e.g. `"money" -> "integer"`.
///
/// Part of the formatter cache key, hence `Hash + Eq` and ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    named: BTreeMap<String, String>,
}

impl FormatOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, style: impl Into<String>) -> Self {
        self.named.insert(name.into(), style.into());
        self
    }

    /// Look up a named style.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What to render: a message id and an optional source-language default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Message id. Must be non-empty.
    pub id: String,
    /// Pattern used when the id has no usable translation.
    pub default_message: Option<Pattern>,
}

impl MessageDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_message: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default_message: impl Into<Pattern>) -> Self {
        self.default_message = Some(default_message.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Errors from loading configuration data.
#[derive(Debug)]
pub enum ConfigError {
    /// The input is not valid JSON, or not a JSON object.
    Json(serde_json::Error),
    /// A message entry is not a string.
    NonStringMessage { id: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "invalid message bundle: {e}"),
            Self::NonStringMessage { id } => {
                write!(f, "message '{id}' is not a string")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::NonStringMessage { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Message patterns for one locale, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    patterns: HashMap<String, Pattern>,
}

impl Messages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat JSON object of `id -> pattern` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or non-string entries.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let bundle: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut messages = Self::new();
        for (id, value) in bundle {
            match value {
                serde_json::Value::String(text) => messages.insert(id, text),
                _ => return Err(ConfigError::NonStringMessage { id }),
            }
        }
        Ok(messages)
    }

    /// Insert a raw pattern.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.patterns
            .insert(id.into(), Pattern::RawText(text.into()));
    }

    /// Insert a precompiled pattern.
    pub fn insert_compiled(&mut self, id: impl Into<String>, nodes: Vec<Node>) {
        self.patterns
            .insert(id.into(), Pattern::CompiledNodes(nodes));
    }

    /// Look up a pattern by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterate over all ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Pattern)> for Messages {
    fn from_iter<I: IntoIterator<Item = (K, Pattern)>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// IntlConfig
// ---------------------------------------------------------------------------

/// Everything a formatting call needs besides the collaborators.
#[derive(Clone)]
pub struct IntlConfig {
    /// Target locale.
    pub locale: String,
    /// Locale the default messages are written in.
    pub default_locale: String,
    /// Named formats for the target locale.
    pub formats: FormatOptions,
    /// Named formats for the default locale.
    pub default_formats: FormatOptions,
    /// Translations for `locale`. Never mutated by the engine.
    pub messages: Arc<Messages>,
    /// Error side channel.
    pub on_error: Arc<dyn ErrorSink>,
    /// Whether the formatter may be skipped for value-less calls.
    pub mode: RenderMode,
}

impl IntlConfig {
    /// Config for `locale` with no messages, [`DEFAULT_LOCALE`] as default
    /// locale, diagnostic mode and a [`TracingSink`].
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            default_locale: DEFAULT_LOCALE.to_owned(),
            formats: FormatOptions::default(),
            default_formats: FormatOptions::default(),
            messages: Arc::new(Messages::default()),
            on_error: Arc::new(TracingSink),
            mode: RenderMode::default(),
        }
    }

    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: impl Into<Arc<Messages>>) -> Self {
        self.messages = messages.into();
        self
    }

    #[must_use]
    pub fn with_formats(mut self, formats: FormatOptions) -> Self {
        self.formats = formats;
        self
    }

    #[must_use]
    pub fn with_default_formats(mut self, formats: FormatOptions) -> Self {
        self.default_formats = formats;
        self
    }

    /// Replace the error sink.
    #[must_use]
    pub fn with_on_error(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.on_error = Arc::new(sink);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Deliver an error to the sink.
    #[inline]
    pub fn report(&self, error: IntlError) {
        self.on_error.report(error);
    }
}

impl fmt::Debug for IntlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntlConfig")
            .field("locale", &self.locale)
            .field("default_locale", &self.default_locale)
            .field("formats", &self.formats)
            .field("default_formats", &self.default_formats)
            .field("messages", &self.messages.len())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
