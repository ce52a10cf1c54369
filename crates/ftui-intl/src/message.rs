//! Message resolution with tiered fallback.
//!
//! # Tiers
//!
//! ```text
//!  values empty && Optimized ──▶ literal fast path (no formatter)
//!          │
//!          ▼
//!  ResolvePrimary: messages[id] in `locale`
//!          │ missing / failed / empty
//!          ▼
//!  ResolveDefault: default message in `default_locale`
//!          │ missing / failed / empty
//!          ▼
//!  Collapse: synthesized text (message source, default, "<id> <json>", id)
//! ```
//!
//! # Invariants
//!
//! 1. **Always renders**: every call returns something displayable. The
//!    only way out without a result is a caller contract violation (empty
//!    id, or a placeholder pattern on the value-less fast path), which
//!    panics.
//!
//! 2. **Errors go sideways**: every recoverable failure is delivered to
//!    the config's error sink exactly once per occurrence and never
//!    returned.
//!
//! 3. **Read-only**: the message table and the values are never mutated.
//!
//! 4. **Collapse**: a single text part is returned as [`Rendered::Text`];
//!    anything with embedded content stays [`Rendered::Parts`].
//!
//! # Example
//!
//! ```
//! use ftui_intl::config::{IntlConfig, MessageDescriptor, Messages};
//! use ftui_intl::formatter::Rendered;
//! use ftui_intl::message::format_message;
//! use ftui_intl::simple::SimpleFormatterFactory;
//! use ftui_intl::value::{Value, Values};
//!
//! let mut messages = Messages::new();
//! messages.insert("greeting", "Hallo {name}!");
//! let config = IntlConfig::new("de").with_messages(messages);
//!
//! let mut values = Values::new();
//! values.insert("name".into(), Value::from("Ann"));
//!
//! let out = format_message(
//!     &config,
//!     &SimpleFormatterFactory,
//!     &MessageDescriptor::new("greeting"),
//!     &values,
//! );
//! assert_eq!(out, Rendered::Text("Hallo Ann!".into()));
//! ```

use std::borrow::Cow;

use crate::config::{FormatOptions, IntlConfig, MessageDescriptor};
use crate::cycle::values_cyclic;
use crate::error::{FormatError, IntlError, IntlErrorKind};
use crate::escape::escape_values;
use crate::formatter::{FormatterFactory, Part, Rendered};
use crate::pattern::{Pattern, unescape_literals};
use crate::value::{Values, values_to_json};

/// Resolve and format a message.
///
/// # Panics
///
/// Panics if `descriptor.id` is empty, or if the value-less fast path
/// (optimized mode, no values) meets a compiled pattern with placeholders.
pub fn format_message(
    config: &IntlConfig,
    formatters: &dyn FormatterFactory,
    descriptor: &MessageDescriptor,
    values: &Values,
) -> Rendered {
    let id = descriptor.id.as_str();
    assert!(!id.is_empty(), "an `id` must be provided to format a message");

    let stored = config.messages.get(id);
    let message = stored.filter(|p| p.is_present());
    let default_message = descriptor.default_message.as_ref().filter(|p| p.is_present());
    let has_values = !values.is_empty();

    if !has_values && config.mode.is_optimized() {
        tracing::debug!(id, "message has no values, skipping formatter");
        return Rendered::Text(literal_text(message.or(default_message), id).into_owned());
    }

    let mut parts = Vec::new();

    if let Some(message) = message {
        match render(formatters, message, &config.locale, &config.formats, values) {
            Ok(rendered) => {
                tracing::debug!(id, locale = %config.locale, "rendered message");
                parts = rendered;
            }
            Err(cause) => config.report(
                IntlError::new(
                    IntlErrorKind::FormatPrimary,
                    format!(
                        "Error formatting message: \"{id}\" for locale: \"{}\"{}",
                        config.locale,
                        fallback_note(default_message)
                    ),
                )
                .with_cause(cause),
            ),
        }
    } else if default_message.is_none()
        || config.locale.to_lowercase() == config.default_locale.to_lowercase()
    {
        config.report(IntlError::new(
            IntlErrorKind::MissingMessage,
            format!(
                "Missing message: \"{id}\" for locale: \"{}\"{}",
                config.locale,
                fallback_note(default_message)
            ),
        ));
    }

    if parts.is_empty()
        && let Some(default_message) = default_message
    {
        match render(
            formatters,
            default_message,
            &config.default_locale,
            &config.default_formats,
            values,
        ) {
            Ok(rendered) => {
                tracing::debug!(id, "rendered default message");
                parts = rendered;
            }
            Err(cause) => config.report(
                IntlError::new(
                    IntlErrorKind::FormatDefault,
                    format!("Error formatting the default message for: \"{id}\""),
                )
                .with_cause(cause),
            ),
        }
    }

    let fallback = Fallback {
        id,
        default_message,
        values,
    };

    if parts.is_empty() {
        config.report(IntlError::new(
            IntlErrorKind::Unformattable,
            format!(
                "Cannot format message: \"{id}\", using message {} as fallback.",
                if message.is_some() || default_message.is_some() {
                    "source"
                } else {
                    "id"
                }
            ),
        ));
        tracing::debug!(id, "no tier produced output, synthesizing text");
        return Rendered::Text(fallback.unformatted(stored));
    }

    match <[Part; 1]>::try_from(parts) {
        Ok([Part::Text(text)]) if text.is_empty() => Rendered::Text(fallback.default_or_id()),
        Ok([Part::Text(text)]) => Rendered::Text(text),
        Ok([part]) => Rendered::Parts(vec![part]),
        Err(parts) => Rendered::Parts(parts),
    }
}

/// Like [`format_message`], but HTML-escapes every string value first.
///
/// Non-string values (embedded content, objects) pass through with their
/// identity intact. The caller's map is not modified.
///
/// # Panics
///
/// Same contract as [`format_message`].
pub fn format_html_message(
    config: &IntlConfig,
    formatters: &dyn FormatterFactory,
    descriptor: &MessageDescriptor,
    raw_values: &Values,
) -> Rendered {
    format_message(config, formatters, descriptor, &escape_values(raw_values))
}

fn render(
    formatters: &dyn FormatterFactory,
    pattern: &Pattern,
    locale: &str,
    formats: &FormatOptions,
    values: &Values,
) -> Result<Vec<Part>, FormatError> {
    formatters
        .compile(pattern, locale, formats)?
        .render_rich(values)
}

/// Fast-path text: the first present pattern, else the id, with literal
/// quoting undone.
fn literal_text<'a>(pattern: Option<&'a Pattern>, id: &'a str) -> Cow<'a, str> {
    match pattern {
        Some(pattern) => pattern.literal_text(),
        None => unescape_literals(id),
    }
}

fn fallback_note(default_message: Option<&Pattern>) -> &'static str {
    if default_message.is_some() {
        ", using default message as fallback."
    } else {
        ""
    }
}

/// Text synthesized when formatting produced nothing usable.
struct Fallback<'a> {
    id: &'a str,
    default_message: Option<&'a Pattern>,
    values: &'a Values,
}

impl Fallback<'_> {
    /// Neither tier produced parts.
    ///
    /// A raw stored message wins when non-empty. Cyclic values are never
    /// embedded; the JSON attempt is skipped outright.
    fn unformatted(&self, stored: Option<&Pattern>) -> String {
        match stored {
            Some(Pattern::RawText(text)) if !text.is_empty() => text.clone(),
            Some(Pattern::RawText(_)) => self.default_or_id(),
            _ if values_cyclic(self.values) => self
                .default_message
                .map_or_else(|| self.id.to_owned(), |p| p.source_text().into_owned()),
            _ => self.default_or_id(),
        }
    }

    /// Default message source, else `"<id> <json>"` when there are values,
    /// else the id.
    fn default_or_id(&self) -> String {
        if let Some(default_message) = self.default_message {
            return default_message.source_text().into_owned();
        }
        if self.values.is_empty() {
            return self.id.to_owned();
        }
        match values_to_json(self.values) {
            Some(json) => format!("{} {json}", self.id),
            None => self.id.to_owned(),
        }
    }
}
