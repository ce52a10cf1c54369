#![forbid(unsafe_code)]

//! Message formatting with tiered fallback for FrankenTUI.
//!
//! Resolves a message id to display text through a fixed chain: the
//! translation for the active locale, then the caller's default message,
//! then a synthesized string built from the message source, the id and the
//! values. Every failure along the way goes to a pluggable error sink, so
//! a broken translation degrades the UI instead of crashing it.
//!
//! # Role in FrankenTUI
//! `ftui-intl` sits between a translation table and the widgets that show
//! text. Pattern compilation and plural rules are collaborators behind
//! traits; the crate ships a reference implementation of both.
//!
//! # Pieces
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`message`] | `format_message` / `format_html_message` fallback engine |
//! | [`plural`] | `format_plural` with option whitelisting and CLDR-style rules |
//! | [`config`] | locales, message tables, named formats, error sink |
//! | [`formatter`] | formatter collaborator contract and rich output |
//! | [`simple`] / [`parser`] | reference ICU-subset formatter |
//! | [`cache`] | LRU memoization of compiled formatters |
//! | [`value`] / [`cycle`] | argument values and cycle detection |
//! | [`escape`] | HTML escaping of string values |
//!
//! # Example
//!
//! ```
//! use ftui_intl::{Intl, IntlConfig, MessageDescriptor, Messages, Value, Values};
//!
//! let mut messages = Messages::new();
//! messages.insert("inbox", "{count, plural, one {# message} other {# messages}}");
//! let intl = Intl::with_defaults(IntlConfig::new("en").with_messages(messages));
//!
//! let mut values = Values::new();
//! values.insert("count".into(), Value::from(2));
//! let out = intl.format_message(&MessageDescriptor::new("inbox"), &values);
//! assert_eq!(out.as_text(), Some("2 messages"));
//! ```

pub mod cache;
pub mod config;
pub mod cycle;
pub mod error;
pub mod escape;
pub mod formatter;
pub mod intl;
pub mod message;
pub mod parser;
pub mod pattern;
pub mod plural;
pub mod simple;
pub mod value;

pub use cache::{CachedFormatterFactory, FormatterCacheStats};
pub use config::{FormatOptions, IntlConfig, MessageDescriptor, Messages, RenderMode};
pub use error::{ErrorSink, FormatError, IntlError, IntlErrorKind, PluralError, TracingSink};
pub use formatter::{Formatter, FormatterFactory, Part, Rendered};
pub use intl::Intl;
pub use message::{format_html_message, format_message};
pub use pattern::{Node, Pattern};
pub use plural::{
    CldrPluralRules, OptionBag, PluralCategory, PluralOptions, PluralRule, PluralRules,
    PluralRulesFactory, format_plural,
};
pub use simple::SimpleFormatterFactory;
pub use value::{Embedded, ListRef, ObjectRef, Value, Values};
