//! Bundled formatting entry point.
//!
//! [`Intl`] owns a config plus the two collaborators, so call sites only
//! pass a descriptor and values. It is cheap to clone and safe to share
//! across threads.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CachedFormatterFactory, DEFAULT_CACHE_CAPACITY};
use crate::config::{IntlConfig, MessageDescriptor};
use crate::formatter::{FormatterFactory, Rendered};
use crate::message;
use crate::plural::{self, CldrPluralRules, OptionBag, PluralCategory, PluralRulesFactory};
use crate::simple::SimpleFormatterFactory;
use crate::value::Values;

/// Config plus formatter and plural-rule providers.
#[derive(Clone)]
pub struct Intl {
    config: IntlConfig,
    formatters: Arc<dyn FormatterFactory>,
    plural_rules: Arc<dyn PluralRulesFactory>,
}

impl Intl {
    pub fn new(
        config: IntlConfig,
        formatters: Arc<dyn FormatterFactory>,
        plural_rules: Arc<dyn PluralRulesFactory>,
    ) -> Self {
        Self {
            config,
            formatters,
            plural_rules,
        }
    }

    /// Built-in providers: a cached [`SimpleFormatterFactory`] and
    /// [`CldrPluralRules`].
    pub fn with_defaults(config: IntlConfig) -> Self {
        Self::new(
            config,
            Arc::new(CachedFormatterFactory::new(
                SimpleFormatterFactory,
                DEFAULT_CACHE_CAPACITY,
            )),
            Arc::new(CldrPluralRules),
        )
    }

    #[must_use]
    pub fn config(&self) -> &IntlConfig {
        &self.config
    }

    /// See [`message::format_message`].
    ///
    /// # Panics
    ///
    /// Panics on an empty message id.
    pub fn format_message(&self, descriptor: &MessageDescriptor, values: &Values) -> Rendered {
        message::format_message(&self.config, self.formatters.as_ref(), descriptor, values)
    }

    /// See [`message::format_html_message`].
    ///
    /// # Panics
    ///
    /// Panics on an empty message id.
    pub fn format_html_message(
        &self,
        descriptor: &MessageDescriptor,
        raw_values: &Values,
    ) -> Rendered {
        message::format_html_message(
            &self.config,
            self.formatters.as_ref(),
            descriptor,
            raw_values,
        )
    }

    /// See [`plural::format_plural`].
    pub fn format_plural(&self, value: f64, options: &OptionBag) -> PluralCategory {
        plural::format_plural(&self.config, self.plural_rules.as_ref(), value, options)
    }
}

impl fmt::Debug for Intl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Messages;
    use crate::value::Value;

    fn intl() -> Intl {
        let mut messages = Messages::new();
        messages.insert("files", "{n, plural, one {# file} other {# files}}");
        messages.insert("hi", "Hi {name}");
        Intl::with_defaults(IntlConfig::new("en").with_messages(messages))
    }

    #[test]
    fn formats_through_cached_factory() {
        let intl = intl();
        let mut values = Values::new();
        values.insert("n".into(), Value::from(1));
        let d = MessageDescriptor::new("files");
        assert_eq!(intl.format_message(&d, &values).as_text(), Some("1 file"));
        values.insert("n".into(), Value::from(4));
        assert_eq!(intl.format_message(&d, &values).as_text(), Some("4 files"));
    }

    #[test]
    fn html_variant() {
        let intl = intl();
        let mut values = Values::new();
        values.insert("name".into(), Value::from("<i>"));
        let out = intl.format_html_message(&MessageDescriptor::new("hi"), &values);
        assert_eq!(out.as_text(), Some("Hi &lt;i&gt;"));
    }

    #[test]
    fn plural_selection() {
        let intl = intl();
        assert_eq!(intl.format_plural(1.0, &OptionBag::new()), PluralCategory::One);
        assert_eq!(intl.format_plural(2.0, &OptionBag::new()), PluralCategory::Other);

        let mut ordinal = OptionBag::new();
        ordinal.insert("type".into(), "ordinal".into());
        assert_eq!(intl.format_plural(2.0, &ordinal), PluralCategory::Two);
    }

    #[test]
    fn clones_share_providers() {
        let intl = intl();
        let copy = intl.clone();
        assert!(Arc::ptr_eq(&intl.formatters, &copy.formatters));
        assert_eq!(copy.config().locale, "en");
    }
}
