//! End-to-end fallback behavior of `format_message`.
//!
//! Each test drives the engine with a recording error sink and, where a
//! tier must fail on demand, a scripted formatter factory that rejects
//! chosen patterns and delegates everything else to the reference
//! formatter.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use ftui_intl::formatter::{Formatter, FormatterFactory, Part, Rendered};
use ftui_intl::{
    Embedded, FormatError, FormatOptions, IntlConfig, IntlError, IntlErrorKind, MessageDescriptor,
    Messages, Pattern, RenderMode, SimpleFormatterFactory, Value, Values, format_html_message,
    format_message,
};

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<IntlError>>>);

impl Recorder {
    fn kinds(&self) -> Vec<IntlErrorKind> {
        self.0.lock().unwrap().iter().map(IntlError::kind).collect()
    }

    fn count(&self, kind: IntlErrorKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message().to_owned())
            .collect()
    }
}

fn config(locale: &str, messages: &[(&str, &str)]) -> (IntlConfig, Recorder) {
    let recorder = Recorder::default();
    let sink = recorder.clone();
    let mut table = Messages::new();
    for (id, text) in messages {
        table.insert(*id, *text);
    }
    let config = IntlConfig::new(locale)
        .with_default_locale("en")
        .with_messages(table)
        .with_on_error(move |err: IntlError| sink.0.lock().unwrap().push(err));
    (config, recorder)
}

fn values(entries: &[(&str, Value)]) -> Values {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Fails to compile any pattern whose source is in `reject` and records the
/// values every compiled formatter is rendered with.
#[derive(Default)]
struct Scripted {
    reject: HashSet<String>,
    seen: Arc<Mutex<Vec<Values>>>,
}

impl Scripted {
    fn rejecting(patterns: &[&str]) -> Self {
        Self {
            reject: patterns.iter().map(|p| (*p).to_owned()).collect(),
            seen: Arc::default(),
        }
    }

    fn observed(&self) -> Vec<Values> {
        self.seen.lock().unwrap().clone()
    }
}

impl FormatterFactory for Scripted {
    fn compile(
        &self,
        pattern: &Pattern,
        locale: &str,
        formats: &FormatOptions,
    ) -> Result<Arc<dyn Formatter>, FormatError> {
        if self.reject.contains(pattern.source_text().as_ref()) {
            return Err(FormatError::Unsupported("scripted failure".into()));
        }
        Ok(Arc::new(Observed {
            inner: SimpleFormatterFactory.compile(pattern, locale, formats)?,
            seen: Arc::clone(&self.seen),
        }))
    }
}

struct Observed {
    inner: Arc<dyn Formatter>,
    seen: Arc<Mutex<Vec<Values>>>,
}

impl Formatter for Observed {
    fn render_rich(&self, values: &Values) -> Result<Vec<Part>, FormatError> {
        self.seen.lock().unwrap().push(values.clone());
        self.inner.render_rich(values)
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Missing message without default returns the id
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn missing_message_no_default_returns_id() {
    let (config, rec) = config("en", &[]);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("greeting"),
        &Values::new(),
    );
    assert_eq!(out, Rendered::Text("greeting".into()));
    assert_eq!(rec.count(IntlErrorKind::MissingMessage), 1);
    assert_eq!(
        rec.messages()[0],
        "Missing message: \"greeting\" for locale: \"en\""
    );
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Missing message in the default locale still warns
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn missing_message_in_default_locale_warns() {
    let (config, rec) = config("en", &[]);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("greeting").with_default("Hello"),
        &Values::new(),
    );
    assert_eq!(out.as_text(), Some("Hello"));
    assert_eq!(rec.kinds(), vec![IntlErrorKind::MissingMessage]);
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Missing message in another locale renders the default silently
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn missing_message_other_locale_uses_default_silently() {
    let (config, rec) = config("fr", &[]);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("greeting").with_default("Hello {name}"),
        &values(&[("name", "Ann".into())]),
    );
    assert_eq!(out.as_text(), Some("Hello Ann"));
    assert!(rec.kinds().is_empty());
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Primary failure falls back to the default message
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn primary_failure_uses_default() {
    let (config, rec) = config("fr", &[("x", "broken")]);
    let factory = Scripted::rejecting(&["broken"]);
    let out = format_message(
        &config,
        &factory,
        &MessageDescriptor::new("x").with_default("fallback"),
        &Values::new(),
    );
    assert_eq!(out.as_text(), Some("fallback"));
    assert_eq!(rec.kinds(), vec![IntlErrorKind::FormatPrimary]);
    assert_eq!(
        rec.messages()[0],
        "Error formatting message: \"x\" for locale: \"fr\", using default message as fallback."
    );
}

#[test]
fn default_tier_uses_default_locale_and_formats() {
    /// Fails the primary tier, then echoes the locale it compiled for.
    struct LocaleCheck;
    impl FormatterFactory for LocaleCheck {
        fn compile(
            &self,
            pattern: &Pattern,
            locale: &str,
            formats: &FormatOptions,
        ) -> Result<Arc<dyn Formatter>, FormatError> {
            match (pattern.source_text().as_ref(), locale) {
                ("primary", "fr") => Err(FormatError::Unsupported("primary".into())),
                ("default", "en") => {
                    assert_eq!(formats.get("money"), Some("integer"));
                    SimpleFormatterFactory.compile(&Pattern::from(locale), locale, formats)
                }
                other => panic!("unexpected compile {other:?}"),
            }
        }
    }

    let (config, rec) = config("fr", &[("x", "primary")]);
    let config = config.with_default_formats(FormatOptions::new().with("money", "integer"));
    let out = format_message(
        &config,
        &LocaleCheck,
        &MessageDescriptor::new("x").with_default("default"),
        &values(&[("v", "".into())]),
    );
    assert_eq!(out.as_text(), Some("en"));
    assert_eq!(rec.kinds(), vec![IntlErrorKind::FormatPrimary]);
}

#[test]
fn runaway_nesting_falls_back_to_default() {
    let hostile = "{a, select, other {".repeat(200_000);
    let (config, rec) = config("fr", &[("x", hostile.as_str())]);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("x").with_default("fallback"),
        &values(&[("a", "b".into())]),
    );
    assert_eq!(out.as_text(), Some("fallback"));
    assert_eq!(rec.kinds(), vec![IntlErrorKind::FormatPrimary]);
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Both tiers fail: a non-empty raw message wins
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn both_tiers_fail_raw_message_wins() {
    let (config, rec) = config("fr", &[("x", "raw")]);
    let factory = Scripted::rejecting(&["raw", "dflt"]);
    let out = format_message(
        &config,
        &factory,
        &MessageDescriptor::new("x").with_default("dflt"),
        &values(&[("a", 1.into())]),
    );
    assert_eq!(out.as_text(), Some("raw"));
    assert_eq!(rec.count(IntlErrorKind::Unformattable), 1);
    assert_eq!(
        rec.kinds(),
        vec![
            IntlErrorKind::FormatPrimary,
            IntlErrorKind::FormatDefault,
            IntlErrorKind::Unformattable,
        ]
    );
    assert_eq!(
        rec.messages()[2],
        "Cannot format message: \"x\", using message source as fallback."
    );
}

#[test]
fn no_message_failed_default_returns_default_source() {
    let (config, rec) = config("fr", &[]);
    let factory = Scripted::rejecting(&["dflt {a}"]);
    let out = format_message(
        &config,
        &factory,
        &MessageDescriptor::new("x").with_default("dflt {a}"),
        &values(&[("a", 1.into())]),
    );
    assert_eq!(out.as_text(), Some("dflt {a}"));
    assert_eq!(
        rec.kinds(),
        vec![IntlErrorKind::FormatDefault, IntlErrorKind::Unformattable]
    );
}

#[test]
fn nothing_to_format_embeds_values_as_json() {
    let (config, rec) = config("en", &[]);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("x"),
        &values(&[("b", "two".into()), ("a", 1.into())]),
    );
    assert_eq!(out.as_text(), Some(r#"x {"a":1,"b":"two"}"#));
    assert_eq!(
        rec.messages().last().map(String::as_str),
        Some("Cannot format message: \"x\", using message id as fallback.")
    );
}

// ═════════════════════════════════════════════════════════════════════════
// 6. HTML entry point escapes strings only
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn html_values_are_escaped_before_formatting() {
    let link = Embedded::new("<Link/>", "payload");
    let (config, _) = config("en", &[("x", "{name} {link}")]);
    let factory = Scripted::rejecting(&[]);
    let raw = values(&[("name", "<b>x</b>".into()), ("link", link.clone().into())]);

    let out = format_html_message(&config, &factory, &MessageDescriptor::new("x"), &raw);

    let seen = factory.observed();
    assert_eq!(seen.len(), 1);
    let name = seen[0]["name"].as_str().unwrap();
    assert!(!name.contains('<') && !name.contains('>'));
    assert!(matches!(&seen[0]["link"], Value::Embedded(e) if e.ptr_eq(&link)));
    assert_eq!(
        out,
        Rendered::Parts(vec![
            Part::Text("&lt;b&gt;x&lt;/b&gt; ".into()),
            Part::Embedded(link),
        ])
    );
    // The caller's values are untouched.
    assert_eq!(raw["name"], Value::from("<b>x</b>"));
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Fast path agrees with the full pipeline
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn fast_path_matches_full_pipeline() {
    for text in ["Plain", "Keep '{this}' literal", "a '{b}' c '{d}'"] {
        let (diagnostic, _) = config("en", &[("x", text)]);
        let optimized = diagnostic.clone().with_mode(RenderMode::Optimized);
        let d = MessageDescriptor::new("x");
        let slow = format_message(&diagnostic, &SimpleFormatterFactory, &d, &Values::new());
        let fast = format_message(&optimized, &SimpleFormatterFactory, &d, &Values::new());
        assert_eq!(fast, slow, "pattern {text:?}");
    }
}

#[test]
fn fast_path_never_calls_the_formatter() {
    struct Unreachable;
    impl FormatterFactory for Unreachable {
        fn compile(
            &self,
            _: &Pattern,
            _: &str,
            _: &FormatOptions,
        ) -> Result<Arc<dyn Formatter>, FormatError> {
            panic!("fast path compiled a pattern");
        }
    }

    let (config, _) = config("en", &[("x", "Hi")]);
    let config = config.with_mode(RenderMode::Optimized);
    let out = format_message(
        &config,
        &Unreachable,
        &MessageDescriptor::new("x"),
        &Values::new(),
    );
    assert_eq!(out.as_text(), Some("Hi"));
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Messages loaded from JSON resolve like inserted ones
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn json_message_table() {
    let messages =
        Messages::from_json_str(r#"{"hi": "Hallo {name}", "bye": "Tschüss"}"#).unwrap();
    let config = IntlConfig::new("de").with_messages(messages);
    let out = format_message(
        &config,
        &SimpleFormatterFactory,
        &MessageDescriptor::new("hi"),
        &values(&[("name", "Ann".into())]),
    );
    assert_eq!(out.as_text(), Some("Hallo Ann"));
}
