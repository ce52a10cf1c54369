//! CLDR plural rules and safe plural-category selection.
//!
//! Implements a subset of the Unicode CLDR plural rules covering the
//! most common language families. Each [`PluralRule`] maps a number to a
//! [`PluralCategory`]. [`format_plural`] puts a provider behind an error
//! boundary: whatever goes wrong, the caller gets a category.
//!
//! Rules read the CLDR operands of the absolute value: the integer digits
//! `i` and whether there are visible fraction digits (`v > 0`).
//!
//! | Family  | Integers                         | Fractions            |
//! |---------|----------------------------------|----------------------|
//! | English | `one` for 1                      | `other`              |
//! | French  | `one` for 0 and 1                | `one` when `i` is 0 or 1 |
//! | Russian | `one` / `few` / `many` by digits | `other`              |
//! | Polish  | `one` / `few` / `many` by digits | `other`              |
//! | Arabic  | all six categories by `n % 100`  | `other`              |
//! | CJK     | `other`                          | `other`              |
//!
//! # Limits
//!
//! An `f64` carries no trailing zeros, so `1.0` is read as `1` (CLDR would
//! give `1.0` fraction digits). French `many` for exact millions is not
//! modelled.
//!
//! # Invariants
//!
//! 1. Every `PluralRule` maps any number to exactly one `PluralCategory`.
//! 2. Rules are pure functions: same number always yields same category.
//! 3. `format_plural` never propagates a provider failure; it reports it
//!    once and answers [`PluralCategory::Other`].

use core::fmt;
use std::collections::BTreeMap;

use crate::config::IntlConfig;
use crate::error::{IntlError, IntlErrorKind, PluralError};

/// CLDR plural categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// All categories in CLDR order.
    pub const ALL: [Self; 6] = [
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Few,
        Self::Many,
        Self::Other,
    ];

    /// CLDR keyword for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }

    /// Parse a CLDR keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == keyword)
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plural rule function that maps a count to a plural category.
///
/// Built-in rules cover the most common CLDR language groups.
/// Custom rules can be provided via the function pointer variant.
#[derive(Clone)]
pub enum PluralRule {
    /// English-like: `one` for 1, `other` for everything else.
    English,
    /// Russian/Slavic: `one` for 1, `few` for 2-4, `many` for 5-20,
    /// then repeats based on last two digits.
    Russian,
    /// Arabic: `zero` for 0, `one` for 1, `two` for 2, `few` for 3-10,
    /// `many` for 11-99, `other` for 100+.
    Arabic,
    /// French-like: `one` for 0-1 including fractions below 2, `other`
    /// for everything else.
    French,
    /// Chinese/Japanese/Korean: always `other` (no plural distinction).
    CJK,
    /// Polish: similar to Russian but with different thresholds.
    Polish,
    /// English ordinals: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
    EnglishOrdinal,
    /// Custom rule function.
    Custom(fn(i64) -> PluralCategory),
}

impl PluralRule {
    /// Determine the plural category for the given count.
    #[must_use]
    pub fn categorize(&self, count: i64) -> PluralCategory {
        match self {
            Self::Custom(f) => f(count),
            _ => self.categorize_operands(Operands {
                i: count.unsigned_abs(),
                fraction: false,
            }),
        }
    }

    /// Determine the category for an arbitrary finite number.
    ///
    /// Custom rules only see integers; they get `other` for fractions.
    #[must_use]
    pub fn categorize_number(&self, value: f64) -> PluralCategory {
        let operands = Operands::of(value);
        match self {
            Self::Custom(_) if operands.fraction => PluralCategory::Other,
            Self::Custom(f) => f(operands.signed(value)),
            _ => self.categorize_operands(operands),
        }
    }

    fn categorize_operands(&self, ops: Operands) -> PluralCategory {
        match self {
            Self::English => english_rule(ops),
            Self::Russian => russian_rule(ops),
            Self::Arabic => arabic_rule(ops),
            Self::French => french_rule(ops),
            Self::CJK => PluralCategory::Other,
            Self::Polish => polish_rule(ops),
            Self::EnglishOrdinal => english_ordinal_rule(ops),
            Self::Custom(_) => PluralCategory::Other,
        }
    }

    /// Select the best rule for a locale tag (e.g., `"en"`, `"ru"`, `"ar"`).
    ///
    /// Falls back to English if the language is unknown.
    #[must_use]
    pub fn for_locale(lang: &str) -> Self {
        // Extract the primary language subtag
        let primary = lang.split(['-', '_']).next().unwrap_or(lang);

        match primary.to_ascii_lowercase().as_str() {
            "en" | "de" | "nl" | "sv" | "da" | "no" | "nb" | "nn" | "it" | "es" | "pt" | "el"
            | "hu" | "fi" | "et" | "he" | "tr" | "bg" => Self::English,
            "fr" | "hi" | "bn" => Self::French,
            "ru" | "uk" | "hr" | "sr" | "bs" => Self::Russian,
            "pl" => Self::Polish,
            "ar" => Self::Arabic,
            "zh" | "ja" | "ko" | "th" | "vi" | "id" | "ms" => Self::CJK,
            _ => Self::English,
        }
    }

    /// Select the ordinal rule for a locale tag.
    ///
    /// Only English distinguishes ordinal forms here; everything else maps
    /// to `other`.
    #[must_use]
    pub fn ordinal_for_locale(lang: &str) -> Self {
        let primary = lang.split(['-', '_']).next().unwrap_or(lang);
        if primary.eq_ignore_ascii_case("en") {
            Self::EnglishOrdinal
        } else {
            Self::CJK
        }
    }
}

impl fmt::Debug for PluralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "PluralRule::English"),
            Self::Russian => write!(f, "PluralRule::Russian"),
            Self::Arabic => write!(f, "PluralRule::Arabic"),
            Self::French => write!(f, "PluralRule::French"),
            Self::CJK => write!(f, "PluralRule::CJK"),
            Self::Polish => write!(f, "PluralRule::Polish"),
            Self::EnglishOrdinal => write!(f, "PluralRule::EnglishOrdinal"),
            Self::Custom(_) => write!(f, "PluralRule::Custom(...)"),
        }
    }
}

// ── Operands ────────────────────────────────────────────────────────

/// CLDR operands of `|n|`: integer digits and presence of a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Operands {
    i: u64,
    fraction: bool,
}

impl Operands {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn of(value: f64) -> Self {
        let abs = value.abs();
        Self {
            // Saturating cast: out-of-range magnitudes land on u64::MAX.
            i: abs.trunc() as u64,
            fraction: abs.fract() != 0.0,
        }
    }

    fn signed(self, value: f64) -> i64 {
        let i = i64::try_from(self.i).unwrap_or(i64::MAX);
        if value.is_sign_negative() { -i } else { i }
    }
}

// ── Rule implementations ────────────────────────────────────────────

fn english_rule(ops: Operands) -> PluralCategory {
    match ops {
        Operands { i: 1, fraction: false } => PluralCategory::One,
        _ => PluralCategory::Other,
    }
}

fn french_rule(ops: Operands) -> PluralCategory {
    if ops.i <= 1 {
        PluralCategory::One
    } else {
        PluralCategory::Other
    }
}

/// Russian and Polish share the `few` test on the last digits.
fn is_slavic_few(i: u64) -> bool {
    (2..=4).contains(&(i % 10)) && !(12..=14).contains(&(i % 100))
}

fn russian_rule(ops: Operands) -> PluralCategory {
    if ops.fraction {
        return PluralCategory::Other;
    }
    let i = ops.i;
    if i % 10 == 1 && i % 100 != 11 {
        PluralCategory::One
    } else if is_slavic_few(i) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn polish_rule(ops: Operands) -> PluralCategory {
    match ops {
        Operands { fraction: true, .. } => PluralCategory::Other,
        Operands { i: 1, .. } => PluralCategory::One,
        Operands { i, .. } if is_slavic_few(i) => PluralCategory::Few,
        _ => PluralCategory::Many,
    }
}

fn arabic_rule(ops: Operands) -> PluralCategory {
    if ops.fraction {
        return PluralCategory::Other;
    }
    match (ops.i, ops.i % 100) {
        (0, _) => PluralCategory::Zero,
        (1, _) => PluralCategory::One,
        (2, _) => PluralCategory::Two,
        (_, 3..=10) => PluralCategory::Few,
        (_, 11..=99) => PluralCategory::Many,
        _ => PluralCategory::Other,
    }
}

fn english_ordinal_rule(ops: Operands) -> PluralCategory {
    if ops.fraction {
        return PluralCategory::Other;
    }
    match (ops.i % 10, ops.i % 100) {
        (1, m) if m != 11 => PluralCategory::One,
        (2, m) if m != 12 => PluralCategory::Two,
        (3, m) if m != 13 => PluralCategory::Few,
        _ => PluralCategory::Other,
    }
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// Loose option bag as handed in by callers.
pub type OptionBag = BTreeMap<String, String>;

/// The only option keys forwarded to a plural-rules provider.
pub const PLURAL_FORMAT_OPTIONS: [&str; 2] = ["localeMatcher", "type"];

/// Plural options after whitelist filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluralOptions {
    /// `localeMatcher`: `"lookup"` or `"best fit"`.
    pub locale_matcher: Option<String>,
    /// `type`: `"cardinal"` or `"ordinal"`.
    pub plural_type: Option<String>,
}

impl PluralOptions {
    /// Keep the whitelisted keys of `bag`, silently dropping the rest.
    #[must_use]
    pub fn filter(bag: &OptionBag) -> Self {
        Self {
            locale_matcher: bag.get(PLURAL_FORMAT_OPTIONS[0]).cloned(),
            plural_type: bag.get(PLURAL_FORMAT_OPTIONS[1]).cloned(),
        }
    }
}

/// A locale-bound plural rule set.
pub trait PluralRules {
    /// Category for `value`.
    ///
    /// # Errors
    ///
    /// Implementations may reject values they cannot categorize.
    fn select(&self, value: f64) -> Result<PluralCategory, PluralError>;
}

/// Builds plural rules for a locale and filtered options.
///
/// Must be safe to call from several threads at once.
pub trait PluralRulesFactory: Send + Sync {
    /// Rules for `locale`.
    ///
    /// # Errors
    ///
    /// Bad locales or options are reported as [`PluralError`].
    fn plural_rules(
        &self,
        locale: &str,
        options: &PluralOptions,
    ) -> Result<Box<dyn PluralRules>, PluralError>;
}

impl<F> PluralRulesFactory for F
where
    F: Fn(&str, &PluralOptions) -> Result<Box<dyn PluralRules>, PluralError> + Send + Sync,
{
    fn plural_rules(
        &self,
        locale: &str,
        options: &PluralOptions,
    ) -> Result<Box<dyn PluralRules>, PluralError> {
        self(locale, options)
    }
}

impl PluralRules for PluralRule {
    fn select(&self, value: f64) -> Result<PluralCategory, PluralError> {
        if !value.is_finite() {
            return Err(PluralError::InvalidValue(value));
        }
        Ok(self.categorize_number(value))
    }
}

/// Built-in provider backed by [`PluralRule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CldrPluralRules;

impl PluralRulesFactory for CldrPluralRules {
    fn plural_rules(
        &self,
        locale: &str,
        options: &PluralOptions,
    ) -> Result<Box<dyn PluralRules>, PluralError> {
        validate_locale(locale)?;
        if let Some(matcher) = options.locale_matcher.as_deref()
            && !matches!(matcher, "lookup" | "best fit")
        {
            return Err(PluralError::InvalidOption {
                key: "localeMatcher".into(),
                value: matcher.into(),
            });
        }
        let rule = match options.plural_type.as_deref() {
            None | Some("cardinal") => PluralRule::for_locale(locale),
            Some("ordinal") => PluralRule::ordinal_for_locale(locale),
            Some(other) => {
                return Err(PluralError::InvalidOption {
                    key: "type".into(),
                    value: other.into(),
                });
            }
        };
        Ok(Box::new(rule))
    }
}

/// Structural BCP 47 check: a 2-3 or 5-8 letter language subtag followed by
/// 1-8 character alphanumeric subtags.
fn validate_locale(locale: &str) -> Result<(), PluralError> {
    let invalid = || PluralError::InvalidLocale(locale.to_owned());
    let mut subtags = locale.split(['-', '_']);
    let language = subtags.next().unwrap_or_default();
    if !matches!(language.len(), 2 | 3 | 5..=8)
        || !language.bytes().all(|b| b.is_ascii_alphabetic())
    {
        return Err(invalid());
    }
    for subtag in subtags {
        if subtag.is_empty()
            || subtag.len() > 8
            || !subtag.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(invalid());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Plural category of `value` in the configured locale.
///
/// `options` is filtered down to [`PLURAL_FORMAT_OPTIONS`] before it reaches
/// the provider. Any provider failure is reported once through the config's
/// error sink and answered with [`PluralCategory::Other`].
pub fn format_plural(
    config: &IntlConfig,
    rules: &dyn PluralRulesFactory,
    value: f64,
    options: &OptionBag,
) -> PluralCategory {
    let filtered = PluralOptions::filter(options);
    match rules
        .plural_rules(&config.locale, &filtered)
        .and_then(|rules| rules.select(value))
    {
        Ok(category) => category,
        Err(err) => {
            config.report(
                IntlError::new(IntlErrorKind::PluralSelection, "Error formatting plural.")
                    .with_cause(err),
            );
            PluralCategory::Other
        }
    }
}
