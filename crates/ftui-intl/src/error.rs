//! Error values and the error side channel.
//!
//! Formatting failures never unwind through the engine. Collaborators
//! return [`FormatError`] or [`PluralError`]; the engine wraps them in an
//! [`IntlError`] and hands it to the configured [`ErrorSink`], then keeps
//! going with the next fallback tier.
//!
//! # Failure Modes
//!
//! | Kind | Cause | Engine behavior |
//! |------|-------|-----------------|
//! | `MissingMessage` | id not in the message table | try default message |
//! | `FormatPrimary` | compile/render of the message failed | try default message |
//! | `FormatDefault` | compile/render of the default message failed | synthesize text |
//! | `Unformattable` | no tier produced output | synthesize text |
//! | `PluralSelection` | plural provider failed | answer `other` |

use core::fmt;
use std::error::Error;

/// Compile or render failure reported by a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The pattern is not valid message syntax.
    Syntax { offset: usize, reason: String },
    /// The pattern references an argument the values do not provide.
    MissingArgument(String),
    /// An argument has a type the pattern cannot use.
    InvalidArgument { name: String, reason: String },
    /// The pattern uses a feature this formatter does not implement.
    Unsupported(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { offset, reason } => {
                write!(f, "syntax error at offset {offset}: {reason}")
            }
            Self::MissingArgument(name) => {
                write!(f, "the value for argument '{name}' was not provided")
            }
            Self::InvalidArgument { name, reason } => {
                write!(f, "invalid value for argument '{name}': {reason}")
            }
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl Error for FormatError {}

/// Failure reported by a plural-rules provider.
#[derive(Debug, Clone, PartialEq)]
pub enum PluralError {
    /// The locale tag is malformed.
    InvalidLocale(String),
    /// An option carries a value the provider does not accept.
    InvalidOption { key: String, value: String },
    /// The number cannot be categorized.
    InvalidValue(f64),
}

impl fmt::Display for PluralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLocale(l) => write!(f, "invalid locale: {l:?}"),
            Self::InvalidOption { key, value } => {
                write!(f, "invalid value {value:?} for option '{key}'")
            }
            Self::InvalidValue(v) => write!(f, "cannot select a plural category for {v}"),
        }
    }
}

impl Error for PluralError {}

/// Underlying failure attached to an [`IntlError`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorCause {
    Format(FormatError),
    Plural(PluralError),
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => e.fmt(f),
            Self::Plural(e) => e.fmt(f),
        }
    }
}

impl Error for ErrorCause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            Self::Plural(e) => Some(e),
        }
    }
}

impl From<FormatError> for ErrorCause {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<PluralError> for ErrorCause {
    fn from(value: PluralError) -> Self {
        Self::Plural(value)
    }
}

/// Classification of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntlErrorKind {
    /// No message for the id in the active locale.
    MissingMessage,
    /// The locale's message failed to compile or render.
    FormatPrimary,
    /// The default message failed to compile or render.
    FormatDefault,
    /// No tier produced output; the result is synthesized text.
    Unformattable,
    /// Plural category selection failed.
    PluralSelection,
}

impl IntlErrorKind {
    /// Stable snake-case name, used as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingMessage => "missing_message",
            Self::FormatPrimary => "format_primary",
            Self::FormatDefault => "format_default",
            Self::Unformattable => "unformattable",
            Self::PluralSelection => "plural_selection",
        }
    }

    /// Whether this kind is a warning rather than a failure.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::MissingMessage | Self::Unformattable)
    }
}

impl fmt::Display for IntlErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error delivered to an [`ErrorSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntlError {
    kind: IntlErrorKind,
    message: String,
    cause: Option<ErrorCause>,
}

impl IntlError {
    /// Create an error without a cause.
    pub fn new(kind: IntlErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<ErrorCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> IntlErrorKind {
        self.kind
    }

    /// Human-readable description, without the cause.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for IntlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ftui-intl] {}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, "\n{cause}")?;
        }
        Ok(())
    }
}

impl Error for IntlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receiver for reported errors.
///
/// Reporting is fire-and-forget: implementations must not panic and must
/// tolerate calls from several threads.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: IntlError);
}

impl<F> ErrorSink for F
where
    F: Fn(IntlError) + Send + Sync,
{
    fn report(&self, error: IntlError) {
        self(error);
    }
}

/// Default sink: forwards errors to `tracing`.
///
/// Warnings are logged at `WARN`, failures at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: IntlError) {
        let cause = error.cause().map(ToString::to_string);
        if error.kind().is_warning() {
            tracing::warn!(kind = %error.kind(), cause = ?cause, "{}", error.message());
        } else {
            tracing::error!(kind = %error.kind(), cause = ?cause, "{}", error.message());
        }
    }
}
