//! Reference formatter over the [`parser`](crate::parser) subset.
//!
//! Good enough for UI strings: arguments, numbers with a couple of styles,
//! plurals (cardinal and ordinal) and selects. Plural categories come from
//! the built-in [`PluralRule`] tables for the formatter's locale. Numbers
//! are rendered without locale-specific grouping.
//!
//! # Example
//!
//! ```
//! use ftui_intl::config::FormatOptions;
//! use ftui_intl::formatter::{Formatter, FormatterFactory};
//! use ftui_intl::pattern::Pattern;
//! use ftui_intl::simple::SimpleFormatterFactory;
//! use ftui_intl::value::{Value, Values};
//!
//! let formatter = SimpleFormatterFactory
//!     .compile(
//!         &Pattern::from("{n, plural, one {# file} other {# files}}"),
//!         "en",
//!         &FormatOptions::default(),
//!     )
//!     .unwrap();
//!
//! let mut values = Values::new();
//! values.insert("n".into(), Value::from(3));
//! assert_eq!(formatter.render(&values).unwrap(), "3 files");
//! ```

use std::sync::Arc;

use crate::config::FormatOptions;
use crate::error::FormatError;
use crate::formatter::{Formatter, FormatterFactory, Part};
use crate::parser::parse;
use crate::pattern::{Node, Pattern, PluralKey};
use crate::plural::{PluralCategory, PluralRule};
use crate::value::{MAX_SAFE_INTEGER, Value, Values};

/// Factory for [`SimpleFormatter`]s. Stateless; wrap it in a
/// [`CachedFormatterFactory`](crate::cache::CachedFormatterFactory) to
/// reuse compiled patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFormatterFactory;

impl FormatterFactory for SimpleFormatterFactory {
    fn compile(
        &self,
        pattern: &Pattern,
        locale: &str,
        formats: &FormatOptions,
    ) -> Result<Arc<dyn Formatter>, FormatError> {
        let nodes = match pattern {
            Pattern::RawText(text) => parse(text)?,
            Pattern::CompiledNodes(nodes) => nodes.clone(),
        };
        Ok(Arc::new(SimpleFormatter {
            nodes,
            cardinal: PluralRule::for_locale(locale),
            ordinal: PluralRule::ordinal_for_locale(locale),
            formats: formats.clone(),
        }))
    }
}

/// A compiled pattern bound to a locale and named formats.
#[derive(Debug)]
pub struct SimpleFormatter {
    nodes: Vec<Node>,
    cardinal: PluralRule,
    ordinal: PluralRule,
    formats: FormatOptions,
}

impl SimpleFormatter {
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        values: &Values,
        pound: Option<f64>,
        out: &mut PartsBuilder,
    ) -> Result<(), FormatError> {
        for node in nodes {
            match node {
                Node::Literal(text) => out.push_text(text),
                Node::Argument(name) => match lookup(values, name)? {
                    Value::Null => {}
                    Value::Bool(b) => out.push_text(if *b { "true" } else { "false" }),
                    Value::Number(n) => out.push_text(&format_number(*n)),
                    Value::String(s) => out.push_text(s),
                    Value::Embedded(e) => out.push_part(Part::Embedded(e.clone())),
                    other @ (Value::List(_) | Value::Object(_)) => {
                        return Err(FormatError::InvalidArgument {
                            name: name.clone(),
                            reason: format!("cannot render a {}", other.type_name()),
                        });
                    }
                },
                Node::Number { name, style } => {
                    let n = number_arg(values, name)?;
                    out.push_text(&self.format_styled(n, style.as_deref())?);
                }
                Node::Plural {
                    name,
                    ordinal,
                    offset,
                    arms,
                } => {
                    let n = number_arg(values, name)?;
                    #[allow(clippy::cast_precision_loss)]
                    let adjusted = n - *offset as f64;
                    let rule = if *ordinal { &self.ordinal } else { &self.cardinal };
                    let category = rule.categorize_number(adjusted);
                    #[allow(clippy::cast_precision_loss)]
                    let arm = arms
                        .iter()
                        .find(|arm| matches!(arm.key, PluralKey::Exact(k) if k as f64 == n))
                        .or_else(|| {
                            arms.iter()
                                .find(|arm| arm.key == PluralKey::Category(category))
                        })
                        .or_else(|| {
                            arms.iter().find(|arm| {
                                arm.key == PluralKey::Category(PluralCategory::Other)
                            })
                        })
                        .ok_or_else(|| FormatError::InvalidArgument {
                            name: name.clone(),
                            reason: format!("no plural arm for '{category}'"),
                        })?;
                    self.render_nodes(&arm.body, values, Some(adjusted), out)?;
                }
                Node::Select { name, arms } => {
                    let key = match lookup(values, name)? {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => format_number(*n),
                        Value::Bool(b) => b.to_string(),
                        _ => "other".to_owned(),
                    };
                    let arm = arms
                        .iter()
                        .find(|arm| arm.key == key)
                        .or_else(|| arms.iter().find(|arm| arm.key == "other"))
                        .ok_or_else(|| FormatError::InvalidArgument {
                            name: name.clone(),
                            reason: format!("no select arm for '{key}'"),
                        })?;
                    self.render_nodes(&arm.body, values, pound, out)?;
                }
                Node::Pound => match pound {
                    Some(n) => out.push_text(&format_number(n)),
                    None => out.push_text("#"),
                },
            }
        }
        Ok(())
    }

    /// Apply a number style, resolving named formats first.
    fn format_styled(&self, n: f64, style: Option<&str>) -> Result<String, FormatError> {
        let style = style.map(|s| self.formats.get(s).unwrap_or(s));
        match style {
            None => Ok(format_number(n)),
            Some("integer") => Ok(format_number(n.round())),
            Some("percent") => Ok(format!("{}%", format_number((n * 100.0).round()))),
            Some(other) => Err(FormatError::Unsupported(format!("number style '{other}'"))),
        }
    }
}

impl Formatter for SimpleFormatter {
    fn render_rich(&self, values: &Values) -> Result<Vec<Part>, FormatError> {
        let mut out = PartsBuilder::default();
        self.render_nodes(&self.nodes, values, None, &mut out)?;
        Ok(out.finish())
    }
}

fn lookup<'v>(values: &'v Values, name: &str) -> Result<&'v Value, FormatError> {
    values
        .get(name)
        .ok_or_else(|| FormatError::MissingArgument(name.to_owned()))
}

fn number_arg(values: &Values, name: &str) -> Result<f64, FormatError> {
    let value = lookup(values, name)?;
    value.as_number().ok_or_else(|| FormatError::InvalidArgument {
        name: name.to_owned(),
        reason: format!("expected a number, got {}", value.type_name()),
    })
}

/// Shortest decimal form; integral values have no fraction.
#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Accumulates parts, merging adjacent text.
#[derive(Default)]
struct PartsBuilder {
    parts: Vec<Part>,
    pending: String,
}

impl PartsBuilder {
    fn push_text(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    fn push_part(&mut self, part: Part) {
        if !self.pending.is_empty() {
            self.parts
                .push(Part::Text(std::mem::take(&mut self.pending)));
        }
        self.parts.push(part);
    }

    /// Output never comes back empty: a blank render is a single empty
    /// text part.
    fn finish(mut self) -> Vec<Part> {
        if !self.pending.is_empty() || self.parts.is_empty() {
            self.parts.push(Part::Text(self.pending));
        }
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Embedded;

    fn compile(pattern: &str, locale: &str) -> Arc<dyn Formatter> {
        SimpleFormatterFactory
            .compile(&Pattern::from(pattern), locale, &FormatOptions::default())
            .unwrap()
    }

    fn values(entries: &[(&str, Value)]) -> Values {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn interpolates_arguments() {
        let f = compile("Hello {name}!", "en");
        let v = values(&[("name", "Ann".into())]);
        assert_eq!(f.render(&v).unwrap(), "Hello Ann!");
    }

    #[test]
    fn missing_argument_is_an_error() {
        let f = compile("Hello {name}!", "en");
        assert_eq!(
            f.render(&Values::new()),
            Err(FormatError::MissingArgument("name".into()))
        );
    }

    #[test]
    fn object_argument_is_an_error() {
        let f = compile("{x}", "en");
        let v = values(&[("x", crate::value::ObjectRef::new().into())]);
        assert!(matches!(
            f.render(&v),
            Err(FormatError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn embedded_values_become_parts() {
        let link = Embedded::new("<Link>", ());
        let f = compile("See {link} now", "en");
        let v = values(&[("link", link.clone().into())]);
        assert_eq!(
            f.render_rich(&v).unwrap(),
            vec![
                Part::Text("See ".into()),
                Part::Embedded(link),
                Part::Text(" now".into()),
            ]
        );
    }

    #[test]
    fn adjacent_text_is_merged() {
        let f = compile("{a}{b}c", "en");
        let v = values(&[("a", "x".into()), ("b", 2.into())]);
        assert_eq!(f.render_rich(&v).unwrap(), vec![Part::Text("x2c".into())]);
    }

    #[test]
    fn blank_render_is_one_empty_part() {
        let f = compile("{a}", "en");
        let v = values(&[("a", "".into())]);
        assert_eq!(f.render_rich(&v).unwrap(), vec![Part::Text(String::new())]);
    }

    #[test]
    fn english_plural_with_exact_and_offset() {
        let f = compile(
            "{n, plural, offset:1 =0 {nobody} =1 {just you} one {you and # other} other {you and # others}}",
            "en",
        );
        let render = |n: i32| f.render(&values(&[("n", n.into())])).unwrap();
        assert_eq!(render(0), "nobody");
        assert_eq!(render(1), "just you");
        assert_eq!(render(2), "you and 1 other");
        assert_eq!(render(5), "you and 4 others");
    }

    #[test]
    fn russian_plural_categories() {
        let f = compile("{n, plural, one {# файл} few {# файла} many {# файлов} other {# файла}}", "ru");
        let render = |n: i32| f.render(&values(&[("n", n.into())])).unwrap();
        assert_eq!(render(1), "1 файл");
        assert_eq!(render(3), "3 файла");
        assert_eq!(render(11), "11 файлов");
    }

    #[test]
    fn ordinal_plural() {
        let f = compile(
            "{n, selectordinal, one {#st} two {#nd} few {#rd} other {#th}}",
            "en",
        );
        let render = |n: i32| f.render(&values(&[("n", n.into())])).unwrap();
        assert_eq!(render(1), "1st");
        assert_eq!(render(22), "22nd");
        assert_eq!(render(13), "13th");
    }

    #[test]
    fn select_falls_back_to_other() {
        let f = compile("{g, select, female {She} male {He} other {They}}", "en");
        assert_eq!(f.render(&values(&[("g", "female".into())])).unwrap(), "She");
        assert_eq!(f.render(&values(&[("g", "robot".into())])).unwrap(), "They");
    }

    #[test]
    fn plural_requires_number() {
        let f = compile("{n, plural, other {#}}", "en");
        assert!(matches!(
            f.render(&values(&[("n", "three".into())])),
            Err(FormatError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn number_styles_and_named_formats() {
        let formats = FormatOptions::new().with("money", "integer");
        let f = SimpleFormatterFactory
            .compile(
                &Pattern::from("{a, number} {b, number, percent} {c, number, money}"),
                "en",
                &formats,
            )
            .unwrap();
        let v = values(&[("a", 2.5.into()), ("b", 0.25.into()), ("c", 9.6.into())]);
        assert_eq!(f.render(&v).unwrap(), "2.5 25% 10");
    }

    #[test]
    fn unknown_number_style() {
        let f = compile("{a, number, currency}", "en");
        assert_eq!(
            f.render(&values(&[("a", 1.into())])),
            Err(FormatError::Unsupported("number style 'currency'".into()))
        );
    }

    #[test]
    fn compiled_nodes_are_used_directly() {
        let f = SimpleFormatterFactory
            .compile(
                &Pattern::CompiledNodes(vec![
                    Node::Literal("Hi ".into()),
                    Node::Argument("who".into()),
                ]),
                "en",
                &FormatOptions::default(),
            )
            .unwrap();
        assert_eq!(f.render(&values(&[("who", "Bo".into())])).unwrap(), "Hi Bo");
    }

    #[test]
    fn syntax_errors_surface_from_compile() {
        let err = SimpleFormatterFactory
            .compile(&Pattern::from("{oops"), "en", &FormatOptions::default())
            .err();
        assert!(matches!(err, Some(FormatError::Syntax { .. })));
    }
}
