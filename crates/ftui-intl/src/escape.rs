//! HTML escaping for values bound for markup.

use crate::value::{Value, Values};

/// HTML-escape a string: `&`, `<`, `>`, `"` and `'`.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_html_into(&mut out, s);
    out
}

/// HTML-escape a string into the output buffer.
fn escape_html_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// Copy of `values` with every string escaped.
///
/// Non-string values are cloned handles of the originals: objects, lists
/// and embedded content keep their identity and are not escaped. The input
/// map is left untouched.
#[must_use]
pub fn escape_values(values: &Values) -> Values {
    values
        .iter()
        .map(|(name, value)| {
            let escaped = match value {
                Value::String(s) => Value::String(escape_html(s)),
                other => other.clone(),
            };
            (name.clone(), escaped)
        })
        .collect()
}
