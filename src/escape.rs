//! LaTeX escaping
//!
//! Record content is arbitrary user text, so every character that LaTeX treats
//! specially is replaced before the text reaches the generated `.tex` source.
//! Substitution is a single left-to-right pass over characters, so replacement
//! text (which itself contains `\`, `{` and `}`) is never rescanned.

use serde_json::Value;

/// Key suffix marking a field as pre-formatted LaTeX that must not be escaped
pub const RAW_SUFFIX: &str = "_tex";

/// Replacement for a single character, or `None` if it passes through
fn replacement(c: char) -> Option<&'static str> {
    let escaped = match c {
        '$' => "\\$",
        '%' => "\\%",
        '&' => "\\&",
        '#' => "\\#",
        '_' => "\\_",
        '{' => "\\{",
        '}' => "\\}",
        '[' => "{[}",
        ']' => "{]}",
        '\'' => "{'}",
        '\\' => "\\textbackslash{}",
        '~' => "\\textasciitilde{}",
        '<' => "\\textless{}",
        '>' => "\\textgreater{}",
        '^' => "\\textasciicircum{}",
        '`' => "{}`",
        '\n' => "\\newline{}",
        _ => return None,
    };
    Some(escaped)
}

/// Escape a string for inclusion in LaTeX source
///
/// # Example
///
/// ```
/// use pca_template_preview::escape::escape_latex;
///
/// assert_eq!(escape_latex("50% Off"), "50\\% Off");
/// ```
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match replacement(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Escape every string inside a JSON value, in place
///
/// Objects are walked key by key, skipping any key ending in `raw_suffix`
/// together with everything nested beneath it. Arrays are walked element by
/// element. Numbers, booleans and null are left alone.
pub fn escape_structure(value: &mut Value, raw_suffix: &str) {
    match value {
        Value::String(s) => *s = escape_latex(s),
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key.ends_with(raw_suffix) {
                    continue;
                }
                escape_structure(child, raw_suffix);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                escape_structure(item, raw_suffix);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
