//! Python-flavoured rendering of literal values.
//!
//! Descriptions quote values the way a Python developer would read them
//! (`'text'`, `True`, `None`, `1e-05`), so rendering goes through these
//! helpers instead of Rust's `Debug` output.

use serde_yaml::Value;

/// `str.isupper()`: at least one cased character and no lowercase ones.
pub fn is_upper(text: &str) -> bool {
    let mut has_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Names starting with `_` are private unless they have the `__dunder__` form.
pub fn is_public_name(name: &str) -> bool {
    !name.starts_with('_') || is_dunder(name)
}

pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub fn bytes_repr(value: &str) -> String {
    format!("b{}", str_repr(value))
}

pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
        }
        return formatted;
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// `repr()` of a YAML scalar or collection.
pub fn value_repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(b) => bool_repr(*b).to_string(),
        Value::Number(n) => number_repr(n),
        Value::String(s) => str_repr(s),
        Value::Sequence(items) => {
            let inner: Vec<String> = items.iter().map(value_repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Mapping(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", value_repr(k), value_repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Tagged(tagged) => value_repr(&tagged.value),
    }
}

/// `str()` of a YAML mapping key.
pub fn key_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => key_str(&tagged.value),
        other => value_repr(other),
    }
}

pub fn number_repr(number: &serde_yaml::Number) -> String {
    if let Some(i) = number.as_i64() {
        i.to_string()
    } else if let Some(u) = number.as_u64() {
        u.to_string()
    } else {
        float_repr(number.as_f64().unwrap_or(f64::NAN))
    }
}

pub fn bool_repr(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Normalise an integer literal (`0x1F`, `1_000`) to its decimal repr.
pub fn int_literal_repr(literal: &str) -> String {
    let cleaned: String = literal.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()
    } else {
        lower.parse::<i128>().ok()
    };
    parsed.map(|v| v.to_string()).unwrap_or(cleaned)
}

pub fn float_literal_repr(literal: &str) -> String {
    let cleaned: String = literal.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<f64>()
        .map(float_repr)
        .unwrap_or(cleaned)
}

/// Decode the body of a Python string literal, quotes and prefix included.
///
/// Returns the decoded value and whether the literal was a bytes literal.
/// Formatted strings are not literals and yield `None`.
pub fn decode_string_literal(literal: &str) -> Option<(String, bool)> {
    let quote_start = literal.find(['\'', '"'])?;
    let prefix = literal[..quote_start].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('t') {
        return None;
    }
    let is_raw = prefix.contains('r');
    let is_bytes = prefix.contains('b');

    let quoted = &literal[quote_start..];
    let body = strip_quotes(quoted);
    let value = if is_raw { body.to_string() } else { unescape(body) };
    Some((value, is_bytes))
}

fn strip_quotes(text: &str) -> &str {
    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(rest) = text.strip_prefix(delim) {
            return rest.strip_suffix(delim).unwrap_or(rest);
        }
    }
    text
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => push_code_point(&mut out, &mut chars, 2, 'x'),
            Some('u') => push_code_point(&mut out, &mut chars, 4, 'u'),
            Some('U') => push_code_point(&mut out, &mut chars, 8, 'U'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    marker: char,
) {
    let mut hex = String::with_capacity(digits);
    for _ in 0..digits {
        match chars.peek() {
            Some(c) if c.is_ascii_hexdigit() => {
                hex.push(*c);
                chars.next();
            }
            _ => break,
        }
    }
    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
        Some(c) if hex.len() == digits => out.push(c),
        _ => {
            out.push('\\');
            out.push(marker);
            out.push_str(&hex);
        }
    }
}

/// Indentation cleanup applied to docstrings, as `inspect.cleandoc` does.
pub fn clean_docstring(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start().to_string());
    for line in &lines[1..] {
        let cut = (line.len() - line.trim_start().len()).min(margin);
        if line.is_char_boundary(cut) {
            cleaned.push(line[cut..].to_string());
        } else {
            cleaned.push(line.trim_start().to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_upper() {
        assert!(is_upper("MAX_SIZE"));
        assert!(is_upper("V2"));
        assert!(!is_upper("Max"));
        assert!(!is_upper("_1"));
        assert!(!is_upper(""));
    }

    #[test]
    fn test_public_names() {
        assert!(is_public_name("step"));
        assert!(is_public_name("__init__"));
        assert!(is_public_name("__call__"));
        assert!(!is_public_name("_helper"));
        assert!(!is_public_name("__mangled"));
        assert!(!is_public_name("____"));
    }

    #[test]
    fn test_str_repr_quote_choice() {
        assert_eq!(str_repr("abc"), "'abc'");
        assert_eq!(str_repr("it's"), "\"it's\"");
        assert_eq!(str_repr("both ' and \""), "'both \\' and \"'");
        assert_eq!(str_repr("a\nb"), "'a\\nb'");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(3.0), "3.0");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(2.5e20), "2.5e+20");
        assert_eq!(float_repr(f64::INFINITY), "inf");
    }

    #[test]
    fn test_value_repr() {
        let value: Value = serde_yaml::from_str("[1, 'a', true, null, 0.5]").unwrap();
        assert_eq!(value_repr(&value), "[1, 'a', True, None, 0.5]");

        let value: Value = serde_yaml::from_str("{a: 1}").unwrap();
        assert_eq!(value_repr(&value), "{'a': 1}");
    }

    #[test]
    fn test_key_str() {
        assert_eq!(key_str(&Value::String("lr".into())), "lr");
        assert_eq!(key_str(&Value::Bool(true)), "True");
        assert_eq!(key_str(&Value::Null), "None");
    }

    #[test]
    fn test_int_literal_repr() {
        assert_eq!(int_literal_repr("0x1F"), "31");
        assert_eq!(int_literal_repr("1_000"), "1000");
        assert_eq!(int_literal_repr("0b101"), "5");
    }

    #[test]
    fn test_decode_string_literal() {
        assert_eq!(decode_string_literal("'a\\tb'"), Some(("a\tb".to_string(), false)));
        assert_eq!(decode_string_literal("r'a\\tb'"), Some(("a\\tb".to_string(), false)));
        assert_eq!(decode_string_literal("b\"raw\""), Some(("raw".to_string(), true)));
        assert_eq!(decode_string_literal("\"\"\"doc\"\"\""), Some(("doc".to_string(), false)));
        assert_eq!(decode_string_literal("f'{x}'"), None);
    }

    #[test]
    fn test_clean_docstring() {
        let doc = "Summary line.\n\n    Details here.\n      Indented more.\n    ";
        assert_eq!(clean_docstring(doc), "Summary line.\n\nDetails here.\n  Indented more.");
        assert_eq!(clean_docstring("\n   Leading blank.\n"), "Leading blank.");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    proptest! {
        #[test]
        fn prop_underscore_names_are_public_only_when_dunder(name in "_[a-z_]{0,12}") {
            prop_assert_eq!(is_public_name(&name), is_dunder(&name));
        }

        #[test]
        fn prop_truncate_never_exceeds(text in ".{0,64}", max in 0usize..80) {
            prop_assert!(truncate_chars(&text, max).chars().count() <= max);
        }
    }
}
