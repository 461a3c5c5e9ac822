//! Flat `key: value` front matter at the head of a markdown document.
//!
//! Only the subset skill documents use is understood: scalars, inline lists,
//! and comments. Nested mappings and block lists are skipped line by line.

use sgqs_api::{Properties, PropertyValue};

/// Splits `content` into its front matter block (without fences) and body.
///
/// Returns `None` for the block when the document does not open with a
/// `---` fence that is closed later on.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let Some(close) = rest.find("\n---") else {
        return (None, content);
    };
    let block = rest[..close].strip_suffix('\r').unwrap_or(&rest[..close]);
    let after = &rest[close + "\n---".len()..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    (Some(block), body)
}

/// Parses the front matter of `content` into a property bag.
///
/// Documents without front matter yield an empty bag.
pub fn parse(content: &str) -> Properties {
    let mut properties = Properties::new();
    let (Some(block), _) = split(content) else {
        return properties;
    };

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim_end();
        if !is_key(key) {
            continue;
        }
        properties.insert(normalize_key(key).to_string(), parse_value(raw.trim()));
    }
    properties
}

fn is_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn normalize_key(key: &str) -> &str {
    match key {
        "allowed-tools" => "tools",
        "argument-hint" => "argumentHint",
        other => other,
    }
}

pub fn parse_value(raw: &str) -> PropertyValue {
    match raw {
        "" | "~" | "null" => return PropertyValue::Null,
        "true" | "True" | "TRUE" => return PropertyValue::Bool(true),
        "false" | "False" | "FALSE" => return PropertyValue::Bool(false),
        _ => {}
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return PropertyValue::List(Vec::new());
        }
        return PropertyValue::List(
            inner
                .split(',')
                .map(|item| unquote(item.trim()).to_string())
                .collect(),
        );
    }

    if let Some(unquoted) = quoted(raw) {
        return PropertyValue::String(unquoted.to_string());
    }

    if let Some(number) = parse_number(raw) {
        return number;
    }

    PropertyValue::String(raw.to_string())
}

fn quoted(raw: &str) -> Option<&str> {
    if raw.len() < 2 {
        return None;
    }
    ['"', '\'']
        .into_iter()
        .find_map(|q| raw.strip_prefix(q).and_then(|r| r.strip_suffix(q)))
}

fn unquote(raw: &str) -> &str {
    quoted(raw).unwrap_or(raw)
}

/// `-?digits(.digits)?`; integral values collapse to `Int`.
fn parse_number(raw: &str) -> Option<PropertyValue> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !frac.is_none_or(all_digits) {
        return None;
    }

    if frac.is_none()
        && let Ok(int) = raw.parse::<i64>()
    {
        return Some(PropertyValue::Int(int));
    }
    let float = raw.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(PropertyValue::Int(float as i64))
    } else {
        Some(PropertyValue::Float(float))
    }
}
