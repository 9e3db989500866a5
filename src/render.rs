//! Per-row field synthesis: dotted-path lookup, template rendering and the
//! ISO week number derived from the invoice date.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Date formats tried in order when deriving the week number.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Resolve a dotted path against a nested JSON value.
/// A missing key or a non-object intermediate resolves to an empty string,
/// never an error, so partially extracted documents flow through untouched.
pub fn resolve_path(context: &Value, path: &str) -> Value {
    if path.is_empty() {
        return Value::String(String::new());
    }
    let mut current = context;
    for part in path.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return Value::String(String::new()),
        }
    }
    current.clone()
}

/// Text form of a scalar placeholder value. Objects and arrays render empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Substitute `{name}` placeholders from the context. `{{` and `}}` are
/// literal braces. If any referenced name is absent the whole rendering
/// degrades to the original template text - no partial substitution and no
/// error, so a half-extracted line item still yields a recognizable cell.
pub fn render_template(template: &str, context: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed {
                    return template.to_string();
                }
                match context.get(name.as_str()) {
                    Some(value) => out.push_str(&scalar_text(value)),
                    None => return template.to_string(),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    out
}

/// ISO-8601 week number (1-53) for a date string, trying each format in
/// DATE_FORMATS. Empty or unparseable input yields None, rendered as an
/// empty placeholder downstream.
pub fn week_of(date_str: &str) -> Option<u32> {
    if date_str.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, fmt) {
            return Some(date.iso_week().week());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_nested_value() {
        let ctx = json!({"a": {"b": 5}});
        assert_eq!(resolve_path(&ctx, "a.b"), json!(5));
    }

    #[test]
    fn resolve_missing_key_is_empty() {
        let ctx = json!({"a": {}});
        assert_eq!(resolve_path(&ctx, "a.b.c"), json!(""));
    }

    #[test]
    fn resolve_through_scalar_is_empty() {
        let ctx = json!({"a": 7});
        assert_eq!(resolve_path(&ctx, "a.b"), json!(""));
    }

    #[test]
    fn resolve_empty_path_is_empty() {
        assert_eq!(resolve_path(&json!({}), ""), json!(""));
    }

    #[test]
    fn render_substitutes_names() {
        let ctx = json!({"x": "foo", "w": 3});
        assert_eq!(render_template("{x} WK {w}", &ctx), "foo WK 3");
    }

    #[test]
    fn render_missing_name_keeps_template() {
        assert_eq!(render_template("{missing}", &json!({})), "{missing}");
        // One missing name degrades the whole rendering, not just that slot.
        let ctx = json!({"x": "foo"});
        assert_eq!(render_template("{x} and {gone}", &ctx), "{x} and {gone}");
    }

    #[test]
    fn render_escaped_braces() {
        let ctx = json!({"x": "foo"});
        assert_eq!(render_template("{{{x}}}", &ctx), "{foo}");
    }

    #[test]
    fn week_of_iso_dates() {
        assert_eq!(week_of("2024-01-04"), Some(1));
        // 2024-12-31 belongs to week 1 of ISO year 2025.
        assert_eq!(week_of("2024-12-31"), Some(1));
        assert_eq!(week_of("2024/06/15"), Some(24));
    }

    #[test]
    fn week_of_bad_input() {
        assert_eq!(week_of(""), None);
        assert_eq!(week_of("bad-date"), None);
        assert_eq!(week_of("15.06.2024"), None);
    }
}
