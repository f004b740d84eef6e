//! Argument-building: turn raw `key="value"` attribute pairs into the JSON
//! payload a tool's dispatch closure expects (spec.md §4.4, §6).

use serde_json::Value;

/// The fixed set of attribute keys the extractor recognizes. Anything else on
/// a `<tool_call ... />` tag (besides `name`) is ignored — tools only ever
/// draw on this set, so there is no schema to consult at extraction time.
pub const RECOGNIZED_ARG_KEYS: &[&str] = &[
    "expression",
    "value",
    "percentage",
    "operation",
    "from",
    "to",
    "amount",
    "duration_seconds",
    "label",
    "hour",
    "minute",
    "decimal_places",
];

/// Builds the JSON arguments object for a tool call out of its raw attribute
/// pairs, coercing values that look numeric into JSON numbers and leaving
/// everything else as JSON strings.
pub struct ToolCallArgBuilder;

impl ToolCallArgBuilder {
    /// Build the arguments object from `attrs` (attribute pairs as captured
    /// by the scanner, `name` included but skipped here). Unrecognized keys
    /// are dropped.
    pub fn build(attrs: &[(String, String)]) -> Value {
        let mut map = serde_json::Map::new();
        for (key, raw_value) in attrs {
            if key == "name" || !RECOGNIZED_ARG_KEYS.contains(&key.as_str()) {
                continue;
            }
            map.insert(key.clone(), coerce(raw_value));
        }
        Value::Object(map)
    }
}

/// Coerce a raw attribute value: numeric-shaped strings become JSON numbers,
/// everything else stays a JSON string.
fn coerce(raw: &str) -> Value {
    if is_numeric_shape(raw) {
        if let Ok(n) = serde_json::from_str::<serde_json::Number>(raw) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

/// `[+-]?[0-9]+(\.[0-9]+)?` — deliberately narrow: no exponents, no leading
/// dot, no trailing dot, matching spec.md §4.4's numeric coercion rule
/// exactly rather than general JSON number syntax.
fn is_numeric_shape(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }

    let mut saw_int_digit = false;
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_int_digit = true;
    }
    if !saw_int_digit {
        return false;
    }

    if matches!(chars.peek(), Some('.')) {
        chars.next();
        let mut saw_frac_digit = false;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_frac_digit = true;
        }
        if !saw_frac_digit {
            return false;
        }
    }

    chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_integers_and_decimals() {
        assert!(is_numeric_shape("42"));
        assert!(is_numeric_shape("-42"));
        assert!(is_numeric_shape("+3"));
        assert!(is_numeric_shape("3.14"));
        assert!(is_numeric_shape("-0.5"));
    }

    #[test]
    fn rejects_non_numeric_shapes() {
        assert!(!is_numeric_shape(""));
        assert!(!is_numeric_shape("3."));
        assert!(!is_numeric_shape(".5"));
        assert!(!is_numeric_shape("1e10"));
        assert!(!is_numeric_shape("abc"));
        assert!(!is_numeric_shape("12abc"));
        assert!(!is_numeric_shape("--5"));
    }

    #[test]
    fn numeric_values_become_unquoted_json_numbers() {
        let attrs = vec![
            ("amount".to_string(), "12.5".to_string()),
            ("label".to_string(), "kitchen timer".to_string()),
        ];
        let args = ToolCallArgBuilder::build(&attrs);
        assert_eq!(args["amount"], serde_json::json!(12.5));
        assert_eq!(args["label"], serde_json::json!("kitchen timer"));
    }

    #[test]
    fn unrecognized_and_name_keys_are_dropped() {
        let attrs = vec![
            ("name".to_string(), "calculator_compute".to_string()),
            ("expression".to_string(), "2+2".to_string()),
            ("bogus".to_string(), "ignored".to_string()),
        ];
        let args = ToolCallArgBuilder::build(&attrs);
        let obj = args.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["expression"], serde_json::json!("2+2"));
    }
}
