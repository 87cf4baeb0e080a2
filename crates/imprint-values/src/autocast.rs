//! Best-effort typing of `KEY=VALUE` strings.

use serde_json::{Number, Value};

use crate::error::{Result, ValuesError};
use crate::merge::ValueTree;

/// Parses a boolean the way humans write them on a command line.
///
/// Accepts `true`/`yes` and `false`/`no`, case-insensitively.
pub fn booleanize(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Converts a string into the most specific scalar it parses as.
///
/// Tries, in order: integer, float, boolean. Anything else stays a string.
/// Non-finite floats (`nan`, `inf`) are kept as strings since JSON cannot hold them.
pub fn autocast(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(float) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    if let Some(flag) = booleanize(raw) {
        return Value::Bool(flag);
    }
    Value::String(raw.to_string())
}

/// Parses `KEY=VALUE` pairs into a flat, still dot-notated, mapping.
///
/// Later pairs override earlier ones with the same key. Only the first `=`
/// separates key from value.
pub fn parse_assignments<I, S>(pairs: I) -> Result<ValueTree>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flat = ValueTree::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| ValuesError::InvalidAssignment(pair.to_string()))?;
        flat.insert(key.to_string(), autocast(raw));
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn casts_integers() {
        assert_eq!(autocast("42"), json!(42));
        assert_eq!(autocast("-7"), json!(-7));
    }

    #[test]
    fn casts_floats() {
        assert_eq!(autocast("3.5"), json!(3.5));
    }

    #[test]
    fn casts_booleans() {
        assert_eq!(autocast("true"), json!(true));
        assert_eq!(autocast("YES"), json!(true));
        assert_eq!(autocast("No"), json!(false));
    }

    #[test]
    fn keeps_strings() {
        assert_eq!(autocast("hello"), json!("hello"));
        assert_eq!(autocast(""), json!(""));
        assert_eq!(autocast("nan"), json!("nan"));
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let flat = parse_assignments(["a.b=1", "url=http://x?y=z"]).unwrap();
        assert_eq!(flat["a.b"], json!(1));
        assert_eq!(flat["url"], json!("http://x?y=z"));
    }

    #[test]
    fn assignment_without_equals_is_an_error() {
        assert!(matches!(
            parse_assignments(["novalue"]),
            Err(ValuesError::InvalidAssignment(_))
        ));
    }
}
