//! Structural JSON equivalence between an expected literal and a response body
//!
//! Objects compare by key set and value, ignoring key order. Arrays compare
//! element-wise, so order matters; callers that need order-independence sort
//! both sides first. Numbers compare by value, so `1` and `1.0` are equal while
//! `"1"` and `1` are not.

use serde_json::{Number, Value};

/// Whether `actual` holds the same JSON document as `expected`.
///
/// Unparsable input on either side is never equivalent.
pub fn equivalent(expected: &str, actual: &[u8]) -> bool {
    match parse_pair(expected, actual) {
        Some((want, got)) => values_equivalent(&want, &got),
        None => false,
    }
}

/// The "no content" check used for 204 responses. Never parses.
pub fn is_empty_body(actual: &[u8]) -> bool {
    actual.is_empty()
}

/// JSON pointer of the first place the two documents diverge.
///
/// Returns `None` when they are equivalent. Unparsable input reports the
/// document root.
pub fn first_difference(expected: &str, actual: &[u8]) -> Option<String> {
    match parse_pair(expected, actual) {
        Some((want, got)) => diff_at(&want, &got, String::new()),
        None => Some("/".to_string()),
    }
}

fn parse_pair(expected: &str, actual: &[u8]) -> Option<(Value, Value)> {
    let want = serde_json::from_str::<Value>(expected).ok()?;
    let got = serde_json::from_slice::<Value>(actual).ok()?;
    Some((want, got))
}

fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equivalent(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| values_equivalent(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (as_integer(x), as_integer(y)) {
        (Some(a), Some(b)) => a == b,
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn diff_at(a: &Value, b: &Value, path: String) -> Option<String> {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                if let Some(p) = diff_at(x, y, format!("{}/{}", path, i)) {
                    return Some(p);
                }
            }
            if xs.len() != ys.len() {
                return Some(format!("{}/{}", path, xs.len().min(ys.len())));
            }
            None
        }
        (Value::Object(xm), Value::Object(ym)) => {
            for (k, x) in xm {
                let child = format!("{}/{}", path, escape_pointer(k));
                match ym.get(k) {
                    Some(y) => {
                        if let Some(p) = diff_at(x, y, child) {
                            return Some(p);
                        }
                    }
                    None => return Some(child),
                }
            }
            ym.keys()
                .find(|k| !xm.contains_key(*k))
                .map(|k| format!("{}/{}", path, escape_pointer(k)))
        }
        _ if values_equivalent(a, b) => None,
        _ if path.is_empty() => Some("/".to_string()),
        _ => Some(path),
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"a":1,"b":2}"#, r#"{"b":2,"a":1}"# ; "object key order ignored")]
    #[test_case(r#"{"a": [1, 2]}"#, "{\n  \"a\" : [ 1,2 ]\n}" ; "whitespace ignored")]
    #[test_case("1", "1.0" ; "integer equals float")]
    #[test_case(r#"{"id": 4}"#, r#"{"id": 4.0}"# ; "nested numeric value")]
    #[test_case("null", "null" ; "null")]
    #[test_case(r#"{"config":{}}"#, r#"{"config":{}}"# ; "empty object")]
    fn test_equivalent(expected: &str, actual: &str) {
        assert!(equivalent(expected, actual.as_bytes()));
        assert_eq!(first_difference(expected, actual.as_bytes()), None);
    }

    #[test_case("[1,2]", "[2,1]" ; "array order significant")]
    #[test_case(r#""1""#, "1" ; "string is not number")]
    #[test_case("true", "1" ; "bool is not number")]
    #[test_case(r#"{"a":1}"#, r#"{"a":1,"b":2}"# ; "extra key")]
    #[test_case(r#"{"a":1,"b":2}"#, r#"{"a":1}"# ; "missing key")]
    #[test_case("[1,2]", "[1,2,3]" ; "array length")]
    #[test_case("null", "{}" ; "null is not object")]
    fn test_not_equivalent(expected: &str, actual: &str) {
        assert!(!equivalent(expected, actual.as_bytes()));
        assert!(first_difference(expected, actual.as_bytes()).is_some());
    }

    #[test]
    fn test_malformed_json_never_equates() {
        assert!(!equivalent(r#"{"a":1}"#, b"{\"a\":1"));
        assert!(!equivalent(r#"{"a":1}"#, b"<html>oops</html>"));
        assert!(!equivalent("not json", b"not json"));
        assert!(!equivalent(r#"{"a":1}"#, &[0xff, 0xfe]));
    }

    #[test]
    fn test_empty_text_is_not_json() {
        assert!(!equivalent("", b""));
        assert!(!equivalent("{}", b""));
    }

    #[test]
    fn test_empty_body_check() {
        assert!(is_empty_body(b""));
        assert!(!is_empty_body(b"{}"));
        assert!(!is_empty_body(b" "));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        assert!(equivalent("18446744073709551615", b"18446744073709551615"));
        assert!(!equivalent("9007199254740993", b"9007199254740992"));
        assert!(equivalent("-3", b"-3.0"));
    }

    #[test]
    fn test_first_difference_points_at_field() {
        let want = r#"{"project":{"id":2,"name":"frotz"}}"#;
        let got = br#"{"project":{"name":"plugh","id":2}}"#;
        assert_eq!(first_difference(want, got).as_deref(), Some("/project/name"));

        let got = br#"{"projects":[{"id":1},{"id":3}]}"#;
        assert_eq!(
            first_difference(r#"{"projects":[{"id":1},{"id":2}]}"#, got).as_deref(),
            Some("/projects/1/id")
        );
        assert_eq!(first_difference("[1]", b"[1,2]").as_deref(), Some("/1"));
        assert_eq!(first_difference("1", b"2").as_deref(), Some("/"));
    }
}
