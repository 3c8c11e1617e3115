//! Field validation for user records
//!
//! Pure predicates; the service layer decides what a failure means.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Inclusive age bounds
pub const MIN_AGE: u8 = 0;
pub const MAX_AGE: u8 = 150;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// `local@domain.tld`: no whitespace, exactly one `@`, a `.` after it
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.is_match(email)
}

/// Present and non-empty
pub fn validate_name(name: Option<&str>) -> bool {
    name.is_some_and(|n| !n.is_empty())
}

/// Age predicate: absent is valid, present must be a whole number in range
pub fn validate_age(age: Option<&Value>) -> bool {
    parse_age(age).is_ok()
}

/// A present age that is not a whole number in range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAge;

/// Normalize an age value
///
/// `None` means "not provided" and stays `None`. A present value must be a
/// JSON number or a numeric string denoting a whole number in
/// `MIN_AGE..=MAX_AGE`; `null`, empty strings, fractions, negatives and
/// anything non-numeric are rejected.
pub fn parse_age(age: Option<&Value>) -> Result<Option<u8>, InvalidAge> {
    let Some(value) = age else {
        return Ok(None);
    };

    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match numeric {
        Some(n)
            if n.is_finite()
                && n.fract() == 0.0
                && n >= f64::from(MIN_AGE)
                && n <= f64::from(MAX_AGE) =>
        {
            Ok(Some(n as u8))
        }
        _ => Err(InvalidAge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("first.last+tag@sub.example.co.uk"));
        assert!(!validate_email("user.example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("us er@example.com"));
        assert!(!validate_email("user@exa mple.com"));
        assert!(!validate_email("a@b@c.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_name_presence() {
        assert!(validate_name(Some("Alice")));
        assert!(!validate_name(Some("")));
        assert!(!validate_name(None));
    }

    #[test]
    fn test_age_bounds() {
        assert_eq!(parse_age(None), Ok(None));
        assert_eq!(parse_age(Some(&json!(0))), Ok(Some(0)));
        assert_eq!(parse_age(Some(&json!(150))), Ok(Some(150)));
        assert_eq!(parse_age(Some(&json!(42.0))), Ok(Some(42)));
        assert_eq!(parse_age(Some(&json!("42"))), Ok(Some(42)));

        assert!(parse_age(Some(&json!(-1))).is_err());
        assert!(parse_age(Some(&json!(151))).is_err());
        assert!(parse_age(Some(&json!(7.5))).is_err());
        assert!(parse_age(Some(&json!("abc"))).is_err());
        assert!(parse_age(Some(&json!(""))).is_err());
        assert!(parse_age(Some(&json!(null))).is_err());
        assert!(parse_age(Some(&json!(true))).is_err());
        assert!(parse_age(Some(&json!([30]))).is_err());
    }

    #[test]
    fn test_age_predicate_matches_parser() {
        assert!(validate_age(None));
        assert!(validate_age(Some(&json!(18))));
        assert!(!validate_age(Some(&json!("NaN"))));
        assert!(!validate_age(Some(&json!("inf"))));
    }
}
