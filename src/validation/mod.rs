//! Field validation rules for submissions and account forms.
//!
//! All functions here are pure: the same input always produces the same
//! errors, and nothing touches the store. Handlers run these first and only
//! reach the persistence layer when the result is empty.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Permissive `token@token.token` shape. Deliberately not RFC 5322.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_STRENGTH_SCORE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingOrTooShort,
    InvalidFormat,
    TooShort,
    Mismatch,
    Weak,
}

/// One failed rule. `field` names the offending input, `message` is safe to
/// show to end users verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

/// The unified error representation shared by both handler families. Page
/// handlers render [`field_map`](Self::field_map) into templates; the JSON
/// API renders [`messages`](Self::messages).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, field: &'static str, kind: ErrorKind, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            kind,
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Flat message list, API wire shape.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }

    /// First message per field, the shape templates expect. Later errors on
    /// the same field do not overwrite earlier ones.
    pub fn field_map(&self) -> HashMap<&'static str, String> {
        let mut map = HashMap::new();
        for e in &self.0 {
            map.entry(e.field).or_insert_with(|| e.message.clone());
        }
        map
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

/// Whether a weak password blocks the request or is merely reported back to
/// the caller for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthPolicy {
    Advisory,
    Blocking,
}

/// Validate the fields every submission carries (name, email).
pub fn validate_submission(name: &str, email: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if name.trim().len() < MIN_NAME_LEN {
        errors.push(
            "name",
            ErrorKind::MissingOrTooShort,
            "Name is required (min 2 chars).",
        );
    }
    if !EMAIL_RE.is_match(email.trim()) {
        errors.push("email", ErrorKind::InvalidFormat, "Valid email is required.");
    }
    errors
}

/// Validate a password pair for the password-bearing flows. Under
/// [`StrengthPolicy::Blocking`] a score below [`MIN_STRENGTH_SCORE`] is an
/// error; under `Advisory` the caller checks [`password_strength`] itself.
pub fn validate_password(
    password: &str,
    confirm: &str,
    policy: StrengthPolicy,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if password.len() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            ErrorKind::TooShort,
            "Password must be at least 6 characters.",
        );
    }
    if password != confirm {
        errors.push(
            "confirmPassword",
            ErrorKind::Mismatch,
            "Passwords do not match.",
        );
    }
    if policy == StrengthPolicy::Blocking
        && password.len() >= MIN_PASSWORD_LEN
        && password_strength(password) < MIN_STRENGTH_SCORE
    {
        errors.push(
            "password",
            ErrorKind::Weak,
            "Password is too weak; mix cases, digits and symbols.",
        );
    }
    errors
}

/// Validate only the fields an update actually supplies; absent fields are
/// left to whatever the store already holds.
pub fn validate_patch(name: Option<&str>, email: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if let Some(name) = name {
        if name.trim().len() < MIN_NAME_LEN {
            errors.push(
                "name",
                ErrorKind::MissingOrTooShort,
                "Name is required (min 2 chars).",
            );
        }
    }
    if let Some(email) = email {
        if !EMAIL_RE.is_match(email.trim()) {
            errors.push("email", ErrorKind::InvalidFormat, "Valid email is required.");
        }
    }
    errors
}

/// 0..=5 score: +1 each for length >= 8, a lowercase letter, an uppercase
/// letter, a digit, and a non-word character (underscore counts as a
/// symbol here).
pub fn password_strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }
    let mut score = 0;
    if password.len() >= 8 {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| !c.is_alphanumeric()) {
        score += 1;
    }
    score
}

/// Trim and strip `<`/`>` from free text before storage. Minimal
/// sanitization, not HTML escaping; templates escape on output.
pub fn sanitize_message(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '<' && *c != '>').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_shorter_than_two_chars_is_rejected() {
        for bad in ["", " ", "A", "  B  "] {
            let errors = validate_submission(bad, "a@b.c");
            assert_eq!(errors.len(), 1, "expected rejection for {bad:?}");
            let e = errors.iter().next().unwrap();
            assert_eq!(e.field, "name");
            assert_eq!(e.kind, ErrorKind::MissingOrTooShort);
        }
        assert!(validate_submission("Jo", "a@b.c").is_empty());
    }

    #[test]
    fn email_must_match_permissive_shape() {
        for bad in ["", "plain", "a@b", "@b.c", "a@.c", "a b@c.d"] {
            let errors = validate_submission("Jordan", bad);
            assert!(!errors.is_empty(), "expected rejection for {bad:?}");
            assert_eq!(errors.iter().next().unwrap().kind, ErrorKind::InvalidFormat);
        }
        for good in ["jo@x.com", "a@b.c", "first.last@sub.example.org"] {
            assert!(
                validate_submission("Jordan", good).is_empty(),
                "expected accept for {good:?}"
            );
        }
    }

    #[test]
    fn both_failures_are_reported_together() {
        let errors = validate_submission("A", "bad");
        assert_eq!(errors.len(), 2);
        let map = errors.field_map();
        assert!(map.contains_key("name"));
        assert!(map.contains_key("email"));
    }

    #[test]
    fn short_password_and_mismatch() {
        let errors = validate_password("abc", "abc", StrengthPolicy::Advisory);
        assert_eq!(errors.iter().next().unwrap().kind, ErrorKind::TooShort);

        let errors = validate_password("secret1", "secret2", StrengthPolicy::Advisory);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().kind, ErrorKind::Mismatch);
        assert_eq!(errors.iter().next().unwrap().field, "confirmPassword");
    }

    #[test]
    fn strength_scoring_table() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc"), 1); // lowercase only
        assert_eq!(password_strength("abcdefgh"), 2); // + length
        assert_eq!(password_strength("Abcdefgh"), 3); // + uppercase
        assert_eq!(password_strength("Abcdefg1"), 4); // + digit
        assert_eq!(password_strength("Abcdef1!"), 5); // + symbol
        assert_eq!(password_strength("under_score"), 3); // length + lowercase + underscore-as-symbol
    }

    #[test]
    fn blocking_policy_rejects_weak_passwords() {
        let errors = validate_password("abcdef", "abcdef", StrengthPolicy::Blocking);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().kind, ErrorKind::Weak);

        // Advisory never emits Weak.
        assert!(validate_password("abcdef", "abcdef", StrengthPolicy::Advisory).is_empty());

        assert!(validate_password("Str0ng!pw", "Str0ng!pw", StrengthPolicy::Blocking).is_empty());
    }

    #[test]
    fn patch_validation_skips_absent_fields() {
        assert!(validate_patch(None, None).is_empty());
        assert!(validate_patch(Some("Jordan"), None).is_empty());
        assert_eq!(validate_patch(Some("A"), None).len(), 1);
        assert_eq!(validate_patch(Some("A"), Some("bad")).len(), 2);
    }

    #[test]
    fn validation_is_deterministic() {
        let a = validate_submission("A", "bad");
        let b = validate_submission("A", "bad");
        assert_eq!(a.messages(), b.messages());
    }

    #[test]
    fn sanitize_strips_angle_brackets_and_trims() {
        assert_eq!(sanitize_message("  hi  "), "hi");
        assert_eq!(sanitize_message("<script>hey</script>"), "scripthey/script");
        assert_eq!(sanitize_message(""), "");
    }
}
