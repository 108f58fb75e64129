//! Inbound submissions and their validation.
//!
//! [`IdentifyRequest`] is the untrusted wire shape. [`IdentifyRequest::validate`]
//! turns it into a [`Submission`], the only input the resolver accepts.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize, de::IgnoredAny};
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("phone pattern compiles")
});

// ─── Validation errors ───────────────────────────────────────────────────────

/// The request field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
  Email,
  PhoneNumber,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Field::Email => f.write_str("email"),
      Field::PhoneNumber => f.write_str("phoneNumber"),
    }
  }
}

/// A rejected submission. `field` is `None` when the failure is about the
/// request as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
  pub field:   Option<Field>,
  pub message: String,
}

impl ValidationError {
  fn on(field: Field, message: &str) -> Self {
    Self { field: Some(field), message: message.to_owned() }
  }
}

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// A request field as it arrived on the wire: a string, or any other JSON
/// value. Non-strings are kept so validation can name the offending field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
  Text(String),
  Other(IgnoredAny),
}

impl RawField {
  fn text(&self, field: Field) -> Result<&str, ValidationError> {
    match self {
      RawField::Text(s) => Ok(s),
      RawField::Other(_) => Err(ValidationError::on(field, match field {
        Field::Email => "Email must be a string",
        Field::PhoneNumber => "Phone number must be a string",
      })),
    }
  }
}

/// `{ "email"?: string, "phoneNumber"?: string }`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
  #[serde(default)]
  pub email:        Option<RawField>,
  #[serde(default)]
  pub phone_number: Option<RawField>,
}

impl IdentifyRequest {
  pub fn new(email: Option<&str>, phone_number: Option<&str>) -> Self {
    Self {
      email:        email.map(|s| RawField::Text(s.to_owned())),
      phone_number: phone_number.map(|s| RawField::Text(s.to_owned())),
    }
  }

  /// Check field types, trim both fields, treat blanks as absent, and check
  /// formats.
  ///
  /// A field that is present and not `null` must be a string. At least one
  /// field must survive trimming. The email must look like
  /// `local@domain.tld`. The phone number, once spaces, hyphens and
  /// parentheses are stripped, must be an optional `+` followed by 1-16
  /// digits not starting with `0`. The trimmed (not stripped) phone number
  /// is what gets stored and matched.
  pub fn validate(&self) -> Result<Submission, ValidationError> {
    let email = self
      .email
      .as_ref()
      .map(|f| f.text(Field::Email))
      .transpose()?;
    let phone_number = self
      .phone_number
      .as_ref()
      .map(|f| f.text(Field::PhoneNumber))
      .transpose()?;

    let email = present(email);
    let phone_number = present(phone_number);

    if email.is_none() && phone_number.is_none() {
      return Err(ValidationError {
        field:   None,
        message: "Either email or phoneNumber must be provided".to_owned(),
      });
    }

    if let Some(email) = email
      && !EMAIL_RE.is_match(email)
    {
      return Err(ValidationError::on(Field::Email, "Email format is invalid"));
    }

    if let Some(phone) = phone_number {
      let stripped: String = phone
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();
      if !PHONE_RE.is_match(&stripped) {
        return Err(ValidationError::on(
          Field::PhoneNumber,
          "Phone number format is invalid",
        ));
      }
    }

    Ok(Submission {
      email:        email.map(str::to_owned),
      phone_number: phone_number.map(str::to_owned),
    })
  }
}

fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

// ─── Validated submission ────────────────────────────────────────────────────

/// A validated `(email?, phone?)` pair with at least one side present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  email:        Option<String>,
  phone_number: Option<String>,
}

impl Submission {
  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }

  /// Lock keys covering every identifier this submission can match on.
  pub fn lock_keys(&self) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(email) = &self.email {
      keys.push(format!("email:{email}"));
    }
    if let Some(phone) = &self.phone_number {
      keys.push(format!("phone:{phone}"));
    }
    keys
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn check(email: Option<&str>, phone: Option<&str>) -> Result<Submission, ValidationError> {
    IdentifyRequest::new(email, phone).validate()
  }

  #[test]
  fn rejects_empty_request() {
    let err = check(None, None).unwrap_err();
    assert_eq!(err.field, None);

    let err = check(Some("  "), Some("")).unwrap_err();
    assert_eq!(err.field, None);
  }

  #[test]
  fn rejects_malformed_email_naming_the_field() {
    let err = check(Some("not-an-email"), None).unwrap_err();
    assert_eq!(err.field, Some(Field::Email));
    assert_eq!(err.field.unwrap().to_string(), "email");

    assert!(check(Some("a@b"), None).is_err());
    assert!(check(Some("a b@x.com"), None).is_err());
  }

  #[test]
  fn rejects_malformed_phone_naming_the_field() {
    for bad in ["0123", "12a4", "+", "12345678901234567"] {
      let err = check(None, Some(bad)).unwrap_err();
      assert_eq!(err.field, Some(Field::PhoneNumber), "input {bad:?}");
    }
  }

  #[test]
  fn accepts_punctuated_phone_and_keeps_trimmed_form() {
    let sub = check(None, Some("  +1 (555) 123-4567 ")).unwrap();
    assert_eq!(sub.phone_number(), Some("+1 (555) 123-4567"));
    assert_eq!(sub.email(), None);
  }

  #[test]
  fn blank_field_is_treated_as_absent() {
    let sub = check(Some(" lorraine@hillvalley.edu "), Some("   ")).unwrap();
    assert_eq!(sub.email(), Some("lorraine@hillvalley.edu"));
    assert_eq!(sub.phone_number(), None);
    assert_eq!(sub.lock_keys(), vec!["email:lorraine@hillvalley.edu"]);
  }

  #[test]
  fn deserializes_camel_case_with_nulls() {
    let req: IdentifyRequest =
      serde_json::from_str(r#"{"email":null,"phoneNumber":"123456"}"#).unwrap();
    let sub = req.validate().unwrap();
    assert_eq!(sub.phone_number(), Some("123456"));
    assert_eq!(sub.lock_keys(), vec!["phone:123456"]);
  }

  #[test]
  fn non_string_fields_are_rejected_naming_the_field() {
    let req: IdentifyRequest =
      serde_json::from_str(r#"{"email":"a@x.com","phoneNumber":123456}"#).unwrap();
    let err = req.validate().unwrap_err();
    assert_eq!(err.field, Some(Field::PhoneNumber));
    assert_eq!(err.message, "Phone number must be a string");

    let req: IdentifyRequest = serde_json::from_str(r#"{"email":["a@x.com"]}"#).unwrap();
    let err = req.validate().unwrap_err();
    assert_eq!(err.field, Some(Field::Email));
    assert_eq!(err.message, "Email must be a string");
  }

  #[test]
  fn type_check_precedes_presence_check() {
    let req: IdentifyRequest = serde_json::from_str(r#"{"email":false}"#).unwrap();
    assert_eq!(req.validate().unwrap_err().field, Some(Field::Email));
  }
}
