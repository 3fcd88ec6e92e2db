use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::User;

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}-[0-9]{2}-[0-9]{4}$").expect("valid regex"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([0-9]{3}\)-[0-9]{3}-[0-9]{4}$").expect("valid regex"));

/// Fields that must be present under `user` when creating a person, with
/// their dotted paths.
const REQUIRED_USER_FIELDS: [(&str, &str); 4] = [
    ("email", "user.email"),
    ("name", "user.name"),
    ("SSN", "user.SSN"),
    ("phone", "user.phone"),
];

/// A person record failed validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("missing required field '{field}'")]
    Missing {
        /// Dotted path of the missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong shape.
    #[error("malformed field '{field}': {value}")]
    Malformed {
        /// Dotted path of the malformed field.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

impl ValidationError {
    /// The dotted path of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::Malformed { field, .. } => *field,
        }
    }
}

/// Whether `ssn` has the shape `DDD-DD-DDDD`.
#[must_use]
pub fn is_valid_ssn(ssn: &str) -> bool {
    SSN.is_match(ssn)
}

/// Whether `phone` has the shape `(DDD)-DDD-DDDD`.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// Checks that a raw value is a creatable person record.
///
/// The value must contain a `user` object with `email`, `name`, `SSN` and
/// `phone` fields, and the SSN and phone number must be correctly formatted.
/// The `user` object as a whole must also parse as a [`User`], so that every
/// query can read it back.
///
/// # Errors
///
/// Returns the first missing or malformed field found.
pub fn validate_person(data: &Value) -> Result<(), ValidationError> {
    let user = match data.get("user") {
        None | Some(Value::Null) => return Err(ValidationError::Missing { field: "user" }),
        Some(Value::Object(user)) => user,
        Some(other) => {
            return Err(ValidationError::Malformed {
                field: "user",
                value: other.to_string(),
            });
        }
    };

    for (key, field) in REQUIRED_USER_FIELDS {
        if user.get(key).is_none_or(Value::is_null) {
            return Err(ValidationError::Missing { field });
        }
    }

    check_shape(&user["SSN"], "user.SSN", is_valid_ssn)?;
    check_shape(&user["phone"], "user.phone", is_valid_phone)?;

    User::deserialize(&data["user"]).map_err(|e| ValidationError::Malformed {
        field: "user",
        value: e.to_string(),
    })?;

    Ok(())
}

fn check_shape(
    value: &Value,
    field: &'static str,
    is_valid: fn(&str) -> bool,
) -> Result<(), ValidationError> {
    match value.as_str() {
        Some(s) if is_valid(s) => Ok(()),
        Some(s) => Err(ValidationError::Malformed {
            field,
            value: s.to_string(),
        }),
        None => Err(ValidationError::Malformed {
            field,
            value: value.to_string(),
        }),
    }
}
