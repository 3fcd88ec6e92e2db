use borsh::BorshSerialize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::Record;

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_YEAR: i64 = 365;
const USERNAME_SUFFIX_MODULUS: u64 = 10_000;

/// A person record, as stored in the collection.
///
/// The stored record also carries the store's identifier field, which is not
/// part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// The nested person details.
    pub user: User,
}

/// Person details nested under the `user` field.
///
/// Every field is optional so that partially populated records can still be
/// queried on the fields they do have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The person's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Social security number, formatted `DDD-DD-DDDD`.
    #[serde(rename = "SSN", default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,

    /// Phone number, formatted `(DDD)-DDD-DDDD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Date of birth as a Unix timestamp (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<i64>,

    /// Registration time as a Unix timestamp (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<i64>,

    /// Postal location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A person's name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,

    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,

    /// Honorific, e.g. 'Dr'.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A postal location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Postal code.
    ///
    /// Stored data is inconsistent about whether this is a string or a number,
    /// so both are accepted and normalised to a string.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub zip: Option<String>,
}

impl User {
    /// Parses the `user` field of a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no `user` field, or if it does not
    /// have the expected shape.
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        record.get("user").map_or_else(
            || Err(serde::de::Error::missing_field("user")),
            Self::deserialize,
        )
    }

    /// The first name, if any.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_ref()?.first.as_deref()
    }

    /// The last name, if any.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.name.as_ref()?.last.as_deref()
    }

    /// The location, or an empty one if none is recorded.
    #[must_use]
    pub fn location(&self) -> &Location {
        static EMPTY: Location = Location {
            street: None,
            city: None,
            state: None,
            zip: None,
        };
        self.location.as_ref().unwrap_or(&EMPTY)
    }

    /// Age in whole years at the given instant.
    ///
    /// Computed as elapsed whole days divided by 365, so leap days push
    /// birthdays slightly early. Returns `None` if there is no date of birth,
    /// or if it is too far from `now` to measure.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.dob.and_then(|dob| age_in_years(dob, now))
    }

    /// A generated username derived from the first and last name.
    ///
    /// Returns `None` unless both names are present.
    #[must_use]
    pub fn generated_username(&self) -> Option<String> {
        Some(generate_username(self.first_name()?, self.last_name()?))
    }
}

/// Age in whole years of someone born at Unix timestamp `dob`.
///
/// Returns `None` if the elapsed time overflows an `i64`.
#[must_use]
pub fn age_in_years(dob: i64, now: DateTime<Utc>) -> Option<i64> {
    let elapsed_days = now.timestamp().checked_sub(dob)?.div_euclid(SECONDS_PER_DAY);
    Some(elapsed_days.div_euclid(DAYS_PER_YEAR))
}

/// Builds a username as lowercase first and last name plus a four digit
/// suffix.
///
/// The suffix is a SHA-256 checksum of the [Borsh](https://borsh.io/) encoded
/// names, reduced modulo 10000, so the same names always produce the same
/// username.
///
/// # Panics
///
/// Panics if borsh serialization fails (which should never happen for this
/// data structure).
#[must_use]
pub fn generate_username(first: &str, last: &str) -> String {
    #[derive(BorshSerialize)]
    struct NameData<'a> {
        first: &'a str,
        last: &'a str,
    }

    let encoded = borsh::to_vec(&NameData { first, last }).expect("this should never fail");
    let hash = Sha256::digest(encoded);

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    let suffix = u64::from_be_bytes(prefix) % USERNAME_SUFFIX_MODULUS;

    format!(
        "{}{}{suffix:04}",
        first.to_lowercase(),
        last.to_lowercase()
    )
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}
