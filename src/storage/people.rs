//! The [`PeopleDb`] wraps a [`JsonStore`] whose records each hold a nested
//! `user` object. Queries scan the whole collection, parsing each record into a
//! typed [`User`]; records that do not have the person shape are skipped.

use std::{collections::BTreeMap, path::PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    domain::{
        Config, Person, Record, User,
        record::id_of,
        validate::{ValidationError, validate_person},
    },
    storage::{JsonStore, StoreError},
};

/// Criteria for [`PeopleDb::find_by_location`].
///
/// Unset fields are not constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    /// Required state.
    pub state: Option<String>,
    /// Required street address.
    pub street: Option<String>,
    /// Required city.
    pub city: Option<String>,
    /// Required postal code.
    pub zip: Option<String>,
}

/// A directory of person records backed by a [`JsonStore`].
#[derive(Debug)]
pub struct PeopleDb {
    store: JsonStore,
}

impl PeopleDb {
    /// Wraps an existing store.
    #[must_use]
    pub const fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Opens the directory at the given path.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonStore::open(path))
    }

    /// Opens the directory described by the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(JsonStore::from_config(config))
    }

    /// The underlying record store.
    #[must_use]
    pub const fn store(&self) -> &JsonStore {
        &self.store
    }

    /// The underlying record store, for generic updates and deletes.
    pub const fn store_mut(&mut self) -> &mut JsonStore {
        &mut self.store
    }

    /// Parses a record as a typed [`Person`].
    ///
    /// Returns `None` if the record does not have the person shape.
    #[must_use]
    pub fn person(record: &Record) -> Option<Person> {
        User::from_record(record).ok().map(|user| Person { user })
    }

    /// Validate and add a new person.
    ///
    /// The record must contain a `user` object with `email`, `name`, `SSN` and
    /// `phone` fields, and every field of `user` must have the shape queries
    /// expect. The SSN must look like `123-45-6789` and the phone number like
    /// `(555)-123-4567`.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - a required field is missing or malformed
    /// - the record cannot be stored (see [`JsonStore::create`])
    pub fn create_person(&mut self, data: Value) -> Result<Record, PersonError> {
        validate_person(&data)?;
        Ok(self.store.create(data)?)
    }

    /// Find people by first and/or last name, ignoring case.
    ///
    /// When both names are given, both must match. When neither is given,
    /// every record is returned.
    #[must_use]
    pub fn find_by_name(&self, first: Option<&str>, last: Option<&str>) -> Vec<&Record> {
        if first.is_none() && last.is_none() {
            return self.store.records().iter().collect();
        }

        self.find(|user| {
            matches_ignoring_case(first, user.first_name())
                && matches_ignoring_case(last, user.last_name())
        })
    }

    /// Find people living in a city, ignoring case.
    #[must_use]
    pub fn find_by_city(&self, city: &str) -> Vec<&Record> {
        self.find(|user| matches_ignoring_case(Some(city), user.location().city.as_deref()))
    }

    /// Find people matching every supplied location field exactly.
    #[must_use]
    pub fn find_by_location(&self, query: &LocationQuery) -> Vec<&Record> {
        self.find(|user| {
            let location = user.location();
            matches_exactly(query.state.as_deref(), location.state.as_deref())
                && matches_exactly(query.street.as_deref(), location.street.as_deref())
                && matches_exactly(query.city.as_deref(), location.city.as_deref())
                && matches_exactly(query.zip.as_deref(), location.zip.as_deref())
        })
    }

    /// Find people by phone number.
    #[must_use]
    pub fn find_by_phone(&self, phone: &str) -> Vec<&Record> {
        self.find(|user| user.phone.as_deref() == Some(phone))
    }

    /// Find people by email address.
    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Vec<&Record> {
        self.find(|user| user.email.as_deref() == Some(email))
    }

    /// Find people by username.
    #[must_use]
    pub fn find_by_username(&self, username: &str) -> Vec<&Record> {
        self.find(|user| user.username.as_deref() == Some(username))
    }

    /// Find people by social security number.
    #[must_use]
    pub fn find_by_ssn(&self, ssn: &str) -> Vec<&Record> {
        self.find(|user| user.ssn.as_deref() == Some(ssn))
    }

    /// Find people whose age right now is within the inclusive bounds.
    ///
    /// See [`PeopleDb::filter_by_age_at`].
    #[must_use]
    pub fn filter_by_age(&self, min_age: Option<i64>, max_age: Option<i64>) -> Vec<&Record> {
        self.filter_by_age_at(min_age, max_age, Utc::now())
    }

    /// Find people whose age at `now` is within the inclusive bounds.
    ///
    /// Age is whole elapsed days divided by 365 (see [`User::age_at`]).
    /// People without a date of birth are skipped.
    #[must_use]
    pub fn filter_by_age_at(
        &self,
        min_age: Option<i64>,
        max_age: Option<i64>,
        now: DateTime<Utc>,
    ) -> Vec<&Record> {
        self.find(|user| {
            user.age_at(now).is_some_and(|age| {
                min_age.is_none_or(|min| age >= min) && max_age.is_none_or(|max| age <= max)
            })
        })
    }

    /// Find people who registered within the inclusive bounds.
    ///
    /// People without a registration time are skipped.
    #[must_use]
    pub fn filter_by_registration_date(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<&Record> {
        let since = since.map(|t| t.timestamp());
        let until = until.map(|t| t.timestamp());

        self.find(|user| {
            user.registered.is_some_and(|registered| {
                since.is_none_or(|since| registered >= since)
                    && until.is_none_or(|until| registered <= until)
            })
        })
    }

    /// Every recorded email address, in collection order.
    #[must_use]
    pub fn generate_emails(&self) -> Vec<String> {
        self.users().filter_map(|(_, user)| user.email).collect()
    }

    /// A generated username for everyone with a first and last name.
    ///
    /// See [`crate::domain::person::generate_username`].
    #[must_use]
    pub fn generate_usernames(&self) -> Vec<String> {
        self.users()
            .filter_map(|(_, user)| user.generated_username())
            .collect()
    }

    /// People grouped by state, ordered by state name.
    ///
    /// People without a state are skipped.
    #[must_use]
    pub fn group_by_state(&self) -> BTreeMap<String, Vec<&Record>> {
        let mut groups: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
        for (record, user) in self.users() {
            if let Some(state) = user.location.and_then(|location| location.state) {
                groups.entry(state).or_default().push(record);
            }
        }
        groups
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Vec<&Record> {
        self.users()
            .filter(|(_, user)| predicate(user))
            .map(|(record, _)| record)
            .collect()
    }

    fn users(&self) -> impl Iterator<Item = (&Record, User)> {
        self.store
            .records()
            .iter()
            .filter_map(|record| match User::from_record(record) {
                Ok(user) => Some((record, user)),
                Err(e) => {
                    let id = id_of(record).unwrap_or(&Value::Null);
                    tracing::debug!("Skipping record {id} without person shape: {e}");
                    None
                }
            })
    }
}

fn matches_ignoring_case(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| {
        actual.is_some_and(|actual| wanted.to_lowercase() == actual.to_lowercase())
    })
}

fn matches_exactly(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| actual == Some(wanted))
}

/// Errors returned when adding a person.
#[derive(Debug, thiserror::Error)]
pub enum PersonError {
    /// The person record is missing a field or has a malformed one.
    #[error("invalid person: {0}")]
    Validation(#[from] ValidationError),
    /// The record store rejected the record.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersonError {
    /// Whether the person record failed validation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const DAY: i64 = 86_400;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    /// Date of birth for someone a little over `age` years old at [`now`].
    fn dob_for_age(age: i64) -> i64 {
        now().timestamp() - (age * 365 + 10) * DAY
    }

    fn person(first: &str, last: &str, city: &str, state: &str, age: i64) -> Value {
        json!({
            "user": {
                "name": {"first": first, "last": last, "title": "Mx"},
                "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                "SSN": "123-45-6789",
                "phone": "(555)-123-4567",
                "username": format!("{}{}", first.to_lowercase(), last.to_lowercase()),
                "dob": dob_for_age(age),
                "registered": now().timestamp() - age * DAY,
                "location": {"street": "1 Main St", "city": city, "state": state, "zip": "75001"}
            }
        })
    }

    fn setup_people() -> (TempDir, PeopleDb) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let mut db = PeopleDb::open(tmp.path().join("people.json"));
        db.create_person(person("Katherine", "Hall", "Austin", "Texas", 25))
            .unwrap();
        db.create_person(person("Omar", "Reyes", "Dallas", "Texas", 35))
            .unwrap();
        db.create_person(person("Lena", "Hall", "Denver", "Colorado", 45))
            .unwrap();
        (tmp, db)
    }

    fn ids(records: &[&Record]) -> Vec<i64> {
        records
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn find_by_first_name_ignores_case() {
        let (_tmp, db) = setup_people();

        assert_eq!(ids(&db.find_by_name(Some("Katherine"), None)), [1]);
        assert_eq!(ids(&db.find_by_name(Some("kATHERINE"), None)), [1]);
    }

    #[test]
    fn find_by_name_requires_both_when_given() {
        let (_tmp, db) = setup_people();

        assert_eq!(ids(&db.find_by_name(None, Some("hall"))), [1, 3]);
        assert_eq!(ids(&db.find_by_name(Some("lena"), Some("HALL"))), [3]);
        assert!(db.find_by_name(Some("Omar"), Some("Hall")).is_empty());
    }

    #[test]
    fn find_by_name_without_criteria_returns_everything() {
        let (_tmp, mut db) = setup_people();
        db.store_mut().create(json!({"note": "not a person"})).unwrap();

        assert_eq!(db.find_by_name(None, None).len(), 4);
    }

    #[test]
    fn find_by_city_ignores_case() {
        let (_tmp, db) = setup_people();

        assert_eq!(ids(&db.find_by_city("dallas")), [2]);
        assert!(db.find_by_city("Paris").is_empty());
    }

    #[test]
    fn find_by_location_combines_criteria() {
        let (_tmp, db) = setup_people();

        let texas = LocationQuery {
            state: Some("Texas".to_string()),
            ..LocationQuery::default()
        };
        assert_eq!(ids(&db.find_by_location(&texas)), [1, 2]);

        let austin_texas = LocationQuery {
            city: Some("Austin".to_string()),
            ..texas.clone()
        };
        assert_eq!(ids(&db.find_by_location(&austin_texas)), [1]);

        let by_zip = LocationQuery {
            zip: Some("75001".to_string()),
            ..LocationQuery::default()
        };
        assert_eq!(ids(&db.find_by_location(&by_zip)), [1, 2, 3]);

        let everyone = LocationQuery::default();
        assert_eq!(db.find_by_location(&everyone).len(), 3);
    }

    #[test]
    fn find_by_location_matches_numeric_zip() {
        let (_tmp, mut db) = setup_people();
        let mut numeric = person("Ada", "Moss", "Reno", "Nevada", 50);
        numeric["user"]["location"]["zip"] = json!(89501);
        db.create_person(numeric).unwrap();

        let query = LocationQuery {
            zip: Some("89501".to_string()),
            ..LocationQuery::default()
        };
        assert_eq!(ids(&db.find_by_location(&query)), [4]);
    }

    #[test]
    fn find_by_single_fields() {
        let (_tmp, db) = setup_people();

        assert_eq!(ids(&db.find_by_email("omar.reyes@example.com")), [2]);
        assert_eq!(ids(&db.find_by_username("lenahall")), [3]);
        assert_eq!(db.find_by_phone("(555)-123-4567").len(), 3);
        assert_eq!(db.find_by_ssn("123-45-6789").len(), 3);
        assert!(db.find_by_email("OMAR.REYES@example.com").is_empty());
    }

    #[test]
    fn filter_by_age_uses_inclusive_bounds() {
        let (_tmp, db) = setup_people();

        assert_eq!(ids(&db.filter_by_age_at(Some(30), Some(40), now())), [2]);
        assert_eq!(ids(&db.filter_by_age_at(Some(35), Some(35), now())), [2]);
        assert_eq!(ids(&db.filter_by_age_at(None, Some(35), now())), [1, 2]);
        assert_eq!(ids(&db.filter_by_age_at(Some(36), None, now())), [3]);
        assert_eq!(db.filter_by_age_at(None, None, now()).len(), 3);
    }

    #[test]
    fn filter_by_age_skips_unmeasurable_dob() {
        let (_tmp, mut db) = setup_people();
        let mut ancient = person("Nia", "Cole", "Austin", "Texas", 30);
        ancient["user"]["dob"] = json!(i64::MIN);
        db.create_person(ancient).unwrap();

        assert_eq!(db.filter_by_age_at(None, None, now()).len(), 3);
        assert_eq!(db.filter_by_age(Some(0), None).len(), 3);
    }

    #[test]
    fn filter_by_age_skips_missing_dob() {
        let (_tmp, mut db) = setup_people();
        let mut no_dob = person("Nia", "Cole", "Austin", "Texas", 30);
        no_dob["user"].as_object_mut().unwrap().remove("dob");
        db.create_person(no_dob).unwrap();

        assert_eq!(db.filter_by_age_at(None, None, now()).len(), 3);
    }

    #[test]
    fn filter_by_age_against_the_clock() {
        let tmp = TempDir::new().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));
        let mut data = person("Theo", "Park", "Austin", "Texas", 0);
        data["user"]["dob"] = json!((Utc::now() - Duration::days(35 * 365 + 10)).timestamp());
        db.create_person(data).unwrap();

        assert_eq!(db.filter_by_age(Some(30), Some(40)).len(), 1);
        assert!(db.filter_by_age(Some(36), None).is_empty());
    }

    #[test]
    fn filter_by_registration_date_collects_every_match() {
        let (_tmp, db) = setup_people();
        // Registered 25, 35 and 45 days before `now`.
        let since = now() - Duration::days(40);

        assert_eq!(
            ids(&db.filter_by_registration_date(Some(since), None)),
            [1, 2]
        );
        assert_eq!(
            ids(&db.filter_by_registration_date(None, Some(since))),
            [3]
        );
        assert_eq!(db.filter_by_registration_date(None, None).len(), 3);
    }

    #[test]
    fn filter_by_registration_date_bounds_are_inclusive() {
        let (_tmp, db) = setup_people();
        let exact = now() - Duration::days(35);

        assert_eq!(
            ids(&db.filter_by_registration_date(Some(exact), Some(exact))),
            [2]
        );
    }

    #[test]
    fn generate_emails_skips_missing() {
        let (_tmp, mut db) = setup_people();
        db.store_mut()
            .create(json!({"user": {"name": {"first": "No", "last": "Email"}}}))
            .unwrap();

        assert_eq!(
            db.generate_emails(),
            [
                "katherine.hall@example.com",
                "omar.reyes@example.com",
                "lena.hall@example.com"
            ]
        );
    }

    #[test]
    fn generate_usernames_is_reproducible() {
        let (tmp, db) = setup_people();

        let usernames = db.generate_usernames();
        assert_eq!(usernames.len(), 3);
        assert!(usernames[0].starts_with("katherinehall"));
        assert!(usernames[1].starts_with("omarreyes"));

        let reopened = PeopleDb::open(tmp.path().join("people.json"));
        assert_eq!(reopened.generate_usernames(), usernames);
    }

    #[test]
    fn group_by_state_orders_states() {
        let (_tmp, db) = setup_people();

        let groups = db.group_by_state();

        let states: Vec<_> = groups.keys().map(String::as_str).collect();
        assert_eq!(states, ["Colorado", "Texas"]);
        assert_eq!(ids(&groups["Texas"]), [1, 2]);
        assert_eq!(ids(&groups["Colorado"]), [3]);
    }

    #[test]
    fn create_person_rejects_malformed_ssn() {
        let tmp = TempDir::new().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));
        let mut data = person("Katherine", "Hall", "Austin", "Texas", 25);

        data["user"]["SSN"] = json!("123-456-789");
        let err = db.create_person(data.clone()).unwrap_err();
        assert!(err.is_validation());
        assert!(db.store().is_empty());
        assert!(!db.store().path().exists());

        data["user"]["SSN"] = json!("123-45-6789");
        let created = db.create_person(data).unwrap();
        assert_eq!(created["id"], json!(1));
    }

    #[test]
    fn create_person_rejects_user_queries_cannot_read() {
        let tmp = TempDir::new().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));

        let err = db
            .create_person(json!({
                "user": {
                    "name": "Katherine Hall",
                    "email": "k@example.com",
                    "SSN": "123-45-6789",
                    "phone": "(555)-123-4567"
                }
            }))
            .unwrap_err();

        assert!(matches!(
            err,
            PersonError::Validation(ValidationError::Malformed { field: "user", .. })
        ));
        assert!(db.store().is_empty());
    }

    #[test]
    fn created_person_is_found_by_email() {
        let tmp = TempDir::new().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));

        db.create_person(json!({
            "user": {
                "name": {"first": "Katherine", "last": "Hall"},
                "email": "k@example.com",
                "SSN": "123-45-6789",
                "phone": "(555)-123-4567"
            }
        }))
        .unwrap();

        assert_eq!(ids(&db.find_by_email("k@example.com")), [1]);
        assert_eq!(db.generate_emails(), ["k@example.com"]);
    }

    #[test]
    fn create_person_requires_user() {
        let tmp = TempDir::new().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));

        let err = db.create_person(json!({"name": "x"})).unwrap_err();

        assert!(matches!(
            err,
            PersonError::Validation(ValidationError::Missing { field: "user" })
        ));
    }

    #[test]
    fn create_person_surfaces_store_errors() {
        let (_tmp, mut db) = setup_people();
        let mut data = person("Katherine", "Hall", "Austin", "Texas", 25);
        data["id"] = json!(1);

        let err = db.create_person(data).unwrap_err();

        assert!(matches!(err, PersonError::Store(StoreError::DuplicateId(_))));
    }

    #[test]
    fn queries_skip_records_without_person_shape() {
        let (_tmp, mut db) = setup_people();
        db.store_mut()
            .create(json!({"user": {"dob": "not a timestamp"}}))
            .unwrap();
        db.store_mut().create(json!({"title": "Super Mario"})).unwrap();

        assert_eq!(db.find_by_city("austin").len(), 1);
        assert_eq!(db.filter_by_age_at(None, None, now()).len(), 3);
        assert!(PeopleDb::person(&db.store().records()[3]).is_none());
        assert!(PeopleDb::person(&db.store().records()[0]).is_some());
    }
}
