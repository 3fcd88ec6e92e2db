use chrono::{DateTime, Utc};
use peopledb::{
    PeopleDb, Person,
    domain::{Location, Name, User},
};
use tracing::instrument;

use super::{parse_date, style::Tone};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Given name
    #[arg(long)]
    first: String,

    /// Family name
    #[arg(long)]
    last: String,

    /// Honorific, e.g. 'Dr'
    #[arg(long)]
    title: Option<String>,

    /// Email address
    #[arg(long)]
    email: String,

    /// Social security number (format XXX-XX-XXXX)
    #[arg(long)]
    ssn: String,

    /// Phone number (format (XXX)-XXX-XXXX)
    #[arg(long)]
    phone: String,

    /// Username
    #[arg(long)]
    username: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    dob: Option<DateTime<Utc>>,

    /// City
    #[arg(long)]
    city: Option<String>,

    /// State
    #[arg(long)]
    state: Option<String>,

    /// Street address
    #[arg(long)]
    street: Option<String>,

    /// Postal code
    #[arg(long)]
    zip: Option<String>,
}

impl Command {
    #[instrument(skip(db))]
    pub fn run(self, db: &mut PeopleDb) -> anyhow::Result<()> {
        let person = self.into_person(Utc::now());
        let record = db.create_person(serde_json::to_value(person)?)?;

        let id = record.get("id").map(ToString::to_string).unwrap_or_default();
        println!("{}", Tone::Success.paint(format_args!("Created person {id}")));
        Ok(())
    }

    fn into_person(self, registered: DateTime<Utc>) -> Person {
        let has_location = self.city.is_some()
            || self.state.is_some()
            || self.street.is_some()
            || self.zip.is_some();

        let location = has_location.then(|| Location {
            street: self.street,
            city: self.city,
            state: self.state,
            zip: self.zip,
        });

        Person {
            user: User {
                name: Some(Name {
                    first: Some(self.first),
                    last: Some(self.last),
                    title: self.title,
                }),
                email: Some(self.email),
                ssn: Some(self.ssn),
                phone: Some(self.phone),
                username: self.username,
                dob: self.dob.map(|dob| dob.timestamp()),
                registered: Some(registered.timestamp()),
                location,
            },
        }
    }
}
