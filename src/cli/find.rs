use peopledb::{LocationQuery, PeopleDb};
use tracing::instrument;

use super::print_records;

#[derive(Debug, clap::Parser)]
pub struct Name {
    /// Given name
    #[arg(long)]
    first: Option<String>,

    /// Family name
    #[arg(long)]
    last: Option<String>,
}

impl Name {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        print_records(&db.find_by_name(self.first.as_deref(), self.last.as_deref()))
    }
}

#[derive(Debug, clap::Parser)]
pub struct City {
    /// The city to search for
    city: String,
}

impl City {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        print_records(&db.find_by_city(&self.city))
    }
}

#[derive(Debug, clap::Parser)]
pub struct Location {
    /// State
    #[arg(long)]
    state: Option<String>,

    /// Street address
    #[arg(long)]
    street: Option<String>,

    /// City
    #[arg(long)]
    city: Option<String>,

    /// Postal code
    #[arg(long)]
    zip: Option<String>,
}

impl Location {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        let query = LocationQuery {
            state: self.state,
            street: self.street,
            city: self.city,
            zip: self.zip,
        };
        print_records(&db.find_by_location(&query))
    }
}

/// A single exact-match value.
#[derive(Debug, clap::Parser)]
pub struct Field {
    /// The value to search for
    pub value: String,
}
