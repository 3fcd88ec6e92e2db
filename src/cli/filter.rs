use chrono::{DateTime, Utc};
use peopledb::PeopleDb;
use tracing::instrument;

use super::{parse_date, print_records};

#[derive(Debug, clap::Parser)]
pub struct Age {
    /// Minimum age in years (inclusive)
    #[arg(long)]
    min: Option<i64>,

    /// Maximum age in years (inclusive)
    #[arg(long)]
    max: Option<i64>,
}

impl Age {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            anyhow::ensure!(min <= max, "--min ({min}) is greater than --max ({max})");
        }
        print_records(&db.filter_by_age(self.min, self.max))
    }
}

#[derive(Debug, clap::Parser)]
pub struct Registered {
    /// Registered on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    since: Option<DateTime<Utc>>,

    /// Registered on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    until: Option<DateTime<Utc>>,
}

impl Registered {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        print_records(&db.filter_by_registration_date(self.since, self.until))
    }
}
