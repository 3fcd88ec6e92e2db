use peopledb::PeopleDb;
use serde_json::Value;
use tracing::instrument;

use super::{parse_value, print_records};

/// Command arguments for `people list`.
#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Top-level equality filters as FIELD=VALUE (repeatable).
    ///
    /// VALUE is parsed as JSON when possible, so `id=3` matches the number 3
    /// and `id='"3"'` matches the string "3".
    #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, Value)>,
}

impl Command {
    #[instrument(skip(db))]
    pub fn run(self, db: &PeopleDb) -> anyhow::Result<()> {
        let filters: Vec<(&str, Value)> = self
            .filters
            .iter()
            .map(|(field, value)| (field.as_str(), value.clone()))
            .collect();

        print_records(&db.store().read(&filters))
    }
}

fn parse_filter(s: &str) -> Result<(String, Value), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, found '{s}'"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }

    Ok((field.to_string(), parse_value(value)))
}
