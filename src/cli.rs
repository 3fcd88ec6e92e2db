use std::{
    io::{self, BufRead},
    path::PathBuf,
};

mod create;
mod edit;
mod filter;
mod find;
mod generate;
mod list;
mod style;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::ArgAction;
use peopledb::{Config, LoadStatus, PeopleDb, Record};
use serde_json::Value;
use style::Tone;

/// Parse a `YYYY-MM-DD` date as midnight UTC.
fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|e| format!("expected a date like 2024-01-31: {e}"))
}

/// Parse a command line value as JSON, falling back to a plain string.
///
/// This lets `3` match the number 3 while `Austin` still works without quotes.
fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = "people.toml", global = true)]
    config: PathBuf,

    /// The path to the JSON document (overrides the configuration file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let mut config = Config::load(&self.config).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Config::default()
        });
        if let Some(database) = self.database {
            config.database = database;
        }

        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Add a new person
    Create(create::Command),

    /// List records, optionally filtered by top-level fields
    List(list::Command),

    /// Find people by first and/or last name (case-insensitive)
    FindName(find::Name),

    /// Find people by city (case-insensitive)
    FindCity(find::City),

    /// Find people by any combination of location fields
    FindLocation(find::Location),

    /// Find people by phone number
    FindPhone(find::Field),

    /// Find people by email address
    FindEmail(find::Field),

    /// Find people by username
    FindUsername(find::Field),

    /// Find people by social security number
    FindSsn(find::Field),

    /// Find people within an age range
    FilterAge(filter::Age),

    /// Find people who registered within a date range
    FilterRegistered(filter::Registered),

    /// List every email address
    Emails,

    /// Generate a username for everyone with a full name
    Usernames,

    /// Count people in each state
    GroupByState,

    /// Merge fields into an existing record
    Update(edit::Update),

    /// Delete a record
    Delete(edit::Delete),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut db = open(config);

        match self {
            Self::Create(command) => command.run(&mut db)?,
            Self::List(command) => command.run(&db)?,
            Self::FindName(command) => command.run(&db)?,
            Self::FindCity(command) => command.run(&db)?,
            Self::FindLocation(command) => command.run(&db)?,
            Self::FindPhone(command) => print_records(&db.find_by_phone(&command.value))?,
            Self::FindEmail(command) => print_records(&db.find_by_email(&command.value))?,
            Self::FindUsername(command) => print_records(&db.find_by_username(&command.value))?,
            Self::FindSsn(command) => print_records(&db.find_by_ssn(&command.value))?,
            Self::FilterAge(command) => command.run(&db)?,
            Self::FilterRegistered(command) => command.run(&db)?,
            Self::Emails => generate::emails(&db)?,
            Self::Usernames => generate::usernames(&db)?,
            Self::GroupByState => generate::group_by_state(&db),
            Self::Update(command) => command.run(&mut db)?,
            Self::Delete(command) => command.run(&mut db)?,
        }
        Ok(())
    }
}

fn open(config: &Config) -> PeopleDb {
    let db = PeopleDb::from_config(config);

    if let LoadStatus::Corrupt { reason } = db.store().load_status() {
        eprintln!(
            "{}",
            Tone::Warning.paint(format_args!(
                "⚠️  Ignoring unreadable database {}: {reason}",
                db.store().path().display()
            ))
        );
    }

    db
}

fn print_records(records: &[&Record]) -> anyhow::Result<()> {
    if records.is_empty() {
        eprintln!("{}", Tone::Quiet.paint("No matching records"));
    }
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

fn prompt_to_proceed() -> io::Result<bool> {
    eprint!("\nProceed? (y/N) ");
    let stdin = std::io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
