use peopledb::{PeopleDb, Record};
use serde_json::Value;
use tracing::instrument;

use super::{parse_value, prompt_to_proceed, style::Tone};

#[derive(Debug, clap::Parser)]
pub struct Update {
    /// The identifier of the record to update
    #[clap(value_parser = parse_id)]
    id: Value,

    /// A JSON object of fields to merge into the record
    #[clap(value_parser = parse_object)]
    changes: Record,
}

impl Update {
    #[instrument(skip(db))]
    pub fn run(self, db: &mut PeopleDb) -> anyhow::Result<()> {
        let record = db.store_mut().update(&self.id, self.changes)?;
        println!("{}", Tone::Success.paint(format_args!("Updated record {}", self.id)));
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The identifier of the record to delete
    #[clap(value_parser = parse_id)]
    id: Value,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip(db))]
    pub fn run(self, db: &mut PeopleDb) -> anyhow::Result<()> {
        let Some(record) = db.store().get(&self.id) else {
            anyhow::bail!("Record {} not found", self.id);
        };

        if !self.yes {
            eprintln!("{}", serde_json::to_string_pretty(record)?);
            if !prompt_to_proceed()? {
                println!("Cancelled");
                return Ok(());
            }
        }

        db.store_mut().delete(&self.id)?;
        println!("{}", Tone::Success.paint(format_args!("Deleted record {}", self.id)));
        Ok(())
    }
}

#[allow(clippy::unnecessary_wraps)]
fn parse_id(s: &str) -> Result<Value, String> {
    Ok(parse_value(s))
}

fn parse_object(s: &str) -> Result<Record, String> {
    match serde_json::from_str(s) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_object_requires_an_object() {
        assert_eq!(
            parse_object(r#"{"name": "b"}"#).unwrap(),
            json!({"name": "b"}).as_object().cloned().unwrap()
        );
        assert!(parse_object("[1]").is_err());
        assert!(parse_object("{").is_err());
    }

    #[test]
    fn update_and_delete_run_against_store() {
        let tmp = tempdir().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));
        db.store_mut().create(json!({"name": "a"})).unwrap();

        Update {
            id: json!(1),
            changes: parse_object(r#"{"name": "b"}"#).unwrap(),
        }
        .run(&mut db)
        .expect("update command should succeed");
        assert_eq!(db.store().records()[0]["name"], json!("b"));

        Delete {
            id: json!(1),
            yes: true,
        }
        .run(&mut db)
        .expect("delete command should succeed");
        assert!(db.store().is_empty());
    }

    #[test]
    fn delete_run_fails_for_missing_record() {
        let tmp = tempdir().unwrap();
        let mut db = PeopleDb::open(tmp.path().join("people.json"));

        let result = Delete {
            id: json!(5),
            yes: true,
        }
        .run(&mut db);

        assert!(result.is_err());
    }
}
