//! A file-backed store of records
//!
//! The [`JsonStore`] keeps the whole collection in memory and mirrors it to a
//! single JSON document on every mutation. It knows nothing about the shape of
//! the records beyond the reserved identifier field.

use std::{
    collections::HashSet,
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::domain::{
    Config, Record, ID_FIELD,
    record::{self, id_of, next_id},
};

/// What happened when the backing document was loaded.
///
/// A missing or unreadable document never prevents the store from opening; it
/// starts empty instead. This lets callers tell a corrupt file apart from a
/// genuinely empty collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The document was read successfully.
    Loaded {
        /// Number of records read.
        records: usize,
    },
    /// There was no document at the path.
    Missing,
    /// The document could not be read, or was not an array of objects.
    Corrupt {
        /// Why the document was rejected.
        reason: String,
    },
}

/// A filesystem backed store of records.
#[derive(Debug)]
pub struct JsonStore {
    /// The JSON document the collection is mirrored to.
    path: PathBuf,
    /// Spaces per indentation level when writing.
    indent: usize,
    records: Vec<Record>,
    status: LoadStatus,
}

impl JsonStore {
    /// Opens the store at the given path with default formatting.
    ///
    /// See [`JsonStore::from_config`].
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_indent(path.into(), Config::default().indent())
    }

    /// Opens the store described by the configuration.
    ///
    /// If the document does not exist, or is not a JSON array of objects, the
    /// store starts with an empty collection. The outcome is available from
    /// [`JsonStore::load_status`].
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::open_with_indent(config.database.clone(), config.indent())
    }

    fn open_with_indent(path: PathBuf, indent: usize) -> Self {
        let (records, status) = load(&path);
        Self {
            path,
            indent,
            records,
            status,
        }
    }

    /// The path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the backing document was loaded.
    #[must_use]
    pub const fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The number of records in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Retrieves a record by identifier.
    #[must_use]
    pub fn get(&self, id: &Value) -> Option<&Record> {
        self.position(id).map(|index| &self.records[index])
    }

    /// Add a new record to the collection.
    ///
    /// If the record has no `id` field, it is assigned the next free integer
    /// identifier. The identifier is always the first field of the stored
    /// record.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - the record is not a JSON object
    /// - the record's identifier is already in use
    /// - no identifier was supplied and the integer identifiers are exhausted
    /// - the document cannot be written to
    pub fn create(&mut self, record: Value) -> Result<Record, StoreError> {
        let fields = match record {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::InvalidInput(format!(
                    "expected a JSON object, found {}",
                    type_name(&other)
                )));
            }
        };

        let id = match fields.get(ID_FIELD) {
            None | Some(Value::Null) => {
                let next = next_id(&self.records).ok_or_else(|| {
                    StoreError::InvalidInput("no integer identifiers left to assign".to_string())
                })?;
                Value::from(next)
            }
            Some(id) if self.position(id).is_some() => {
                return Err(StoreError::DuplicateId(id.clone()));
            }
            Some(id) => id.clone(),
        };

        let mut stored = Map::with_capacity(fields.len() + 1);
        stored.insert(ID_FIELD.to_string(), id.clone());
        stored.extend(fields.into_iter().filter(|(key, _)| key != ID_FIELD));

        self.records.push(stored);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        tracing::info!("Created record {id}");
        Ok(self.records[self.records.len() - 1].clone())
    }

    /// Search the collection using top-level equality filters.
    ///
    /// A record matches when every `(field, value)` pair is present and equal.
    /// With no filters, every record matches. Results are in collection order;
    /// an empty result means nothing matched.
    #[must_use]
    pub fn read(&self, filters: &[(&str, Value)]) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| record::matches(r, filters))
            .collect()
    }

    /// Merge `changes` into an existing record.
    ///
    /// This is a shallow merge: each supplied field replaces the existing value
    /// and other fields are untouched. The identifier is never changed, even if
    /// `changes` contains one.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - no record has the given identifier
    /// - the document cannot be written to, in which case the record is left
    ///   unchanged
    pub fn update(&mut self, id: &Value, changes: Record) -> Result<Record, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let previous = self.records[index].clone();
        let record = &mut self.records[index];
        for (key, value) in changes {
            if key != ID_FIELD {
                record.insert(key, value);
            }
        }

        if let Err(e) = self.persist() {
            self.records[index] = previous;
            return Err(e);
        }

        tracing::info!("Updated record {id}");
        Ok(self.records[index].clone())
    }

    /// Remove a record from the collection.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - no record has the given identifier
    /// - the document cannot be written to, in which case the record is
    ///   restored
    pub fn delete(&mut self, id: &Value) -> Result<Record, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let removed = self.records.remove(index);
        if let Err(e) = self.persist() {
            self.records.insert(index, removed);
            return Err(e);
        }

        tracing::info!("Deleted record {id}");
        Ok(removed)
    }

    fn position(&self, id: &Value) -> Option<usize> {
        self.records.iter().position(|r| id_of(r) == Some(id))
    }

    /// Write the whole collection to disk.
    ///
    /// The document is written to a sibling temporary file and renamed into
    /// place, so a failed write leaves the previous document intact.
    fn persist(&self) -> Result<(), StoreError> {
        let indent = " ".repeat(self.indent);
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut buffer,
            PrettyFormatter::with_indent(indent.as_bytes()),
        );
        self.records.serialize(&mut serializer)?;

        write_replacing(&self.path, &buffer)?;
        tracing::debug!(
            "Wrote {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn load(path: &Path) -> (Vec<Record>, LoadStatus) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No document at {}, starting empty", path.display());
            return (Vec::new(), LoadStatus::Missing);
        }
        Err(e) => return corrupt(path, format!("failed to read document: {e}")),
    };

    let records: Vec<Record> = match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => return corrupt(path, format!("expected an array of objects: {e}")),
    };

    let mut seen = HashSet::with_capacity(records.len());
    for id in records.iter().filter_map(id_of) {
        if !seen.insert(id.to_string()) {
            tracing::warn!("Duplicate identifier {id} in {}", path.display());
        }
    }

    tracing::debug!("Loaded {} records from {}", records.len(), path.display());
    let status = LoadStatus::Loaded {
        records: records.len(),
    };
    (records, status)
}

fn corrupt(path: &Path, reason: String) -> (Vec<Record>, LoadStatus) {
    tracing::warn!(
        "Ignoring unusable document at {}, starting empty: {reason}",
        path.display()
    );
    (Vec::new(), LoadStatus::Corrupt { reason })
}

fn write_replacing(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut temp_path = OsString::from(path.as_os_str());
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    writer.write_all(contents)?;
    writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;

    fs::rename(&temp_path, path)
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Errors returned by [`JsonStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The argument had the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A record with this identifier already exists.
    #[error("identifier {0} is already in use")]
    DuplicateId(Value),
    /// No record has this identifier.
    #[error("record {0} not found")]
    NotFound(Value),
    /// The document could not be written.
    #[error("failed to write document: {0}")]
    Io(#[from] io::Error),
    /// The collection could not be serialized.
    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the caller supplied a malformed argument.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::DuplicateId(_))
    }

    /// Whether the requested record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
