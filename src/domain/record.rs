use serde_json::{Map, Value};

/// The reserved identifier field.
pub const ID_FIELD: &str = "id";

/// A single entry in the collection.
///
/// Records are open-ended JSON objects. The only field the store interprets is
/// [`ID_FIELD`].
pub type Record = Map<String, Value>;

/// Returns the identifier of a record, if it has one.
#[must_use]
pub fn id_of(record: &Record) -> Option<&Value> {
    record.get(ID_FIELD)
}

/// Returns the next identifier for a collection.
///
/// This is one greater than the highest integer identifier present, or `1` if
/// there are none. Non-integer identifiers are ignored. No attempt is made to
/// 'recycle' identifiers if there are gaps in the sequence.
///
/// Returns `None` if the highest identifier is already `i64::MAX`.
#[must_use]
pub fn next_id<'a>(records: impl IntoIterator<Item = &'a Record>) -> Option<i64> {
    records
        .into_iter()
        .filter_map(|record| id_of(record).and_then(Value::as_i64))
        .max()
        .map_or(Some(1), |max| max.max(0).checked_add(1))
}

/// Whether every `(field, value)` pair matches the record's top-level fields.
///
/// Comparison is exact JSON equality, so `1` does not match `"1"`.
#[must_use]
pub fn matches(record: &Record, filters: &[(&str, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, value)| record.get(*field) == Some(value))
}
