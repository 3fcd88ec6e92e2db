//! File-backed JSON record store
//!
//! Records are JSON objects stored as a single pretty-printed array on disk.
//! The generic [`JsonStore`] handles identifiers and persistence, while
//! [`PeopleDb`] layers person-shaped queries on top.

pub mod domain;
pub use domain::{Config, Person, Record};

/// File-backed storage and the person directory.
pub mod storage;
pub use storage::{JsonStore, LoadStatus, LocationQuery, PeopleDb, PersonError, StoreError};
