//! Domain models for the record store.
//!
//! This module contains the untyped [`Record`] used by the generic store, the
//! typed person structures used by the directory, and configuration.

/// Untyped records and identifier helpers.
pub mod record;
pub use record::{Record, ID_FIELD};

/// Typed person records.
pub mod person;
pub use person::{Location, Name, Person, User};

mod config;
pub use config::Config;

/// Shape validators for person fields.
pub mod validate;
pub use validate::ValidationError;
