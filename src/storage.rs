pub mod store;
/// Person-shaped queries over a [`JsonStore`].
pub mod people;

pub use people::{LocationQuery, PeopleDb, PersonError};
pub use store::{JsonStore, LoadStatus, StoreError};
