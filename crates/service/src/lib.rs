//! Store adapter: CRUD over items addressed by a string id.
//! - `store` holds the backend seam (`ItemBackend`) and its implementations.
//! - `items` is the facade the HTTP layer talks to.
//! - Backend specifics (expression syntax, attribute encoding) stay behind the trait.

pub mod errors;
pub mod items;
pub mod store;

pub use items::ItemStore;
