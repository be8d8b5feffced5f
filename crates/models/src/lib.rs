//! Domain entities shared by the store adapter and the HTTP layer.

pub mod errors;
pub mod item;

pub use item::{Item, Patch};
