//! Persistent bot settings.
//!
//! Each store wraps one JSON file. It is loaded at startup, mutated in
//! memory, and written back only when `save` is called.

mod error;
mod store;

pub use error::SettingsError;
pub use store::SettingsStore;
