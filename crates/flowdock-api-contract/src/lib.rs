//! Flowdock REST API contract types
//!
//! This crate defines the records returned by the Flowdock REST and streaming
//! APIs, the polymorphic message content they carry, and the option structs
//! accepted by list/create/update endpoints. The types are shared by the REST
//! client and the command-line tools built on top of it.

pub mod content;
pub mod error;
pub mod options;
pub mod query;
pub mod time;
pub mod types;
pub mod validation;

pub use content::*;
pub use error::*;
pub use options::*;
pub use time::Time;
pub use types::*;
