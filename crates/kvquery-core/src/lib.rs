//! # kvquery Core
//!
//! Statement parsers and executors for kvquery.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! Users should depend on the main `kvquery` crate, which re-exports
//! everything here together with logging and input validation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keyspace;
pub mod query;

pub use error::{Error, Result};
pub use keyspace::{Keyspace, MemoryKeyspace, NO_EXPIRATION};
