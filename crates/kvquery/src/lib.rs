//! # kvquery
//!
//! A small query language for inspecting and bulk-editing flat key-value
//! stores whose keys carry TTLs.
//!
//! ## Quick Start
//!
//! ```rust
//! use kvquery::{Engine, EngineConfig, Keyspace, MemoryKeyspace};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let keyspace = MemoryKeyspace::new();
//!     keyspace.set_value("user:1", "alice", 0)?;
//!     keyspace.set_value("user:2", "bob", 5000)?;
//!
//!     let engine = Engine::new(&keyspace, EngineConfig::default())?;
//!
//!     // Keys and values matching every clause
//!     let users = engine.select("select from main where key like 'user:%'")?;
//!     assert_eq!(users.len(), 2);
//!
//!     // Rewrite values, keeping each key's remaining TTL
//!     engine.update("update main set value = 'anonymous' where ttl > 0")?;
//!     assert_eq!(keyspace.get_value("user:2")?, "anonymous");
//!
//!     // Deletion is two-phase: plan, inspect, confirm
//!     let mut plan = engine.plan_delete("delete from main where value like 'alice'")?;
//!     assert_eq!(plan.keys(), ["user:1"]);
//!     plan.confirm()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Statements
//!
//! ```text
//! select from <source> [where <clause> [and <clause>]...]
//! update <source> set value|key|ttl = '<payload>' where <clause> [and <clause>]...
//! delete from <source> where <clause> [and <clause>]...
//!
//! <clause> := key like '<pattern>' | key regex '<regex>'
//!           | value like '<pattern>' | value regex '<regex>'
//!           | ttl > <ms> | ttl < <ms> | ttl == <ms>
//! ```
//!
//! LIKE patterns use `%` for any run of characters and `_` for exactly one
//! character, and must match the whole key or value. Keywords are
//! case-insensitive; pattern text is not.
//!
//! The parsers and executors live in `kvquery-core` and are re-exported
//! here. Any store can be queried by implementing [`Keyspace`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
pub mod logging;
pub mod security;
mod statement;

// Re-export core types
pub use kvquery_core::{Error, Result};

// Keyspace abstraction
pub use kvquery_core::keyspace::{Keyspace, MemoryKeyspace, NO_EXPIRATION};

// Query components
pub use kvquery_core::query::{
    compile_like_pattern, compile_raw_pattern, execute_query, execute_update_query,
    like_to_regex, parse_delete_query, parse_query, parse_update_query, plan_delete, DeleteQuery,
    Executor, MatchPattern, MatchResult, MutationSummary, ParseError, PendingDeletion,
    QueryCondition, TtlFilter, TtlOperator, UpdateKind, UpdateQuery,
};

pub use engine::{Engine, EngineConfig, Outcome};
pub use logging::{LogConfig, LogFormat, LogOutput};
pub use statement::Statement;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
