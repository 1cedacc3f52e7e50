/// Query engine module
///
/// Statement parsing, pattern compilation, and scan-based execution.
/// Parsed statement types
#[allow(missing_docs)]
pub mod condition;
/// Scan executor
pub mod executor;
/// UPDATE and DELETE execution
pub mod mutation;
/// Statement parsers
#[allow(missing_docs)]
pub mod parser;
/// LIKE and regex pattern compiler
pub mod pattern;

// Re-export main types
pub use condition::*;
pub use executor::{execute_query, Executor, MatchResult};
pub use mutation::{execute_update_query, plan_delete, MutationSummary, PendingDeletion};
pub use parser::{parse_delete_query, parse_query, parse_update_query, ParseError};
pub use pattern::{compile_like_pattern, compile_raw_pattern, like_to_regex, MatchPattern};
