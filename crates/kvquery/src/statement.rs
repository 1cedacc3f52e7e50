//! Statement dispatch.
//!
//! Routes raw text to the SELECT, UPDATE or DELETE parser by its leading
//! keyword.

use kvquery_core::query::{
    parse_delete_query, parse_query, parse_update_query, DeleteQuery, ParseError, QueryCondition,
    UpdateQuery,
};
use std::fmt;
use std::str::FromStr;

/// A parsed statement of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `select from <source> [where ...]`
    Select(QueryCondition),
    /// `update <source> set <field> = <value> where ...`
    Update(UpdateQuery),
    /// `delete from <source> where ...`
    Delete(DeleteQuery),
}

impl Statement {
    /// Parses `text`, choosing the parser from its first word.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvquery::Statement;
    ///
    /// let stmt = Statement::parse("delete from main where ttl < 1000")?;
    /// assert!(matches!(stmt, Statement::Delete(_)));
    /// assert_eq!(stmt.source(), "main");
    /// # Ok::<(), kvquery::ParseError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let first = text.split_whitespace().next().unwrap_or("");
        match first.to_ascii_lowercase().as_str() {
            "select" => parse_query(text).map(Statement::Select),
            "update" => parse_update_query(text).map(Statement::Update),
            "delete" | "del" => parse_delete_query(text).map(Statement::Delete),
            _ => Err(ParseError::UnexpectedStatement {
                expected: "SELECT, UPDATE or DELETE".to_string(),
                found: first.to_string(),
            }),
        }
    }

    /// The source the statement targets.
    pub fn source(&self) -> &str {
        match self {
            Statement::Select(condition) => &condition.source,
            Statement::Update(query) => &query.source,
            Statement::Delete(query) => &query.source,
        }
    }

    /// The filter shared by all three statement kinds.
    pub fn condition(&self) -> &QueryCondition {
        match self {
            Statement::Select(condition) => condition,
            Statement::Update(query) => &query.condition,
            Statement::Delete(query) => &query.condition,
        }
    }

    /// Whether executing the statement can modify the keyspace.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Statement::Select(_))
    }
}

impl FromStr for Statement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Statement::parse(s)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(condition) => write!(f, "{}", condition),
            Statement::Update(query) => write!(f, "{}", query),
            Statement::Delete(query) => write!(f, "{}", query),
        }
    }
}
