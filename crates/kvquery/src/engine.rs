//! Statement execution against a caller-owned keyspace.

use crate::security::{validate_key, validate_statement, validate_value};
use crate::statement::Statement;
use kvquery_core::error::{Error, Result};
use kvquery_core::keyspace::Keyspace;
use kvquery_core::query::{
    parse_delete_query, parse_query, parse_update_query, Executor, MatchResult, MutationSummary,
    PendingDeletion, UpdateKind, UpdateQuery,
};
use tracing::debug;

/// Default statement length limit (1MB)
const DEFAULT_MAX_STATEMENT_LENGTH: usize = 1024 * 1024;

/// Default key length limit (16MB)
const DEFAULT_MAX_KEY_LENGTH: usize = 16 * 1024 * 1024;

/// Default value length limit (1GB)
const DEFAULT_MAX_VALUE_LENGTH: usize = 1024 * 1024 * 1024;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest statement text accepted, in bytes
    pub max_statement_length: usize,
    /// Longest key name an UPDATE may write, in bytes
    pub max_key_length: usize,
    /// Longest value an UPDATE may write, in bytes
    pub max_value_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_statement_length: DEFAULT_MAX_STATEMENT_LENGTH,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Set the statement length limit
    pub fn with_max_statement_length(mut self, len: usize) -> Self {
        self.max_statement_length = len;
        self
    }

    /// Set the key length limit
    pub fn with_max_key_length(mut self, len: usize) -> Self {
        self.max_key_length = len;
        self
    }

    /// Set the value length limit
    pub fn with_max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Rejects limits that would refuse every statement
    pub fn validate(&self) -> Result<()> {
        if self.max_statement_length == 0 {
            return Err(Error::InvalidInput(
                "max_statement_length cannot be zero".to_string(),
            ));
        }

        if self.max_key_length == 0 {
            return Err(Error::InvalidInput(
                "max_key_length cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Result of [`Engine::run`]
#[derive(Debug)]
pub enum Outcome<'a> {
    /// Keys and values matched by a SELECT
    Rows(MatchResult),
    /// Per-key counts of an UPDATE
    Updated(MutationSummary),
    /// A DELETE plan awaiting [`PendingDeletion::confirm`]
    PendingDelete(PendingDeletion<'a>),
}

/// Validates, parses and executes statements against one keyspace.
///
/// The engine keeps no state between statements; it is a keyspace handle
/// plus input limits. Source names in statements are not interpreted, the
/// caller decides which keyspace an engine wraps.
///
/// # Examples
///
/// ```rust
/// use kvquery::{Engine, EngineConfig, Keyspace, MemoryKeyspace};
///
/// let keyspace = MemoryKeyspace::new();
/// keyspace.set_value("user:1", "alice", 0)?;
/// keyspace.set_value("user:2", "bob", 5000)?;
///
/// let engine = Engine::new(&keyspace, EngineConfig::default())?;
/// let rows = engine.select("select from main where ttl > 0")?;
/// assert_eq!(rows.get("user:2").map(String::as_str), Some("bob"));
///
/// let mut plan = engine.plan_delete("delete from main where key like 'user:%'")?;
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan.confirm()?.applied, 2);
/// # Ok::<(), kvquery::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine<K: Keyspace> {
    keyspace: K,
    config: EngineConfig,
}

impl<K: Keyspace> Engine<K> {
    /// Creates an engine over `keyspace` after checking `config`.
    pub fn new(keyspace: K, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        debug!(connected = keyspace.is_connected(), "engine created");
        Ok(Self { keyspace, config })
    }

    /// The wrapped keyspace.
    pub fn keyspace(&self) -> &K {
        &self.keyspace
    }

    /// The active limits.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs a SELECT statement.
    pub fn select(&self, text: &str) -> Result<MatchResult> {
        validate_statement(text, &self.config)?;
        let condition = parse_query(text)?;
        Executor::new(&self.keyspace).execute(&condition)
    }

    /// Runs an UPDATE statement.
    pub fn update(&self, text: &str) -> Result<MutationSummary> {
        validate_statement(text, &self.config)?;
        let query = parse_update_query(text)?;
        self.run_update(&query)
    }

    /// Plans a DELETE statement; nothing is deleted until the returned
    /// plan is confirmed.
    pub fn plan_delete(&self, text: &str) -> Result<PendingDeletion<'_>> {
        validate_statement(text, &self.config)?;
        let query = parse_delete_query(text)?;
        Executor::new(&self.keyspace).plan_delete(&query)
    }

    /// Runs any statement, dispatching on its leading keyword.
    pub fn run(&self, text: &str) -> Result<Outcome<'_>> {
        validate_statement(text, &self.config)?;
        let executor = Executor::new(&self.keyspace);
        match Statement::parse(text)? {
            Statement::Select(condition) => executor.execute(&condition).map(Outcome::Rows),
            Statement::Update(query) => self.run_update(&query).map(Outcome::Updated),
            Statement::Delete(query) => executor.plan_delete(&query).map(Outcome::PendingDelete),
        }
    }

    fn run_update(&self, query: &UpdateQuery) -> Result<MutationSummary> {
        match query.kind {
            UpdateKind::Key => validate_key(&query.new_value, &self.config)?,
            UpdateKind::Value => validate_value(&query.new_value, &self.config)?,
            UpdateKind::Ttl => {}
        }
        Executor::new(&self.keyspace).update(query)
    }
}
