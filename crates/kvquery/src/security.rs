/// Input validation for statements and update payloads
///
/// Keeps oversized or empty input away from the parser and the keyspace.
/// Limits come from [`EngineConfig`].
use crate::EngineConfig;
use kvquery_core::error::{Error, Result};

/// Validates statement text
///
/// # Security
///
/// - Prevents empty statements
/// - Prevents oversized statements (default >1MB)
///
/// # Errors
///
/// Returns Error::InvalidInput if validation fails
#[inline]
pub fn validate_statement(text: &str, config: &EngineConfig) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("Statement cannot be empty".to_string()));
    }

    if text.len() > config.max_statement_length {
        return Err(Error::InvalidInput(format!(
            "Statement length {} exceeds maximum {}",
            text.len(),
            config.max_statement_length
        )));
    }

    Ok(())
}

/// Validates a key name written by a rename
///
/// # Security
///
/// - Prevents empty keys
/// - Prevents oversized keys (default >16MB)
/// - Prevents null bytes
///
/// # Errors
///
/// Returns Error::InvalidInput if validation fails
#[inline]
pub fn validate_key(key: &str, config: &EngineConfig) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("Key cannot be empty".to_string()));
    }

    if key.len() > config.max_key_length {
        return Err(Error::InvalidInput(format!(
            "Key size {} exceeds maximum {}",
            key.len(),
            config.max_key_length
        )));
    }

    if key.contains('\0') {
        return Err(Error::InvalidInput(
            "Key cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}

/// Validates a value written by an update
///
/// # Errors
///
/// Returns Error::InvalidInput if the value exceeds the configured maximum
#[inline]
pub fn validate_value(value: &str, config: &EngineConfig) -> Result<()> {
    if value.len() > config.max_value_length {
        return Err(Error::InvalidInput(format!(
            "Value size {} exceeds maximum {}",
            value.len(),
            config.max_value_length
        )));
    }

    Ok(())
}
