/// Parsed statement types
///
/// The structured form of SELECT, UPDATE and DELETE statements. All of them
/// are plain values created per statement; nothing here holds state
/// between calls.
use super::pattern::MatchPattern;
use std::fmt;

/// Comparison applied to a key's remaining TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlOperator {
    GreaterThan, // >
    LessThan,    // <
    Equals,      // ==
}

impl TtlOperator {
    /// Parses the operator text used in `ttl` clauses.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(TtlOperator::GreaterThan),
            "<" => Some(TtlOperator::LessThan),
            "==" => Some(TtlOperator::Equals),
            _ => None,
        }
    }
}

/// A `ttl <op> <millis>` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlFilter {
    pub operator: TtlOperator,
    pub millis: i64,
}

impl TtlFilter {
    /// Whether a key with remaining lifetime `ttl` (milliseconds) passes.
    pub fn admits(&self, ttl: i64) -> bool {
        match self.operator {
            TtlOperator::GreaterThan => ttl > self.millis,
            TtlOperator::LessThan => ttl < self.millis,
            TtlOperator::Equals => ttl == self.millis,
        }
    }
}

/// Compiled WHERE clause of a statement plus the source it targets.
///
/// A field left as `None` places no constraint on that attribute, so the
/// default condition for a source matches every key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub source: String,
    pub key_pattern: Option<MatchPattern>,
    pub value_pattern: Option<MatchPattern>,
    pub ttl: Option<TtlFilter>,
}

impl QueryCondition {
    /// A condition on `source` with no constraints.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key_pattern: None,
            value_pattern: None,
            ttl: None,
        }
    }

    /// True when no clause constrains the scan.
    pub fn matches_everything(&self) -> bool {
        self.key_pattern.is_none() && self.value_pattern.is_none() && self.ttl.is_none()
    }
}

/// The single field an UPDATE statement mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Replace the value, keeping the TTL
    Value,
    /// Rename the key, keeping value and TTL
    Key,
    /// Replace the TTL, keeping the value
    Ttl,
}

impl UpdateKind {
    /// Parses the field name of a SET assignment (case-insensitive).
    pub fn from_field(field: &str) -> Option<Self> {
        match field.to_ascii_lowercase().as_str() {
            "value" => Some(UpdateKind::Value),
            "key" => Some(UpdateKind::Key),
            "ttl" => Some(UpdateKind::Ttl),
            _ => None,
        }
    }
}

/// `UPDATE <source> SET <field> = <value> WHERE ...`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub source: String,
    pub kind: UpdateKind,
    /// New value, new key name, or TTL in milliseconds as text, per `kind`
    pub new_value: String,
    pub condition: QueryCondition,
}

impl UpdateQuery {
    /// The TTL payload of a [`UpdateKind::Ttl`] update.
    ///
    /// The parser has already validated the text, so this only returns
    /// `None` for other update kinds.
    pub fn ttl_millis(&self) -> Option<u64> {
        match self.kind {
            UpdateKind::Ttl => self.new_value.parse().ok(),
            _ => None,
        }
    }
}

/// `DELETE FROM <source> WHERE ...`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub source: String,
    pub condition: QueryCondition,
}

// Display implementations for debugging and log lines

impl fmt::Display for TtlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlOperator::GreaterThan => write!(f, ">"),
            TtlOperator::LessThan => write!(f, "<"),
            TtlOperator::Equals => write!(f, "=="),
        }
    }
}

impl fmt::Display for TtlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ttl {} {}", self.operator, self.millis)
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::Value => write!(f, "value"),
            UpdateKind::Key => write!(f, "key"),
            UpdateKind::Ttl => write!(f, "ttl"),
        }
    }
}

impl QueryCondition {
    fn fmt_where(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses = Vec::new();
        if let Some(ref ttl) = self.ttl {
            clauses.push(ttl.to_string());
        }
        if let Some(ref pattern) = self.value_pattern {
            clauses.push(format!("value {}", pattern));
        }
        if let Some(ref pattern) = self.key_pattern {
            clauses.push(format!("key {}", pattern));
        }
        if !clauses.is_empty() {
            write!(f, " WHERE {}", clauses.join(" AND "))?;
        }
        Ok(())
    }
}

impl fmt::Display for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT FROM {}", self.source)?;
        self.fmt_where(f)
    }
}

impl fmt::Display for UpdateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UPDATE {} SET {} = '{}'",
            self.source, self.kind, self.new_value
        )?;
        self.condition.fmt_where(f)
    }
}

impl fmt::Display for DeleteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.source)?;
        self.condition.fmt_where(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::pattern::compile_like_pattern;

    #[test]
    fn test_ttl_filter_admits() {
        let gt = TtlFilter {
            operator: TtlOperator::GreaterThan,
            millis: 0,
        };
        assert!(gt.admits(5000));
        assert!(!gt.admits(0));
        assert!(!gt.admits(-1));

        let eq = TtlFilter {
            operator: TtlOperator::Equals,
            millis: -1,
        };
        assert!(eq.admits(-1));
        assert!(!eq.admits(1));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(TtlOperator::from_symbol(">"), Some(TtlOperator::GreaterThan));
        assert_eq!(TtlOperator::from_symbol("=="), Some(TtlOperator::Equals));
        assert_eq!(TtlOperator::from_symbol(">>"), None);
        assert_eq!(TtlOperator::from_symbol("="), None);
    }

    #[test]
    fn test_update_kind_field_names() {
        assert_eq!(UpdateKind::from_field("VALUE"), Some(UpdateKind::Value));
        assert_eq!(UpdateKind::from_field("Key"), Some(UpdateKind::Key));
        assert_eq!(UpdateKind::from_field("ttl"), Some(UpdateKind::Ttl));
        assert_eq!(UpdateKind::from_field("expiry"), None);
    }

    #[test]
    fn test_condition_display() {
        let mut cond = QueryCondition::new("main");
        assert_eq!(cond.to_string(), "SELECT FROM main");
        assert!(cond.matches_everything());

        cond.key_pattern = Some(compile_like_pattern("user:%").unwrap());
        cond.ttl = Some(TtlFilter {
            operator: TtlOperator::LessThan,
            millis: 100,
        });
        assert_eq!(
            cond.to_string(),
            "SELECT FROM main WHERE ttl < 100 AND key LIKE 'user:%'"
        );
    }
}
