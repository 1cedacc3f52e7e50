/// Statement parsers
///
/// Turns SELECT, UPDATE and DELETE text into [`QueryCondition`],
/// [`UpdateQuery`] and [`DeleteQuery`]. Keywords are case-insensitive and
/// only recognised as whole words outside quoted text; pattern text keeps
/// its original case.
///
/// ```text
/// query        := "select" "from" source ["where" clause ("and" clause)*]
/// clause       := ttl-clause | value-clause | key-clause
/// ttl-clause   := "ttl" (">" | "<" | "==") integer
/// value-clause := "value" ("like" quoted | "regex" quoted)
/// key-clause   := "key"   ("like" quoted | "regex" quoted)
/// update       := "update" source "set" field "=" value "where" clause ...
/// delete       := ("delete" | "del") "from" source "where" clause ...
/// ```
use super::condition::{
    DeleteQuery, QueryCondition, TtlFilter, TtlOperator, UpdateKind, UpdateQuery,
};
use super::pattern::{compile_like_pattern, compile_raw_pattern, MatchPattern};
use std::fmt;
use tracing::debug;

/// Parses a SELECT statement.
///
/// Without a `where` clause the condition matches every key of the source.
pub fn parse_query(text: &str) -> Result<QueryCondition, ParseError> {
    let condition = parse_condition(text.trim())?;
    debug!(statement = %condition, "parsed query");
    Ok(condition)
}

/// Parses `update <source> set <field> = <value> where <filter>`.
///
/// The filter goes through [`parse_query`] as
/// `select from <source> where <filter>`, so UPDATE selects exactly the
/// keys the equivalent SELECT would.
pub fn parse_update_query(text: &str) -> Result<UpdateQuery, ParseError> {
    let text = text.trim();
    expect_leading(text, &["update"], "UPDATE")?;

    let set_at = find_keyword(text, "set").ok_or(ParseError::MissingSetClause)?;
    let (prefix, suffix) = (&text[..set_at], &text[set_at + "set".len()..]);

    let source = prefix
        .split_whitespace()
        .nth(1)
        .ok_or(ParseError::MissingSourceName)?;

    let where_at = find_keyword(suffix, "where").ok_or(ParseError::MissingWhereClause)?;
    let assignment = suffix[..where_at].trim();
    let filter = suffix[where_at + "where".len()..].trim();

    let (field, value) = assignment
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(assignment.to_string()))?;
    let field = field.trim();
    let kind = UpdateKind::from_field(field)
        .ok_or_else(|| ParseError::InvalidUpdateType(field.to_string()))?;
    let new_value = unquote(value.trim()).to_string();

    match kind {
        UpdateKind::Ttl if new_value.parse::<u64>().is_err() => {
            return Err(ParseError::InvalidTtlValue(new_value));
        }
        UpdateKind::Key if new_value.is_empty() => {
            return Err(ParseError::InvalidAssignment(assignment.to_string()));
        }
        _ => {}
    }

    let condition = parse_condition(&format!("select from {} where {}", source, filter))?;
    let query = UpdateQuery {
        source: source.to_string(),
        kind,
        new_value,
        condition,
    };
    debug!(statement = %query, "parsed update");
    Ok(query)
}

/// Parses `delete from <source> where <filter>` (`del` is accepted for
/// `delete`).
pub fn parse_delete_query(text: &str) -> Result<DeleteQuery, ParseError> {
    let text = text.trim();
    expect_leading(text, &["delete", "del"], "DELETE FROM")?;

    let from_follows = text
        .split_whitespace()
        .nth(1)
        .is_some_and(|word| word.eq_ignore_ascii_case("from"));
    if !from_follows {
        return Err(ParseError::MissingFromClause);
    }

    let where_at = find_keyword(text, "where").ok_or(ParseError::MissingWhereClause)?;
    let source = text[..where_at]
        .split_whitespace()
        .nth(2)
        .ok_or(ParseError::MissingSourceName)?;
    let filter = text[where_at + "where".len()..].trim();

    let condition = parse_condition(&format!("select from {} where {}", source, filter))?;
    let query = DeleteQuery {
        source: source.to_string(),
        condition,
    };
    debug!(statement = %query, "parsed delete");
    Ok(query)
}

fn parse_condition(text: &str) -> Result<QueryCondition, ParseError> {
    let from_at = find_keyword(text, "from").ok_or(ParseError::MissingFromClause)?;
    let rest = &text[from_at + "from".len()..];

    let source = rest
        .split_whitespace()
        .next()
        .filter(|word| !word.eq_ignore_ascii_case("where"))
        .ok_or(ParseError::MissingSourceName)?;
    let mut condition = QueryCondition::new(source);

    let Some(where_at) = find_keyword(rest, "where") else {
        return Ok(condition);
    };

    for clause in split_keyword(&rest[where_at + "where".len()..], "and") {
        apply_clause(clause.trim(), &mut condition)?;
    }

    Ok(condition)
}

/// Routes one clause by the first of `ttl`, `value`, `key` it contains.
///
/// Containment is checked on the whole clause text, quoted pattern
/// included, so `key like '%value%'` is handled as a value clause.
fn apply_clause(clause: &str, condition: &mut QueryCondition) -> Result<(), ParseError> {
    let lower = clause.to_ascii_lowercase();

    if let Some(at) = lower.find("ttl") {
        condition.ttl = Some(parse_ttl_clause(&clause[at + "ttl".len()..])?);
    } else if lower.contains("value") {
        condition.value_pattern = Some(parse_pattern_clause(clause)?);
    } else if lower.contains("key") {
        condition.key_pattern = Some(parse_pattern_clause(clause)?);
    } else {
        return Err(ParseError::InvalidPatternClause(clause.to_string()));
    }

    Ok(())
}

fn parse_ttl_clause(rest: &str) -> Result<TtlFilter, ParseError> {
    let rest = rest.trim_start();
    let op_len = rest
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(rest.len());
    let (symbol, operand) = rest.split_at(op_len);

    let operator = TtlOperator::from_symbol(symbol)
        .ok_or_else(|| ParseError::InvalidTtlOperator(symbol.to_string()))?;

    let operand = operand.trim();
    let millis = operand
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidTtlValue(operand.to_string()))?;

    Ok(TtlFilter { operator, millis })
}

fn parse_pattern_clause(clause: &str) -> Result<MatchPattern, ParseError> {
    let (at, keyword, raw) = if let Some(at) = find_keyword(clause, "like") {
        (at, "like", false)
    } else if let Some(at) = find_keyword(clause, "regex") {
        (at, "regex", true)
    } else {
        return Err(ParseError::InvalidPatternClause(clause.to_string()));
    };

    let quoted = clause[at + keyword.len()..].trim();
    if quoted.is_empty() {
        return Err(ParseError::InvalidPatternClause(clause.to_string()));
    }

    let pattern = unquote(quoted);
    if raw {
        compile_raw_pattern(pattern)
    } else {
        compile_like_pattern(pattern)
    }
}

fn expect_leading(text: &str, accepted: &[&str], expected: &str) -> Result<(), ParseError> {
    let first = text.split_whitespace().next().unwrap_or("");
    if accepted.iter().any(|word| first.eq_ignore_ascii_case(word)) {
        Ok(())
    } else {
        Err(ParseError::UnexpectedStatement {
            expected: expected.to_string(),
            found: first.to_string(),
        })
    }
}

/// Strips one pair of surrounding quotes, or any stray quote characters at
/// either end. Quotes inside the text cannot be escaped.
fn unquote(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text.trim_matches(|c| c == '\'' || c == '"')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets of `word` appearing as a whole word outside quotes.
fn keyword_positions(text: &str, word: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for (i, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None => {
                let starts_word = !prev.is_some_and(is_word_char);
                let matches = text
                    .get(i..i + word.len())
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(word));
                let ends_word = !text[i..]
                    .get(word.len()..)
                    .and_then(|tail| tail.chars().next())
                    .is_some_and(is_word_char);
                if starts_word && matches && ends_word {
                    positions.push(i);
                }
            }
        }
        prev = Some(ch);
    }

    positions
}

fn find_keyword(text: &str, word: &str) -> Option<usize> {
    keyword_positions(text, word).into_iter().next()
}

fn split_keyword<'a>(text: &'a str, word: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in keyword_positions(text, word) {
        if at < start {
            continue;
        }
        parts.push(&text[start..at]);
        start = at + word.len();
    }
    parts.push(&text[start..]);
    parts
}

/// Parser errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    MissingFromClause,
    MissingSourceName,
    MissingSetClause,
    MissingWhereClause,
    InvalidTtlOperator(String),
    InvalidTtlValue(String),
    InvalidPatternClause(String),
    InvalidPattern { pattern: String, message: String },
    InvalidUpdateType(String),
    InvalidAssignment(String),
    UnexpectedStatement { expected: String, found: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingFromClause => write!(f, "Missing 'from' clause"),
            ParseError::MissingSourceName => write!(f, "Missing source name after 'from'"),
            ParseError::MissingSetClause => write!(f, "Missing 'set' clause"),
            ParseError::MissingWhereClause => write!(f, "Missing 'where' clause"),
            ParseError::InvalidTtlOperator(op) => {
                write!(f, "Invalid TTL operator: '{}' (expected >, < or ==)", op)
            }
            ParseError::InvalidTtlValue(v) => write!(f, "Invalid TTL value: '{}'", v),
            ParseError::InvalidPatternClause(c) => write!(f, "Invalid pattern clause: '{}'", c),
            ParseError::InvalidPattern { pattern, message } => {
                write!(f, "Invalid pattern '{}': {}", pattern, message)
            }
            ParseError::InvalidUpdateType(field) => {
                write!(f, "Invalid update field: '{}' (expected value, key or ttl)", field)
            }
            ParseError::InvalidAssignment(a) => write!(f, "Invalid SET assignment: '{}'", a),
            ParseError::UnexpectedStatement { expected, found } => {
                write!(f, "Expected {} statement, found '{}'", expected, found)
            }
        }
    }
}

impl std::error::Error for ParseError {}
