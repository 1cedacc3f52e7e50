/// Pattern compiler
///
/// Turns SQL `LIKE` wildcards into anchored regular expressions and wraps
/// raw `regex` clauses. Both end up as a [`MatchPattern`].
use super::parser::ParseError;
use regex::Regex;
use std::fmt;

/// A compiled key or value matcher.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    source: String,
    raw: bool,
    regex: Regex,
}

impl MatchPattern {
    /// Tests `input` against the pattern.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// The text the pattern was written as, before translation.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The regular expression actually matched against.
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern came from a `regex` clause.
    pub fn is_raw(&self) -> bool {
        self.raw
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.regex.as_str() == other.regex.as_str()
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw {
            write!(f, "REGEX '{}'", self.source)
        } else {
            write!(f, "LIKE '{}'", self.source)
        }
    }
}

/// Translates a `LIKE` pattern into a whole-string regular expression.
///
/// Every regex metacharacter is escaped first, then `%` becomes `.*` and
/// `_` becomes `.`. Neither wildcard is a regex metacharacter, so escaping
/// leaves them untouched and no user text can turn into a wildcard.
pub fn like_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern);
    let mut out = String::with_capacity(escaped.len() + 2);
    out.push('^');
    for ch in escaped.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push(other),
        }
    }
    out.push('$');
    out
}

/// Compiles a `LIKE` pattern.
///
/// The empty pattern matches only the empty string.
pub fn compile_like_pattern(pattern: &str) -> Result<MatchPattern, ParseError> {
    // `(?s)` lets `%` and `_` cover newlines inside multi-line values.
    let expr = format!("(?s){}", like_to_regex(pattern));
    let regex = Regex::new(&expr).map_err(|e| ParseError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(MatchPattern {
        source: pattern.to_string(),
        raw: false,
        regex,
    })
}

/// Compiles a raw regular expression verbatim.
///
/// Raw patterns are not anchored; a pattern that should match the whole
/// string must say so itself.
pub fn compile_raw_pattern(pattern: &str) -> Result<MatchPattern, ParseError> {
    let regex = Regex::new(pattern).map_err(|e| ParseError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(MatchPattern {
        source: pattern.to_string(),
        raw: true,
        regex,
    })
}
