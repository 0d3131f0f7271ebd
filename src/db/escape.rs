//! SQL literal and identifier escaping.

/// Escape a string for use inside a single-quoted SQL literal.
///
/// Standard-conforming strings are assumed, so only the quote is doubled.
/// NUL cannot appear in a PostgreSQL text value and is dropped.
pub fn escape_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\'' => result.push_str("''"),
            '\0' => {}
            c => result.push(c),
        }
    }
    result
}

/// Render a single-quoted SQL literal.
#[inline]
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", escape_literal(s))
}

/// Render a double-quoted SQL identifier.
#[inline]
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
