//! Error codes for the prompt diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Expression parser errors
//! - `E2xx` - Variable resolution errors

use std::fmt;

/// The two failure classes callers distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A `$name` reference with no preceding definition.
    UndefinedVariable,
    /// Unbalanced delimiters or a construct that cannot be interpreted.
    MalformedExpression,
}

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unclosed delimiter.
    ///
    /// A `(` or `[` was opened but the prompt ended before it was closed.
    E100,

    /// Unmatched closing delimiter.
    ///
    /// A `)` or `]` has no opener, or closes an opener of the other kind.
    E101,

    /// Invalid number.
    ///
    /// A weight or step field looks numeric but is not a finite number.
    E102,

    /// Unknown curve.
    ///
    /// The field after a boundary list names a curve that does not exist.
    /// Valid curves are `linear`, `bezier`, `catmull` and `mean`.
    E103,

    /// Boundary count mismatch.
    ///
    /// A boundary list has a different number of entries than there are
    /// keyframes.
    E104,

    // =========================================================================
    // Variable Resolution Errors (E2xx)
    // =========================================================================
    /// Undefined variable.
    ///
    /// A variable was referenced before any definition of it.
    E200,

    /// Wrong number of macro arguments.
    ///
    /// A macro was called with a different number of arguments than it has
    /// parameters, or without an argument list.
    E201,

    /// Unterminated argument list.
    ///
    /// A macro call or definition opened `(` and never closed it.
    E202,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Variable resolution errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Parser errors
            ErrorCode::E100 => "unclosed delimiter",
            ErrorCode::E101 => "unmatched closing delimiter",
            ErrorCode::E102 => "invalid number",
            ErrorCode::E103 => "unknown curve",
            ErrorCode::E104 => "boundary count mismatch",
            // Variable resolution errors
            ErrorCode::E200 => "undefined variable",
            ErrorCode::E201 => "wrong number of arguments",
            ErrorCode::E202 => "unterminated argument list",
        }
    }

    /// Returns the failure class of this code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::E200 => ErrorKind::UndefinedVariable,
            _ => ErrorKind::MalformedExpression,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E100.description(), "unclosed delimiter");
        assert_eq!(ErrorCode::E103.description(), "unknown curve");
        assert_eq!(ErrorCode::E200.description(), "undefined variable");
    }

    #[test]
    fn test_error_code_kind() {
        assert_eq!(ErrorCode::E200.kind(), ErrorKind::UndefinedVariable);
        assert_eq!(ErrorCode::E101.kind(), ErrorKind::MalformedExpression);
        assert_eq!(ErrorCode::E202.kind(), ErrorKind::MalformedExpression);
    }
}
