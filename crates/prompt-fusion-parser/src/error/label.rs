//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in prompt text.
///
/// A diagnostic has one primary label marking where the problem is, and
/// may carry secondary labels pointing at related text, such as the
/// definition of a macro that was called with the wrong arguments.
///
/// ```text
/// error[E201]: macro `$a` takes 2 arguments but 1 was supplied
///   |
/// 1 | $a($b, $c) = $b and $c
///   | ---------- defined here
/// 2 | $a(cat)
///   | ^^^^^^^ wrong number of arguments
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
