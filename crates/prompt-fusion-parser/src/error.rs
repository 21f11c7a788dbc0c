//! Error and diagnostic system for the prompt parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error message with optional error code, multiple source
//! locations, and help text. Multiple diagnostics are wrapped in [`ParseError`]
//! for returning from the parsing lifecycle.
//!
//! # Example
//!
//! ```
//! # use prompt_fusion_parser::error::{Diagnostic, ErrorCode};
//! # use prompt_fusion_parser::Span;
//!
//! let span = Span::new(12..18);
//! let definition = Span::new(0..10);
//!
//! let diag = Diagnostic::error("macro `$a` takes 2 arguments but 1 was supplied")
//!     .with_code(ErrorCode::E201)
//!     .with_label(span, "wrong number of arguments")
//!     .with_secondary_label(definition, "defined here")
//!     .with_help("pass one argument per parameter");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::{ErrorCode, ErrorKind};
pub use label::Label;
pub use parse_error::ParseError;
