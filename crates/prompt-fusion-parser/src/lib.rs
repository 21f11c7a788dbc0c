//! # Prompt Fusion Parser
//!
//! Parser for the Prompt Fusion prompt language. This crate provides the
//! pipeline from raw prompt text to the [`Expression`] tree evaluated by the
//! scheduler.
//!
//! ## Usage
//!
//! ```
//! # use prompt_fusion_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "$subject = a red cat\n[$subject:a blue dog:0.5], (masterpiece:1.2)";
//!
//!     let expression = parse(source)?;
//!     assert!(expression.is_time_varying());
//!     Ok(())
//! }
//! ```

mod elaborate;
mod elaborate_utils;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod parser_types;
mod span;
mod tokens;
mod variables;

pub use span::Span;

use log::debug;

use prompt_fusion_core::expression::Expression;

use elaborate::Builder;
use error::ParseError;

/// Expand the variable definitions and references of a prompt.
///
/// Definitions are removed and every reference is replaced by its value,
/// surrounded by single spaces.
///
/// # Errors
///
/// Returns a [`ParseError`] whose spans refer to `source`. All undefined
/// references are reported together.
///
/// # Example
///
/// ```
/// # use prompt_fusion_parser::resolve_variables;
/// let resolved = resolve_variables("$a = cat\nI love $a").unwrap();
/// assert_eq!(resolved, "I love  cat ");
/// ```
pub fn resolve_variables(source: &str) -> Result<String, ParseError> {
    variables::resolve(source)
}

/// Parse prompt text that holds no variables into an expression tree.
///
/// # Errors
///
/// Returns a [`ParseError`] whose spans refer to `resolved` for unbalanced
/// delimiters, invalid numbers, unknown curves and boundary count
/// mismatches.
pub fn parse_expression(resolved: &str) -> Result<Expression, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(resolved);

    // Step 2: Build the bracket tree
    let tree = parser::build_tree(&tokens)?;

    // Step 3: Elaborate
    let expression = Builder::new().build(&tree)?;
    Ok(expression)
}

/// Parse a prompt into an expression tree.
///
/// This is the main entry point. It orchestrates the complete pipeline:
///
/// 1. **Resolve** - Expand variables and macros
/// 2. **Tokenize** - Convert the resolved text to tokens
/// 3. **Parse** - Build the bracket tree
/// 4. **Elaborate** - Classify every group into an [`Expression`]
///
/// Use [`resolve_variables`] and [`parse_expression`] separately when
/// errors must be rendered against the text their spans refer to.
///
/// # Errors
///
/// Returns the first phase's [`ParseError`].
pub fn parse(source: &str) -> Result<Expression, ParseError> {
    let resolved = resolve_variables(source)?;
    debug!(resolved = resolved.as_str(); "Variables resolved");
    parse_expression(&resolved)
}
