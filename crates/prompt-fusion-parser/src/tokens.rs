use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the prompt language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    // Text
    Text(&'src str),
    Escaped(&'src str),  // \x, kept with its backslash
    Variable(&'src str), // $name, name only

    // Operators
    Dollar, // $
    Equals, // =
    Colon,  // :
    Comma,  // ,
    Pipe,   // |

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Whitespace
    Whitespace(&'src str),
    Newline,
}

impl Token<'_> {
    /// Returns `true` for `(` and `[`.
    pub fn is_open(&self) -> bool {
        matches!(self, Token::LeftParen | Token::LeftBracket)
    }

    /// Returns `true` for `)` and `]`.
    pub fn is_close(&self) -> bool {
        matches!(self, Token::RightParen | Token::RightBracket)
    }

    /// Returns `true` for whitespace and newlines.
    pub fn is_blank(&self) -> bool {
        matches!(self, Token::Whitespace(_) | Token::Newline)
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> fmt::Display for PositionedToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl<'src> Location for PositionedToken<'src> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

/// Writes the token exactly as it appeared in the source.
impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => write!(f, "{text}"),
            Token::Escaped(text) => write!(f, "{text}"),
            Token::Variable(name) => write!(f, "${name}"),

            Token::Dollar => write!(f, "$"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),

            Token::Whitespace(text) => write!(f, "{text}"),
            Token::Newline => writeln!(f),
        }
    }
}
