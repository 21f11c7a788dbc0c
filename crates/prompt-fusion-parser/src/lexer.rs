//! Lexical analyzer for prompt text.
//!
//! The lexer converts prompt text into a stream of [`Token`]s. Every
//! character belongs to exactly one token, so tokenizing never fails and the
//! token spans tile the input. Escapes are kept verbatim because the host
//! grammar interprets them itself.
//!
//! The public entry point is [`tokenize`].

use winnow::{
    Parser as _,
    combinator::{alt, preceded},
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, take_while},
};

use crate::{
    span::Span,
    tokens::{PositionedToken, Token},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError>;

/// Characters that end a text run.
const DELIMITERS: [char; 10] = ['\\', '$', '=', ':', ',', '|', '(', ')', '[', ']'];

fn is_text_char(c: char) -> bool {
    !c.is_whitespace() && !DELIMITERS.contains(&c)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a backslash escape: `\` followed by any character
fn escaped<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    ('\\', any)
        .take()
        .map(Token::Escaped)
        .parse_next(input)
}

/// Parse a lone trailing backslash, which is plain text
fn trailing_backslash<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\\'.take().map(Token::Text).parse_next(input)
}

/// Parse a variable reference `$name`
fn variable<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded('$', take_while(1.., is_identifier_char))
        .map(Token::Variable)
        .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '$'.value(Token::Dollar),
        '='.value(Token::Equals),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
        '|'.value(Token::Pipe),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
    ))
    .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .map(Token::Whitespace)
        .parse_next(input)
}

/// Parse a run of plain text
fn text<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_text_char)
        .map(Token::Text)
        .parse_next(input)
}

/// Take a single character of any kind as text
fn fallback<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    any.take().map(Token::Text).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        escaped,            // Must come before trailing_backslash
        trailing_backslash, // Backslash at end of input
        variable,           // Must come before single char '$'
        single_char_token,  // Single character tokens
        newline,            // Must come before whitespace
        whitespace,         // General whitespace
        text,               // Everything else
        fallback,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Split prompt text into positioned tokens.
///
/// The spans of the returned tokens are contiguous and cover the whole input.
pub fn tokenize(input: &str) -> Vec<PositionedToken<'_>> {
    let mut located_input = LocatingSlice::new(input);
    let mut tokens = Vec::new();

    while !located_input.is_empty() {
        match positioned_token(&mut located_input) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                // Skip one character and keep going.
                if located_input.next_token().is_none() {
                    break;
                }
            }
        }
    }

    log::trace!(tokens = tokens.len(); "Tokenized prompt");
    tokens
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input).into_iter().map(|t| t.token).collect()
    }

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
    }

    #[test]
    fn test_single_tokens() {
        test_single_token("hello", Token::Text("hello"));
        test_single_token("1girl", Token::Text("1girl"));
        test_single_token("-2.1", Token::Text("-2.1"));
        test_single_token("{prompt}", Token::Text("{prompt}"));
        test_single_token("$var", Token::Variable("var"));
        test_single_token("$", Token::Dollar);
        test_single_token("=", Token::Equals);
        test_single_token(":", Token::Colon);
        test_single_token(",", Token::Comma);
        test_single_token("|", Token::Pipe);
        test_single_token("(", Token::LeftParen);
        test_single_token(")", Token::RightParen);
        test_single_token("[", Token::LeftBracket);
        test_single_token("]", Token::RightBracket);
        test_single_token(" \t", Token::Whitespace(" \t"));
        test_single_token("\n", Token::Newline);
    }

    #[test]
    fn test_escapes_are_verbatim() {
        assert_eq!(
            kinds(r"portrait \(object\)"),
            vec![
                Token::Text("portrait"),
                Token::Whitespace(" "),
                Token::Escaped(r"\("),
                Token::Text("object"),
                Token::Escaped(r"\)"),
            ]
        );
        assert_eq!(
            kinds(r"\$var"),
            vec![Token::Escaped(r"\$"), Token::Text("var")]
        );
        assert_eq!(
            kinds(r"\\$ x"),
            vec![
                Token::Escaped(r"\\"),
                Token::Dollar,
                Token::Whitespace(" "),
                Token::Text("x"),
            ]
        );
    }

    #[test]
    fn test_trailing_backslash_is_text() {
        assert_eq!(kinds(r"end\"), vec![Token::Text("end"), Token::Text(r"\")]);
    }

    #[test]
    fn test_lone_dollars() {
        assert_eq!(
            kinds("$$ arst"),
            vec![
                Token::Dollar,
                Token::Dollar,
                Token::Whitespace(" "),
                Token::Text("arst"),
            ]
        );
    }

    #[test]
    fn test_macro_definition() {
        assert_eq!(
            kinds("$a($b, c) = x"),
            vec![
                Token::Variable("a"),
                Token::LeftParen,
                Token::Variable("b"),
                Token::Comma,
                Token::Whitespace(" "),
                Token::Text("c"),
                Token::RightParen,
                Token::Whitespace(" "),
                Token::Equals,
                Token::Whitespace(" "),
                Token::Text("x"),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("[a:b]");
        let spans: Vec<_> = tokens.iter().map(|t| t.span.to_range()).collect();
        assert_eq!(spans, vec![0..1, 1..2, 2..3, 3..4, 4..5]);
    }

    fn check_spans_tile_input(input: &str) -> Result<(), TestCaseError> {
        let tokens = tokenize(input);

        let mut cursor = 0;
        let mut rebuilt = String::new();
        for token in &tokens {
            prop_assert_eq!(token.span.start(), cursor);
            prop_assert!(!token.span.is_empty());
            cursor = token.span.end();
            rebuilt.push_str(&token.to_string());
        }
        prop_assert_eq!(cursor, input.len());
        prop_assert_eq!(rebuilt, input);
        Ok(())
    }

    proptest! {
        #[test]
        fn test_spans_tile_input(input in r"[a-z0-9 $\\=:,|()\[\]\n.é]{0,40}") {
            check_spans_tile_input(&input)?;
        }
    }
}
