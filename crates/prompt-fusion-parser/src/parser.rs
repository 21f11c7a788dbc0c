//! Parser for prompt tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the bracket tree defined in [`parser_types`](super::parser_types). Groups
//! are split into fields at their colons; outside of any group a colon is
//! ordinary text. The public entry point is [`build_tree`].

use winnow::{
    Parser as _,
    combinator::{alt, repeat},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use prompt_fusion_core::expression::Delimiter;

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types::{Field, Group, Node},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// The input ended inside a group
    Unclosed { delimiter: Delimiter, open: Span },
    /// A group was closed with the other kind of delimiter
    Mismatched {
        delimiter: Delimiter,
        open: Span,
        found: Span,
    },
}

type Input<'src> = PromptTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type PromptTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

fn cut_error<'src>(input: &Input<'src>, context: Context) -> ErrMode<ContextError<Context>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), context))
}

fn delimiter_of(token: &Token<'_>) -> Option<Delimiter> {
    match token {
        Token::LeftParen | Token::RightParen => Some(Delimiter::Paren),
        Token::LeftBracket | Token::RightBracket => Some(Delimiter::Bracket),
        _ => None,
    }
}

/// Parse any token that does not open or close a group
fn leaf<'src>(input: &mut Input<'src>) -> IResult<Node<'src>> {
    any.verify(|token: &PositionedToken<'_>| !token.is_open() && !token.is_close())
        .map(|token: &PositionedToken<'src>| Node::Leaf(token.clone()))
        .parse_next(input)
}

/// Parse a leaf inside a group, where colons separate fields
fn field_leaf<'src>(input: &mut Input<'src>) -> IResult<Node<'src>> {
    any.verify(|token: &PositionedToken<'_>| {
        !token.is_open() && !token.is_close() && !matches!(token.token, Token::Colon)
    })
    .map(|token: &PositionedToken<'src>| Node::Leaf(token.clone()))
    .parse_next(input)
}

/// Parse a field separator
fn colon<'src>(input: &mut Input<'src>) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Colon => Some(token.span),
        _ => None,
    })
    .parse_next(input)
}

/// Parse the nodes of one field
fn field<'src>(input: &mut Input<'src>) -> IResult<Field<'src>> {
    repeat(0.., alt((group, field_leaf))).parse_next(input)
}

/// Parse a group, committing once its opener is consumed
fn group<'src>(input: &mut Input<'src>) -> IResult<Node<'src>> {
    let (delimiter, open) = any
        .verify_map(|token: &PositionedToken<'_>| {
            delimiter_of(&token.token)
                .filter(|_| token.is_open())
                .map(|delimiter| (delimiter, token.span))
        })
        .parse_next(input)?;

    let first = field.parse_next(input)?;
    let rest: Vec<(Span, Field<'src>)> = repeat(0.., (colon, field)).parse_next(input)?;

    let close = match input.peek_token() {
        None => return Err(cut_error(input, Context::Unclosed { delimiter, open })),
        Some(token) if delimiter_of(&token.token) == Some(delimiter) => token.span,
        Some(token) => {
            let found = token.span;
            return Err(cut_error(
                input,
                Context::Mismatched {
                    delimiter,
                    open,
                    found,
                },
            ));
        }
    };
    input.next_token();

    let (separators, others): (Vec<Span>, Vec<Field<'src>>) = rest.into_iter().unzip();
    let mut fields = Vec::with_capacity(others.len() + 1);
    fields.push(first);
    fields.extend(others);

    Ok(Node::Group(Group {
        delimiter,
        open,
        close,
        fields,
        separators,
    }))
}

/// Parse top-level nodes
fn nodes<'src>(input: &mut Input<'src>) -> IResult<Vec<Node<'src>>> {
    repeat(0.., alt((group, leaf))).parse_next(input)
}

/// Convert a winnow error into a diagnostic.
///
/// `end` is the byte offset of the end of the input.
fn convert_error(error: ErrMode<ContextError<Context>>, end: usize) -> Diagnostic {
    let context = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next().cloned(),
        ErrMode::Incomplete(_) => None,
    };

    match context {
        Some(Context::Unclosed { delimiter, open }) => {
            Diagnostic::error(format!("unclosed `{}`", delimiter.open()))
                .with_code(ErrorCode::E100)
                .with_label(
                    Span::new(open.start()..end),
                    format!("this `{}` is never closed", delimiter.open()),
                )
                .with_help(format!("add a matching `{}`", delimiter.close()))
        }
        Some(Context::Mismatched {
            delimiter,
            open,
            found,
        }) => Diagnostic::error(format!(
            "mismatched closing delimiter, expected `{}`",
            delimiter.close()
        ))
        .with_code(ErrorCode::E101)
        .with_label(found, format!("expected `{}`", delimiter.close()))
        .with_secondary_label(open, format!("`{}` opened here", delimiter.open()))
        .with_help("close groups in the reverse order they were opened"),
        None => Diagnostic::error("unexpected end of input")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(end..end), "incomplete"),
    }
}

fn unmatched_closer(token: &PositionedToken<'_>) -> Diagnostic {
    Diagnostic::error(format!("unmatched closing delimiter `{}`", token.token))
        .with_code(ErrorCode::E101)
        .with_label(token.span, "no matching opener")
        .with_help(format!("remove it or escape it as `\\{}`", token.token))
}

/// Build the bracket tree of a resolved prompt.
pub(crate) fn build_tree<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<Vec<Node<'src>>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);
    let end = tokens.last().map_or(0, |token| token.span.end());

    match nodes.parse_next(&mut token_slice) {
        Ok(tree) => match token_slice.peek_token() {
            None => Ok(tree),
            Some(token) => Err(unmatched_closer(token)),
        },
        Err(e) => Err(convert_error(e, end)),
    }
}
