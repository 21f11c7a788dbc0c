//! Bracket tree produced by the parser and consumed by elaboration.

use prompt_fusion_core::expression::Delimiter;

use crate::{span::Span, tokens::PositionedToken};

/// A node of the bracket tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node<'src> {
    /// Any token that is not a delimiter of a group.
    Leaf(PositionedToken<'src>),
    /// A parenthesized or bracketed group.
    Group(Group<'src>),
}

impl Node<'_> {
    pub fn span(&self) -> Span {
        match self {
            Node::Leaf(token) => token.span,
            Node::Group(group) => group.span(),
        }
    }
}

/// The nodes between two colons of a group.
pub(crate) type Field<'src> = Vec<Node<'src>>;

/// `open field (':' field)* close`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group<'src> {
    pub delimiter: Delimiter,
    pub open: Span,
    pub close: Span,
    /// Always holds at least one (possibly empty) field.
    pub fields: Vec<Field<'src>>,
    /// Spans of the colons between fields.
    pub separators: Vec<Span>,
}

impl Group<'_> {
    pub fn span(&self) -> Span {
        self.open.union(self.close)
    }
}
