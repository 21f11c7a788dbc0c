//! Variable and macro resolution.
//!
//! Resolution is a textual pass over the lexer's tokens that runs before any
//! structural parsing. Definitions (`$name = value` and
//! `$name(p1, p2) = body`) are removed from the output, and every reference
//! is replaced by its fully resolved text, padded with one space on either
//! side so it stays a standalone token. Later whitespace normalization folds
//! the padding away.
//!
//! Scopes form a persistent chain of [`Rc`] frames. A definition pushes a new
//! frame that is visible to everything after it in the same value; the
//! enclosing text never sees definitions made inside a nested value.

use std::{ops::Range, rc::Rc};

use log::{debug, trace};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lexer,
    span::Span,
    tokens::{PositionedToken, Token},
};

/// A parameterized definition.
#[derive(Debug)]
struct Macro {
    params: Vec<String>,
    /// Token range of the unresolved body.
    body: Range<usize>,
    /// Scope the macro was defined in.
    scope: ScopeRef,
    /// Span of `$name(params)` in the source.
    span: Span,
}

#[derive(Debug)]
enum Binding {
    Value(String),
    Macro(Rc<Macro>),
}

#[derive(Debug)]
struct Scope {
    name: String,
    binding: Binding,
    parent: ScopeRef,
}

type ScopeRef = Option<Rc<Scope>>;

fn bind(parent: ScopeRef, name: impl Into<String>, binding: Binding) -> ScopeRef {
    Some(Rc::new(Scope {
        name: name.into(),
        binding,
        parent,
    }))
}

fn lookup<'s>(mut scope: &'s ScopeRef, name: &str) -> Option<&'s Binding> {
    while let Some(frame) = scope {
        if frame.name == name {
            return Some(&frame.binding);
        }
        scope = &frame.parent;
    }
    None
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Token walker that expands definitions and references.
struct Resolver<'a> {
    tokens: &'a [PositionedToken<'a>],
    diagnostics: DiagnosticCollector,
    definitions: usize,
}

impl<'a> Resolver<'a> {
    fn new(tokens: &'a [PositionedToken<'a>]) -> Self {
        Self {
            tokens,
            diagnostics: DiagnosticCollector::new(),
            definitions: 0,
        }
    }

    fn token(&self, index: usize) -> Option<&'a Token<'a>> {
        self.tokens.get(index).map(|t| &t.token)
    }

    /// Span covering the tokens in `range`.
    fn span_of(&self, range: Range<usize>) -> Span {
        let last = range.end.checked_sub(1).and_then(|i| self.tokens.get(i));
        match (self.tokens.get(range.start), last) {
            (Some(first), Some(last)) if range.start < range.end => first.span.union(last.span),
            (Some(first), _) => Span::new(first.span.start()..first.span.start()),
            _ => Span::default(),
        }
    }

    fn skip_whitespace(&self, mut index: usize, end: usize) -> usize {
        while index < end && matches!(self.token(index), Some(Token::Whitespace(_))) {
            index += 1;
        }
        index
    }

    /// Index of the `)` matching the `(` at `open`, if it occurs before `end`.
    fn matching_paren(&self, open: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for index in open..end {
            let token = self.token(index)?;
            if token.is_open() {
                depth += 1;
            } else if token.is_close() {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Index one past the last token of a definition value starting at `start`.
    ///
    /// A value stops at a newline outside any delimiter, at a closer with no
    /// opener inside the value, or at `end`.
    fn value_end(&self, start: usize, end: usize) -> usize {
        let mut depth = 0usize;
        for index in start..end {
            match self.token(index) {
                Some(token) if token.is_open() => depth += 1,
                Some(token) if token.is_close() => {
                    if depth == 0 {
                        return index;
                    }
                    depth -= 1;
                }
                Some(Token::Newline) if depth == 0 => return index,
                _ => {}
            }
        }
        end
    }

    /// Split `range` on commas outside any delimiter.
    ///
    /// A range holding only whitespace has no items.
    fn split_items(&self, range: Range<usize>) -> Vec<Range<usize>> {
        if range.clone().all(|i| self.token(i).is_some_and(Token::is_blank)) {
            return Vec::new();
        }

        let mut items = Vec::new();
        let mut depth = 0usize;
        let mut start = range.start;
        for index in range.clone() {
            match self.token(index) {
                Some(token) if token.is_open() => depth += 1,
                Some(token) if token.is_close() => depth = depth.saturating_sub(1),
                Some(Token::Comma) if depth == 0 => {
                    items.push(start..index);
                    start = index + 1;
                }
                _ => {}
            }
        }
        items.push(start..range.end);
        items
    }

    /// Parameter names of a macro definition, with any leading `$` removed.
    fn params(&self, range: Range<usize>) -> Vec<String> {
        self.split_items(range)
            .into_iter()
            .map(|item| {
                let text: String = self.tokens[item].iter().map(|t| t.to_string()).collect();
                text.trim().trim_start_matches('$').to_string()
            })
            .collect()
    }

    /// Resolve the tokens in `range` against `scope`.
    ///
    /// Newlines outside definitions are written as `newline`.
    fn resolve_range(&mut self, range: Range<usize>, scope: ScopeRef, newline: &str) -> String {
        let tokens = self.tokens;
        let mut scope = scope;
        let mut out = String::new();
        let mut index = range.start;

        while index < range.end {
            let positioned = &tokens[index];
            index = match positioned.token {
                Token::Variable(name) => {
                    self.variable(index, range.end, name, &mut scope, &mut out)
                }
                Token::Newline => {
                    out.push_str(newline);
                    index + 1
                }
                _ => {
                    out.push_str(&positioned.to_string());
                    index + 1
                }
            };
        }

        out
    }

    /// Handle the variable token at `index`, returning the index to continue from.
    fn variable(
        &mut self,
        index: usize,
        end: usize,
        name: &str,
        scope: &mut ScopeRef,
        out: &mut String,
    ) -> usize {
        let after_name = index + 1;

        // An argument or parameter list must follow the name directly.
        let list = match self.token(after_name) {
            Some(Token::LeftParen) if after_name < end => {
                match self.matching_paren(after_name, end) {
                    Some(close) => Some(close),
                    None => {
                        let open_span = self.span_of(after_name..end);
                        self.diagnostics.emit(
                            Diagnostic::error(format!("unterminated list after `${name}`"))
                                .with_code(ErrorCode::E202)
                                .with_label(open_span, "this `(` is never closed")
                                .with_help("add a matching `)`"),
                        );
                        return end;
                    }
                }
            }
            _ => None,
        };
        let after_list = list.map_or(after_name, |close| close + 1);

        let equals = self.skip_whitespace(after_list, end);
        if equals < end && matches!(self.token(equals), Some(Token::Equals)) {
            let params = list.map(|close| self.params(after_name + 1..close));
            let definition_span = self.span_of(index..after_list);
            return self.define(name, params, definition_span, equals + 1, end, scope);
        }

        let reference_span = self.tokens[index].span;
        let Some(binding) = lookup(scope, name) else {
            self.diagnostics.emit(
                Diagnostic::error(format!("undefined variable `${name}`"))
                    .with_code(ErrorCode::E200)
                    .with_label(reference_span, "not defined")
                    .with_help(format!("define it before use: `${name} = ...`")),
            );
            out.push_str(&self.tokens[index].to_string());
            return after_name;
        };

        let macro_def = match binding {
            Binding::Value(value) => {
                trace!(name; "Substituting variable");
                push_padded(out, value);
                return after_name;
            }
            Binding::Macro(macro_def) => Rc::clone(macro_def),
        };

        match list {
            None => {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "macro `${name}` must be called with an argument list"
                    ))
                    .with_code(ErrorCode::E201)
                    .with_label(reference_span, "missing arguments")
                    .with_secondary_label(macro_def.span, "defined here")
                    .with_help(format!("call it as `${name}(...)`")),
                );
                after_name
            }
            Some(close) => {
                let call_span = self.span_of(index..close + 1);
                let args: Vec<String> = self
                    .split_items(after_name + 1..close)
                    .into_iter()
                    .map(|arg| self.resolve_range(arg, scope.clone(), " ").trim().to_string())
                    .collect();

                if args.len() != macro_def.params.len() {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "macro `${name}` takes {} but {} supplied",
                            plural(macro_def.params.len(), "argument"),
                            match args.len() {
                                1 => "1 was".to_string(),
                                n => format!("{n} were"),
                            }
                        ))
                        .with_code(ErrorCode::E201)
                        .with_label(call_span, "wrong number of arguments")
                        .with_secondary_label(macro_def.span, "defined here")
                        .with_help("pass one argument per parameter"),
                    );
                    return close + 1;
                }

                trace!(name, args = args.len(); "Expanding macro");
                let call_scope = macro_def
                    .params
                    .iter()
                    .zip(args)
                    .fold(macro_def.scope.clone(), |parent, (param, arg)| {
                        bind(parent, param.as_str(), Binding::Value(arg))
                    });
                let body = self.resolve_range(macro_def.body.clone(), call_scope, " ");
                push_padded(out, body.trim());
                close + 1
            }
        }
    }

    /// Record a definition whose value starts after the `=` at `value_start - 1`.
    fn define(
        &mut self,
        name: &str,
        params: Option<Vec<String>>,
        span: Span,
        value_start: usize,
        end: usize,
        scope: &mut ScopeRef,
    ) -> usize {
        let value_start = self.skip_whitespace(value_start, end);
        let value_end = self.value_end(value_start, end);
        let next = match self.token(value_end) {
            Some(Token::Newline) if value_end < end => value_end + 1,
            _ => value_end,
        };

        self.definitions += 1;
        let binding = match params {
            None => {
                let value = self.resolve_range(value_start..value_end, scope.clone(), " ");
                trace!(name; "Defined variable");
                Binding::Value(value.trim().to_string())
            }
            Some(params) => {
                trace!(name, params = params.len(); "Defined macro");
                Binding::Macro(Rc::new(Macro {
                    params,
                    body: value_start..value_end,
                    scope: scope.clone(),
                    span,
                }))
            }
        };
        *scope = bind(scope.take(), name, binding);
        next
    }
}

fn push_padded(out: &mut String, text: &str) {
    out.push(' ');
    out.push_str(text);
    out.push(' ');
}

/// Expand every variable definition and reference in `source`.
///
/// Returns the prompt with definitions removed and references replaced by
/// their values. All undefined references are reported together.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per undefined variable,
/// wrong macro argument count, or unterminated argument list. Spans refer
/// to `source`.
pub fn resolve(source: &str) -> Result<String, ParseError> {
    let tokens = lexer::tokenize(source);
    let mut resolver = Resolver::new(&tokens);
    let resolved = resolver.resolve_range(0..tokens.len(), None, "\n");

    debug!(definitions = resolver.definitions; "Resolved variables");
    resolver.diagnostics.finish()?;
    Ok(resolved)
}
