//! Surface syntax parser.
//!
//! # Two-stage parsing
//!
//! 1. **Raw parse**: winnow combinators parse text into `Raw*` structures
//!    (borrowed strings, positions as remaining-input lengths).
//! 2. **Tree build**: `Raw*` structures become [`Expr`] / [`Program`] nodes
//!    with byte spans and fresh [`NodeId`]s.
//!
//! [`NodeId`]: crate::NodeId

mod raw;

use derive_more::{Display, Error};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;

use crate::expr::{
    EnrichDecl, Expr, ExprKind, Item, ItemKind, Literal, OperatorEntry, Program, ShapeBinding,
    TypeRef,
};
use crate::location::Span;
use crate::node_id::NodeIdGen;
use raw::{
    RawBinding, RawExpr, RawExprKind, RawItem, RawItemKind, RawSpan, RawType, raw_expr, raw_item,
    ws,
};

/// Parse error for the surface syntax.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("parse error at offset {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

// ============================================================================
// Tree builder
// ============================================================================

struct TreeBuilder {
    total_len: usize,
    ids: NodeIdGen,
}

impl TreeBuilder {
    fn new(source: &str) -> Self {
        Self {
            total_len: source.len(),
            ids: NodeIdGen::new(),
        }
    }

    fn span(&self, raw: RawSpan) -> Span {
        Span::new(self.total_len - raw.start_rem, self.total_len - raw.end_rem)
    }

    fn build_type(&self, raw: &RawType<'_>) -> TypeRef {
        TypeRef {
            name: raw.name.to_owned(),
            args: raw.args.iter().map(|arg| self.build_type(arg)).collect(),
        }
    }

    fn build_expr(&mut self, raw: RawExpr<'_>) -> Expr {
        let span = self.span(raw.span);
        let kind = match raw.kind {
            RawExprKind::Var(name) => ExprKind::Var(name.to_owned()),
            RawExprKind::Int(value) => ExprKind::Lit(Literal::Int(value)),
            RawExprKind::Float(text) => ExprKind::Lit(Literal::Float(text.to_owned())),
            RawExprKind::Str(text) => ExprKind::Lit(Literal::Str(text)),
            RawExprKind::Bool(value) => ExprKind::Lit(Literal::Bool(value)),
            RawExprKind::Select(receiver, member) => ExprKind::Select {
                receiver: self.build_expr(*receiver),
                member,
            },
            RawExprKind::Apply(callee, args) => ExprKind::Apply {
                callee: self.build_expr(*callee),
                args: args.into_iter().map(|arg| self.build_expr(arg)).collect(),
            },
            RawExprKind::TypeApply(callee, types) => ExprKind::TypeApply {
                callee: self.build_expr(*callee),
                types: types.iter().map(|ty| self.build_type(ty)).collect(),
            },
            RawExprKind::Ascribe(expr, ty) => ExprKind::Ascribe {
                expr: self.build_expr(*expr),
                ty: self.build_type(&ty),
            },
        };
        // Children are numbered before their parent.
        Expr::new(self.ids.fresh(), span, kind)
    }

    fn build_binding(&self, raw: RawBinding<'_>) -> ShapeBinding {
        ShapeBinding {
            shape: raw.shape.to_owned(),
            shape_span: self.span(raw.shape_span),
            methods: raw
                .methods
                .into_iter()
                .map(|(name, span)| (name, self.span(span)))
                .collect(),
        }
    }

    fn build_item(&mut self, raw: RawItem<'_>) -> Item {
        let span = self.span(raw.span);
        let kind = match raw.kind {
            RawItemKind::Operators(entries) => ItemKind::Operators(
                entries
                    .into_iter()
                    .map(|entry| OperatorEntry {
                        spelling: entry.spelling,
                        method: entry.method,
                        span: self.span(entry.span),
                    })
                    .collect(),
            ),
            RawItemKind::Enrich {
                conversion,
                bindings,
            } => ItemKind::Enrich(EnrichDecl {
                conversion: conversion.to_owned(),
                bindings: bindings
                    .into_iter()
                    .map(|binding| self.build_binding(binding))
                    .collect(),
            }),
            RawItemKind::Let(name, value) => ItemKind::Let {
                name: name.to_owned(),
                value: self.build_expr(value),
            },
            RawItemKind::Expr(expr) => ItemKind::Expr(self.build_expr(expr)),
        };
        Item { span, kind }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Render a winnow error as a plain message such as "expected `)`".
fn describe(err: &ErrMode<ContextError>) -> String {
    let (ErrMode::Backtrack(err) | ErrMode::Cut(err)) = err else {
        return "unexpected end of input".to_string();
    };
    let mut labels = Vec::new();
    let mut expected = Vec::new();
    for context in err.context() {
        match context {
            StrContext::Label(label) => labels.push(label.to_string()),
            StrContext::Expected(value) => expected.push(value.to_string()),
            _ => {}
        }
    }
    if !expected.is_empty() {
        labels.push(format!("expected {}", expected.join(" or ")));
    }
    if labels.is_empty() {
        "invalid syntax".to_string()
    } else {
        labels.join(": ")
    }
}

fn error_at(input: &str, remaining: &str, message: String) -> ParseError {
    ParseError {
        message,
        offset: input.len() - remaining.len(),
    }
}

/// Parse a whole source file.
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    let mut remaining = input;
    let mut raw_items = Vec::new();
    loop {
        ws.parse_next(&mut remaining)
            .map_err(|e| error_at(input, remaining, format!("lexer error: {}", describe(&e))))?;
        if remaining.is_empty() {
            break;
        }
        let item = raw_item
            .parse_next(&mut remaining)
            .map_err(|e| error_at(input, remaining, describe(&e)))?;
        raw_items.push(item);
    }

    let mut builder = TreeBuilder::new(input);
    let items = raw_items
        .into_iter()
        .map(|item| builder.build_item(item))
        .collect();
    Ok(Program { items })
}

/// Parse a single expression, rejecting trailing input.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut remaining = input;
    ws.parse_next(&mut remaining)
        .map_err(|e| error_at(input, remaining, format!("lexer error: {}", describe(&e))))?;
    let expr = raw_expr
        .parse_next(&mut remaining)
        .map_err(|e| error_at(input, remaining, describe(&e)))?;
    ws.parse_next(&mut remaining)
        .map_err(|e| error_at(input, remaining, format!("lexer error: {}", describe(&e))))?;
    if !remaining.is_empty() {
        return Err(error_at(
            input,
            remaining,
            "trailing input after expression".to_string(),
        ));
    }
    Ok(TreeBuilder::new(input).build_expr(expr))
}

/// Parse an expression for tests, panicking with context on failure.
pub fn parse_test_expr(input: &str) -> Expr {
    parse_expr(input).unwrap_or_else(|e| {
        panic!(
            "Failed to parse test expression at offset {}:\n  {}\n\nInput:\n{}",
            e.offset, e.message, input
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
