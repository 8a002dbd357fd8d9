//! Raw (unresolved) parse structures and winnow combinators.
//!
//! This is the "stage 1" parser: text → `Raw*` structs. Positions are
//! recorded as remaining-input lengths, which the builder in the parent
//! module turns into byte spans once the total length is known.

use winnow::ascii::digit1;
use winnow::combinator::{cut_err, opt, preceded, repeat, separated};
use winnow::error::{AddContext, ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{any, one_of, take_till, take_while};

use crate::printer::is_member_char;

// ============================================================================
// Raw structures
// ============================================================================

/// Start and end of a node, as remaining-input lengths.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawSpan {
    pub start_rem: usize,
    pub end_rem: usize,
}

impl RawSpan {
    fn since(start_rem: usize, input: &str) -> Self {
        Self {
            start_rem,
            end_rem: input.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawExpr<'a> {
    pub span: RawSpan,
    pub kind: RawExprKind<'a>,
}

#[derive(Debug, Clone)]
pub(crate) enum RawExprKind<'a> {
    Var(&'a str),
    Int(i64),
    Float(&'a str),
    Str(String),
    Bool(bool),
    Select(Box<RawExpr<'a>>, String),
    Apply(Box<RawExpr<'a>>, Vec<RawExpr<'a>>),
    TypeApply(Box<RawExpr<'a>>, Vec<RawType<'a>>),
    Ascribe(Box<RawExpr<'a>>, RawType<'a>),
}

#[derive(Debug, Clone)]
pub(crate) struct RawType<'a> {
    pub name: &'a str,
    pub args: Vec<RawType<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawItem<'a> {
    pub span: RawSpan,
    pub kind: RawItemKind<'a>,
}

#[derive(Debug, Clone)]
pub(crate) enum RawItemKind<'a> {
    Operators(Vec<RawOperatorEntry>),
    Enrich {
        conversion: &'a str,
        bindings: Vec<RawBinding<'a>>,
    },
    Let(&'a str, RawExpr<'a>),
    Expr(RawExpr<'a>),
}

#[derive(Debug, Clone)]
pub(crate) struct RawOperatorEntry {
    pub spelling: String,
    pub method: String,
    pub span: RawSpan,
}

#[derive(Debug, Clone)]
pub(crate) struct RawBinding<'a> {
    pub shape: &'a str,
    pub shape_span: RawSpan,
    pub methods: Vec<(String, RawSpan)>,
}

// ============================================================================
// Winnow parsers
// ============================================================================

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

/// Skip whitespace and `//` line comments.
pub(crate) fn ws(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_ascii_whitespace())
            .void()
            .parse_next(input)?;
        if input.starts_with("//") {
            take_till(0.., '\n').void().parse_next(input)?;
        } else {
            return Ok(());
        }
    }
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
pub(crate) fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Parse a dotted path: `a.b.c`
pub(crate) fn path<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (ident, repeat(0.., ('.', ident)).map(|()| ()))
        .take()
        .parse_next(input)
}

/// Parse a member name: a bare name such as `plus`, `+`, `unary_-`, or a
/// quoted name such as `"*:"`.
pub(crate) fn member(input: &mut &str) -> ModalResult<String> {
    if input.starts_with('"') {
        return string_lit.parse_next(input);
    }
    take_while(1.., is_member_char)
        .map(|s: &str| s.to_owned())
        .parse_next(input)
}

/// Parse a string literal: "content"
pub(crate) fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}

/// Parse an integer or float literal: `42`, `-1`, `2.5`
fn number<'a>(input: &mut &'a str) -> ModalResult<RawExprKind<'a>> {
    let start = input.checkpoint();
    let text = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)?;
    if text.contains('.') {
        return Ok(RawExprKind::Float(text));
    }
    match text.parse::<i64>() {
        Ok(value) => Ok(RawExprKind::Int(value)),
        Err(_) => {
            // Errors point at the start of the literal.
            input.reset(&start);
            Err(ErrMode::Cut(ContextError::new().add_context(
                &*input,
                &start,
                StrContext::Label("integer literal out of range"),
            )))
        }
    }
}

/// Parse a type: `Int`, `List[Int]`
pub(crate) fn raw_type<'a>(input: &mut &'a str) -> ModalResult<RawType<'a>> {
    let name = ident.context(expected("type name")).parse_next(input)?;
    let args: Option<Vec<RawType<'a>>> =
        opt(preceded(('[', ws), type_list_tail)).parse_next(input)?;
    Ok(RawType {
        name,
        args: args.unwrap_or_default(),
    })
}

/// Parse `T1, T2]` after an opening bracket.
fn type_list_tail<'a>(input: &mut &'a str) -> ModalResult<Vec<RawType<'a>>> {
    let types: Vec<RawType<'a>> =
        separated(1.., (ws, raw_type, ws).map(|(_, t, _)| t), ',').parse_next(input)?;
    cut_err(']').context(expected("`]`")).parse_next(input)?;
    Ok(types)
}

/// Parse a primary expression.
fn raw_primary<'a>(input: &mut &'a str) -> ModalResult<RawExpr<'a>> {
    let start = input.len();
    let kind = match input.chars().next() {
        Some('(') => {
            '('.parse_next(input)?;
            ws.parse_next(input)?;
            let inner = raw_expr.parse_next(input)?;
            ws.parse_next(input)?;
            let ty = opt(preceded((':', ws), raw_type)).parse_next(input)?;
            ws.parse_next(input)?;
            cut_err(')').context(expected("`)`")).parse_next(input)?;
            match ty {
                Some(ty) => RawExprKind::Ascribe(Box::new(inner), ty),
                // Parentheses do not create a node of their own.
                None => return Ok(inner),
            }
        }
        Some('"') => RawExprKind::Str(string_lit.parse_next(input)?),
        Some(c) if c.is_ascii_digit() || c == '-' => number.parse_next(input)?,
        _ => match ident.context(expected("expression")).parse_next(input)? {
            "true" => RawExprKind::Bool(true),
            "false" => RawExprKind::Bool(false),
            name => RawExprKind::Var(name),
        },
    };
    Ok(RawExpr {
        span: RawSpan::since(start, input),
        kind,
    })
}

/// Parse an expression: a primary followed by any number of `.member`,
/// `(args)` and `[types]` suffixes.
pub(crate) fn raw_expr<'a>(input: &mut &'a str) -> ModalResult<RawExpr<'a>> {
    let start = input.len();
    let mut expr = raw_primary.parse_next(input)?;
    loop {
        let checkpoint = *input;
        ws.parse_next(input)?;
        let kind = match input.chars().next() {
            Some('.') => {
                '.'.parse_next(input)?;
                ws.parse_next(input)?;
                let name = cut_err(member)
                    .context(expected("member name"))
                    .parse_next(input)?;
                RawExprKind::Select(Box::new(expr), name)
            }
            Some('(') => {
                '('.parse_next(input)?;
                let args: Vec<RawExpr<'a>> =
                    separated(0.., (ws, raw_expr, ws).map(|(_, e, _)| e), ',')
                        .parse_next(input)?;
                ws.parse_next(input)?;
                cut_err(')').context(expected("`)`")).parse_next(input)?;
                RawExprKind::Apply(Box::new(expr), args)
            }
            Some('[') => {
                '['.parse_next(input)?;
                let types = type_list_tail.parse_next(input)?;
                RawExprKind::TypeApply(Box::new(expr), types)
            }
            _ => {
                *input = checkpoint;
                return Ok(expr);
            }
        };
        expr = RawExpr {
            span: RawSpan::since(start, input),
            kind,
        };
    }
}

/// Parse `shape m1, m2;` inside an enrich block.
fn raw_binding<'a>(input: &mut &'a str) -> ModalResult<RawBinding<'a>> {
    let shape_start = input.len();
    let shape = ident.context(expected("shape name")).parse_next(input)?;
    let shape_span = RawSpan::since(shape_start, input);
    let methods: Vec<(String, RawSpan)> = separated(
        1..,
        (ws, spanned_member, ws).map(|(_, m, _)| m),
        ',',
    )
    .parse_next(input)?;
    cut_err(';').context(expected("`;`")).parse_next(input)?;
    Ok(RawBinding {
        shape,
        shape_span,
        methods,
    })
}

fn spanned_member(input: &mut &str) -> ModalResult<(String, RawSpan)> {
    let start = input.len();
    let name = member.context(expected("method name")).parse_next(input)?;
    Ok((name, RawSpan::since(start, input)))
}

/// Parse the rest of `enrich path { ... }` after the keyword.
fn raw_enrich<'a>(input: &mut &'a str) -> ModalResult<RawItemKind<'a>> {
    ws.parse_next(input)?;
    let conversion = cut_err(path)
        .context(expected("conversion path"))
        .parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('{').context(expected("`{`")).parse_next(input)?;
    let mut bindings = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            break;
        }
        bindings.push(cut_err(raw_binding).parse_next(input)?);
    }
    Ok(RawItemKind::Enrich {
        conversion,
        bindings,
    })
}

/// Parse the rest of `operators { "sym" => name, ... }` after the keyword.
fn raw_operators(input: &mut &str) -> ModalResult<RawItemKind<'static>> {
    ws.parse_next(input)?;
    cut_err('{').context(expected("`{`")).parse_next(input)?;
    let mut entries = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            break;
        }
        let start = input.len();
        let spelling = cut_err(member)
            .context(expected("operator spelling"))
            .parse_next(input)?;
        ws.parse_next(input)?;
        cut_err("=>").context(expected("`=>`")).parse_next(input)?;
        ws.parse_next(input)?;
        let method = cut_err(member)
            .context(expected("method name"))
            .parse_next(input)?;
        let span = RawSpan::since(start, input);
        ws.parse_next(input)?;
        opt(',').parse_next(input)?;
        entries.push(RawOperatorEntry {
            spelling,
            method,
            span,
        });
    }
    Ok(RawItemKind::Operators(entries))
}

/// Whether the text after `enrich`/`operators` continues a declaration.
/// Otherwise the keyword is an ordinary name starting an expression.
fn opens_declaration(input: &str, first: impl Fn(char) -> bool) -> bool {
    let mut rest = input;
    ws(&mut rest).is_ok() && rest.chars().next().is_some_and(first)
}

/// Parse one top-level item.
pub(crate) fn raw_item<'a>(input: &mut &'a str) -> ModalResult<RawItem<'a>> {
    let start = input.len();
    let checkpoint = *input;
    let kind = match opt(ident).parse_next(input)? {
        Some("let") => {
            ws.parse_next(input)?;
            let name = cut_err(ident)
                .context(expected("binding name"))
                .parse_next(input)?;
            ws.parse_next(input)?;
            cut_err('=').context(expected("`=`")).parse_next(input)?;
            ws.parse_next(input)?;
            let value = cut_err(raw_expr).parse_next(input)?;
            ws.parse_next(input)?;
            cut_err(';').context(expected("`;`")).parse_next(input)?;
            RawItemKind::Let(name, value)
        }
        Some("enrich")
            if opens_declaration(*input, |c| c.is_ascii_alphabetic() || "_{".contains(c)) =>
        {
            raw_enrich.parse_next(input)?
        }
        Some("operators") if opens_declaration(*input, |c| c == '{') => {
            raw_operators.parse_next(input)?
        }
        _ => {
            *input = checkpoint;
            let expr = raw_expr.parse_next(input)?;
            ws.parse_next(input)?;
            cut_err(';').context(expected("`;`")).parse_next(input)?;
            RawItemKind::Expr(expr)
        }
    };
    Ok(RawItem {
        span: RawSpan::since(start, input),
        kind,
    })
}

