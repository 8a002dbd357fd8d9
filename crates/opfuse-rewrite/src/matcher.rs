//! Shape matchers.
//!
//! Each matcher recognizes exactly one call-tree topology and pulls the
//! receiver, evidence and operands out of it. Matchers never guess: the
//! caller says which shape it expects, and anything else is a
//! [`ShapeMismatch`](crate::RewriteErrorKind::ShapeMismatch).
//!
//! All trees share the same skeleton, read from the outside in:
//!
//! ```text
//! <method args>* ( <prefix> . m )
//! prefix = conv(subject)(ev)   evidence on the conversion
//!        | conv(subject)       evidence trailing
//! ```

use opfuse_syntax::Expr;
use tracing::trace;

use crate::error::{RewriteError, RewriteResult};
use crate::shape::Shape;

/// Sub-expressions extracted from a call tree.
///
/// Operands are always in natural order: `receiver` is the left-hand side
/// even when the tree wrote it as the method argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extraction<'a> {
    pub receiver: &'a Expr,
    pub evidence: &'a Expr,
    pub operand: Option<&'a Expr>,
    pub lift_evidence: Option<&'a Expr>,
    pub method_name: &'a str,
    /// The conversion reference, including type arguments.
    pub conversion: &'a Expr,
}

/// Run the matcher for `shape` against `tree`.
pub fn match_shape(shape: Shape, tree: &Expr) -> RewriteResult<Extraction<'_>> {
    trace!(%shape, id = %tree.id, "matching call tree");
    match shape {
        Shape::Unop => match_unop(tree),
        Shape::Unop0 => match_unop0(tree),
        Shape::UnopWithEv => match_unop_with_ev(tree),
        Shape::Binop => match_binop(tree),
        Shape::Rbinop => match_rbinop(tree),
        Shape::BinopWithEv => match_binop_with_ev(tree),
        Shape::RbinopWithEv => match_rbinop_with_ev(tree),
        Shape::BinopWithLift => match_binop_with_lift(tree),
        Shape::BinopWithSelfLift => match_binop_with_self_lift(tree),
    }
}

/// `conv(lhs)(ev).m()`
fn match_unop(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::Unop, tree);
    let (selected, _) = cx.apply(tree, 0)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence,
        operand: None,
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(lhs)(ev).m`
fn match_unop0(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::Unop0, tree);
    let (prefix, method_name) = cx.member(tree)?;
    let (conversion, receiver, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence,
        operand: None,
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(lhs).m(ev)`
fn match_unop_with_ev(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::UnopWithEv, tree);
    let (selected, args) = cx.apply(tree, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver) = cx.without_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence: &args[0],
        operand: None,
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(lhs)(ev).m(rhs)`
fn match_binop(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::Binop, tree);
    let (selected, args) = cx.apply(tree, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence,
        operand: Some(&args[0]),
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(rhs)(ev).m(lhs)`
fn match_rbinop(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::Rbinop, tree);
    let (selected, args) = cx.apply(tree, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, rhs, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver: &args[0],
        evidence,
        operand: Some(rhs),
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(lhs).m(rhs)(ev)`
fn match_binop_with_ev(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::BinopWithEv, tree);
    let (partial, ev_args) = cx.apply(tree, 1)?;
    let (selected, args) = cx.apply(partial, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver) = cx.without_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence: &ev_args[0],
        operand: Some(&args[0]),
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(rhs).m(lhs)(ev)`
fn match_rbinop_with_ev(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::RbinopWithEv, tree);
    let (partial, ev_args) = cx.apply(tree, 1)?;
    let (selected, args) = cx.apply(partial, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, rhs) = cx.without_evidence(prefix)?;
    Ok(Extraction {
        receiver: &args[0],
        evidence: &ev_args[0],
        operand: Some(rhs),
        lift_evidence: None,
        method_name,
        conversion,
    })
}

/// `conv(lhs)(ev0).m(rhs)(ev1)`
fn match_binop_with_lift(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::BinopWithLift, tree);
    let (partial, lift_args) = cx.apply(tree, 1)?;
    let (selected, args) = cx.apply(partial, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence,
        operand: Some(&args[0]),
        lift_evidence: Some(&lift_args[0]),
        method_name,
        conversion,
    })
}

/// `conv(lhs)(ev).m(rhs)`, with `ev` doubling as the lift evidence.
fn match_binop_with_self_lift(tree: &Expr) -> RewriteResult<Extraction<'_>> {
    let cx = Cursor::new(Shape::BinopWithSelfLift, tree);
    let (selected, args) = cx.apply(tree, 1)?;
    let (prefix, method_name) = cx.member(selected)?;
    let (conversion, receiver, evidence) = cx.with_evidence(prefix)?;
    Ok(Extraction {
        receiver,
        evidence,
        operand: Some(&args[0]),
        lift_evidence: Some(evidence),
        method_name,
        conversion,
    })
}

/// Decomposition helpers that report failures against the whole site.
struct Cursor<'a> {
    shape: Shape,
    site: &'a Expr,
}

impl<'a> Cursor<'a> {
    fn new(shape: Shape, site: &'a Expr) -> Self {
        Self { shape, site }
    }

    fn fail(&self, reason: impl std::fmt::Display) -> RewriteError {
        trace!(shape = %self.shape, %reason, "shape mismatch");
        RewriteError::shape_mismatch(self.shape, self.site, reason)
    }

    /// `callee(args)` with exactly `arity` arguments.
    fn apply(&self, node: &'a Expr, arity: usize) -> RewriteResult<(&'a Expr, &'a [Expr])> {
        let (callee, args) = node.as_apply().ok_or_else(|| {
            self.fail(format_args!(
                "expected an argument list, found {} `{node}`",
                node.kind_name()
            ))
        })?;
        if args.len() != arity {
            return Err(self.fail(format_args!(
                "expected {arity} argument(s) in `{node}`, found {}",
                args.len()
            )));
        }
        Ok((callee, args))
    }

    /// `prefix.m`
    fn member(&self, node: &'a Expr) -> RewriteResult<(&'a Expr, &'a str)> {
        node.as_select().ok_or_else(|| {
            self.fail(format_args!(
                "expected a method selection, found {} `{node}`",
                node.kind_name()
            ))
        })
    }

    /// `conv(subject)(ev)`
    fn with_evidence(&self, prefix: &'a Expr) -> RewriteResult<(&'a Expr, &'a Expr, &'a Expr)> {
        let (wrapped, ev_args) = prefix
            .as_apply()
            .ok_or_else(|| self.fail(format_args!("`{prefix}` is missing its evidence argument")))?;
        if ev_args.len() != 1 {
            return Err(self.fail(format_args!(
                "expected a single evidence argument in `{prefix}`, found {}",
                ev_args.len()
            )));
        }
        let (conversion, subject) = self.without_evidence(wrapped)?;
        Ok((conversion, subject, &ev_args[0]))
    }

    /// `conv(subject)`
    fn without_evidence(&self, prefix: &'a Expr) -> RewriteResult<(&'a Expr, &'a Expr)> {
        let (conversion, args) = self.apply(prefix, 1)?;
        if !conversion.is_path() {
            return Err(self.fail(format_args!(
                "conversion head `{conversion}` is not a path"
            )));
        }
        Ok((conversion, &args[0]))
    }
}

// =============================================================================
// Call-site discovery
// =============================================================================

/// The outline of a possible enrichment call, before any shape is chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallHead<'a> {
    /// Dotted path of the conversion, without type arguments.
    pub conversion: String,
    pub method: &'a str,
    /// Argument lists applied after the method selection.
    pub applied: usize,
    /// Every argument along the call chain, subject and evidence included.
    pub arguments: Vec<&'a Expr>,
}

/// Find the conversion and method a call chain is rooted in.
///
/// Recognizes `conv(x)...(...).m(...)...` with up to two argument lists on
/// the conversion. Returns `None` for anything that is not headed by a
/// path applied to arguments.
pub fn call_head(tree: &Expr) -> Option<CallHead<'_>> {
    let mut arguments = Vec::new();
    let mut node = tree;
    let mut applied = 0;
    while let Some((callee, args)) = node.as_apply() {
        arguments.extend(args);
        applied += 1;
        node = callee;
    }
    let (prefix, method) = node.as_select()?;

    let mut head = prefix;
    let mut conversion_lists = 0;
    while let Some((callee, args)) = head.as_apply() {
        arguments.extend(args);
        conversion_lists += 1;
        head = callee;
    }
    if !(1..=2).contains(&conversion_lists) || !head.is_path() {
        return None;
    }
    Some(CallHead {
        conversion: head.path_name()?,
        method,
        applied,
        arguments,
    })
}
