//! Error types for call-site rewriting

use derive_more::Display;
use opfuse_syntax::{Expr, Span};

use crate::shape::Shape;

pub type RewriteResult<T> = Result<T, RewriteError>;

#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display("{kind}")]
pub struct RewriteError {
    kind: Box<RewriteErrorKind>,
}

impl From<RewriteErrorKind> for RewriteError {
    fn from(kind: RewriteErrorKind) -> Self {
        RewriteError {
            kind: Box::new(kind),
        }
    }
}

impl RewriteError {
    pub(crate) fn shape_mismatch(
        shape: Shape,
        tree: &Expr,
        reason: impl std::fmt::Display,
    ) -> Self {
        RewriteErrorKind::ShapeMismatch {
            shape,
            reason: reason.to_string(),
            tree: tree.to_string(),
            span: tree.span,
        }
        .into()
    }

    pub(crate) fn untyped_lift_operand(shape: Shape, operand: &Expr) -> Self {
        RewriteErrorKind::UntypedLiftOperand {
            shape,
            operand: operand.to_string(),
            span: operand.span,
        }
        .into()
    }

    pub fn kind(&self) -> &RewriteErrorKind {
        &self.kind
    }

    /// The shape whose entry point failed.
    pub fn shape(&self) -> Shape {
        match &*self.kind {
            RewriteErrorKind::ShapeMismatch { shape, .. }
            | RewriteErrorKind::UntypedLiftOperand { shape, .. } => *shape,
        }
    }

    /// Source location the failure is attributed to.
    pub fn span(&self) -> Span {
        match &*self.kind {
            RewriteErrorKind::ShapeMismatch { span, .. }
            | RewriteErrorKind::UntypedLiftOperand { span, .. } => *span,
        }
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(&*self.kind, RewriteErrorKind::ShapeMismatch { .. })
    }
}

#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum RewriteErrorKind {
    #[display("cannot extract `{shape}` operands: {reason} (tree = {tree})")]
    ShapeMismatch {
        shape: Shape,
        reason: String,
        tree: String,
        span: Span,
    },

    #[display(
        "`{shape}` needs the static type of operand `{operand}` to pick a lift method; \
         write it as `({operand}: Type)`"
    )]
    UntypedLiftOperand {
        shape: Shape,
        operand: String,
        span: Span,
    },
}

impl std::error::Error for RewriteError {}
