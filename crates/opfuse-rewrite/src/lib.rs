//! Call-site fusion for implicit enrichment.
//!
//! An enrichment call wraps a value in a conversion and calls a method on
//! the wrapper, which forwards to a type-class evidence value:
//!
//! ```text
//! ops(a)(ev).+(b)    ==>    ev.plus(a, b)
//! ```
//!
//! This crate recognizes such call trees by [`Shape`] and rebuilds them as
//! direct evidence calls, removing the wrapper.

pub mod engine;
pub mod entry;
pub mod error;
pub mod matcher;
pub mod operators;
pub mod shape;

pub use engine::rewrite;
pub use entry::{
    EntryPoint, binop, binop_with_ev, binop_with_lift, binop_with_self_lift, rbinop,
    rbinop_with_ev, unop, unop_with_ev, unop0,
};
pub use error::{RewriteError, RewriteErrorKind, RewriteResult};
pub use matcher::{CallHead, Extraction, call_head, match_shape};
pub use operators::{DefaultOperators, IdentityOperators, OperatorNames, OperatorTable};
pub use shape::{EvidencePosition, LiftSource, Shape};
