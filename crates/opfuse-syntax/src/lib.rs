//! Expression trees and surface syntax for opfuse.
//!
//! The rewrite engine only ever inspects and builds [`Expr`] values; the
//! parser and printer exist so programs can be read from and written back
//! to text.

pub mod expr;
pub mod location;
pub mod node_id;
pub mod parser;
pub mod printer;

pub use expr::{
    EnrichDecl, Expr, ExprKind, Item, ItemKind, Literal, OperatorEntry, Program, ShapeBinding,
    TypeRef,
};
pub use location::Span;
pub use node_id::{NodeId, NodeIdGen};
pub use parser::{ParseError, parse_expr, parse_program, parse_test_expr};
pub use printer::print_program;
