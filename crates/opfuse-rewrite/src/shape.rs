//! The closed set of recognized call shapes.
//!
//! A shape fixes the topology of an enrichment call: how many operands the
//! method takes, where the evidence argument sits, whether the operands are
//! written in reverse, and whether the right operand is lifted through an
//! evidence conversion. Adding a shape means adding a variant here, a
//! matcher and an entry point.

use serde::Serialize;

/// Where the evidence argument appears in the call tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidencePosition {
    /// Applied to the conversion: `conv(lhs)(ev).m(...)`
    Conversion,
    /// Last argument list of the method: `conv(lhs).m(...)(ev)` or
    /// `conv(lhs).m(ev)`
    Trailing,
}

/// Which evidence value supplies the lift conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftSource {
    /// A second evidence argument after the operand.
    Separate,
    /// The same evidence the method is taken from.
    SameEvidence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, salsa::Update)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// `conv(lhs)(ev).m()`
    Unop,
    /// `conv(lhs)(ev).m`
    Unop0,
    /// `conv(lhs).m(ev)`
    UnopWithEv,
    /// `conv(lhs)(ev).m(rhs)`
    Binop,
    /// `conv(rhs)(ev).m(lhs)`
    Rbinop,
    /// `conv(lhs).m(rhs)(ev)`
    BinopWithEv,
    /// `conv(rhs).m(lhs)(ev)`
    RbinopWithEv,
    /// `conv(lhs)(ev0).m(rhs)(ev1)`
    BinopWithLift,
    /// `conv(lhs)(ev).m(rhs)`, lifting `rhs` through `ev`
    BinopWithSelfLift,
}

impl Shape {
    pub const ALL: [Shape; 9] = [
        Shape::Unop,
        Shape::Unop0,
        Shape::UnopWithEv,
        Shape::Binop,
        Shape::Rbinop,
        Shape::BinopWithEv,
        Shape::RbinopWithEv,
        Shape::BinopWithLift,
        Shape::BinopWithSelfLift,
    ];

    /// The keyword used for this shape in `enrich` declarations.
    pub const fn keyword(self) -> &'static str {
        match self {
            Shape::Unop => "unop",
            Shape::Unop0 => "unop0",
            Shape::UnopWithEv => "unop_with_ev",
            Shape::Binop => "binop",
            Shape::Rbinop => "rbinop",
            Shape::BinopWithEv => "binop_with_ev",
            Shape::RbinopWithEv => "rbinop_with_ev",
            Shape::BinopWithLift => "binop_with_lift",
            Shape::BinopWithSelfLift => "binop_with_self_lift",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Shape> {
        Shape::ALL.into_iter().find(|shape| shape.keyword() == keyword)
    }

    /// Number of logical operands passed to the evidence method.
    pub const fn arity(self) -> usize {
        match self {
            Shape::Unop | Shape::Unop0 | Shape::UnopWithEv => 1,
            _ => 2,
        }
    }

    pub const fn evidence_position(self) -> EvidencePosition {
        match self {
            Shape::UnopWithEv | Shape::BinopWithEv | Shape::RbinopWithEv => {
                EvidencePosition::Trailing
            }
            _ => EvidencePosition::Conversion,
        }
    }

    /// Whether the call site writes the operands right-to-left.
    pub const fn is_reversed(self) -> bool {
        matches!(self, Shape::Rbinop | Shape::RbinopWithEv)
    }

    pub const fn lift(self) -> Option<LiftSource> {
        match self {
            Shape::BinopWithLift => Some(LiftSource::Separate),
            Shape::BinopWithSelfLift => Some(LiftSource::SameEvidence),
            _ => None,
        }
    }

    /// Argument lists applied after the method selection.
    pub const fn method_arg_lists(self) -> usize {
        match self {
            Shape::Unop0 => 0,
            Shape::Unop | Shape::UnopWithEv | Shape::Binop | Shape::Rbinop => 1,
            Shape::BinopWithSelfLift => 1,
            Shape::BinopWithEv | Shape::RbinopWithEv | Shape::BinopWithLift => 2,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.keyword())
    }
}

impl std::str::FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::from_keyword(s).ok_or_else(|| format!("unknown call shape `{s}`"))
    }
}
