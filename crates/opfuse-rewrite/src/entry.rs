//! One entry point per call shape.
//!
//! Callers choose the shape by choosing the function; the engine never
//! searches for a shape that fits.

use opfuse_syntax::Expr;

use crate::engine::rewrite;
use crate::error::RewriteResult;
use crate::operators::OperatorNames;
use crate::shape::Shape;

pub type EntryPoint = fn(&Expr, &dyn OperatorNames) -> RewriteResult<Expr>;

pub fn unop(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::Unop, tree, table)
}

pub fn unop0(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::Unop0, tree, table)
}

pub fn unop_with_ev(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::UnopWithEv, tree, table)
}

pub fn binop(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::Binop, tree, table)
}

pub fn rbinop(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::Rbinop, tree, table)
}

pub fn binop_with_ev(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::BinopWithEv, tree, table)
}

pub fn rbinop_with_ev(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::RbinopWithEv, tree, table)
}

pub fn binop_with_lift(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::BinopWithLift, tree, table)
}

pub fn binop_with_self_lift(tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    rewrite(Shape::BinopWithSelfLift, tree, table)
}

impl Shape {
    /// The entry point that rewrites call sites of this shape.
    pub fn entry_point(self) -> EntryPoint {
        match self {
            Shape::Unop => unop,
            Shape::Unop0 => unop0,
            Shape::UnopWithEv => unop_with_ev,
            Shape::Binop => binop,
            Shape::Rbinop => rbinop,
            Shape::BinopWithEv => binop_with_ev,
            Shape::RbinopWithEv => rbinop_with_ev,
            Shape::BinopWithLift => binop_with_lift,
            Shape::BinopWithSelfLift => binop_with_self_lift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::DefaultOperators;
    use opfuse_syntax::parse_test_expr;

    #[test]
    fn test_entry_points_fix_the_shape() {
        let tree = parse_test_expr("ops(a)(ev).unary_-");
        for shape in Shape::ALL {
            let result = shape.entry_point()(&tree, &DefaultOperators);
            match shape {
                Shape::Unop0 => assert_eq!(result.unwrap().to_string(), "ev.negate(a)"),
                _ => assert_eq!(result.unwrap_err().shape(), shape),
            }
        }
    }

    #[test]
    fn test_binop_and_self_lift_differ_only_by_entry_point() {
        let tree = parse_test_expr("ops(a)(ev).+(1)");
        let plain = binop(&tree, &DefaultOperators).unwrap();
        let lifted = binop_with_self_lift(&tree, &DefaultOperators).unwrap();
        assert_eq!(plain.to_string(), "ev.plus(a, 1)");
        assert_eq!(lifted.to_string(), "ev.plus(a, ev.fromInt(1))");
    }
}
