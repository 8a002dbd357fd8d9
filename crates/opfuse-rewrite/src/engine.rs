use opfuse_syntax::Expr;
use tracing::debug;

use crate::error::{RewriteError, RewriteResult};
use crate::matcher::match_shape;
use crate::operators::OperatorNames;
use crate::shape::Shape;

/// Rewrite an enrichment call into a direct call on its evidence.
///
/// `conv(lhs)(ev).m(rhs)` becomes `ev.resolved(lhs, rhs)` where `resolved`
/// is `m` looked up in `table`. Lift shapes pass the operand through
/// `lift_ev.from<T>(rhs)` first, `T` being the operand's static type.
///
/// The result keeps the node id of `tree`; every other new node is
/// synthetic.
pub fn rewrite(shape: Shape, tree: &Expr, table: &dyn OperatorNames) -> RewriteResult<Expr> {
    let extraction = match_shape(shape, tree)?;
    let resolved = table.resolve(extraction.method_name);

    let mut args = Vec::with_capacity(shape.arity());
    args.push(extraction.receiver.clone());
    if let Some(operand) = extraction.operand {
        let operand = match extraction.lift_evidence {
            Some(lift_evidence) => lift(shape, lift_evidence, operand)?,
            None => operand.clone(),
        };
        args.push(operand);
    }

    debug!(
        %shape,
        method = extraction.method_name,
        resolved,
        span = %tree.span,
        "rewrote call site"
    );
    Ok(Expr::method_call(tree.span, extraction.evidence.clone(), resolved, args).with_id(tree.id))
}

/// `lift_evidence.from<T>(operand)`
fn lift(shape: Shape, lift_evidence: &Expr, operand: &Expr) -> RewriteResult<Expr> {
    let type_name = operand
        .static_type_name()
        .ok_or_else(|| RewriteError::untyped_lift_operand(shape, operand))?;
    Ok(Expr::method_call(
        operand.span,
        lift_evidence.clone(),
        format!("from{type_name}"),
        vec![operand.clone()],
    ))
}
