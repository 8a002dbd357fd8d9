//! Evaluate call trees before and after rewriting and compare the results.
//!
//! The evaluator models the runtime behaviour of an enrichment: `ops(x)`
//! builds a wrapper, applying evidence to it stores the evidence, and
//! selecting a method collects argument lists until the method's shape is
//! satisfied, then forwards to the evidence. Rewritten trees call the
//! evidence directly, so both paths must agree.

use std::collections::HashMap;

use opfuse_rewrite::{DefaultOperators, OperatorNames, OperatorTable, Shape};
use opfuse_syntax::{Expr, ExprKind, Literal, parse_test_expr};

/// Integer arithmetic modulo `modulus`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Evidence {
    modulus: i64,
}

impl Evidence {
    fn call(self, method: &str, args: &[i64]) -> i64 {
        let m = self.modulus;
        let value = match (method, args) {
            ("plus", [a, b]) => a + b,
            ("minus", [a, b]) => a - b,
            ("times", [a, b]) => a * b,
            ("pow", [a, b]) => a.pow(*b as u32),
            ("mod", [a, b]) => a.rem_euclid(*b),
            ("eqv", [a, b]) => i64::from(a.rem_euclid(m) == b.rem_euclid(m)),
            ("lt", [a, b]) => i64::from(a.rem_euclid(m) < b.rem_euclid(m)),
            ("<+>", [a, b]) => *a.max(b),
            ("negate", [a]) => -a,
            ("abs", [a]) => a.abs(),
            ("fromInt", [a]) => *a,
            _ => panic!("evidence has no method {method}/{}", args.len()),
        };
        value.rem_euclid(m)
    }
}

#[derive(Clone, Debug)]
enum Value {
    Int(i64),
    Evidence(Evidence),
    Conversion,
    Wrapper {
        subject: i64,
        evidence: Option<Evidence>,
    },
    Method {
        subject: i64,
        evidence: Option<Evidence>,
        name: String,
        lists: Vec<Vec<Value>>,
    },
    EvidenceMethod(Evidence, String),
}

/// The enrichment class: which shape each wrapper method has and which
/// evidence method it forwards to.
struct Enrichment {
    methods: HashMap<&'static str, (Shape, &'static str)>,
}

impl Enrichment {
    fn new() -> Self {
        let methods = [
            ("+", (Shape::Binop, "plus")),
            ("-", (Shape::Rbinop, "minus")),
            ("*", (Shape::BinopWithEv, "times")),
            ("%", (Shape::RbinopWithEv, "mod")),
            ("**", (Shape::Binop, "pow")),
            ("===", (Shape::Binop, "eqv")),
            ("<", (Shape::Binop, "lt")),
            ("<+>", (Shape::Binop, "<+>")),
            ("unary_-", (Shape::Unop0, "negate")),
            ("abs", (Shape::Unop, "abs")),
            ("absWith", (Shape::UnopWithEv, "abs")),
            ("plusLift", (Shape::BinopWithLift, "plus")),
            ("plusSelf", (Shape::BinopWithSelfLift, "plus")),
        ]
        .into_iter()
        .collect();
        Self { methods }
    }

    fn shape(&self, method: &str) -> Shape {
        self.methods[method].0
    }

    /// Run a wrapper method once all of its argument lists are present.
    fn finish(
        &self,
        subject: i64,
        evidence: Option<Evidence>,
        name: &str,
        lists: &[Vec<Value>],
    ) -> Value {
        let (shape, target) = self.methods[name];
        let arg = |list: usize| lists[list][0].clone();
        let int = |v: Value| match v {
            Value::Int(n) => n,
            other => panic!("expected an integer, found {other:?}"),
        };
        let ev = |v: Value| match v {
            Value::Evidence(ev) => ev,
            other => panic!("expected evidence, found {other:?}"),
        };
        let own = || evidence.expect("wrapper has no evidence");
        let result = match shape {
            Shape::Unop | Shape::Unop0 => own().call(target, &[subject]),
            Shape::UnopWithEv => ev(arg(0)).call(target, &[subject]),
            Shape::Binop => own().call(target, &[subject, int(arg(0))]),
            Shape::Rbinop => own().call(target, &[int(arg(0)), subject]),
            Shape::BinopWithEv => ev(arg(1)).call(target, &[subject, int(arg(0))]),
            Shape::RbinopWithEv => ev(arg(1)).call(target, &[int(arg(0)), subject]),
            Shape::BinopWithLift => {
                let lifted = ev(arg(1)).call("fromInt", &[int(arg(0))]);
                own().call(target, &[subject, lifted])
            }
            Shape::BinopWithSelfLift => {
                let lifted = own().call("fromInt", &[int(arg(0))]);
                own().call(target, &[subject, lifted])
            }
        };
        Value::Int(result)
    }
}

struct Evaluator {
    env: HashMap<String, Value>,
    enrichment: Enrichment,
}

impl Evaluator {
    fn new() -> Self {
        let env = [
            ("ops", Value::Conversion),
            ("ev", Value::Evidence(Evidence { modulus: 1_000_003 })),
            ("mod7", Value::Evidence(Evidence { modulus: 7 })),
            ("a", Value::Int(12)),
            ("b", Value::Int(5)),
            ("c", Value::Int(-9)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect();
        Self {
            env,
            enrichment: Enrichment::new(),
        }
    }

    fn eval(&self, expr: &Expr) -> Value {
        match &*expr.kind {
            ExprKind::Var(name) => self.env[name].clone(),
            ExprKind::Lit(Literal::Int(n)) => Value::Int(*n),
            ExprKind::Lit(other) => panic!("unsupported literal {other}"),
            ExprKind::Ascribe { expr, .. } => self.eval(expr),
            ExprKind::TypeApply { callee, .. } => self.eval(callee),
            ExprKind::Select { receiver, member } => self.select(self.eval(receiver), member),
            ExprKind::Apply { callee, args } => {
                let args = args.iter().map(|arg| self.eval(arg)).collect();
                self.apply(self.eval(callee), args)
            }
        }
    }

    fn select(&self, receiver: Value, member: &str) -> Value {
        match receiver {
            Value::Wrapper { subject, evidence } => {
                let method = Value::Method {
                    subject,
                    evidence,
                    name: member.to_owned(),
                    lists: Vec::new(),
                };
                self.saturate(method)
            }
            Value::Evidence(ev) => Value::EvidenceMethod(ev, member.to_owned()),
            other => panic!("cannot select {member} on {other:?}"),
        }
    }

    fn apply(&self, callee: Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Conversion => match args.as_slice() {
                [Value::Int(subject)] => Value::Wrapper {
                    subject: *subject,
                    evidence: None,
                },
                _ => panic!("conversion takes one integer"),
            },
            Value::Wrapper {
                subject,
                evidence: None,
            } => match args.as_slice() {
                [Value::Evidence(ev)] => Value::Wrapper {
                    subject,
                    evidence: Some(*ev),
                },
                _ => panic!("wrapper takes one evidence value"),
            },
            Value::Method {
                subject,
                evidence,
                name,
                mut lists,
            } => {
                lists.push(args);
                self.saturate(Value::Method {
                    subject,
                    evidence,
                    name,
                    lists,
                })
            }
            Value::EvidenceMethod(ev, name) => {
                let ints: Vec<_> = args
                    .into_iter()
                    .map(|arg| match arg {
                        Value::Int(n) => n,
                        other => panic!("evidence methods take integers, found {other:?}"),
                    })
                    .collect();
                Value::Int(ev.call(&name, &ints))
            }
            other => panic!("cannot apply {other:?}"),
        }
    }

    fn saturate(&self, method: Value) -> Value {
        if let Value::Method {
            subject,
            evidence,
            name,
            lists,
        } = &method
        {
            if lists.len() == self.enrichment.shape(name).method_arg_lists() {
                return self.enrichment.finish(*subject, *evidence, name, lists);
            }
        }
        method
    }
}

fn int(value: Value) -> i64 {
    match value {
        Value::Int(n) => n,
        other => panic!("expected an integer result, found {other:?}"),
    }
}

fn assert_equivalent(src: &str, table: &dyn OperatorNames) {
    let evaluator = Evaluator::new();
    let tree = parse_test_expr(src);
    let method = opfuse_rewrite::call_head(&tree)
        .unwrap_or_else(|| panic!("{src} is not an enrichment call"))
        .method;
    let shape = evaluator.enrichment.shape(method);

    let rewritten = shape
        .entry_point()(&tree, table)
        .unwrap_or_else(|e| panic!("{src}: {e}"));
    let before = int(evaluator.eval(&tree));
    let after = int(evaluator.eval(&rewritten));
    assert_eq!(before, after, "{src} => {rewritten}");
}

#[test]
fn test_every_shape_preserves_meaning() {
    for src in [
        "ops(a)(ev).abs()",
        "ops(c)(ev).abs()",
        "ops(a)(ev).unary_-",
        "ops(c).absWith(mod7)",
        "ops(a)(ev).+(b)",
        "ops(a)(ev).-(b)",
        "ops(a).*(c)(ev)",
        "ops(b).%(a)(ev)",
        "ops(a)(ev).===(b)",
        "ops(b)(ev).<(a)",
        "ops(a)(ev).plusLift(c)(mod7)",
        "ops(a)(mod7).plusSelf((c: Int))",
    ] {
        assert_equivalent(src, &DefaultOperators);
    }
}

#[test]
fn test_reversed_operands_are_not_commuted() {
    // minus and mod are not commutative, so a swap would change the value.
    let evaluator = Evaluator::new();
    let tree = parse_test_expr("ops(a)(ev).-(b)");
    let rewritten = opfuse_rewrite::rbinop(&tree, &DefaultOperators).unwrap();
    assert_eq!(rewritten.to_string(), "ev.minus(b, a)");
    assert_eq!(int(evaluator.eval(&rewritten)), 5 - 12 + 1_000_003);
}

#[test]
fn test_lift_uses_the_lift_evidence() {
    // The lift evidence reduces modulo 7 before the main evidence adds.
    let evaluator = Evaluator::new();
    let tree = parse_test_expr("ops(a)(ev).plusLift(c)(mod7)");
    let rewritten = opfuse_rewrite::binop_with_lift(&tree, &DefaultOperators).unwrap();
    assert_eq!(rewritten.to_string(), "ev.plus(a, mod7.fromInt(c))");
    assert_eq!(int(evaluator.eval(&rewritten)), 12 + (-9i64).rem_euclid(7));
}

#[test]
fn test_nested_sites_rewrite_inside_out() {
    let table = DefaultOperators;
    let tree = parse_test_expr("ops(ops(a)(ev).+(b))(ev).===(c)");
    let inner = tree
        .try_map_post_order(&mut |node| {
            let is_site = opfuse_rewrite::call_head(&node)
                .is_some_and(|head| head.applied == 1 && head.method == "+");
            if is_site {
                opfuse_rewrite::binop(&node, &table)
            } else {
                Ok(node)
            }
        })
        .unwrap();
    assert_eq!(inner.to_string(), "ops(ev.plus(a, b))(ev).===(c)");

    let outer = opfuse_rewrite::binop(&inner, &table).unwrap();
    assert_eq!(outer.to_string(), "ev.eqv(ev.plus(a, b), c)");

    let evaluator = Evaluator::new();
    let original = parse_test_expr("ops(ops(a)(ev).+(b))(ev).===(c)");
    assert_eq!(int(evaluator.eval(&original)), int(evaluator.eval(&outer)));
}

#[test]
fn test_table_overrides_change_the_target() {
    let table = OperatorTable::new().with("**", "pow");
    assert_equivalent("ops(b)(ev).**(a)", &table);
    // Unmapped spellings call the evidence method of the same name.
    assert_equivalent("ops(a)(ev).<+>(b)", &table);
}
