//! Expression trees.
//!
//! The tree mirrors the desugared form a host compiler produces after type
//! checking: member selection, (curried) application, explicit type
//! application and type ascription over variables and literals. Nodes are
//! immutable values; passes that change a tree build a new one.

use crate::location::Span;
use crate::node_id::NodeId;

/// An expression node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Expr {
    /// Unique identifier, or [`NodeId::SYNTHETIC`] for built nodes.
    pub id: NodeId,
    pub span: Span,
    pub kind: Box<ExprKind>,
}

/// The different kinds of expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ExprKind {
    /// Variable reference: `a`, `ev`
    Var(String),

    /// Literal: `42`, `1.5`, `"s"`, `true`
    Lit(Literal),

    /// Member selection without arguments: `recv.name`
    Select { receiver: Expr, member: String },

    /// Application of one argument list: `callee(a, b)`
    ///
    /// Curried calls nest: `f(x)(y)` is `Apply(Apply(f, [x]), [y])`.
    Apply { callee: Expr, args: Vec<Expr> },

    /// Explicit type arguments: `callee[A, B]`
    TypeApply { callee: Expr, types: Vec<TypeRef> },

    /// Type ascription: `(expr: Type)`
    Ascribe { expr: Expr, ty: TypeRef },
}

/// Literal values.
///
/// Floats keep their source spelling so trees stay `Eq + Hash`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum Literal {
    Int(i64),
    Float(String),
    Str(String),
    Bool(bool),
}

impl Literal {
    /// Name of the literal's intrinsic type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "Int",
            Literal::Float(_) => "Float",
            Literal::Str(_) => "String",
            Literal::Bool(_) => "Bool",
        }
    }
}

/// A type reference as written in source: `Int`, `List[Int]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

impl Expr {
    /// Create a new expression with the given ID, span and kind.
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self {
            id,
            span,
            kind: Box::new(kind),
        }
    }

    /// Create a node that did not come from the parser.
    pub fn synthetic(span: Span, kind: ExprKind) -> Self {
        Self::new(NodeId::SYNTHETIC, span, kind)
    }

    pub fn var(span: Span, name: impl Into<String>) -> Self {
        Self::synthetic(span, ExprKind::Var(name.into()))
    }

    pub fn select(span: Span, receiver: Expr, member: impl Into<String>) -> Self {
        Self::synthetic(
            span,
            ExprKind::Select {
                receiver,
                member: member.into(),
            },
        )
    }

    pub fn apply(span: Span, callee: Expr, args: Vec<Expr>) -> Self {
        Self::synthetic(span, ExprKind::Apply { callee, args })
    }

    /// Build `receiver.method(args)`.
    pub fn method_call(
        span: Span,
        receiver: Expr,
        method: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::apply(span, Self::select(span, receiver, method), args)
    }

    /// Replace this node's identity, keeping its structure.
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &*self.kind {
            ExprKind::Var(_) => "variable",
            ExprKind::Lit(_) => "literal",
            ExprKind::Select { .. } => "member selection",
            ExprKind::Apply { .. } => "application",
            ExprKind::TypeApply { .. } => "type application",
            ExprKind::Ascribe { .. } => "ascription",
        }
    }

    /// Decompose `callee(args)`.
    pub fn as_apply(&self) -> Option<(&Expr, &[Expr])> {
        match &*self.kind {
            ExprKind::Apply { callee, args } => Some((callee, args)),
            _ => None,
        }
    }

    /// Decompose `receiver.member`.
    pub fn as_select(&self) -> Option<(&Expr, &str)> {
        match &*self.kind {
            ExprKind::Select { receiver, member } => Some((receiver, member)),
            _ => None,
        }
    }

    /// Whether this node names something: `a`, `a.b.c`, optionally with
    /// type arguments (`a.b[T]`).
    pub fn is_path(&self) -> bool {
        match &*self.kind {
            ExprKind::Var(_) => true,
            ExprKind::Select { receiver, .. } => receiver.is_path(),
            ExprKind::TypeApply { callee, .. } => callee.is_path(),
            _ => false,
        }
    }

    /// Dotted name of a path node, without type arguments.
    pub fn path_name(&self) -> Option<String> {
        match &*self.kind {
            ExprKind::Var(name) => Some(name.clone()),
            ExprKind::Select { receiver, member } => {
                let prefix = receiver.path_name()?;
                Some(format!("{prefix}.{member}"))
            }
            ExprKind::TypeApply { callee, .. } => callee.path_name(),
            _ => None,
        }
    }

    /// Name of this expression's static type, when the tree states it.
    ///
    /// Ascriptions and literals carry a type; everything else would need
    /// inference, which is not available here.
    pub fn static_type_name(&self) -> Option<&str> {
        match &*self.kind {
            ExprKind::Ascribe { ty, .. } => Some(&ty.name),
            ExprKind::Lit(lit) => Some(lit.type_name()),
            _ => None,
        }
    }

    /// Visit this node's direct children.
    pub fn children(&self) -> Vec<&Expr> {
        match &*self.kind {
            ExprKind::Var(_) | ExprKind::Lit(_) => Vec::new(),
            ExprKind::Select { receiver, .. } => vec![receiver],
            ExprKind::Apply { callee, args } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(callee);
                out.extend(args);
                out
            }
            ExprKind::TypeApply { callee, .. } => vec![callee],
            ExprKind::Ascribe { expr, .. } => vec![expr],
        }
    }

    /// Rebuild this node bottom-up, passing every rebuilt node to `f`.
    pub fn try_map_post_order<E>(
        self,
        f: &mut impl FnMut(Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let Expr { id, span, kind } = self;
        let kind = match *kind {
            kind @ (ExprKind::Var(_) | ExprKind::Lit(_)) => kind,
            ExprKind::Select { receiver, member } => ExprKind::Select {
                receiver: receiver.try_map_post_order(f)?,
                member,
            },
            ExprKind::Apply { callee, args } => ExprKind::Apply {
                callee: callee.try_map_post_order(f)?,
                args: args
                    .into_iter()
                    .map(|arg| arg.try_map_post_order(f))
                    .collect::<Result<_, _>>()?,
            },
            ExprKind::TypeApply { callee, types } => ExprKind::TypeApply {
                callee: callee.try_map_post_order(f)?,
                types,
            },
            ExprKind::Ascribe { expr, ty } => ExprKind::Ascribe {
                expr: expr.try_map_post_order(f)?,
                ty,
            },
        };
        f(Expr::new(id, span, kind))
    }
}

// =============================================================================
// Programs
// =============================================================================

/// A parsed source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Item {
    pub span: Span,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ItemKind {
    /// `operators { "**" => pow, ... }`
    Operators(Vec<OperatorEntry>),
    /// `enrich ops { binop +, -; unop0 abs; }`
    Enrich(EnrichDecl),
    /// `let name = expr;`
    Let { name: String, value: Expr },
    /// `expr;`
    Expr(Expr),
}

/// One `"spelling" => method` entry of an operator table block.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct OperatorEntry {
    pub spelling: String,
    pub method: String,
    pub span: Span,
}

/// Declaration of an enrichment conversion and the shapes of its methods.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct EnrichDecl {
    /// Dotted conversion path, e.g. `syntax.ringOps`.
    pub conversion: String,
    pub bindings: Vec<ShapeBinding>,
}

/// `shape m1, m2, ...;` inside an `enrich` block.
///
/// The shape keyword is kept as written; checking it is the binder's job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct ShapeBinding {
    pub shape: String,
    pub shape_span: Span,
    pub methods: Vec<(String, Span)>,
}

impl Program {
    /// Statements that evaluate something (`let` and expression items).
    pub fn statements(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Let { .. } | ItemKind::Expr(_)))
    }

    pub fn enrich_decls(&self) -> impl Iterator<Item = (&EnrichDecl, Span)> {
        self.items.iter().filter_map(|item| match &item.kind {
            ItemKind::Enrich(decl) => Some((decl, item.span)),
            _ => None,
        })
    }

    pub fn operator_entries(&self) -> impl Iterator<Item = &OperatorEntry> {
        self.items
            .iter()
            .filter_map(|item| match &item.kind {
                ItemKind::Operators(entries) => Some(entries.iter()),
                _ => None,
            })
            .flatten()
    }
}
