//! Declarations that drive the rewrite: operator tables and enrichments.
//!
//! Both functions here report problems through the [`Diagnostic`]
//! accumulator, so they must run inside a tracked query.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use opfuse_rewrite::Shape;
use opfuse_syntax::{EnrichDecl, Program};
use salsa::Accumulator;
use tracing::{trace, warn};

use crate::diagnostic::{CompilationPhase, Diagnostic};

/// Methods of each enrichment conversion and the shape they are called with.
#[derive(Clone, Debug, Default, PartialEq, Eq, salsa::Update)]
pub struct EnrichEnv {
    conversions: BTreeMap<String, BTreeMap<String, Shape>>,
    has_errors: bool,
}

impl EnrichEnv {
    /// Shape of `method` on values wrapped by `conversion`, if it is enriched.
    pub fn shape_of(&self, conversion: &str, method: &str) -> Option<Shape> {
        self.conversions.get(conversion)?.get(method).copied()
    }

    /// Whether any declaration was rejected.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    fn bind(&mut self, db: &dyn salsa::Database, decl: &EnrichDecl) {
        let methods = self.conversions.entry(decl.conversion.clone()).or_default();
        for binding in &decl.bindings {
            let Some(shape) = Shape::from_keyword(&binding.shape) else {
                Diagnostic::error(
                    CompilationPhase::Binding,
                    binding.shape_span,
                    format!("unknown call shape `{}`", binding.shape),
                )
                .accumulate(db);
                self.has_errors = true;
                continue;
            };
            for (method, span) in &binding.methods {
                match methods.entry(method.clone()) {
                    Entry::Vacant(entry) => {
                        trace!(conversion = %decl.conversion, %method, %shape, "bound method");
                        entry.insert(shape);
                    }
                    Entry::Occupied(entry) if *entry.get() == shape => {
                        warn!(conversion = %decl.conversion, %method, %shape, "duplicate binding");
                        Diagnostic::warning(
                            CompilationPhase::Binding,
                            *span,
                            format!(
                                "`{method}` is already bound as `{shape}` on `{}`",
                                decl.conversion
                            ),
                        )
                        .accumulate(db);
                    }
                    Entry::Occupied(entry) => {
                        Diagnostic::error(
                            CompilationPhase::Binding,
                            *span,
                            format!(
                                "`{method}` on `{}` is bound as `{}`; cannot rebind it as `{shape}`",
                                decl.conversion,
                                entry.get()
                            ),
                        )
                        .accumulate(db);
                        self.has_errors = true;
                    }
                }
            }
        }
    }
}

/// Collect the `enrich` declarations of a program.
///
/// Blocks naming the same conversion are merged. A method bound twice with
/// the same shape is a warning; with a different shape it is an error and
/// the first binding is kept.
pub fn bind_program(db: &dyn salsa::Database, program: &Program) -> EnrichEnv {
    let mut env = EnrichEnv::default();
    for (decl, _) in program.enrich_decls() {
        env.bind(db, decl);
    }
    env
}

/// Entries of the program's `operators` blocks, in spelling order.
///
/// A spelling given twice keeps its last method; a conflicting repeat is a
/// warning.
pub fn operator_overrides(db: &dyn salsa::Database, program: &Program) -> Vec<(String, String)> {
    let mut overrides: BTreeMap<String, String> = BTreeMap::new();
    for entry in program.operator_entries() {
        if let Some(previous) = overrides.insert(entry.spelling.clone(), entry.method.clone()) {
            if previous != entry.method {
                warn!(
                    spelling = %entry.spelling,
                    %previous,
                    method = %entry.method,
                    "operator remapped"
                );
                Diagnostic::warning(
                    CompilationPhase::Binding,
                    entry.span,
                    format!(
                        "operator `{}` was mapped to `{previous}`; `{}` replaces it",
                        entry.spelling, entry.method
                    ),
                )
                .accumulate(db);
            }
        }
    }
    overrides.into_iter().collect()
}
