//! Rewrite pipeline for opfuse.
//!
//! The pipeline is a set of Salsa tracked functions over a [`SourceFile`],
//! each cached independently.
//!
//! ```text
//! SourceFile
//!     │
//!     ▼
//! parse_program ─► Program
//!     │
//!     ├─► operator_overrides ─► "spelling" => method entries
//!     ├─► enrich_env ─► conversion -> method -> Shape
//!     │
//!     ▼
//! rewrite_program ─► RewriteOutput
//!     1. collect call sites (top-down)
//!     2. substitute sites through their entry points (bottom-up)
//! ```
//!
//! ## Diagnostics
//!
//! Every stage reports problems via `Diagnostic { ... }.accumulate(db)`;
//! [`rewrite_with_diagnostics`] gathers them with the output. A program
//! with any error produces no rewritten output.

use std::collections::HashMap;

use opfuse_rewrite::{OperatorNames, OperatorTable, Shape, call_head};
use opfuse_syntax::{Expr, Item, ItemKind, NodeId, Program, Span};
use salsa::Accumulator;
use serde::Serialize;
use tracing::{debug, trace};

use crate::binding::{EnrichEnv, bind_program};
use crate::database::SourceFile;
use crate::diagnostic::{CompilationPhase, Diagnostic};

// =============================================================================
// Output types
// =============================================================================

/// One rewritten call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, salsa::Update)]
pub struct SiteReport {
    pub shape: Shape,
    pub conversion: String,
    /// Method name as written at the call site.
    pub method: String,
    /// Evidence method the call now targets.
    pub resolved: String,
    pub span: Span,
}

/// A rewritten program and the sites that were fused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct RewriteOutput {
    /// Statements only; declarations have no call sites left to serve.
    pub program: Program,
    pub sites: Vec<SiteReport>,
}

/// Result of running the whole pipeline on one file.
pub struct RewriteOutcome<'db> {
    pub output: Option<&'db RewriteOutput>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RewriteOutcome<'_> {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Effective operator table of one file and the problems found reading it.
pub struct OperatorsOutcome {
    pub table: OperatorTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl OperatorsOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A call tree recognized as an enrichment call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub id: NodeId,
    pub span: Span,
    pub shape: Shape,
    pub conversion: String,
    pub method: String,
}

// =============================================================================
// Pipeline Stages
// =============================================================================

/// Stage 1: Parse source text.
#[salsa::tracked(returns(ref))]
pub fn parse_program(db: &dyn salsa::Database, file: SourceFile) -> Option<Program> {
    match opfuse_syntax::parse_program(file.text(db)) {
        Ok(program) => Some(program),
        Err(err) => {
            Diagnostic::error(
                CompilationPhase::Parsing,
                Span::new(err.offset, err.offset),
                err.message,
            )
            .accumulate(db);
            None
        }
    }
}

/// Stage 2a: Operator entries declared by the file.
#[salsa::tracked(returns(ref))]
pub fn operator_overrides(db: &dyn salsa::Database, file: SourceFile) -> Vec<(String, String)> {
    match parse_program(db, file) {
        Some(program) => crate::binding::operator_overrides(db, program),
        None => Vec::new(),
    }
}

/// Stage 2b: Enrichment declarations of the file.
#[salsa::tracked(returns(ref))]
pub fn enrich_env(db: &dyn salsa::Database, file: SourceFile) -> EnrichEnv {
    match parse_program(db, file) {
        Some(program) => bind_program(db, program),
        None => EnrichEnv::default(),
    }
}

/// The default operator table layered with the file's `operators` blocks.
pub fn operator_table(db: &dyn salsa::Database, file: SourceFile) -> OperatorTable {
    operator_overrides(db, file)
        .iter()
        .fold(OperatorTable::new(), |table, (spelling, method)| {
            table.with(spelling.as_str(), method.as_str())
        })
}

/// Stage 3: Fuse every enrichment call site in the file.
///
/// Returns `None` when parsing, binding or any single rewrite failed.
#[salsa::tracked(returns(ref))]
pub fn rewrite_program(db: &dyn salsa::Database, file: SourceFile) -> Option<RewriteOutput> {
    let program = parse_program(db, file).as_ref()?;
    let table = operator_table(db, file);
    let env = enrich_env(db, file);
    if env.has_errors() {
        return None;
    }

    let sites = collect_sites(program, env);
    debug!(path = %file.path(db).display(), sites = sites.len(), "collected call sites");

    let mut failed = false;
    let items = program
        .statements()
        .map(|item| substitute_item(item, &sites, &table))
        .filter_map(|result| match result {
            Ok(item) => Some(item),
            Err(diagnostics) => {
                for diagnostic in diagnostics {
                    diagnostic.accumulate(db);
                }
                failed = true;
                None
            }
        })
        .collect();
    if failed {
        return None;
    }

    let sites = sites
        .iter()
        .map(|site| SiteReport {
            shape: site.shape,
            conversion: site.conversion.clone(),
            method: site.method.clone(),
            resolved: table.resolve(&site.method).to_owned(),
            span: site.span,
        })
        .collect();
    Some(RewriteOutput {
        program: Program { items },
        sites,
    })
}

/// Run the pipeline and collect all diagnostics.
pub fn rewrite_with_diagnostics(db: &dyn salsa::Database, file: SourceFile) -> RewriteOutcome<'_> {
    let output = rewrite_program(db, file).as_ref();
    let diagnostics = rewrite_program::accumulated::<Diagnostic>(db, file)
        .into_iter()
        .cloned()
        .collect();
    RewriteOutcome {
        output,
        diagnostics,
    }
}

/// Build the file's operator table and collect the diagnostics raised while
/// parsing it and reading its `operators` blocks.
pub fn operators_with_diagnostics(
    db: &dyn salsa::Database,
    file: SourceFile,
) -> OperatorsOutcome {
    let table = operator_table(db, file);
    let diagnostics = operator_overrides::accumulated::<Diagnostic>(db, file)
        .into_iter()
        .cloned()
        .collect();
    OperatorsOutcome { table, diagnostics }
}

// =============================================================================
// Phase 1: site collection
// =============================================================================

/// Find enrichment call sites in every statement, outermost first.
pub fn collect_sites(program: &Program, env: &EnrichEnv) -> Vec<CallSite> {
    let mut sites = Vec::new();
    for item in program.statements() {
        match &item.kind {
            ItemKind::Let { value, .. } => collect_in(value, env, &mut sites),
            ItemKind::Expr(expr) => collect_in(expr, env, &mut sites),
            ItemKind::Operators(_) | ItemKind::Enrich(_) => {}
        }
    }
    sites
}

fn collect_in(expr: &Expr, env: &EnrichEnv, sites: &mut Vec<CallSite>) {
    if let Some(head) = call_head(expr) {
        if let Some(shape) = env.shape_of(&head.conversion, head.method) {
            // More argument lists than the shape takes means the call's
            // result is applied again; the site sits further down the chain.
            if head.applied <= shape.method_arg_lists() {
                trace!(id = %expr.id, %shape, method = head.method, "found call site");
                sites.push(CallSite {
                    id: expr.id,
                    span: expr.span,
                    shape,
                    conversion: head.conversion.clone(),
                    method: head.method.to_owned(),
                });
                for arg in head.arguments {
                    collect_in(arg, env, sites);
                }
                return;
            }
        }
    }
    for child in expr.children() {
        collect_in(child, env, sites);
    }
}

// =============================================================================
// Phase 2: substitution
// =============================================================================

fn substitute_item(
    item: &Item,
    sites: &[CallSite],
    table: &dyn OperatorNames,
) -> Result<Item, Vec<Diagnostic>> {
    let kind = match &item.kind {
        ItemKind::Let { name, value } => ItemKind::Let {
            name: name.clone(),
            value: substitute(value.clone(), sites, table)?,
        },
        ItemKind::Expr(expr) => ItemKind::Expr(substitute(expr.clone(), sites, table)?),
        other => other.clone(),
    };
    Ok(Item {
        span: item.span,
        kind,
    })
}

/// Rebuild `expr` bottom-up, rewriting each recorded site through its
/// shape's entry point. Operands are rewritten before the site holding them.
pub fn substitute(
    expr: Expr,
    sites: &[CallSite],
    table: &dyn OperatorNames,
) -> Result<Expr, Vec<Diagnostic>> {
    let by_id: HashMap<NodeId, &CallSite> = sites.iter().map(|site| (site.id, site)).collect();
    let mut errors = Vec::new();
    let rewritten = expr.try_map_post_order(&mut |node| {
        let Some(site) = by_id.get(&node.id) else {
            return Ok::<_, std::convert::Infallible>(node);
        };
        match site.shape.entry_point()(&node, table) {
            Ok(replacement) => Ok(replacement),
            Err(err) => {
                debug!(%err, "rewrite failed");
                errors.push(Diagnostic::error(
                    CompilationPhase::Rewriting,
                    site.span,
                    format!("cannot fuse `{}` call as `{}`: {err}", site.method, site.shape),
                ));
                Ok(node)
            }
        }
    });
    let Ok(rewritten) = rewritten;
    if errors.is_empty() {
        Ok(rewritten)
    } else {
        Err(errors)
    }
}
