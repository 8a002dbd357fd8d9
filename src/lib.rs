pub mod binding;
pub mod database;
pub mod diagnostic;
pub mod diagnostics;
pub mod pipeline;

pub use database::{Db, OpfuseDatabaseImpl, SourceFile};
pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};
pub use pipeline::{
    OperatorsOutcome, RewriteOutcome, RewriteOutput, SiteReport, operators_with_diagnostics,
    rewrite_program, rewrite_with_diagnostics,
};
