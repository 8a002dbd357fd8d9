//! opfuse CLI entry point.

mod cli;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, ReportFormat};
use opfuse::database::Db;
use opfuse::diagnostics::print_diagnostic;
use opfuse::pipeline::{RewriteOutput, operators_with_diagnostics, rewrite_with_diagnostics};
use opfuse::{Diagnostic, OpfuseDatabaseImpl, SourceFile};
use opfuse_rewrite::{EvidencePosition, LiftSource, OperatorNames, OperatorTable, Shape};
use opfuse_syntax::print_program;
use salsa::Database;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Rewrite {
            file,
            report,
            check,
        } => rewrite_file(file, report, check),
        Command::Shapes => {
            print_shapes();
            ExitCode::SUCCESS
        }
        Command::Operators { file } => print_operators(file),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("OPFUSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

fn load(db: &OpfuseDatabaseImpl, path: PathBuf) -> Option<SourceFile> {
    match db.input(path.clone()) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            None
        }
    }
}

fn print_diagnostics(db: &OpfuseDatabaseImpl, file: SourceFile, diagnostics: &[Diagnostic]) {
    let display_path = file.path(db).display().to_string();
    for diag in diagnostics {
        print_diagnostic(diag, file.text(db), &display_path);
    }
}

fn rewrite_file(path: PathBuf, report: Option<ReportFormat>, check: bool) -> ExitCode {
    let db = OpfuseDatabaseImpl::default();
    let Some(file) = load(&db, path) else {
        return ExitCode::FAILURE;
    };

    db.attach(|db| {
        let outcome = rewrite_with_diagnostics(db, file);
        print_diagnostics(db, file, &outcome.diagnostics);

        let Some(output) = outcome.output else {
            return ExitCode::FAILURE;
        };
        if !check {
            print!("{}", print_program(&output.program));
        }
        match report {
            Some(ReportFormat::Text) => print_text_report(output),
            Some(ReportFormat::Json) => match serde_json::to_string_pretty(&output.sites) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing report: {e}");
                    return ExitCode::FAILURE;
                }
            },
            None => {}
        }

        if outcome.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

fn print_text_report(output: &RewriteOutput) {
    println!("// {} call site(s) fused", output.sites.len());
    for site in &output.sites {
        println!(
            "// {:>5}..{:<5} {:<20} {}.{} -> {}",
            site.span.start, site.span.end, site.shape, site.conversion, site.method, site.resolved
        );
    }
}

fn print_shapes() {
    println!("{:<20} {:>5}  {:<10}  {:<8} LIFT", "SHAPE", "ARITY", "EVIDENCE", "ORDER");
    for shape in Shape::ALL {
        let evidence = match shape.evidence_position() {
            EvidencePosition::Conversion => "conversion",
            EvidencePosition::Trailing => "trailing",
        };
        let order = if shape.is_reversed() { "reversed" } else { "natural" };
        let lift = match shape.lift() {
            Some(LiftSource::Separate) => "separate",
            Some(LiftSource::SameEvidence) => "same",
            None => "-",
        };
        println!(
            "{:<20} {:>5}  {:<10}  {:<8} {}",
            shape,
            shape.arity(),
            evidence,
            order,
            lift
        );
    }
}

fn print_operators(path: Option<PathBuf>) -> ExitCode {
    let db = OpfuseDatabaseImpl::default();
    let file = match path {
        Some(path) => match load(&db, path) {
            Some(file) => Some(file),
            None => return ExitCode::FAILURE,
        },
        None => None,
    };

    db.attach(|db| {
        let table = match file {
            Some(file) => {
                let outcome = operators_with_diagnostics(db, file);
                print_diagnostics(db, file, &outcome.diagnostics);
                if outcome.has_errors() {
                    return ExitCode::FAILURE;
                }
                outcome.table
            }
            None => OperatorTable::new(),
        };
        for (spelling, method) in table.entries() {
            println!("{spelling:<8} {method}");
        }
        ExitCode::SUCCESS
    })
}
