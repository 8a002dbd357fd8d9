//! Diagnostic formatting for the opfuse CLI.

use std::io::IsTerminal;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

use crate::diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};

/// Get the display color for a pipeline phase.
pub fn phase_color(phase: CompilationPhase) -> Color {
    match phase {
        CompilationPhase::Parsing => Color::Red,
        CompilationPhase::Binding => Color::Yellow,
        CompilationPhase::Rewriting => Color::Magenta,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

fn report_kind(severity: DiagnosticSeverity) -> ReportKind<'static> {
    match severity {
        DiagnosticSeverity::Error => ReportKind::Error,
        DiagnosticSeverity::Warning => ReportKind::Warning,
    }
}

fn build_report<'a>(
    diag: &Diagnostic,
    file_path: &'a str,
    color: bool,
) -> Report<'static, (&'a str, std::ops::Range<usize>)> {
    let (start, end) = normalize_span(diag.span.start, diag.span.end);
    let config = Config::default()
        .with_color(color)
        .with_index_type(IndexType::Byte);

    Report::build(report_kind(diag.severity), (file_path, start..end))
        .with_config(config)
        .with_code(format!("{:?}", diag.phase))
        .with_message(&diag.message)
        .with_label(
            Label::new((file_path, start..end))
                .with_message(&diag.message)
                .with_color(phase_color(diag.phase)),
        )
        .finish()
}

/// Print a diagnostic to stderr using ariadne.
pub fn print_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) {
    build_report(diag, file_path, std::io::stderr().is_terminal())
        .eprint((file_path, Source::from(source)))
        .ok();
}

/// Render a diagnostic without colors.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) -> String {
    let mut out = Vec::new();
    build_report(diag, file_path, false)
        .write((file_path, Source::from(source)), &mut out)
        .ok();
    String::from_utf8_lossy(&out).into_owned()
}
