//! End-to-end tests for the rewrite pipeline and the `opfuse` binary.

use std::io::Write;
use std::process::Command;

use insta::assert_snapshot;
use opfuse::{
    CompilationPhase, Db, DiagnosticSeverity, OpfuseDatabaseImpl, SourceFile, rewrite_program,
    rewrite_with_diagnostics,
};
use opfuse_rewrite::Shape;
use opfuse_syntax::print_program;
use salsa::{Database as _, Setter as _};
use tempfile::NamedTempFile;

const ALGEBRA: &str = r#"
// Comparison and ring operators on any A with evidence.
enrich syntax.ops {
    binop ===, =!=, <, +, *, **;
    rbinop -;
    unop0 unary_-;
    unop abs;
    binop_with_ev /;
    rbinop_with_ev %;
    unop_with_ev signum;
    binop_with_lift "*:";
    binop_with_self_lift |+|;
}
"#;

fn write_source(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".opf").expect("Failed to create temp file");
    file.write_all(text.as_bytes()).expect("Failed to write source");
    file
}

#[test]
fn test_every_shape_through_the_pipeline() {
    let text = format!(
        r#"{ALGEBRA}
let eq = syntax.ops[Int](a)(ev).===(b);
let lt = syntax.ops[Int](a)(ev).<(b);
let diff = syntax.ops[Int](b)(ev).-(a);
let neg = syntax.ops[Int](a)(ev).unary_-;
let mag = syntax.ops[Int](a)(ev).abs();
let sig = syntax.ops[Int](a).signum(ev);
let q = syntax.ops[Int](a)./(b)(ev);
let r = syntax.ops[Int](b).%(a)(ev);
let scaled = syntax.ops[Vec](v)(vs)."*:"((k: Real))(field);
let joined = syntax.ops[Int](a)(ev).|+|(1);
"#
    );
    OpfuseDatabaseImpl::default().attach(|db| {
        let file = SourceFile::from_text(db, "shapes.opf", text);
        let output = rewrite_program(db, file).as_ref().expect("rewrite");
        assert_snapshot!(print_program(&output.program), @r"
        let eq = ev.eqv(a, b);
        let lt = ev.lt(a, b);
        let diff = ev.minus(a, b);
        let neg = ev.negate(a);
        let mag = ev.abs(a);
        let sig = ev.signum(a);
        let q = ev.div(a, b);
        let r = ev.mod(a, b);
        let scaled = vs.timesl(v, field.fromReal((k: Real)));
        let joined = ev.combine(a, ev.fromInt(1));
        ");

        let shapes: Vec<_> = output.sites.iter().map(|site| site.shape).collect();
        assert_eq!(
            shapes,
            vec![
                Shape::Binop,
                Shape::Binop,
                Shape::Rbinop,
                Shape::Unop0,
                Shape::Unop,
                Shape::UnopWithEv,
                Shape::BinopWithEv,
                Shape::RbinopWithEv,
                Shape::BinopWithLift,
                Shape::BinopWithSelfLift,
            ]
        );
    });
}

#[test]
fn test_site_report_serializes() {
    let text = format!("{ALGEBRA}syntax.ops(a)(ev).**(b);");
    OpfuseDatabaseImpl::default().attach(|db| {
        let file = SourceFile::from_text(db, "pow.opf", text);
        let output = rewrite_program(db, file).as_ref().expect("rewrite");
        let json = serde_json::to_value(&output.sites).unwrap();
        assert_eq!(json[0]["shape"], "binop");
        assert_eq!(json[0]["conversion"], "syntax.ops");
        assert_eq!(json[0]["method"], "**");
        assert_eq!(json[0]["resolved"], "pow");
    });
}

#[test]
fn test_unlifted_operand_without_type_fails() {
    let text = format!("{ALGEBRA}syntax.ops(v)(vs).\"*:\"(k)(field);");
    OpfuseDatabaseImpl::default().attach(|db| {
        let file = SourceFile::from_text(db, "lift.opf", text);
        let outcome = rewrite_with_diagnostics(db, file);
        assert!(outcome.output.is_none());
        let diag = &outcome.diagnostics[0];
        assert_eq!(diag.phase, CompilationPhase::Rewriting);
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert!(diag.message.contains("write it as `(k: Type)`"), "{}", diag.message);
    });
}

#[test]
fn test_edit_reruns_rewrite() {
    let mut db = OpfuseDatabaseImpl::default();
    let text = format!("{ALGEBRA}syntax.ops(a)(ev).+(b);");
    let file = SourceFile::from_text(&db, "edit.opf", text);
    let before = rewrite_program(&db, file).clone().expect("rewrite");
    assert_eq!(print_program(&before.program), "ev.plus(a, b);\n");

    file.set_text(&mut db).to(format!("{ALGEBRA}syntax.ops(a)(ev).*(b);"));
    let after = rewrite_program(&db, file).clone().expect("rewrite");
    assert_eq!(print_program(&after.program), "ev.times(a, b);\n");
}

#[test]
fn test_input_from_disk() {
    let source = write_source(&format!("{ALGEBRA}syntax.ops(a)(ev).=!=(b);"));
    let db = OpfuseDatabaseImpl::default();
    let file = db.input(source.path().to_path_buf()).expect("input");
    let output = rewrite_program(&db, file).as_ref().expect("rewrite");
    assert_eq!(print_program(&output.program), "ev.neqv(a, b);\n");
}

#[test]
fn test_cli_rewrite_and_check() {
    let source = write_source(&format!("{ALGEBRA}let x = syntax.ops(a)(ev).+(b);"));
    let output = Command::new(env!("CARGO_BIN_EXE_opfuse"))
        .arg("rewrite")
        .arg(source.path())
        .output()
        .expect("Failed to run opfuse");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "let x = ev.plus(a, b);\n");

    let bad = write_source(&format!("{ALGEBRA}syntax.ops(a).+(b);"));
    let output = Command::new(env!("CARGO_BIN_EXE_opfuse"))
        .args(["rewrite", "--check"])
        .arg(bad.path())
        .output()
        .expect("Failed to run opfuse");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot fuse `+` call as `binop`"), "{stderr}");
}

#[test]
fn test_cli_operators_with_file() {
    let source = write_source("operators { \"**\" => power, \"<+>\" => merge, }");
    let output = Command::new(env!("CARGO_BIN_EXE_opfuse"))
        .args(["operators", "--file"])
        .arg(source.path())
        .output()
        .expect("Failed to run opfuse");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Vec<_>> = stdout
        .lines()
        .map(|line| line.split_whitespace().collect())
        .collect();
    assert!(lines.contains(&vec!["**", "power"]));
    assert!(lines.contains(&vec!["<+>", "merge"]));
    assert!(lines.contains(&vec!["===", "eqv"]));
}

#[test]
fn test_cli_operators_rejects_unparseable_file() {
    let source = write_source("operators { \"**\" => power, ");
    let output = Command::new(env!("CARGO_BIN_EXE_opfuse"))
        .args(["operators", "--file"])
        .arg(source.path())
        .output()
        .expect("Failed to run opfuse");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Parsing"), "{stderr}");
}

#[test]
fn test_cli_operators_reports_remapped_operator() {
    let source = write_source("operators { \"+\" => add, \"+\" => sum, }");
    let output = Command::new(env!("CARGO_BIN_EXE_opfuse"))
        .args(["operators", "--file"])
        .arg(source.path())
        .output()
        .expect("Failed to run opfuse");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.lines().any(|line| line.split_whitespace().eq(["+", "sum"])),
        "{stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("operator `+` was mapped to `add`"), "{stderr}");
    assert!(!stderr.contains('\x1b'), "{stderr}");
}
