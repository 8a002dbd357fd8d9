//! Text printer for expression trees and programs.
//!
//! The output is valid input for [`crate::parser::parse_program`], so a
//! printed rewrite can be fed back through the pipeline.

use std::fmt::{self, Display, Formatter, Write as _};

use crate::expr::{EnrichDecl, Expr, ExprKind, Item, ItemKind, Literal, Program, TypeRef};

/// Characters allowed in a bare (unquoted) member name besides
/// alphanumerics and `_`.
pub const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '<', '>', '=', '!', '&', '|', '^', '~', '?', '@', '#', '\\',
];

pub fn is_member_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || OPERATOR_CHARS.contains(&c)
}

/// Write a member name, quoting it when a bare name would not parse back.
pub fn write_member(f: &mut impl fmt::Write, name: &str) -> fmt::Result {
    let bare = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(is_member_char);
    if bare {
        f.write_str(name)
    } else {
        write_string_lit(f, name)
    }
}

fn write_string_lit(f: &mut impl fmt::Write, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_separated<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_char('[')?;
            write_separated(f, &self.args)?;
            f.write_char(']')?;
        }
        Ok(())
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(text) => f.write_str(text),
            Literal::Str(text) => write_string_lit(f, text),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ExprKind::Var(name) => f.write_str(name),
            ExprKind::Lit(lit) => write!(f, "{lit}"),
            ExprKind::Select { receiver, member } => {
                write!(f, "{receiver}.")?;
                write_member(f, member)
            }
            ExprKind::Apply { callee, args } => {
                write!(f, "{callee}(")?;
                write_separated(f, args)?;
                f.write_char(')')
            }
            ExprKind::TypeApply { callee, types } => {
                write!(f, "{callee}[")?;
                write_separated(f, types)?;
                f.write_char(']')
            }
            ExprKind::Ascribe { expr, ty } => write!(f, "({expr}: {ty})"),
        }
    }
}

impl Display for EnrichDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "enrich {} {{", self.conversion)?;
        for binding in &self.bindings {
            write!(f, "    {} ", binding.shape)?;
            for (i, (method, _)) in binding.methods.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_member(f, method)?;
            }
            writeln!(f, ";")?;
        }
        f.write_char('}')
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ItemKind::Operators(entries) => {
                writeln!(f, "operators {{")?;
                for entry in entries {
                    f.write_str("    ")?;
                    write_string_lit(f, &entry.spelling)?;
                    f.write_str(" => ")?;
                    write_member(f, &entry.method)?;
                    writeln!(f, ",")?;
                }
                f.write_char('}')
            }
            ItemKind::Enrich(decl) => write!(f, "{decl}"),
            ItemKind::Let { name, value } => write!(f, "let {name} = {value};"),
            ItemKind::Expr(expr) => write!(f, "{expr};"),
        }
    }
}

/// Print every item of a program, one per line.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for item in &program.items {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{item}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Span;

    fn sp() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn test_print_method_call() {
        let call = Expr::method_call(
            sp(),
            Expr::var(sp(), "ev"),
            "plus",
            vec![Expr::var(sp(), "a"), Expr::var(sp(), "b")],
        );
        assert_eq!(call.to_string(), "ev.plus(a, b)");
    }

    #[test]
    fn test_print_symbolic_and_quoted_members() {
        let sym = Expr::select(sp(), Expr::var(sp(), "x"), "<+>");
        assert_eq!(sym.to_string(), "x.<+>");

        let colon = Expr::select(sp(), Expr::var(sp(), "x"), "*:");
        assert_eq!(colon.to_string(), "x.\"*:\"");
    }

    #[test]
    fn test_print_ascription_and_type_args() {
        let conv = Expr::synthetic(
            sp(),
            ExprKind::TypeApply {
                callee: Expr::var(sp(), "ops"),
                types: vec![TypeRef {
                    name: "List".into(),
                    args: vec![TypeRef::named("Int")],
                }],
            },
        );
        let ascribed = Expr::synthetic(
            sp(),
            ExprKind::Ascribe {
                expr: Expr::var(sp(), "n"),
                ty: TypeRef::named("Int"),
            },
        );
        let call = Expr::apply(sp(), conv, vec![ascribed]);
        assert_eq!(call.to_string(), "ops[List[Int]]((n: Int))");
    }

    #[test]
    fn test_print_string_literal_escapes() {
        let lit = Literal::Str("a \"b\"\n".into());
        assert_eq!(lit.to_string(), r#""a \"b\"\n""#);
    }
}
