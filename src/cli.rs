//! Command-line interface for opfuse.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "opfuse")]
#[command(about = "Fuse enrichment call sites into direct evidence calls", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rewrite a source file and print the result
    Rewrite {
        /// Source file to rewrite
        file: PathBuf,
        /// Also print a report of the fused call sites
        #[arg(long, value_enum)]
        report: Option<ReportFormat>,
        /// Only check that every call site can be fused
        #[arg(long)]
        check: bool,
    },
    /// List the supported call shapes
    Shapes,
    /// Print the effective operator table
    Operators {
        /// Layer the `operators` blocks of this file over the defaults
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rewrite_command() {
        let cli =
            Cli::try_parse_from(["opfuse", "rewrite", "in.opf", "--report", "json"]).unwrap();
        let Command::Rewrite {
            file,
            report,
            check,
        } = cli.command
        else {
            panic!("expected rewrite");
        };
        assert_eq!(file, PathBuf::from("in.opf"));
        assert_eq!(report, Some(ReportFormat::Json));
        assert!(!check);
    }

    #[test]
    fn test_parse_operators_command() {
        let cli = Cli::try_parse_from(["opfuse", "operators"]).unwrap();
        assert!(matches!(cli.command, Command::Operators { file: None }));
    }
}
