//! Cassis - closure conversion for the Cassis HIR
//!
//! CLI driver that lifts closures out of serialized programs and runs them.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// Closure conversion for the Cassis HIR
#[derive(Parser, Debug)]
#[command(name = "cassis")]
#[command(author, version, about = "Lift closures into top-level classes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lift closures in a serialized program (or a directory of them)
    Lift(commands::lift::LiftArgs),

    /// Lift a program, then evaluate a static method
    Run(commands::run::RunArgs),
}

/// Settings shared by every subcommand
#[derive(Clone, Copy, Debug)]
pub struct Output {
    pub format: OutputFormat,
    pub use_color: bool,
    pub quiet: bool,
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over -v
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose, cli.quiet))
        .parse_default_env()
        .init();

    let output = Output {
        format: cli.format,
        use_color: !cli.no_color && !cli.quiet && atty::is(atty::Stream::Stderr),
        quiet: cli.quiet,
    };

    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Lift(args) => commands::lift::run(args, output),
        Commands::Run(args) => commands::run::run(args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(log_level(0, false), LevelFilter::Warn);
        assert_eq!(log_level(2, false), LevelFilter::Debug);
        assert_eq!(log_level(7, false), LevelFilter::Trace);
        assert_eq!(log_level(3, true), LevelFilter::Error);
    }

    #[test]
    fn test_lift_arguments_parse() {
        let cli = Cli::try_parse_from([
            "cassis", "--format", "json", "-vv", "lift", "unit.json", "-o", "out.json", "--print-hir",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Lift(args)) => {
                assert_eq!(args.input.to_str(), Some("unit.json"));
                assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("out.json"));
                assert!(args.print_hir);
                assert!(args.config.is_none());
            }
            other => panic!("expected lift, got {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_class_and_method() {
        assert!(Cli::try_parse_from(["cassis", "run", "unit.json"]).is_err());
        let cli = Cli::try_parse_from([
            "cassis", "run", "unit.json", "--class", "a.Outer", "--method", "main",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.class, "a.Outer");
                assert_eq!(args.method, "main");
            }
            other => panic!("expected run, got {:?}", other),
        }
    }
}
