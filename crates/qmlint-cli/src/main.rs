// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! qmlint command-line interface.
//!
//! Runs an XML rule grammar over a file or a folder of `.qml` / `.js`
//! sources and prints one diagnostic per line:
//!
//! ```text
//! src/Main.qml (12, 5) : No hardcoded colors allowed
//! ```
//!
//! The exit code is 0 on a clean run and 1 when any syntax error was
//! emitted; rule violations and unused-symbol findings do not fail the
//! run.

use clap::Parser;
use miette::Result;

use camino::Utf8PathBuf;
use qmlint_core::analyzer::{Analyzer, Target};
use qmlint_core::context::DiagnosticKind;
use qmlint_core::rules::Grammar;

/// Static analyzer for QML-like declarative-UI source
#[derive(Debug, Parser)]
#[command(name = "qmlint")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Analyze a single source file
    #[arg(long, value_name = "PATH", conflicts_with = "folder", required_unless_present = "folder")]
    file: Option<Utf8PathBuf>,

    /// Analyze every .qml / .js file in a folder
    #[arg(long, value_name = "PATH")]
    folder: Option<Utf8PathBuf>,

    /// The XML rule grammar to evaluate
    #[arg(long, value_name = "PATH")]
    grammar: Utf8PathBuf,

    /// Also parse files named by string imports
    #[arg(long)]
    include_imports: bool,

    /// Recurse into subfolders of the given folder
    #[arg(long)]
    include_subfolders: bool,

    /// Rewrite analyzed files with formatted source
    #[arg(long)]
    rewrite: bool,

    /// Drop unreferenced declarations when rewriting
    #[arg(long, requires = "rewrite")]
    remove_unused: bool,
}

fn main() -> Result<()> {
    // Initialize tracing only when RUST_LOG is explicitly set, so the
    // diagnostic output stays machine-readable by default.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    let grammar = Grammar::load_file(&cli.grammar).map_err(miette::Report::new)?;

    let target = match (cli.file, cli.folder) {
        (Some(file), _) => Target::File(file),
        (None, Some(folder)) => Target::Folder(folder),
        (None, None) => unreachable!("clap enforces --file or --folder"),
    };

    let mut analyzer = Analyzer::new(grammar, target);
    analyzer.set_include_imports(cli.include_imports);
    analyzer.set_include_subfolders(cli.include_subfolders);
    analyzer.set_rewrite(cli.rewrite);
    analyzer.set_remove_unused(cli.remove_unused);

    let diagnostics = analyzer.analyze();
    for diagnostic in &diagnostics {
        println!("{diagnostic}");
    }

    let syntax_errors = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Syntax)
        .count();
    if syntax_errors > 0 {
        tracing::info!(syntax_errors, "exiting non-zero");
        std::process::exit(1);
    }
    Ok(())
}
