//! snipcov - Correlate documentation snippets with the tests that cover them
//!
//! snipcov parses Python source files to find region-tagged documentation
//! snippets, derives invocation keys from the neighboring test files, and
//! joins the two so each snippet knows which tests exercise it. The results
//! feed listing reports and XUnit report annotation.

mod inject;
mod output;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use output::{RegionTagOptions, TestedFilter};
use owo_colors::OwoColorize;
use snipcov_core::{Analysis, analyze_artifact, extract_directory};
use std::io::Read;
use std::path::{Path, PathBuf};

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "snipcov", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract snippets from a directory and emit the JSON artifact
    Extract {
        /// Directory to scan for Python sources and tests
        root: PathBuf,

        /// Output file for the artifact (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// List region tags recorded in an extraction artifact
    ListRegionTags {
        /// JSON artifact produced by `extract`
        artifact: PathBuf,

        /// Root directory the artifact was extracted from
        root: PathBuf,

        /// Show tags the snippet parser detected
        #[arg(long)]
        detected: bool,

        /// Show tags present in source but missed by the snippet parser
        #[arg(long)]
        undetected: bool,

        /// Show the number of tests covering each detected tag
        #[arg(long)]
        test_counts: bool,

        /// Show the source files each detected tag appears in
        #[arg(long)]
        filenames: bool,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// List the source files snippets were extracted from
    ListSourceFiles {
        /// JSON artifact produced by `extract`
        artifact: PathBuf,

        /// Root directory the artifact was extracted from
        root: PathBuf,

        /// Only list files where all/some/none of the snippets are tested
        #[arg(long, value_enum)]
        tested_files: Option<TestedFilter>,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Annotate an XUnit report (read from stdin) with region tags
    Inject {
        /// JSON artifact produced by `extract`
        artifact: PathBuf,

        /// Root directory the artifact was extracted from
        root: PathBuf,

        /// Output file for the rewritten report (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Extract { root, output } => run_extract(&root, output.as_deref()),
        Command::ListRegionTags {
            artifact,
            root,
            detected,
            undetected,
            test_counts,
            filenames,
            output,
        } => {
            let analysis = load_analysis(&artifact, &root)?;
            let opts = RegionTagOptions {
                detected,
                undetected,
                test_counts,
                filenames,
            };
            output::write_output(
                &output::format_region_tags(&analysis, &opts),
                output.as_deref(),
            )
        }
        Command::ListSourceFiles {
            artifact,
            root,
            tested_files,
            output,
        } => {
            let analysis = load_analysis(&artifact, &root)?;
            output::write_output(
                &output::format_source_files(&analysis, tested_files),
                output.as_deref(),
            )
        }
        Command::Inject {
            artifact,
            root,
            output,
        } => run_inject(&artifact, &root, output.as_deref()),
    }
}

fn run_extract(root: &Path, output: Option<&Path>) -> Result<()> {
    eprintln!("{} Extracting {}...", "->".blue().bold(), root.display());

    let extracted = extract_directory(root)?;
    print_warnings(&extracted.warnings);
    eprintln!(
        "   Found {} snippets",
        extracted.snippets.len().to_string().green()
    );

    let json = serde_json::to_string_pretty(&extracted.snippets)
        .wrap_err("Failed to serialize snippet artifact")?;
    output::write_output(&[json], output)
}

fn run_inject(artifact: &Path, root: &Path, output: Option<&Path>) -> Result<()> {
    let analysis = load_analysis(artifact, root)?;

    let mut xml = String::new();
    std::io::stdin()
        .read_to_string(&mut xml)
        .wrap_err("Failed to read XUnit report from stdin")?;

    let rewritten = inject::inject_region_tags(&analysis.snippets, &xml)?;
    output::write_output(&[rewritten], output)
}

fn load_analysis(artifact: &Path, root: &Path) -> Result<Analysis> {
    eprintln!(
        "{} Analyzing {} against {}...",
        "->".blue().bold(),
        artifact.display(),
        root.display()
    );
    let analysis = analyze_artifact(artifact, root)?;
    print_warnings(&analysis.warnings);
    Ok(analysis)
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {warning}", "!".yellow().bold());
    }
}
