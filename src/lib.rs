//! a2dl: build draw.io icon libraries from AsciiDoc and keep diagrams in sync.
//!
//! Each AsciiDoc document describes one icon: an optional PNG image, a set
//! of named tooltip sections and an optional "read more" link. A folder of
//! such documents becomes a draw.io library, and diagrams that use those
//! icons can be re-patched whenever the documents change.
//!
//! # Modules
//!
//! - [`icon`]: AsciiDoc parsing and icon serialization
//! - [`library`]: folder scanning and the `<mxlibrary>` container
//! - [`diagram`]: loading, patching and writing diagrams
//! - [`graph`]: laying out a relation list as a new diagram
//! - [`config`]: markup tokens and builder options
//! - [`sample`]: the example project scaffold
//! - [`error`]: error types for a2dl operations

pub mod config;
pub mod diagram;
pub mod error;
pub mod graph;
pub mod icon;
pub mod library;
pub mod sample;
pub mod xml;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{BuildOptions, MarkupTokens, ScanOptions, DEFAULT_GLOB, DEFAULT_ICON_SIZE};
use crate::diagram::{UpdateOptions, WriteMode, WriteOptions};
use crate::graph::{GraphDiagramOptions, LayoutAlgorithm};
use crate::library::Library;

pub use error::A2dlError;

/// The a2dl CLI application.
#[derive(Parser)]
#[command(name = "a2dl")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log more (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a draw.io library from a folder of AsciiDoc icons.
    Library(LibraryArgs),
    /// Re-apply a folder of icons to an existing diagram.
    Diagram(DiagramArgs),
    /// Lay out a CSV relation list as a new diagram.
    Graph(GraphArgs),
    /// Scaffold a sample project into an empty folder.
    Example(ExampleArgs),
}

/// Options shared by every subcommand that scans an icon folder.
#[derive(clap::Args)]
struct ScanArgs {
    /// Glob selecting icon documents, relative to the folder.
    #[arg(long, default_value = DEFAULT_GLOB)]
    glob: String,

    /// Resolve relative image paths against this folder instead of the
    /// document's own folder.
    #[arg(long, value_name = "DIR")]
    image_path: Option<PathBuf>,

    /// YAML file overriding the markup tokens.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Icon width in the library.
    #[arg(long, default_value_t = DEFAULT_ICON_SIZE)]
    icon_size: f64,
}

impl ScanArgs {
    fn to_options(&self) -> Result<ScanOptions, A2dlError> {
        let tokens = match &self.config {
            Some(path) => MarkupTokens::from_yaml_file(path)?,
            None => MarkupTokens::default(),
        };
        Ok(ScanOptions {
            glob: self.glob.clone(),
            build: BuildOptions {
                tokens,
                image_base_path: self.image_path.clone(),
                icon_size: self.icon_size,
            },
        })
    }
}

/// How reports are printed.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the library subcommand.
#[derive(clap::Args)]
struct LibraryArgs {
    /// Folder holding the icon documents.
    source: PathBuf,

    /// Library file to write.
    output: PathBuf,

    #[command(flatten)]
    scan: ScanArgs,

    /// Output format for the scan report.
    #[arg(long, value_enum, default_value_t)]
    report: ReportFormat,
}

/// Arguments for the diagram subcommand.
#[derive(clap::Args)]
struct DiagramArgs {
    /// Folder holding the icon documents.
    source: PathBuf,

    /// Diagram file to update.
    diagram: PathBuf,

    #[command(flatten)]
    scan: ScanArgs,

    /// Write `<stem>.new.<ext>` next to the diagram instead of replacing it.
    #[arg(long)]
    new_file: bool,

    /// Remove the backup after a successful in-place write.
    #[arg(long)]
    clean: bool,

    /// Re-compress each page model in the written file.
    #[arg(long)]
    recompress: bool,

    /// Output format for the update report.
    #[arg(long, value_enum, default_value_t)]
    report: ReportFormat,
}

/// Arguments for the graph subcommand.
#[derive(clap::Args)]
struct GraphArgs {
    /// CSV file with a `source,target,undirected,labels` header.
    relations: PathBuf,

    /// Diagram file to write.
    output: PathBuf,

    /// Icon folder to resolve node names against; earlier folders win.
    #[arg(long = "library", value_name = "DIR", required = true)]
    libraries: Vec<PathBuf>,

    #[command(flatten)]
    scan: ScanArgs,

    /// Layout algorithm: force, shell, circular, spectral or spiral.
    #[arg(long, default_value = "force")]
    layout: String,

    /// Seed for the randomised layouts.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Compress the page model in the written file.
    #[arg(long)]
    recompress: bool,
}

/// Arguments for the example subcommand.
#[derive(clap::Args)]
struct ExampleArgs {
    /// Folder to create (must be missing or empty).
    output: PathBuf,
}

/// Run the a2dl CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`. Usage
/// errors come back as [`A2dlError::Usage`] so the caller can exit with 1;
/// help and version output exit directly.
pub fn run() -> Result<(), A2dlError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(A2dlError::Usage(err.render().to_string())),
    };
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Library(args)) => run_library(args),
        Some(Commands::Diagram(args)) => run_diagram(args),
        Some(Commands::Graph(args)) => run_graph(args),
        Some(Commands::Example(args)) => run_example(args),
        None => {
            println!("a2dl {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("AsciiDoc to draw.io library builder.");
            println!();
            println!("Run 'a2dl --help' for usage information.");
            Ok(())
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `verbosity`.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    // A second initialisation (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_report<R: Serialize + std::fmt::Display>(
    report: &R,
    format: ReportFormat,
) -> Result<(), A2dlError> {
    match format {
        ReportFormat::Text => print!("{report}"),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Execute the library subcommand.
fn run_library(args: LibraryArgs) -> Result<(), A2dlError> {
    let opts = args.scan.to_options()?;
    let (library, report) = Library::from_folder(&args.source, &opts)?;
    library.write(&args.output)?;
    print_report(&report, args.report)
}

/// Execute the diagram subcommand.
fn run_diagram(args: DiagramArgs) -> Result<(), A2dlError> {
    let opts = args.scan.to_options()?;
    let (library, scan) = Library::from_folder(&args.source, &opts)?;
    if scan.error_count() > 0 {
        tracing::warn!(errors = scan.error_count(), "some icons failed to build");
    }

    let write = WriteOptions {
        mode: if args.new_file {
            WriteMode::NewFile
        } else {
            WriteMode::InPlace
        },
        clean: args.clean,
        recompress: args.recompress,
    };
    let report = diagram::update_diagram_file(
        &args.diagram,
        &[library],
        &UpdateOptions::default(),
        &write,
    )?;
    print_report(&report, args.report)
}

/// Execute the graph subcommand.
fn run_graph(args: GraphArgs) -> Result<(), A2dlError> {
    let scan = args.scan.to_options()?;
    let relations = graph::read_relations_csv(&args.relations)?;
    let libraries = load_libraries(&args.libraries, &scan)?;

    let algorithm = match args.layout.parse::<LayoutAlgorithm>() {
        Ok(algorithm) => algorithm,
        Err(never) => match never {},
    };
    if algorithm == LayoutAlgorithm::Force && !args.layout.trim().eq_ignore_ascii_case("force") {
        tracing::warn!(requested = %args.layout, used = algorithm.name(), "unknown layout name");
    }

    let opts = GraphDiagramOptions {
        algorithm,
        seed: args.seed,
        ..Default::default()
    };
    let diagram = graph::build_graph_diagram(&relations, &libraries, &opts, &args.output);
    let written = diagram.write(&WriteOptions {
        mode: WriteMode::InPlace,
        clean: true,
        recompress: args.recompress,
    })?;
    println!(
        "Wrote {} ({} relation(s), {} icon(s) placed, layout {})",
        written.display(),
        relations.len(),
        diagram.objects().len(),
        algorithm.name()
    );
    Ok(())
}

fn load_libraries(folders: &[PathBuf], scan: &ScanOptions) -> Result<Vec<Library>, A2dlError> {
    folders
        .iter()
        .map(|folder| {
            let (library, report) = Library::from_folder(folder, scan)?;
            tracing::info!(folder = %folder.display(), icons = report.icons, "loaded library");
            Ok(library)
        })
        .collect()
}

/// Execute the example subcommand.
fn run_example(args: ExampleArgs) -> Result<(), A2dlError> {
    let written = sample::write_example(&args.output)?;
    println!(
        "Wrote sample project to {} ({} files)",
        args.output.display(),
        written.len()
    );
    Ok(())
}
