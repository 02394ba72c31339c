//! PCA Template Preview CLI tool
//!
//! Creates a PDF preview of PCA templates.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use pca_template_preview::config::{default_config_path, Config};
use pca_template_preview::ids::{parse_ids, read_id_file, verify_ids};
use pca_template_preview::report::{generate_preview, PreviewOptions};
use pca_template_preview::store::open_store;
use pca_template_preview::Error;

/// PCA Template Preview - Create a PDF preview of PCA templates
#[derive(Parser)]
#[command(name = "pca-template-preview")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "template_ids"])))]
#[command(after_help = "EXAMPLES:
    # Preview two templates
    pca-template-preview 5c9b7f3e2a1d4e0012345678 5c9b7f3e2a1d4e0012345679

    # Read IDs from a file and keep intermediate files
    pca-template-preview --debug --file ids.txt

    # Use the [staging] section of the configuration file
    pca-template-preview -s staging --file ids.txt")]
struct Cli {
    /// Template IDs to include
    #[arg(value_name = "TEMPLATE_ID")]
    template_ids: Vec<String>,

    /// Read template IDs from a file (one per line)
    #[arg(short, long, value_name = "FILENAME")]
    file: Option<PathBuf>,

    /// Keep intermediate files for debugging
    #[arg(short, long)]
    debug: bool,

    /// Configuration section to use
    #[arg(short, long, value_name = "SECTION")]
    section: Option<String>,

    /// Configuration file (default: <config dir>/pca-template-preview/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        let code = e.downcast_ref::<Error>().map_or(1, Error::exit_code);
        process::exit(code);
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let raw_ids = match &cli.file {
        Some(path) => read_id_file(path)
            .with_context(|| format!("Could not read template IDs from {}", path.display()))?,
        None => cli.template_ids.clone(),
    };

    // Every ID is checked before anything is generated
    let ids = parse_ids(&raw_ids)?;
    if ids.is_empty() {
        println!("No valid template IDs provided - exiting!");
        return Ok(());
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path, cli.section.as_deref())?;
    let store = open_store(&config.store)?;
    verify_ids(store.as_ref(), &ids)?;

    println!("Generating Template Preview for {} templates...", ids.len());

    let options = PreviewOptions {
        resources: config.resources,
        compiler: config.compiler,
        debug: cli.debug,
    };
    let outcome = generate_preview(store.as_ref(), &ids, &options)?;

    if let Some(output) = &outcome.output {
        println!("Output: {}", output.display());
    }
    if let Some(work_dir) = &outcome.work_dir {
        println!("Intermediate files kept in: {}", work_dir.display());
    }
    println!("Done");

    Ok(())
}
