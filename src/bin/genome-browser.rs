//! The command-line entry point of the genome browser service.
//!
//! ```shell
//! cargo run --release --bin=genome-browser --features=binaries -- \
//!     browse 1/2/3 --workspace my_workspace --alignment 1/5/1
//! ```
//!
//! The service endpoints and scratch directory are normally taken from the
//! environment the hosting runtime sets up (`SDK_CALLBACK_URL`,
//! `KB_WORKSPACE_URL`, `KB_SCRATCH`, and `KB_AUTH_TOKEN`). The `run` command
//! implements the runtime's job contract: it reads a JSON-RPC request from a
//! file and writes the response to another.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use clap_verbosity_flag::Verbosity;
use genome_browser::Config;
use genome_browser::GenomeBrowser;
use genome_browser::config::DEFAULT_JBROWSE_DIR;
use genome_browser::config::DEFAULT_SAMTOOLS;
use genome_browser::dispatch;
use genome_browser::params::BrowseGenomeParams;
use genome_browser::params::BuildGenomeBrowserParams;
use serde::Serialize;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

////////////////////////////////////////////////////////////////////////////////////////
// Arguments
////////////////////////////////////////////////////////////////////////////////////////

/// The service endpoints and local installation.
#[derive(clap::Args)]
struct ServiceArgs {
    /// The callback endpoint for the SDK services.
    #[arg(long, env = "SDK_CALLBACK_URL", global = true)]
    callback_url: Option<String>,

    /// The endpoint of the workspace store.
    #[arg(long, env = "KB_WORKSPACE_URL", global = true)]
    workspace_url: Option<String>,

    /// The scratch directory within which all files are written.
    #[arg(long, env = "KB_SCRATCH", global = true)]
    scratch_dir: Option<PathBuf>,

    /// The authorization token forwarded to the services.
    #[arg(long, env = "KB_AUTH_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// The JBrowse installation.
    #[arg(long, global = true, default_value = DEFAULT_JBROWSE_DIR)]
    jbrowse_dir: PathBuf,

    /// The `samtools` executable.
    #[arg(long, global = true, default_value = DEFAULT_SAMTOOLS)]
    samtools: PathBuf,
}

impl ServiceArgs {
    /// Assembles the service configuration.
    fn config(&self) -> Result<Config> {
        let callback_url = self
            .callback_url
            .clone()
            .context("`--callback-url` (or `SDK_CALLBACK_URL`) is required")?;
        let workspace_url = self
            .workspace_url
            .clone()
            .context("`--workspace-url` (or `KB_WORKSPACE_URL`) is required")?;
        let scratch_dir = self
            .scratch_dir
            .clone()
            .context("`--scratch-dir` (or `KB_SCRATCH`) is required")?;

        let config = Config::new(callback_url, workspace_url, scratch_dir)
            .with_jbrowse_dir(&self.jbrowse_dir)
            .with_samtools(&self.samtools);

        Ok(match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        })
    }
}

/// A command to run.
#[derive(Subcommand)]
enum Command {
    /// Builds a browser for a genome in the store and publishes it as a
    /// report.
    Browse {
        /// The genome reference.
        genome_ref: String,

        /// The workspace to save the report to.
        #[arg(short, long)]
        workspace: String,

        /// An alignment reference (may be repeated).
        #[arg(short, long)]
        alignment: Vec<String>,
    },

    /// Builds a browser from the parameters in a JSON file.
    Build {
        /// The parameters file.
        params: PathBuf,
    },

    /// Reports the health of the service.
    Status,

    /// Runs a JSON-RPC request from a file and writes the response to another.
    Run {
        /// The request file.
        input: PathBuf,

        /// The response file.
        output: PathBuf,
    },
}

/// Packages workspace genomes as static JBrowse bundles.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    service: ServiceArgs,

    #[command(flatten)]
    verbose: Verbosity,
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Prints a value as pretty JSON on stdout.
fn print<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing the result")?;
    println!("{json}");
    Ok(())
}

/// Reads and decodes a JSON file.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn run(args: Args) -> Result<()> {
    let config = args.service.config()?;
    let browser = GenomeBrowser::try_from_config(config).context("connecting to the services")?;

    match args.command {
        Command::Browse {
            genome_ref,
            workspace,
            alignment,
        } => {
            let params = BrowseGenomeParams {
                genome_ref: Some(genome_ref),
                result_workspace_name: Some(workspace.into()),
                alignment_refs: Some(alignment),
            };

            let results = browser
                .browse_genome_app(Some(&params))
                .context("building the genome browser")?;
            print(&results)
        }
        Command::Build { params } => {
            let params = read_json::<BuildGenomeBrowserParams>(&params)?;

            let results = browser
                .build_genome_browser(&params)
                .context("building the genome browser")?;
            print(&results)
        }
        Command::Status => print(&browser.status()),
        Command::Run { input, output } => {
            let request = read_json::<dispatch::Request>(&input)?;
            let response = dispatch::dispatch(&browser, &request);

            let json = serde_json::to_string(&response).context("serializing the response")?;
            fs::write(&output, json).with_context(|| format!("writing {}", output.display()))?;

            info!("wrote response to {}", output.display());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(args)
}
