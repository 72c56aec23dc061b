//! The service entry points.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::acquire;
use crate::acquire::AlignmentFile;
use crate::acquire::GenomeFiles;
use crate::config::Config;
use crate::package;
use crate::package::Packager;
use crate::params::BrowseGenomeParams;
use crate::params::BuildGenomeBrowserParams;
use crate::params::GenomeInput;
use crate::reference::ObjectRef;
use crate::report;
use crate::report::Emitter;
use crate::report::REPORT_NAME_PREFIX;
use crate::service;
use crate::service::Services;
use crate::track;
use crate::track::Pipeline;
use crate::track::Tools;
use crate::unique;
use crate::validate;

/// The prefix of packaged browsers built by `browse_genome_app`.
pub const BROWSE_OUTPUT_PREFIX: &str = "minimal_jbrowse_";

/// The prefix of packaged browsers built by `build_genome_browser`.
pub const BUILD_OUTPUT_PREFIX: &str = "min_jbrowse_";

/// The prefix of the intermediate track data directories.
pub const DATA_DIR_PREFIX: &str = "browser_data_";

/// The source repository reported by [`GenomeBrowser::status()`].
const GIT_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// The commit reported by [`GenomeBrowser::status()`].
const GIT_COMMIT_HASH: &str = match option_env!("GIT_COMMIT_HASH") {
    Some(hash) => hash,
    None => "",
};

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error from a service entry point.
#[derive(Debug)]
pub enum Error {
    /// The request was rejected before any work began.
    Validation(Vec<String>),

    /// Acquiring the input files failed.
    Acquire(acquire::Error),

    /// Building the tracks failed.
    Track(track::Error),

    /// Packaging the browser failed.
    Package(package::Error),

    /// Publishing the report failed.
    Report(report::Error),

    /// A call to the store failed.
    Service(service::Error),
}

impl Error {
    /// Creates a validation error with a single message.
    fn invalid(message: impl Into<String>) -> Self {
        Error::Validation(vec![message.into()])
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(errors) => match errors.as_slice() {
                [error] => write!(f, "invalid parameters: {error}"),
                _ => write!(f, "invalid parameters: {}", errors.join("; ")),
            },
            Error::Acquire(err) => write!(f, "acquire error: {err}"),
            Error::Track(err) => write!(f, "track error: {err}"),
            Error::Package(err) => write!(f, "package error: {err}"),
            Error::Report(err) => write!(f, "report error: {err}"),
            Error::Service(err) => write!(f, "service error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<acquire::Error> for Error {
    fn from(err: acquire::Error) -> Self {
        Error::Acquire(err)
    }
}

impl From<track::Error> for Error {
    fn from(err: track::Error) -> Self {
        Error::Track(err)
    }
}

impl From<package::Error> for Error {
    fn from(err: package::Error) -> Self {
        Error::Package(err)
    }
}

impl From<report::Error> for Error {
    fn from(err: report::Error) -> Self {
        Error::Report(err)
    }
}

impl From<service::Error> for Error {
    fn from(err: service::Error) -> Self {
        Error::Service(err)
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Results
////////////////////////////////////////////////////////////////////////////////////////

/// The result of `browse_genome_app`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BrowseGenomeResults {
    /// The name of the report.
    pub report_name: String,

    /// The reference of the report.
    pub report_ref: String,

    /// The genome the browser was built for.
    pub genome_ref: String,
}

/// The result of `build_genome_browser`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BuildGenomeBrowserResults {
    /// The packaged browser.
    pub browser_dir: PathBuf,

    /// The name of the browser.
    pub genome_browser_name: String,
}

/// The health of the service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Status {
    /// Always `OK` for a running service.
    pub state: String,

    /// A free-form message.
    pub message: String,

    /// The service version.
    pub version: String,

    /// The source repository.
    pub git_url: String,

    /// The commit the service was built from (empty if unknown).
    pub git_commit_hash: String,
}

////////////////////////////////////////////////////////////////////////////////////////
// Genome browser
////////////////////////////////////////////////////////////////////////////////////////

/// The genome browser service.
///
/// A [`GenomeBrowser`] holds the configuration and the external services for
/// the lifetime of the process. Each call is independent: every packaged
/// browser and every intermediate data directory gets a fresh unique name
/// within the scratch directory.
pub struct GenomeBrowser {
    /// The configuration.
    config: Config,

    /// The external services.
    services: Services,
}

impl std::fmt::Debug for GenomeBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenomeBrowser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GenomeBrowser {
    /// Creates a new [`GenomeBrowser`].
    pub fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }

    /// Creates a new [`GenomeBrowser`] that reaches the services at the
    /// endpoints in `config`.
    pub fn try_from_config(config: Config) -> Result<Self> {
        let services = Services::try_from_config(&config)?;
        Ok(Self::new(config, services))
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports the health of the service.
    pub fn status(&self) -> Status {
        Status {
            state: String::from("OK"),
            message: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_url: GIT_URL.to_string(),
            git_commit_hash: GIT_COMMIT_HASH.to_string(),
        }
    }

    /// Gets the display name of the object at `reference`.
    pub fn get_object_name(&self, reference: &str) -> Result<String> {
        let reference = reference.parse::<ObjectRef>().map_err(|_| {
            Error::invalid("this must be a valid object reference to find the object's name")
        })?;

        Ok(acquire::object_name(
            self.services.workspace.as_ref(),
            &reference,
        )?)
    }

    /// Builds a browser for a genome in the store, packages it, and publishes
    /// it as a report in `result_workspace_name`.
    pub fn browse_genome_app(
        &self,
        params: Option<&BrowseGenomeParams>,
    ) -> Result<BrowseGenomeResults> {
        let params = params.ok_or_else(|| Error::invalid("missing all parameters"))?;
        info!("browse_genome_app: {params:?}");

        let workspace_name = match &params.result_workspace_name {
            None | Some(Value::Null) => {
                return Err(Error::invalid("result_workspace_name must be provided"))
            }
            Some(name) => name,
        };

        let workspace_name = match workspace_name.as_str() {
            Some(name)
                if validate::validate_workspace_name(
                    self.services.workspace.as_ref(),
                    workspace_name,
                ) =>
            {
                name
            }
            _ => {
                return Err(Error::invalid(
                    "result_workspace_name is not a valid workspace",
                ))
            }
        };

        let genome_ref = self.check_genome_ref(params.genome_ref.as_deref())?;

        let alignment_refs = params
            .alignment_refs
            .iter()
            .flatten()
            .map(|alignment_ref| {
                alignment_ref.parse::<ObjectRef>().map_err(|_| {
                    Error::invalid(
                        "all alignment_refs must be a reference of the format ws/oid or \
                         ws/oid/ver",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let genome = acquire::acquire_genome_files(&self.services, &genome_ref)?;
        let alignments = acquire::acquire_alignment_files(&self.services, &alignment_refs)?;

        let browser_dir = self.build(
            &genome,
            &alignments,
            &self.scratch(unique::name(BROWSE_OUTPUT_PREFIX)),
        )?;

        let report = Emitter::new(
            self.services.archiver.as_ref(),
            self.services.reports.as_ref(),
        )
        .emit(&browser_dir, &genome_ref, workspace_name)?;

        info!("browse_genome_app: created report {}", report.name);

        Ok(BrowseGenomeResults {
            report_name: report.name,
            report_ref: report.reference,
            genome_ref: genome_ref.to_string(),
        })
    }

    /// Builds a browser from a genome and alignments given either by
    /// reference or as local files, and packages it in the scratch directory.
    pub fn build_genome_browser(
        &self,
        params: &BuildGenomeBrowserParams,
    ) -> Result<BuildGenomeBrowserResults> {
        info!("build_genome_browser: {params:?}");

        let request = params.reconcile().map_err(|errors| {
            for err in &errors {
                error!("{err}");
            }

            Error::Validation(errors)
        })?;

        let name = request
            .name
            .unwrap_or_else(|| unique::name(REPORT_NAME_PREFIX));

        let genome = match request.genome {
            GenomeInput::Reference(genome_ref) => {
                acquire::acquire_genome_files(&self.services, &genome_ref)?
            }
            GenomeInput::Files { gff, fasta } => GenomeFiles { fasta, gff },
        };

        let alignments = acquire::acquire_alignments(&self.services, &request.alignments)?;

        let browser_dir = self.build(
            &genome,
            &alignments,
            &self.scratch(unique::name(BUILD_OUTPUT_PREFIX)),
        )?;

        Ok(BuildGenomeBrowserResults {
            browser_dir,
            genome_browser_name: name,
        })
    }

    /// Checks that `genome_ref` is present, well formed, and names a genome.
    fn check_genome_ref(&self, genome_ref: Option<&str>) -> Result<ObjectRef> {
        let genome_ref = genome_ref
            .filter(|genome_ref| !genome_ref.is_empty())
            .ok_or_else(|| Error::invalid("genome_ref parameter is required"))?;

        let genome_ref = genome_ref.parse::<ObjectRef>().map_err(|_| {
            Error::invalid("genome_ref must be a reference of the format ws/oid or ws/oid/ver")
        })?;

        if !validate::validate_reference_type(
            self.services.workspace.as_ref(),
            &genome_ref,
            validate::GENOME_TYPES,
        )? {
            return Err(Error::invalid(
                "genome_ref must reference a KBaseGenomes.Genome object",
            ));
        }

        Ok(genome_ref)
    }

    /// Gets a path within the scratch directory.
    fn scratch(&self, name: String) -> PathBuf {
        self.config.scratch_dir().join(name)
    }

    /// Builds the tracks for a genome and its alignments and packages them
    /// into `output_dir`.
    fn build(
        &self,
        genome: &GenomeFiles,
        alignments: &[AlignmentFile],
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let data_dir = self.scratch(unique::name(DATA_DIR_PREFIX));
        let tools = Tools::from(&self.config);

        let data = Pipeline::new(genome, alignments).run(&tools, &data_dir)?;
        info!("tracks: finished building {}", data.data_dir.display());

        Ok(Packager::new(self.config.jbrowse_dir()).package(&data.data_dir, output_dir)?)
    }
}
