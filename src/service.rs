//! The external services this crate collaborates with.
//!
//! Each collaborator is described by a trait so that the pipeline can be run
//! against the real JSON-RPC services ([`client::Client`] and the wrappers in
//! [`workspace`] and [`sdk`]) or against in-process stand-ins.
//!
//! Response types keep the fields the pipeline depends on as [`Option`]s. A
//! service that answers successfully but omits one of those fields has broken
//! its contract, and it is up to the caller (see [`crate::acquire`]) to turn
//! that into a descriptive error.

pub mod client;
pub mod sdk;
pub mod workspace;

use std::path::Path;
use std::path::PathBuf;

pub use client::Client;
pub use client::Error;
use serde::Deserialize;
use serde::Serialize;

use crate::ObjectRef;
use crate::config::Config;

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Object store
////////////////////////////////////////////////////////////////////////////////////////

/// Metadata about a single object in the store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectInfo {
    /// The display name of the object.
    name: String,

    /// The fully qualified, versioned type name (e.g.,
    /// `KBaseGenomes.Genome-8.0`).
    type_name: String,

    /// The resolved reference path the store used to reach the object.
    path: Vec<String>,
}

impl ObjectInfo {
    /// Creates a new [`ObjectInfo`].
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            path,
        }
    }

    /// Gets the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Gets the resolved reference path.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

/// The workspace object store.
pub trait ObjectStore {
    /// Gets the references an object holds to other objects (without fetching
    /// the object's data).
    fn get_object_refs(&self, reference: &ObjectRef) -> Result<Vec<String>>;

    /// Gets the metadata for each of `references`, in order.
    fn get_object_info(&self, references: &[String]) -> Result<Vec<ObjectInfo>>;

    /// Resolves a workspace by name, failing if it does not exist or is not
    /// accessible.
    fn get_workspace_info(&self, name: &str) -> Result<()>;
}

////////////////////////////////////////////////////////////////////////////////////////
// Format conversion and downloads
////////////////////////////////////////////////////////////////////////////////////////

/// The result of exporting a genome as GFF.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GffFile {
    /// The path to the exported file.
    pub file_path: Option<PathBuf>,
}

/// The result of exporting an assembly as FASTA.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FastaFile {
    /// The path to the exported file.
    pub path: Option<PathBuf>,
}

/// The result of downloading an alignment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AlignmentDownload {
    /// The directory the alignment files were written to.
    pub destination_dir: Option<PathBuf>,
}

/// Exports genome annotations.
pub trait GenomeConverter {
    /// Exports the annotations of a genome as a GFF file.
    fn genome_to_gff(&self, genome_ref: &ObjectRef) -> Result<GffFile>;
}

/// Exports assembly sequences.
pub trait AssemblyConverter {
    /// Exports the sequences of an assembly (or contig set) as a FASTA file.
    fn assembly_to_fasta(&self, assembly_ref: &ObjectRef) -> Result<FastaFile>;
}

/// Downloads read alignments.
pub trait AlignmentDownloader {
    /// Downloads an alignment as a BAM file into a local directory.
    fn download_alignment(&self, alignment_ref: &ObjectRef) -> Result<AlignmentDownload>;
}

////////////////////////////////////////////////////////////////////////////////////////
// Archiving and reporting
////////////////////////////////////////////////////////////////////////////////////////

/// A directory archived to blob storage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ArchivedFile {
    /// The blob storage id.
    pub shock_id: String,
}

/// Archives files to blob storage.
pub trait BlobArchiver {
    /// Zips a directory and uploads the archive.
    fn archive_directory(&self, path: &Path) -> Result<ArchivedFile>;
}

/// A link from a report to an archived HTML bundle.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HtmlLink {
    /// The blob storage id of the archive.
    pub shock_id: String,

    /// The file within the archive to open.
    pub name: String,

    /// A description of the link.
    pub description: String,
}

/// A request to create a report.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReportParams {
    /// The message displayed with the report.
    pub message: String,

    /// The index of the HTML link to show directly.
    pub direct_html_link_index: usize,

    /// The HTML links.
    pub html_links: Vec<HtmlLink>,

    /// The name of the report object.
    pub report_object_name: String,

    /// The workspace the report is saved to.
    pub workspace_name: String,
}

/// A saved report.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReportInfo {
    /// The name of the report object.
    pub name: String,

    /// The reference to the report object.
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Creates reports.
pub trait ReportService {
    /// Creates and saves a report.
    fn create_extended_report(&self, params: &ReportParams) -> Result<ReportInfo>;
}

////////////////////////////////////////////////////////////////////////////////////////
// Services
////////////////////////////////////////////////////////////////////////////////////////

/// The full set of collaborators used by the service.
#[allow(missing_debug_implementations)]
pub struct Services {
    /// The workspace object store.
    pub workspace: Box<dyn ObjectStore>,

    /// The genome exporter.
    pub genomes: Box<dyn GenomeConverter>,

    /// The assembly exporter.
    pub assemblies: Box<dyn AssemblyConverter>,

    /// The alignment downloader.
    pub alignments: Box<dyn AlignmentDownloader>,

    /// The blob archiver.
    pub archiver: Box<dyn BlobArchiver>,

    /// The report service.
    pub reports: Box<dyn ReportService>,
}

impl Services {
    /// Connects to the JSON-RPC services named in `config`.
    pub fn try_from_config(config: &Config) -> Result<Self> {
        let token = config.token().map(String::from);
        let callback = |service_ver: Option<&str>| {
            let client = Client::try_new(config.callback_url(), token.clone())?;
            Ok::<_, Error>(match service_ver {
                Some(version) => client.with_service_version(version),
                None => client,
            })
        };

        Ok(Self {
            workspace: Box::new(workspace::Workspace::new(Client::try_new(
                config.workspace_url(),
                token.clone(),
            )?)),
            genomes: Box::new(sdk::GenomeFileUtil::new(callback(None)?)),
            assemblies: Box::new(sdk::AssemblyUtil::new(callback(None)?)),
            alignments: Box::new(sdk::ReadsAlignmentUtils::new(callback(Some(
                sdk::ALIGNMENT_SERVICE_VERSION,
            ))?)),
            archiver: Box::new(sdk::DataFileUtil::new(callback(None)?)),
            reports: Box::new(sdk::KBaseReport::new(callback(None)?)),
        })
    }
}
