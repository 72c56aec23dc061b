//! Clients for the SDK services reached through the callback endpoint.

use std::path::Path;

use serde_json::json;

use crate::ObjectRef;
use crate::service::AlignmentDownload;
use crate::service::AlignmentDownloader;
use crate::service::ArchivedFile;
use crate::service::AssemblyConverter;
use crate::service::BlobArchiver;
use crate::service::Client;
use crate::service::FastaFile;
use crate::service::GenomeConverter;
use crate::service::GffFile;
use crate::service::ReportInfo;
use crate::service::ReportParams;
use crate::service::ReportService;
use crate::service::Result;

/// The release of the alignment service that supports downloads.
pub const ALIGNMENT_SERVICE_VERSION: &str = "dev";

/// The genome file utility service.
#[derive(Clone, Debug)]
pub struct GenomeFileUtil(Client);

impl GenomeFileUtil {
    /// Creates a new client.
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

impl GenomeConverter for GenomeFileUtil {
    fn genome_to_gff(&self, genome_ref: &ObjectRef) -> Result<GffFile> {
        self.0.call(
            "GenomeFileUtil.genome_to_gff",
            &json!({ "genome_ref": genome_ref.to_string() }),
        )
    }
}

/// The assembly utility service.
#[derive(Clone, Debug)]
pub struct AssemblyUtil(Client);

impl AssemblyUtil {
    /// Creates a new client.
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

impl AssemblyConverter for AssemblyUtil {
    fn assembly_to_fasta(&self, assembly_ref: &ObjectRef) -> Result<FastaFile> {
        self.0.call(
            "AssemblyUtil.get_assembly_as_fasta",
            &json!({ "ref": assembly_ref.to_string() }),
        )
    }
}

/// The reads alignment utility service.
#[derive(Clone, Debug)]
pub struct ReadsAlignmentUtils(Client);

impl ReadsAlignmentUtils {
    /// Creates a new client.
    ///
    /// The client should request [`ALIGNMENT_SERVICE_VERSION`].
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

impl AlignmentDownloader for ReadsAlignmentUtils {
    fn download_alignment(&self, alignment_ref: &ObjectRef) -> Result<AlignmentDownload> {
        // The index is rebuilt locally, so it is never downloaded.
        self.0.call(
            "ReadsAlignmentUtils.download_alignment",
            &json!({
                "source_ref": alignment_ref.to_string(),
                "downloadBAI": 0
            }),
        )
    }
}

/// The data file utility service.
#[derive(Clone, Debug)]
pub struct DataFileUtil(Client);

impl DataFileUtil {
    /// Creates a new client.
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

impl BlobArchiver for DataFileUtil {
    fn archive_directory(&self, path: &Path) -> Result<ArchivedFile> {
        self.0.call(
            "DataFileUtil.file_to_shock",
            &json!({
                "file_path": path.to_string_lossy(),
                "make_handle": 0,
                "pack": "zip"
            }),
        )
    }
}

/// The report service.
#[derive(Clone, Debug)]
pub struct KBaseReport(Client);

impl KBaseReport {
    /// Creates a new client.
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

impl ReportService for KBaseReport {
    fn create_extended_report(&self, params: &ReportParams) -> Result<ReportInfo> {
        self.0.call("KBaseReport.create_extended_report", params)
    }
}
