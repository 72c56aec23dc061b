//! Stand-ins for the external services and tools, for use in tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt as _;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::OnceLock;

use tempdir::TempDir;

use crate::Config;
use crate::ObjectRef;
use crate::package;
use crate::service;
use crate::service::AlignmentDownload;
use crate::service::AlignmentDownloader;
use crate::service::ArchivedFile;
use crate::service::AssemblyConverter;
use crate::service::BlobArchiver;
use crate::service::FastaFile;
use crate::service::GenomeConverter;
use crate::service::GffFile;
use crate::service::ObjectInfo;
use crate::service::ObjectStore;
use crate::service::ReportInfo;
use crate::service::ReportParams;
use crate::service::ReportService;
use crate::service::Services;

/// The blob id handed out by [`StubCallback`].
pub const SHOCK_ID: &str = "0b1c2d3e-shock";

/// The reference handed out for reports by [`StubCallback`].
pub const REPORT_REF: &str = "1/99/1";

/// The log file the stand-in tools append their invocations to (within the
/// directory they write into).
pub const CALLS_LOG: &str = "calls.log";

/// Builds the "not found" error the stand-ins return.
fn not_found(method: &str, what: &str) -> service::Error {
    service::Error::Rpc {
        method: method.to_string(),
        name: String::from("JSONRPCError"),
        code: -32500,
        message: format!("{what} does not exist or is inaccessible"),
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Object store
////////////////////////////////////////////////////////////////////////////////////////

/// An in-memory object store.
#[derive(Clone, Debug, Default)]
pub struct StubStore {
    /// Object infos by reference.
    objects: HashMap<String, ObjectInfo>,

    /// Outgoing references by object reference.
    links: HashMap<String, Vec<String>>,

    /// Existing workspaces.
    workspaces: HashSet<String>,
}

impl StubStore {
    /// Adds an object reached directly by `reference`.
    pub fn with_object(mut self, reference: &str, name: &str, type_name: &str) -> Self {
        self.objects.insert(
            reference.to_string(),
            ObjectInfo::new(name, type_name, vec![reference.to_string()]),
        );
        self
    }

    /// Overrides the path the store reports for `reference`.
    pub fn with_path(mut self, reference: &str, path: &[&str]) -> Self {
        if let Some(info) = self.objects.get_mut(reference) {
            *info = ObjectInfo::new(
                info.name(),
                info.type_name(),
                path.iter().map(|step| step.to_string()).collect(),
            );
        }
        self
    }

    /// Sets the outgoing references of `reference`.
    pub fn with_links(mut self, reference: &str, refs: Vec<String>) -> Self {
        self.links.insert(reference.to_string(), refs);
        self
    }

    /// Adds a workspace.
    pub fn with_workspace(mut self, name: &str) -> Self {
        self.workspaces.insert(name.to_string());
        self
    }
}

impl ObjectStore for StubStore {
    fn get_object_refs(&self, reference: &ObjectRef) -> service::Result<Vec<String>> {
        let key = reference.to_string();

        if !self.objects.contains_key(&key) {
            return Err(not_found("Workspace.get_objects2", &key));
        }

        Ok(self.links.get(&key).cloned().unwrap_or_default())
    }

    fn get_object_info(&self, references: &[String]) -> service::Result<Vec<ObjectInfo>> {
        references
            .iter()
            .map(|reference| {
                self.objects
                    .get(reference)
                    .cloned()
                    .ok_or_else(|| not_found("Workspace.get_object_info3", reference))
            })
            .collect()
    }

    fn get_workspace_info(&self, name: &str) -> service::Result<()> {
        match self.workspaces.contains(name) {
            true => Ok(()),
            false => Err(not_found("Workspace.get_workspace_info", name)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Callback services
////////////////////////////////////////////////////////////////////////////////////////

/// In-process stand-ins for every callback service.
///
/// Clones share the recorded archives and reports.
#[derive(Clone, Debug, Default)]
pub struct StubCallback {
    /// The GFF path returned for any genome.
    gff: Option<PathBuf>,

    /// The FASTA path returned for any assembly.
    fasta: Option<PathBuf>,

    /// Download directories by alignment reference.
    downloads: HashMap<String, PathBuf>,

    /// Every archived directory.
    archived: Rc<RefCell<Vec<PathBuf>>>,

    /// Every created report.
    reports: Rc<RefCell<Vec<ReportParams>>>,
}

impl StubCallback {
    /// Sets the GFF path returned for genomes.
    pub fn with_gff(mut self, path: impl Into<PathBuf>) -> Self {
        self.gff = Some(path.into());
        self
    }

    /// Sets the FASTA path returned for assemblies.
    pub fn with_fasta(mut self, path: impl Into<PathBuf>) -> Self {
        self.fasta = Some(path.into());
        self
    }

    /// Sets the download directory for an alignment.
    pub fn with_download(mut self, reference: &str, dir: &Path) -> Self {
        self.downloads
            .insert(reference.to_string(), dir.to_path_buf());
        self
    }

    /// Gets every archived directory.
    pub fn archived(&self) -> Vec<PathBuf> {
        self.archived.borrow().clone()
    }

    /// Gets every created report.
    pub fn reports(&self) -> Vec<ReportParams> {
        self.reports.borrow().clone()
    }
}

impl GenomeConverter for StubCallback {
    fn genome_to_gff(&self, _: &ObjectRef) -> service::Result<GffFile> {
        Ok(GffFile {
            file_path: self.gff.clone(),
        })
    }
}

impl AssemblyConverter for StubCallback {
    fn assembly_to_fasta(&self, _: &ObjectRef) -> service::Result<FastaFile> {
        Ok(FastaFile {
            path: self.fasta.clone(),
        })
    }
}

impl AlignmentDownloader for StubCallback {
    fn download_alignment(&self, alignment_ref: &ObjectRef) -> service::Result<AlignmentDownload> {
        let key = alignment_ref.to_string();

        self.downloads
            .get(&key)
            .map(|dir| AlignmentDownload {
                destination_dir: Some(dir.clone()),
            })
            .ok_or_else(|| not_found("ReadsAlignmentUtils.download_alignment", &key))
    }
}

impl BlobArchiver for StubCallback {
    fn archive_directory(&self, path: &Path) -> service::Result<ArchivedFile> {
        self.archived.borrow_mut().push(path.to_path_buf());

        Ok(ArchivedFile {
            shock_id: SHOCK_ID.to_string(),
        })
    }
}

impl ReportService for StubCallback {
    fn create_extended_report(&self, params: &ReportParams) -> service::Result<ReportInfo> {
        self.reports.borrow_mut().push(params.clone());

        Ok(ReportInfo {
            name: params.report_object_name.clone(),
            reference: REPORT_REF.to_string(),
        })
    }
}

/// Assembles [`Services`] from the stand-ins.
pub fn services(store: StubStore, callback: StubCallback) -> Services {
    Services {
        workspace: Box::new(store),
        genomes: Box::new(callback.clone()),
        assemblies: Box::new(callback.clone()),
        alignments: Box::new(callback.clone()),
        archiver: Box::new(callback.clone()),
        reports: Box::new(callback),
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Command-line tools
////////////////////////////////////////////////////////////////////////////////////////

/// `prepare-refseqs.pl --fasta <fasta> --out <dir>`.
const PREPARE_REFSEQS: &str = r#"#!/bin/sh
case "$2" in *broken*) exit 3 ;; esac
mkdir -p "$4/seq"
echo "prepare-refseqs.pl $2" >> "$4/calls.log"
"#;

/// `flatfile-to-json.pl --gff <gff> --trackLabel <label> --trackType <type> --out <dir>`.
const FLATFILE_TO_JSON: &str = r#"#!/bin/sh
case "$2" in *broken*) exit 4 ;; esac
echo '{"tracks": []}' > "$8/trackList.json"
echo "flatfile-to-json.pl $2 $4 $6" >> "$8/calls.log"
"#;

/// `samtools index <bam> <bai>`.
const SAMTOOLS: &str = r#"#!/bin/sh
case "$2" in *broken*) exit 5 ;; esac
touch "$3"
echo "samtools $1 $(basename "$2") $(basename "$3")" >> "$(dirname "$2")/calls.log"
"#;

/// `add-bam-track.pl --label <label> --bam_url <url> --in <trackList.json>`.
const ADD_BAM_TRACK: &str = r#"#!/bin/sh
case "$2" in *broken*) exit 6 ;; esac
echo "add-bam-track.pl $2 $4" >> "$(dirname "$6")/calls.log"
"#;

/// The stand-in JBrowse installation, built once per test run.
static JBROWSE: OnceLock<PathBuf> = OnceLock::new();

/// Writes an executable script.
fn write_script(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

/// Builds a JBrowse installation holding stand-in converter scripts and the
/// full static asset manifest (including the helper subtree that packaging
/// prunes).
fn build_jbrowse() -> io::Result<PathBuf> {
    let root = TempDir::new("jbrowse")?.into_path();

    let bin = root.join("bin");
    fs::create_dir_all(&bin)?;
    write_script(&bin.join("prepare-refseqs.pl"), PREPARE_REFSEQS)?;
    write_script(&bin.join("flatfile-to-json.pl"), FLATFILE_TO_JSON)?;
    write_script(&bin.join("add-bam-track.pl"), ADD_BAM_TRACK)?;
    write_script(&root.join("samtools"), SAMTOOLS)?;

    for dir in package::STATIC_DIRS {
        fs::create_dir_all(root.join(dir))?;
        fs::write(root.join(dir).join("README"), dir)?;
    }

    fs::create_dir_all(root.join("src").join("JBrowse"))?;
    fs::write(root.join("src").join("JBrowse").join("Browser.js"), "// browser")?;
    fs::create_dir_all(root.join("src").join("util"))?;
    fs::write(root.join("src").join("util").join("helper.pl"), "# helper")?;

    for file in package::STATIC_FILES {
        fs::write(root.join(file), file)?;
    }

    Ok(root)
}

/// Gets the stand-in JBrowse installation.
pub fn jbrowse_dir() -> &'static Path {
    JBROWSE.get_or_init(|| build_jbrowse().expect("stand-in JBrowse installation to build"))
}

/// Gets a configuration that runs the stand-in tools and writes into
/// `scratch_dir`.
pub fn config(scratch_dir: &Path) -> Config {
    Config::new("http://localhost:9999", "http://localhost:9998", scratch_dir)
        .with_jbrowse_dir(jbrowse_dir())
        .with_samtools(jbrowse_dir().join("samtools"))
}

/// Reads the tool invocations logged into `dir`.
pub fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(CALLS_LOG))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
