//! Acquiring the local files a browser is built from.
//!
//! Nothing in this module parses genomic data. Genomes, assemblies, and
//! alignments are exported to local files by the external services in
//! [`crate::service`]; this module asks for those exports, checks that the
//! answers hold up their end of the contract, and hands back paths.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::ObjectRef;
use crate::params::AlignmentInput;
use crate::reference;
use crate::service;
use crate::service::ObjectStore;
use crate::service::Services;

/// The type fragments recognized as sequence containers.
pub const SEQUENCE_CONTAINER_TYPES: &[&str] =
    &["KBaseGenomeAnnotations.Assembly", "KBaseGenomes.ContigSet"];

/// The extension of BAM files in an alignment download.
pub const BAM_EXTENSION: &str = ".bam";

/// The prefix of names given to alignments supplied as local files.
pub const LOCAL_ALIGNMENT_PREFIX: &str = "alignment_";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to acquiring files.
#[derive(Debug)]
pub enum Error {
    /// A service call failed.
    Service(service::Error),

    /// The genome does not reference a sequence container.
    NoAssembly(ObjectRef),

    /// The genome references more than one sequence container.
    MultipleAssemblies(ObjectRef, Vec<String>),

    /// The store returned a path that is not a valid reference.
    InvalidPath(Vec<String>, reference::ParseError),

    /// A service answered without a field it is required to return.
    MissingField {
        /// The service method.
        method: &'static str,

        /// The missing field.
        field: &'static str,
    },

    /// An alignment download did not contain a BAM file.
    NoBamFile(PathBuf),

    /// Two alignments resolved to the same display name.
    DuplicateAlignmentName(String),

    /// An I/O error.
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Service(err) => write!(f, "service error: {err}"),
            Error::NoAssembly(genome_ref) => write!(
                f,
                "there was no Assembly or ContigSet found as a reference to genome `{genome_ref}`"
            ),
            Error::MultipleAssemblies(genome_ref, refs) => write!(
                f,
                "genome `{genome_ref}` references {} Assemblies or ContigSets: {}",
                refs.len(),
                refs.join(", ")
            ),
            Error::InvalidPath(path, err) => {
                write!(f, "invalid reference path `{}`: {err}", path.join(";"))
            }
            Error::MissingField { method, field } => {
                write!(f, "the response from `{method}` is missing `{field}`")
            }
            Error::NoBamFile(dir) => {
                write!(f, "no BAM file found in alignment download `{}`", dir.display())
            }
            Error::DuplicateAlignmentName(name) => {
                write!(f, "more than one alignment is named `{name}`")
            }
            Error::Io(path, err) => write!(f, "i/o error at `{}`: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

impl From<service::Error> for Error {
    fn from(err: service::Error) -> Self {
        Error::Service(err)
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Acquired files
////////////////////////////////////////////////////////////////////////////////////////

/// The local files for a genome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenomeFiles {
    /// The FASTA file of reference sequences.
    pub fasta: PathBuf,

    /// The GFF file of feature annotations.
    pub gff: PathBuf,
}

/// A local alignment file and the label its track is shown under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignmentFile {
    /// The track label.
    pub name: String,

    /// The BAM file.
    pub path: PathBuf,
}

////////////////////////////////////////////////////////////////////////////////////////
// Lookups
////////////////////////////////////////////////////////////////////////////////////////

/// Resolves the single assembly (or legacy contig set) a genome references.
///
/// The reference is returned as the full path the store resolved it through,
/// so that an assembly only reachable via the genome stays reachable.
pub fn resolve_assembly_ref(store: &dyn ObjectStore, genome_ref: &ObjectRef) -> Result<ObjectRef> {
    let refs = store.get_object_refs(genome_ref)?;

    let infos = match refs.is_empty() {
        true => Vec::new(),
        false => store.get_object_info(&refs)?,
    };

    let mut paths = infos
        .into_iter()
        .filter(|info| {
            SEQUENCE_CONTAINER_TYPES
                .iter()
                .any(|fragment| info.type_name().contains(fragment))
        })
        .map(|info| info.path().to_vec())
        .collect::<Vec<_>>();

    match paths.len() {
        0 => Err(Error::NoAssembly(genome_ref.clone())),
        1 => {
            let path = paths.remove(0);
            ObjectRef::try_from_path(&path).map_err(|err| Error::InvalidPath(path, err))
        }
        _ => Err(Error::MultipleAssemblies(
            genome_ref.clone(),
            paths.iter().map(|path| path.join(";")).collect(),
        )),
    }
}

/// Gets the display name of an object.
pub fn object_name(store: &dyn ObjectStore, reference: &ObjectRef) -> Result<String> {
    store
        .get_object_info(&[reference.to_string()])?
        .into_iter()
        .next()
        .map(|info| info.name().to_string())
        .ok_or(Error::MissingField {
            method: "Workspace.get_object_info3",
            field: "infos",
        })
}

////////////////////////////////////////////////////////////////////////////////////////
// Genome files
////////////////////////////////////////////////////////////////////////////////////////

/// Exports a genome's sequences as FASTA and its annotations as GFF.
pub fn acquire_genome_files(services: &Services, genome_ref: &ObjectRef) -> Result<GenomeFiles> {
    info!("genome: resolving the assembly of {genome_ref}");
    let assembly_ref = resolve_assembly_ref(services.workspace.as_ref(), genome_ref)?;
    info!("genome: found assembly {assembly_ref}");

    info!("genome: converting sequence data to FASTA");
    let fasta = services
        .assemblies
        .assembly_to_fasta(&assembly_ref)?
        .path
        .ok_or(Error::MissingField {
            method: "AssemblyUtil.get_assembly_as_fasta",
            field: "path",
        })?;
    info!("genome: FASTA file created: {}", fasta.display());

    info!("genome: converting annotation data to GFF");
    let gff = services
        .genomes
        .genome_to_gff(genome_ref)?
        .file_path
        .ok_or(Error::MissingField {
            method: "GenomeFileUtil.genome_to_gff",
            field: "file_path",
        })?;
    info!("genome: GFF file created: {}", gff.display());

    Ok(GenomeFiles { fasta, gff })
}

////////////////////////////////////////////////////////////////////////////////////////
// Alignment files
////////////////////////////////////////////////////////////////////////////////////////

/// Finds the BAM file within an alignment download directory.
///
/// The lexicographically first `*.bam` entry wins.
fn find_bam_file(dir: &Path) -> Result<PathBuf> {
    let mut candidates = std::fs::read_dir(dir)
        .map_err(|err| Error::Io(dir.to_path_buf(), err))?
        .map(|entry| {
            entry
                .map(|entry| entry.path())
                .map_err(|err| Error::Io(dir.to_path_buf(), err))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(BAM_EXTENSION))
        })
        .collect::<Vec<_>>();

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoBamFile(dir.to_path_buf()))
}

/// Downloads a single alignment and returns its display name and BAM file.
fn download_alignment(services: &Services, alignment_ref: &ObjectRef) -> Result<AlignmentFile> {
    let name = object_name(services.workspace.as_ref(), alignment_ref)?;

    info!("alignment: downloading {alignment_ref} ({name})");
    let dir = services
        .alignments
        .download_alignment(alignment_ref)?
        .destination_dir
        .ok_or(Error::MissingField {
            method: "ReadsAlignmentUtils.download_alignment",
            field: "destination_dir",
        })?;

    let path = find_bam_file(&dir)?;
    info!("alignment: BAM file for {name}: {}", path.display());

    Ok(AlignmentFile { name, path })
}

/// Downloads every alignment in `alignment_refs`, in order.
///
/// Alignments are labelled by their display names in the store, and labels
/// must be unique within a browser, so two alignments that share a name are
/// rejected.
pub fn acquire_alignment_files(
    services: &Services,
    alignment_refs: &[ObjectRef],
) -> Result<Vec<AlignmentFile>> {
    let inputs = alignment_refs
        .iter()
        .cloned()
        .map(AlignmentInput::Reference)
        .collect::<Vec<_>>();

    acquire_alignments(services, &inputs)
}

/// Resolves every alignment input, in order.
///
/// Referenced alignments are downloaded and labelled by their display names;
/// local BAM files are labelled `alignment_<index>` by their position in
/// `inputs`.
pub fn acquire_alignments(
    services: &Services,
    inputs: &[AlignmentInput],
) -> Result<Vec<AlignmentFile>> {
    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let file = match input {
            AlignmentInput::Reference(alignment_ref) => download_alignment(services, alignment_ref)?,
            AlignmentInput::BamFile(path) => AlignmentFile {
                name: format!("{LOCAL_ALIGNMENT_PREFIX}{i}"),
                path: path.clone(),
            },
        };

        if !seen.insert(file.name.clone()) {
            return Err(Error::DuplicateAlignmentName(file.name));
        }

        files.push(file);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;
    use crate::testing::StubCallback;
    use crate::testing::StubStore;
    use crate::testing::services;

    /// A store holding a genome linked to the given `(ref, type)` objects.
    fn store_with_links(links: &[(&str, &str)]) -> StubStore {
        let mut store = StubStore::default().with_object("1/2/3", "genome", "KBaseGenomes.Genome-8.0");

        for (reference, type_name) in links {
            store = store.with_object(reference, "linked", type_name);
        }

        store.with_links(
            "1/2/3",
            links.iter().map(|(reference, _)| reference.to_string()).collect(),
        )
    }

    #[test]
    fn resolves_a_single_assembly() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let store = store_with_links(&[
            ("1/4/1", "KBaseGenomeAnnotations.Assembly-6.0"),
            ("1/5/1", "KBaseGenomes.Taxon-1.0"),
        ])
        .with_path("1/4/1", &["1/2/3", "1/4/1"]);

        let assembly_ref = resolve_assembly_ref(&store, &"1/2/3".parse()?)?;
        assert_eq!(assembly_ref.to_string(), "1/2/3;1/4/1");

        Ok(())
    }

    #[test]
    fn resolves_a_legacy_contig_set() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let store = store_with_links(&[("1/6/2", "KBaseGenomes.ContigSet-3.0")]);
        let assembly_ref = resolve_assembly_ref(&store, &"1/2/3".parse()?)?;
        assert_eq!(assembly_ref.to_string(), "1/6/2");
        Ok(())
    }

    #[test]
    fn rejects_genomes_without_an_assembly() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let store = store_with_links(&[("1/5/1", "KBaseGenomes.Taxon-1.0")]);
        let err = resolve_assembly_ref(&store, &"1/2/3".parse()?).unwrap_err();
        assert!(matches!(err, Error::NoAssembly(_)));

        let store = store_with_links(&[]);
        let err = resolve_assembly_ref(&store, &"1/2/3".parse()?).unwrap_err();
        assert!(matches!(err, Error::NoAssembly(_)));

        Ok(())
    }

    #[test]
    fn rejects_genomes_with_many_assemblies() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let store = store_with_links(&[
            ("1/4/1", "KBaseGenomeAnnotations.Assembly-6.0"),
            ("1/6/2", "KBaseGenomes.ContigSet-3.0"),
        ]);

        let err = resolve_assembly_ref(&store, &"1/2/3".parse()?).unwrap_err();
        assert_eq!(
            err.to_string(),
            "genome `1/2/3` references 2 Assemblies or ContigSets: 1/4/1, 1/6/2"
        );

        Ok(())
    }

    #[test]
    fn genome_files() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let store = store_with_links(&[("1/4/1", "KBaseGenomeAnnotations.Assembly-6.0")]);
        let callback = StubCallback::default()
            .with_gff("/scratch/genome.gff")
            .with_fasta("/scratch/assembly.fa");

        let files = acquire_genome_files(&services(store, callback), &"1/2/3".parse()?)?;
        assert_eq!(
            files,
            GenomeFiles {
                fasta: PathBuf::from("/scratch/assembly.fa"),
                gff: PathBuf::from("/scratch/genome.gff"),
            }
        );

        Ok(())
    }

    #[test]
    fn genome_files_with_missing_fields() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let store = store_with_links(&[("1/4/1", "KBaseGenomeAnnotations.Assembly-6.0")]);

        let callback = StubCallback::default().with_gff("/scratch/genome.gff");
        let err = acquire_genome_files(&services(store.clone(), callback), &"1/2/3".parse()?)
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "path", .. }));

        let callback = StubCallback::default().with_fasta("/scratch/assembly.fa");
        let err = acquire_genome_files(&services(store, callback), &"1/2/3".parse()?).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField {
                field: "file_path",
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn alignment_files() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("alignments")?;

        let first = tmp.path().join("first");
        fs::create_dir(&first)?;
        fs::write(first.join("reads.bam"), b"")?;
        fs::write(first.join("reads.bam.bai"), b"")?;

        let second = tmp.path().join("second");
        fs::create_dir(&second)?;
        fs::write(second.join("b.bam"), b"")?;
        fs::write(second.join("a.bam"), b"")?;

        let store = StubStore::default()
            .with_object("1/7/1", "wt_rep1", "KBaseRNASeq.RNASeqAlignment-4.0")
            .with_object("1/8/1", "wt_rep2", "KBaseRNASeq.RNASeqAlignment-4.0");
        let callback = StubCallback::default()
            .with_download("1/7/1", &first)
            .with_download("1/8/1", &second);

        let files = acquire_alignment_files(
            &services(store, callback),
            &["1/7/1".parse()?, "1/8/1".parse()?],
        )?;

        assert_eq!(
            files,
            vec![
                AlignmentFile {
                    name: String::from("wt_rep1"),
                    path: first.join("reads.bam"),
                },
                AlignmentFile {
                    name: String::from("wt_rep2"),
                    path: second.join("a.bam"),
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn alignment_download_without_a_bam() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("alignments")?;
        fs::write(tmp.path().join("reads.sam"), b"")?;

        let store = StubStore::default().with_object("1/7/1", "wt", "KBaseRNASeq.RNASeqAlignment-4.0");
        let callback = StubCallback::default().with_download("1/7/1", tmp.path());

        let err = acquire_alignment_files(&services(store, callback), &["1/7/1".parse()?])
            .unwrap_err();
        assert!(matches!(err, Error::NoBamFile(_)));

        Ok(())
    }

    #[test]
    fn duplicate_alignment_names() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("alignments")?;
        fs::write(tmp.path().join("reads.bam"), b"")?;

        let store = StubStore::default()
            .with_object("1/7/1", "same", "KBaseRNASeq.RNASeqAlignment-4.0")
            .with_object("2/7/1", "same", "KBaseRNASeq.RNASeqAlignment-4.0");
        let callback = StubCallback::default()
            .with_download("1/7/1", tmp.path())
            .with_download("2/7/1", tmp.path());

        let err = acquire_alignment_files(
            &services(store, callback),
            &["1/7/1".parse()?, "2/7/1".parse()?],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "more than one alignment is named `same`");

        Ok(())
    }

    #[test]
    fn local_alignments_are_numbered() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let files = acquire_alignments(
            &services(StubStore::default(), StubCallback::default()),
            &[
                AlignmentInput::BamFile(PathBuf::from("/data/a.bam")),
                AlignmentInput::BamFile(PathBuf::from("/data/b.bam")),
            ],
        )?;

        let names = files.iter().map(|file| file.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["alignment_0", "alignment_1"]);

        Ok(())
    }
}
