//! The individual stages of building browser tracks.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use tracing::info;

use crate::track::Error;
use crate::track::FEATURE_TRACK_LABEL;
use crate::track::FEATURE_TRACK_TYPE;
use crate::track::Result;
use crate::track::TRACK_LIST;
use crate::track::Tools;

/// A stage of track building.
///
/// Every stage writes into the same output directory. Stages run in order and
/// the first failure stops the pipeline.
pub trait Stage {
    /// A short description of the stage for logging.
    fn name(&self) -> String;

    /// Runs the stage against `out_dir`.
    fn run(&self, tools: &Tools, out_dir: &Path) -> Result<()>;
}

/// Runs a command to completion, failing unless it exits successfully.
///
/// `task` describes what the command does and is used in the error.
pub(crate) fn run_command(task: &'static str, command: &mut Command) -> Result<()> {
    info!("running: {command:?}");

    let status = command.status().map_err(|err| Error::Spawn {
        program: PathBuf::from(command.get_program()),
        source: err,
    })?;

    if !status.success() {
        return Err(Error::ExitStatus {
            task,
            code: status.code(),
        });
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////
// Reference sequence track
////////////////////////////////////////////////////////////////////////////////////////

/// Builds the reference sequence track from a FASTA file.
#[derive(Clone, Debug)]
pub struct SequenceTrack {
    /// The FASTA file.
    fasta: PathBuf,
}

impl SequenceTrack {
    /// Creates a new [`SequenceTrack`].
    pub fn new(fasta: impl Into<PathBuf>) -> Self {
        Self {
            fasta: fasta.into(),
        }
    }
}

impl Stage for SequenceTrack {
    fn name(&self) -> String {
        String::from("reference sequence track")
    }

    fn run(&self, tools: &Tools, out_dir: &Path) -> Result<()> {
        run_command(
            "build reference sequence track from FASTA file",
            Command::new(tools.jbrowse_script("prepare-refseqs.pl"))
                .arg("--fasta")
                .arg(&self.fasta)
                .arg("--out")
                .arg(out_dir),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Feature track
////////////////////////////////////////////////////////////////////////////////////////

/// Builds the feature annotation track from a GFF file.
#[derive(Clone, Debug)]
pub struct FeatureTrack {
    /// The GFF file.
    gff: PathBuf,
}

impl FeatureTrack {
    /// Creates a new [`FeatureTrack`].
    pub fn new(gff: impl Into<PathBuf>) -> Self {
        Self { gff: gff.into() }
    }
}

impl Stage for FeatureTrack {
    fn name(&self) -> String {
        String::from("feature annotation track")
    }

    fn run(&self, tools: &Tools, out_dir: &Path) -> Result<()> {
        run_command(
            "build feature annotation track from GFF file",
            Command::new(tools.jbrowse_script("flatfile-to-json.pl"))
                .arg("--gff")
                .arg(&self.gff)
                .arg("--trackLabel")
                .arg(FEATURE_TRACK_LABEL)
                .arg("--trackType")
                .arg(FEATURE_TRACK_TYPE)
                .arg("--out")
                .arg(out_dir),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Alignment track
////////////////////////////////////////////////////////////////////////////////////////

/// Builds an alignment track from a BAM file.
///
/// The BAM file is copied into the output directory as `<index>_<file name>`,
/// indexed there, and then registered in the track list under `label`. The
/// index keeps BAM files that share a file name from overwriting each other.
#[derive(Clone, Debug)]
pub struct AlignmentTrack {
    /// The position of the alignment within the browser.
    index: usize,

    /// The label of the track.
    label: String,

    /// The BAM file.
    bam: PathBuf,
}

impl AlignmentTrack {
    /// Creates a new [`AlignmentTrack`].
    pub fn new(index: usize, label: impl Into<String>, bam: impl Into<PathBuf>) -> Self {
        Self {
            index,
            label: label.into(),
            bam: bam.into(),
        }
    }
}

impl Stage for AlignmentTrack {
    fn name(&self) -> String {
        format!("alignment track `{}`", self.label)
    }

    fn run(&self, tools: &Tools, out_dir: &Path) -> Result<()> {
        let file_name = self
            .bam
            .file_name()
            .ok_or_else(|| Error::InvalidFileName(self.bam.clone()))?;

        let mut local_name = OsString::from(format!("{}_", self.index));
        local_name.push(file_name);

        let bam = out_dir.join(&local_name);
        fs::copy(&self.bam, &bam).map_err(|err| Error::Io(bam.clone(), err))?;

        let mut bai = bam.clone().into_os_string();
        bai.push(".bai");

        // TODO: check that the BAM header's reference names match the
        // sequences in the reference sequence track.
        run_command(
            "make index file from BAM file",
            Command::new(&tools.samtools)
                .arg("index")
                .arg(&bam)
                .arg(&bai),
        )?;

        run_command(
            "build alignment track from BAM file",
            Command::new(tools.jbrowse_script("add-bam-track.pl"))
                .arg("--label")
                .arg(&self.label)
                .arg("--bam_url")
                .arg(&local_name)
                .arg("--in")
                .arg(out_dir.join(TRACK_LIST)),
        )
    }
}
