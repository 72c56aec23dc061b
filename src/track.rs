//! Building browser tracks with the JBrowse converters.
//!
//! A browser's data directory holds a reference sequence track, a single
//! feature annotation track, and zero or more alignment tracks, each produced
//! by an external converter. The order is fixed:
//!
//! ```text
//! sequence ──▶ features ──▶ alignment* (in request order)
//! ```
//!
//! The stages are run by a [`Pipeline`]. The first stage to fail stops the
//! pipeline, and whatever the earlier stages wrote is left in the data
//! directory.

pub mod stage;

use std::io;
use std::path::Path;
use std::path::PathBuf;

pub use stage::AlignmentTrack;
pub use stage::FeatureTrack;
pub use stage::SequenceTrack;
pub use stage::Stage;
use tracing::info;

use crate::acquire::AlignmentFile;
use crate::acquire::GenomeFiles;
use crate::config::Config;

/// The label of the feature annotation track.
pub const FEATURE_TRACK_LABEL: &str = "FeatureAnnotations";

/// The rendering type of the feature annotation track.
pub const FEATURE_TRACK_TYPE: &str = "CanvasFeatures";

/// The track list manifest within a data directory.
pub const TRACK_LIST: &str = "trackList.json";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to building tracks.
#[derive(Debug)]
pub enum Error {
    /// A tool could not be started.
    Spawn {
        /// The program.
        program: PathBuf,

        /// The underlying error.
        source: io::Error,
    },

    /// A tool exited unsuccessfully.
    ExitStatus {
        /// What the tool was asked to do.
        task: &'static str,

        /// The exit code (absent if the tool was killed by a signal).
        code: Option<i32>,
    },

    /// A BAM path has no file name.
    InvalidFileName(PathBuf),

    /// An I/O error.
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Spawn { program, source } => {
                write!(f, "could not run `{}`: {source}", program.display())
            }
            Error::ExitStatus {
                task,
                code: Some(code),
            } => write!(f, "failed to {task}: return code {code}"),
            Error::ExitStatus { task, code: None } => {
                write!(f, "failed to {task}: terminated by a signal")
            }
            Error::InvalidFileName(path) => {
                write!(f, "`{}` does not name a file", path.display())
            }
            Error::Io(path, err) => write!(f, "i/o error at `{}`: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Tools
////////////////////////////////////////////////////////////////////////////////////////

/// The locations of the external tools.
#[derive(Clone, Debug)]
pub struct Tools {
    /// The directory holding the JBrowse converter scripts.
    jbrowse_bin: PathBuf,

    /// The `samtools` executable.
    samtools: PathBuf,
}

impl Tools {
    /// Creates a new [`Tools`].
    pub fn new(jbrowse_bin: impl Into<PathBuf>, samtools: impl Into<PathBuf>) -> Self {
        Self {
            jbrowse_bin: jbrowse_bin.into(),
            samtools: samtools.into(),
        }
    }

    /// Gets the path to a JBrowse converter script.
    pub fn jbrowse_script(&self, name: &str) -> PathBuf {
        self.jbrowse_bin.join(name)
    }
}

impl From<&Config> for Tools {
    fn from(config: &Config) -> Self {
        Self::new(config.jbrowse_bin(), config.samtools())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Pipeline
////////////////////////////////////////////////////////////////////////////////////////

/// A browser data directory and the files it was built from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BrowserData {
    /// The data directory.
    pub data_dir: PathBuf,

    /// The FASTA file.
    pub fasta: PathBuf,

    /// The GFF file.
    pub gff: PathBuf,
}

/// An ordered list of track building stages.
#[allow(missing_debug_implementations)]
pub struct Pipeline {
    /// The stages, in the order they run.
    stages: Vec<Box<dyn Stage>>,

    /// The genome files the pipeline was created from.
    genome: GenomeFiles,
}

impl Pipeline {
    /// Creates the pipeline for a genome and its alignments.
    pub fn new(genome: &GenomeFiles, alignments: &[AlignmentFile]) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(SequenceTrack::new(&genome.fasta)),
            Box::new(FeatureTrack::new(&genome.gff)),
        ];

        stages.extend(alignments.iter().enumerate().map(|(i, alignment)| {
            Box::new(AlignmentTrack::new(i, &alignment.name, &alignment.path)) as Box<dyn Stage>
        }));

        Self {
            stages,
            genome: genome.clone(),
        }
    }

    /// Gets the names of the stages, in order.
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage against `data_dir`.
    pub fn run(&self, tools: &Tools, data_dir: &Path) -> Result<BrowserData> {
        std::fs::create_dir_all(data_dir).map_err(|err| Error::Io(data_dir.to_path_buf(), err))?;

        for stage in &self.stages {
            let name = stage.name();
            info!("tracks: building {name}");
            stage.run(tools, data_dir)?;
            info!("tracks: done building {name}");
        }

        Ok(BrowserData {
            data_dir: data_dir.to_path_buf(),
            fasta: self.genome.fasta.clone(),
            gff: self.genome.gff.clone(),
        })
    }
}
