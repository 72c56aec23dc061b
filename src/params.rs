//! Request parameters and their reconciliation.
//!
//! Requests arrive as loosely shaped JSON in which a genome may be given either
//! by reference or by a pair of local files, and each alignment either by
//! reference or by a local BAM file. The raw shapes ([`GenomeFileInput`],
//! [`AlignmentFileInput`]) mirror that JSON. Reconciliation checks every rule
//! up front, accumulates _all_ violations, and only when there are none turns
//! the raw shapes into the tagged [`GenomeInput`] and [`AlignmentInput`] enums,
//! where "both" and "neither" are no longer representable.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::ObjectRef;

////////////////////////////////////////////////////////////////////////////////////////
// Raw parameters
////////////////////////////////////////////////////////////////////////////////////////

/// A key that may be absent, present with a value, or present as `null`.
///
/// The outer [`Option`] records whether the key was given at all.
pub type Field<T> = Option<Option<T>>;

/// Deserializes a [`Field`] so that an explicit `null` still counts as
/// present.
fn present<'de, D, T>(deserializer: D) -> Result<Field<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A genome, as given in a request.
///
/// Exactly one of `genome_ref` or the pair of `gff_file` and `fasta_file`
/// should be present. A key given as `null` is present (with no value).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GenomeFileInput {
    /// A local GFF file.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub gff_file: Field<String>,

    /// A local FASTA file.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub fasta_file: Field<String>,

    /// A reference to a genome object.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub genome_ref: Field<String>,
}

/// An alignment, as given in a request.
///
/// Exactly one of `bam_file` or `alignment_ref` should be present. A key given
/// as `null` is present (with no value).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AlignmentFileInput {
    /// A local BAM file.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub bam_file: Field<String>,

    /// A reference to an alignment object.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub alignment_ref: Field<String>,
}

/// The parameters of `build_genome_browser`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BuildGenomeBrowserParams {
    /// The genome.
    #[serde(default)]
    pub genome_input: Option<GenomeFileInput>,

    /// The alignments, if any.
    #[serde(default)]
    pub alignment_inputs: Option<Vec<AlignmentFileInput>>,

    /// The workspace the browser would be saved to.
    #[serde(default)]
    pub result_workspace_id: Option<i64>,

    /// The name of the browser.
    #[serde(default)]
    pub genome_browser_name: Option<String>,
}

/// The parameters of `browse_genome_app`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BrowseGenomeParams {
    /// A reference to the genome.
    #[serde(default)]
    pub genome_ref: Option<String>,

    /// The workspace the report is saved to.
    ///
    /// This is kept as raw JSON so that a non-string value is reported as an
    /// invalid workspace rather than as a malformed request.
    #[serde(default)]
    pub result_workspace_name: Option<Value>,

    /// References to alignments, if any.
    #[serde(default)]
    pub alignment_refs: Option<Vec<String>>,
}

////////////////////////////////////////////////////////////////////////////////////////
// Reconciled inputs
////////////////////////////////////////////////////////////////////////////////////////

/// A genome, either in the store or on local disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GenomeInput {
    /// A genome object in the store.
    Reference(ObjectRef),

    /// A local annotation and sequence file pair.
    Files {
        /// The GFF file.
        gff: PathBuf,

        /// The FASTA file.
        fasta: PathBuf,
    },
}

/// An alignment, either in the store or on local disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AlignmentInput {
    /// An alignment object in the store.
    Reference(ObjectRef),

    /// A local BAM file.
    BamFile(PathBuf),
}

/// A reconciled `build_genome_browser` request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildRequest {
    /// The genome.
    pub genome: GenomeInput,

    /// The alignments, in request order.
    pub alignments: Vec<AlignmentInput>,

    /// The requested browser name, if a non-blank one was given.
    pub name: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////////////
// Reconciliation
////////////////////////////////////////////////////////////////////////////////////////

/// Reconciles a single genome input, pushing any violations onto `errors`.
fn reconcile_genome(
    input: Option<&GenomeFileInput>,
    errors: &mut Vec<String>,
) -> Option<GenomeInput> {
    let input = match input {
        Some(input)
            if input.genome_ref.is_some()
                || input.gff_file.is_some()
                || input.fasta_file.is_some() =>
        {
            input
        }
        _ => {
            errors.push(String::from(
                "genome_input must exist and contain ONE of a genome reference or a GFF file.",
            ));
            return None;
        }
    };

    if let Some(genome_ref) = &input.genome_ref {
        let mut ok = true;

        if input.gff_file.is_some() || input.fasta_file.is_some() {
            errors.push(String::from(
                "genome_input should just have genome_ref or both of gff_file and fasta_file",
            ));
            ok = false;
        }

        match genome_ref.as_deref().map(str::parse::<ObjectRef>) {
            Some(Ok(reference)) if ok => Some(GenomeInput::Reference(reference)),
            Some(Ok(_)) => None,
            _ => {
                errors.push(String::from(
                    "genome_input.genome_ref must be a valid workspace reference string",
                ));
                None
            }
        }
    } else {
        let gff = input.gff_file.clone().flatten();
        let fasta = input.fasta_file.clone().flatten();

        match (gff, fasta) {
            (Some(gff), Some(fasta)) => Some(GenomeInput::Files {
                gff: PathBuf::from(gff),
                fasta: PathBuf::from(fasta),
            }),
            _ => {
                errors.push(String::from(
                    "When using a gff_file and fasta_file to represent a genome, BOTH files must \
                     be present.",
                ));
                None
            }
        }
    }
}

/// Reconciles a single alignment input, pushing any violations onto `errors`.
fn reconcile_alignment(
    input: &AlignmentFileInput,
    errors: &mut Vec<String>,
) -> Option<AlignmentInput> {
    match (&input.alignment_ref, &input.bam_file) {
        (None, None) => {
            errors.push(String::from(
                "an alignment input must have ONE of alignment_ref or bam_file keys",
            ));
            None
        }
        (Some(_), Some(_)) => {
            errors.push(String::from(
                "an alignment input must have ONE of alignment_ref or bam_file, not both.",
            ));
            None
        }
        (Some(alignment_ref), None) => {
            let alignment_ref = alignment_ref.as_deref();
            match alignment_ref.map(str::parse::<ObjectRef>) {
                Some(Ok(reference)) => Some(AlignmentInput::Reference(reference)),
                _ => {
                    errors.push(format!(
                        "alignment.alignment_ref must be a valid workspace reference string, not \
                         {}",
                        alignment_ref.unwrap_or("null")
                    ));
                    None
                }
            }
        }
        (None, Some(Some(bam_file))) => Some(AlignmentInput::BamFile(PathBuf::from(bam_file))),
        (None, Some(None)) => {
            errors.push(String::from("alignment.bam_file must be a path to a BAM file"));
            None
        }
    }
}

impl BuildGenomeBrowserParams {
    /// Reconciles the parameters into a [`BuildRequest`].
    ///
    /// Every rule is evaluated, so the error list names every problem with
    /// the request, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::params::BuildGenomeBrowserParams;
    /// use genome_browser::params::GenomeInput;
    ///
    /// let params: BuildGenomeBrowserParams = serde_json::from_str(
    ///     r#"{"genome_input": {"genome_ref": "1/2/3"}, "alignment_inputs": [{"bam_file": "a.bam"}]}"#,
    /// )?;
    ///
    /// let request = params.reconcile().unwrap();
    /// assert!(matches!(request.genome, GenomeInput::Reference(_)));
    /// assert_eq!(request.alignments.len(), 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn reconcile(&self) -> Result<BuildRequest, Vec<String>> {
        let mut errors = Vec::new();

        let genome = reconcile_genome(self.genome_input.as_ref(), &mut errors);

        let alignments = self
            .alignment_inputs
            .iter()
            .flatten()
            .map(|input| reconcile_alignment(input, &mut errors))
            .collect::<Vec<_>>();

        let name = self
            .genome_browser_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from);

        match genome {
            Some(genome) if errors.is_empty() => Ok(BuildRequest {
                genome,
                alignments: alignments.into_iter().flatten().collect(),
                name,
            }),
            _ => Err(errors),
        }
    }

    /// Checks the parameters, returning every violation (empty if the request
    /// is valid).
    pub fn check(&self) -> Vec<String> {
        self.reconcile().err().unwrap_or_default()
    }
}
