//! `genome_browser` is a crate for turning genomes stored in a workspace into
//! static, self-contained [JBrowse](https://jbrowse.org) bundles.
//!
//! The crate implements a single, linear pipeline:
//!
//! 1. Validate the request ([`params`], [`validate`]).
//! 2. Acquire the annotation (GFF), sequence (FASTA), and alignment (BAM) files
//!    for the genome by asking the relevant external services to export them
//!    ([`acquire`]).
//! 3. Run the JBrowse converters over those files to materialize tracks into a
//!    data directory ([`track`]).
//! 4. Package the data directory together with the JBrowse static assets
//!    ([`package`]).
//! 5. Archive the bundle and publish a report linking to it ([`report`]).
//!
//! All of the format conversion happens outside of this crate: either in the
//! external services reached through the traits in [`service`] or in the
//! command-line tools shipped with JBrowse. This crate only decides _what_ to
//! run and in _which order_, and it refuses malformed requests before any of
//! that work begins.
//!
//! ## Object references
//!
//! Everything in the workspace is addressed by an [`ObjectRef`]: one or more
//! `workspace/object[/version]` segments joined by `;`.
//!
//! ```
//! use genome_browser::ObjectRef;
//!
//! let reference = "11/22/33;44/55".parse::<ObjectRef>()?;
//! assert_eq!(reference.segments().len(), 2);
//! assert_eq!(reference.to_string(), "11/22/33;44/55");
//!
//! assert!("11/22;".parse::<ObjectRef>().is_err());
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Running the service
//!
//! The entry points live on [`GenomeBrowser`]. Construct one from a
//! [`Config`] and a set of [`service::Services`], then call
//! [`GenomeBrowser::browse_genome_app()`] or
//! [`GenomeBrowser::build_genome_browser()`]. The [`dispatch`] module wraps the
//! same entry points in the JSON-RPC envelope used by the hosting runtime.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod acquire;
pub mod browser;
pub mod config;
pub mod dispatch;
pub mod package;
pub mod params;
pub mod reference;
pub mod report;
pub mod service;
pub mod track;
pub mod unique;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::GenomeBrowser;
pub use config::Config;
pub use reference::ObjectRef;
