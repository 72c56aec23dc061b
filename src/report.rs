//! Publishing a packaged browser as a report.

use std::path::Path;

use tracing::info;

use crate::ObjectRef;
use crate::service;
use crate::service::BlobArchiver;
use crate::service::HtmlLink;
use crate::service::ReportInfo;
use crate::service::ReportParams;
use crate::service::ReportService;
use crate::unique;

/// The prefix of generated report names.
pub const REPORT_NAME_PREFIX: &str = "GenomeBrowser-";

/// The page the report links to within the archive.
pub const LINK_NAME: &str = "index.html";

/// The description of the report's link.
pub const LINK_DESCRIPTION: &str = "Packaged genome browser";

/// An error related to reporting.
#[derive(Debug)]
pub enum Error {
    /// Archiving the packaged browser failed.
    Archive(service::Error),

    /// Creating the report failed.
    Report(service::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Archive(err) => write!(f, "archive error: {err}"),
            Error::Report(err) => write!(f, "report error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The message shown on the report for a genome.
pub fn message(genome_ref: &ObjectRef) -> String {
    format!("Genome Browser for {genome_ref}")
}

/// Archives a packaged browser and publishes a report linking to it.
pub struct Emitter<'a> {
    /// The blob archiver.
    archiver: &'a dyn BlobArchiver,

    /// The report service.
    reports: &'a dyn ReportService,
}

impl std::fmt::Debug for Emitter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

impl<'a> Emitter<'a> {
    /// Creates a new [`Emitter`].
    pub fn new(archiver: &'a dyn BlobArchiver, reports: &'a dyn ReportService) -> Self {
        Self { archiver, reports }
    }

    /// Archives `browser_dir` and publishes a report for `genome_ref` into
    /// `workspace_name`.
    pub fn emit(
        &self,
        browser_dir: &Path,
        genome_ref: &ObjectRef,
        workspace_name: &str,
    ) -> Result<ReportInfo> {
        info!("report: archiving {}", browser_dir.display());
        let archived = self
            .archiver
            .archive_directory(browser_dir)
            .map_err(Error::Archive)?;

        let params = ReportParams {
            message: message(genome_ref),
            direct_html_link_index: 0,
            html_links: vec![HtmlLink {
                shock_id: archived.shock_id,
                name: LINK_NAME.to_string(),
                description: LINK_DESCRIPTION.to_string(),
            }],
            report_object_name: unique::name(REPORT_NAME_PREFIX),
            workspace_name: workspace_name.to_string(),
        };

        info!("report: creating {}", params.report_object_name);
        self.reports
            .create_extended_report(&params)
            .map_err(Error::Report)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing;
    use crate::testing::StubCallback;

    #[test]
    fn emits_a_report() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let callback = StubCallback::default();
        let genome_ref = "1/2/3".parse::<ObjectRef>()?;

        let info = Emitter::new(&callback, &callback).emit(
            Path::new("/scratch/minimal_jbrowse_x"),
            &genome_ref,
            "my_workspace",
        )?;

        assert!(info.name.starts_with(REPORT_NAME_PREFIX));
        assert_eq!(info.reference, testing::REPORT_REF);
        assert_eq!(
            callback.archived(),
            [PathBuf::from("/scratch/minimal_jbrowse_x")]
        );

        let reports = callback.reports();
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.message, "Genome Browser for 1/2/3");
        assert_eq!(report.workspace_name, "my_workspace");
        assert_eq!(report.direct_html_link_index, 0);
        assert_eq!(
            report.html_links,
            [HtmlLink {
                shock_id: testing::SHOCK_ID.to_string(),
                name: String::from("index.html"),
                description: String::from("Packaged genome browser"),
            }]
        );

        Ok(())
    }

    #[test]
    fn report_names_are_unique() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let callback = StubCallback::default();
        let emitter = Emitter::new(&callback, &callback);
        let genome_ref = "1/2".parse::<ObjectRef>()?;

        let first = emitter.emit(Path::new("a"), &genome_ref, "ws")?;
        let second = emitter.emit(Path::new("b"), &genome_ref, "ws")?;
        assert_ne!(first.name, second.name);

        Ok(())
    }
}
