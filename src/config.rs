//! Service configuration.

use std::path::Path;
use std::path::PathBuf;

/// The default location of the JBrowse installation.
pub const DEFAULT_JBROWSE_DIR: &str = "/kb/module/jbrowse";

/// The default `samtools` executable (resolved through `PATH`).
pub const DEFAULT_SAMTOOLS: &str = "samtools";

/// Configuration for the service.
///
/// A configuration is assembled once when the service starts and is only read
/// afterwards. Every component that needs a value receives the configuration
/// (or the piece of it it needs) explicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The callback endpoint for the SDK services (format conversion,
    /// archiving, and reporting).
    callback_url: String,

    /// The endpoint of the workspace store.
    workspace_url: String,

    /// The scratch directory within which all files are written.
    scratch_dir: PathBuf,

    /// The authorization token forwarded to the services, if any.
    token: Option<String>,

    /// The JBrowse installation (converter scripts and static assets).
    jbrowse_dir: PathBuf,

    /// The `samtools` executable.
    samtools: PathBuf,
}

impl Config {
    /// Creates a new configuration with the default JBrowse installation and
    /// `samtools` executable.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::Config;
    ///
    /// let config = Config::new("http://callback", "http://workspace", "/scratch");
    ///
    /// assert_eq!(config.callback_url(), "http://callback");
    /// assert_eq!(config.jbrowse_bin().to_str(), Some("/kb/module/jbrowse/bin"));
    /// assert!(config.token().is_none());
    /// ```
    pub fn new(
        callback_url: impl Into<String>,
        workspace_url: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            callback_url: callback_url.into(),
            workspace_url: workspace_url.into(),
            scratch_dir: scratch_dir.into(),
            token: None,
            jbrowse_dir: PathBuf::from(DEFAULT_JBROWSE_DIR),
            samtools: PathBuf::from(DEFAULT_SAMTOOLS),
        }
    }

    /// Sets the authorization token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the JBrowse installation directory.
    pub fn with_jbrowse_dir(mut self, jbrowse_dir: impl Into<PathBuf>) -> Self {
        self.jbrowse_dir = jbrowse_dir.into();
        self
    }

    /// Sets the `samtools` executable.
    pub fn with_samtools(mut self, samtools: impl Into<PathBuf>) -> Self {
        self.samtools = samtools.into();
        self
    }

    /// Gets the callback endpoint.
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Gets the workspace endpoint.
    pub fn workspace_url(&self) -> &str {
        &self.workspace_url
    }

    /// Gets the scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Gets the authorization token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Gets the JBrowse installation directory.
    pub fn jbrowse_dir(&self) -> &Path {
        &self.jbrowse_dir
    }

    /// Gets the directory holding the JBrowse converter scripts.
    pub fn jbrowse_bin(&self) -> PathBuf {
        self.jbrowse_dir.join("bin")
    }

    /// Gets the `samtools` executable.
    pub fn samtools(&self) -> &Path {
        &self.samtools
    }
}
