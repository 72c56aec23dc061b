//! Packaging browser data together with the JBrowse static assets.
//!
//! A packaged browser is a directory that can be served as-is:
//!
//! ```text
//! <output>/
//! ├── index.html, jbrowse.conf, ...   (static files)
//! ├── browser/ css/ img/ plugins/ src/ (static directories)
//! └── data/                           (the tracks)
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

/// The static asset directories copied from the JBrowse installation.
pub const STATIC_DIRS: &[&str] = &["browser", "css", "img", "plugins", "src"];

/// The static asset files copied from the JBrowse installation.
pub const STATIC_FILES: &[&str] = &[
    "bower.json",
    "compat_121.html",
    "index.html",
    "jbrowse_conf.json",
    "jbrowse.conf",
    "LICENSE",
    "MYMETA.json",
    "MYMETA.yml",
    "package.json",
];

/// Subtrees removed from the copied static assets.
pub const PRUNED: &[&str] = &["src/util"];

/// The directory within a packaged browser that holds the tracks.
pub const DATA_DIR: &str = "data";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to packaging.
#[derive(Debug)]
pub enum Error {
    /// The output directory already exists.
    AlreadyExists(PathBuf),

    /// An I/O error.
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AlreadyExists(path) => {
                write!(f, "output directory `{}` already exists", path.display())
            }
            Error::Io(path, err) => write!(f, "i/o error at `{}`: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Attaches the offending path to an I/O error.
fn at(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| Error::Io(path.to_path_buf(), err)
}

////////////////////////////////////////////////////////////////////////////////////////
// Packager
////////////////////////////////////////////////////////////////////////////////////////

/// Assembles packaged browsers from a JBrowse installation.
#[derive(Clone, Debug)]
pub struct Packager {
    /// The JBrowse installation.
    jbrowse_dir: PathBuf,
}

impl Packager {
    /// Creates a new [`Packager`] drawing its static assets from
    /// `jbrowse_dir`.
    pub fn new(jbrowse_dir: impl Into<PathBuf>) -> Self {
        Self {
            jbrowse_dir: jbrowse_dir.into(),
        }
    }

    /// Packages `data_dir` into a new directory at `output_dir`.
    ///
    /// `output_dir` must not exist. On success, `data_dir` has been moved to
    /// `<output_dir>/data` and the output directory is returned.
    pub fn package(&self, data_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
        if let Some(parent) = output_dir.parent() {
            fs::create_dir_all(parent).map_err(at(parent))?;
        }

        fs::create_dir(output_dir).map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(output_dir.to_path_buf()),
            _ => Error::Io(output_dir.to_path_buf(), err),
        })?;

        info!("packaging: copying static assets into {}", output_dir.display());

        for dir in STATIC_DIRS {
            copy_dir(&self.jbrowse_dir.join(dir), &output_dir.join(dir))?;
        }

        for file in STATIC_FILES {
            let from = self.jbrowse_dir.join(file);
            fs::copy(&from, output_dir.join(file)).map_err(at(&from))?;
        }

        for subtree in PRUNED {
            let path = output_dir.join(subtree);

            match fs::remove_dir_all(&path) {
                Ok(()) => debug!("packaging: pruned {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(path, err)),
            }
        }

        let destination = output_dir.join(DATA_DIR);
        info!(
            "packaging: moving {} to {}",
            data_dir.display(),
            destination.display()
        );
        move_dir(data_dir, &destination)?;

        Ok(output_dir.to_path_buf())
    }
}

/// Recursively copies the directory `from` to `to`.
fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(at(to))?;

    for entry in fs::read_dir(from).map_err(at(from))? {
        let entry = entry.map_err(at(from))?;
        let path = entry.path();
        let target = to.join(entry.file_name());

        if entry.file_type().map_err(at(&path))?.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(at(&path))?;
        }
    }

    Ok(())
}

/// Moves the directory `from` to `to`, falling back to a copy when the two are
/// on different filesystems.
///
/// A missing `from` is an error and leaves `to` untouched.
fn move_dir(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::Io(from.to_path_buf(), err));
        }
        Err(err) => debug!(
            "packaging: rename of {} failed ({err}), copying instead",
            from.display()
        ),
    }

    copy_dir(from, to)?;
    fs::remove_dir_all(from).map_err(at(from))
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::testing;

    fn data_dir(root: &Path) -> PathBuf {
        let data = root.join("browser_data");
        fs::create_dir_all(data.join("seq")).unwrap();
        fs::write(data.join("trackList.json"), "{}").unwrap();
        fs::write(data.join("seq").join("refSeqs.json"), "[]").unwrap();
        data
    }

    #[test]
    fn packages_a_browser() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("package")?;
        let data = data_dir(tmp.path());
        let output = tmp.path().join("min_jbrowse_1");

        let packaged = Packager::new(testing::jbrowse_dir()).package(&data, &output)?;
        assert_eq!(packaged, output);

        for file in STATIC_FILES {
            assert!(output.join(file).is_file(), "missing {file}");
        }

        for dir in STATIC_DIRS {
            assert!(output.join(dir).join("README").is_file(), "missing {dir}");
        }

        assert!(output.join("src/JBrowse/Browser.js").is_file());
        assert!(!output.join("src/util").exists());

        assert!(!data.exists());
        assert!(output.join("data/trackList.json").is_file());
        assert!(output.join("data/seq/refSeqs.json").is_file());

        Ok(())
    }

    #[test]
    fn existing_output_is_an_error() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("package")?;
        let data = data_dir(tmp.path());
        let output = tmp.path().join("min_jbrowse_1");
        fs::create_dir(&output)?;
        fs::write(output.join("keep"), "")?;

        let err = Packager::new(testing::jbrowse_dir())
            .package(&data, &output)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref path) if path == &output));

        assert!(output.join("keep").is_file());
        assert!(data.join("trackList.json").is_file());

        Ok(())
    }

    #[test]
    fn missing_data_dir() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("package")?;
        let data = tmp.path().join("browser_data");
        let output = tmp.path().join("min_jbrowse_1");

        let err = Packager::new(testing::jbrowse_dir())
            .package(&data, &output)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Io(ref path, ref err) if path == &data && err.kind() == io::ErrorKind::NotFound
        ));

        assert!(output.join("index.html").is_file());
        assert!(!output.join(DATA_DIR).exists());

        Ok(())
    }

    #[test]
    fn missing_static_assets() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new("package")?;
        let data = data_dir(tmp.path());

        let err = Packager::new(tmp.path().join("no-jbrowse"))
            .package(&data, &tmp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(..)));

        Ok(())
    }
}
