//! A single step within an object reference path.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// The delimiter between the components of a segment.
pub const DELIMITER: char = '/';

/// The grammar for a single segment: `<workspace>/<object>[/<version>]`.
static REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)/([0-9]+)(?:/([0-9]+))?$").unwrap());

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a segment.
#[derive(Debug)]
pub enum ParseError {
    /// The segment does not match `<workspace>/<object>[/<version>]`.
    InvalidFormat(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidFormat(segment) => write!(
                f,
                "invalid segment: expected `workspace/object[/version]`, found `{segment}`"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Segment
////////////////////////////////////////////////////////////////////////////////////////

/// A single `<workspace>/<object>[/<version>]` step of an object reference.
///
/// Ids are non-negative integers of any size. They are kept as the digit
/// strings they were written as, so every segment that matches the grammar
/// parses.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Segment {
    /// The workspace id.
    workspace: String,

    /// The object id.
    object: String,

    /// The object version, if pinned.
    version: Option<String>,
}

impl Segment {
    /// Creates a new segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::reference::Segment;
    ///
    /// let segment = Segment::new(11, 22, Some(33));
    /// assert_eq!(segment.to_string(), "11/22/33");
    /// ```
    pub fn new(workspace: u64, object: u64, version: Option<u64>) -> Self {
        Self {
            workspace: workspace.to_string(),
            object: object.to_string(),
            version: version.map(|version| version.to_string()),
        }
    }

    /// Returns the workspace id.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::reference::Segment;
    ///
    /// let segment = "11/22".parse::<Segment>()?;
    /// assert_eq!(segment.workspace(), "11");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Returns the object id.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::reference::Segment;
    ///
    /// let segment = "11/22".parse::<Segment>()?;
    /// assert_eq!(segment.object(), "22");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Returns the version, if the segment pins one.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::reference::Segment;
    ///
    /// assert_eq!("11/22/33".parse::<Segment>()?.version(), Some("33"));
    /// assert_eq!("11/22".parse::<Segment>()?.version(), None);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.workspace, DELIMITER, self.object)?;

        if let Some(version) = &self.version {
            write!(f, "{}{}", DELIMITER, version)?;
        }

        Ok(())
    }
}

impl FromStr for Segment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidFormat(s.to_string());
        let groups = REGEX.captures(s).ok_or_else(invalid)?;

        // The first two groups are not optional in the grammar.
        let workspace = groups.get(1).ok_or_else(invalid)?.as_str().to_string();
        let object = groups.get(2).ok_or_else(invalid)?.as_str().to_string();
        let version = groups.get(3).map(|m| m.as_str().to_string());

        Ok(Self {
            workspace,
            object,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_segments() -> Result<(), Box<dyn std::error::Error>> {
        let segment = "11/22/33".parse::<Segment>()?;
        assert_eq!(segment, Segment::new(11, 22, Some(33)));

        let segment = "0/0".parse::<Segment>()?;
        assert_eq!(segment, Segment::new(0, 0, None));

        Ok(())
    }

    #[test]
    fn invalid_segments() {
        for value in ["", "1", "11/", "11/22/", "/22", "a/b", "11/22/33/44", " 11/22", "-1/2"] {
            let err = value.parse::<Segment>().unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidFormat(_)),
                "`{value}` should fail on format"
            );
        }
    }

    #[test]
    fn ids_of_any_size() -> Result<(), Box<dyn std::error::Error>> {
        let segment = "99999999999999999999/1/000123456789012345678901".parse::<Segment>()?;

        assert_eq!(segment.workspace(), "99999999999999999999");
        assert_eq!(segment.object(), "1");
        assert_eq!(segment.version(), Some("000123456789012345678901"));
        assert_eq!(
            segment.to_string(),
            "99999999999999999999/1/000123456789012345678901"
        );

        Ok(())
    }
}
