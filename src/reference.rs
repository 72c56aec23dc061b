//! Object references into the workspace store.

pub mod segment;

use std::str::FromStr;

use nonempty::NonEmpty;
pub use segment::Segment;

/// The delimiter between segments of a reference path.
pub const PATH_DELIMITER: char = ';';

/// An error associated with parsing an [`ObjectRef`].
#[derive(Debug)]
pub enum ParseError {
    /// A segment of the path could not be parsed.
    InvalidSegment(segment::ParseError, usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidSegment(err, index) => {
                write!(f, "invalid reference path segment #{}: {err}", index + 1)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A reference to an object in the workspace store.
///
/// A reference is a path of one or more [`Segment`]s. A path with more than
/// one segment reaches its target object _through_ the preceding objects, which
/// is how the store grants access to objects the caller can only see by way of
/// another object that links to them.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ObjectRef(NonEmpty<Segment>);

impl ObjectRef {
    /// Creates a reference from a single segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::ObjectRef;
    /// use genome_browser::reference::Segment;
    ///
    /// let reference = ObjectRef::new(Segment::new(1, 2, None));
    /// assert_eq!(reference.to_string(), "1/2");
    /// ```
    pub fn new(segment: Segment) -> Self {
        Self(NonEmpty::new(segment))
    }

    /// Returns the segments of the reference path.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::ObjectRef;
    ///
    /// let reference = "11/22;44/55/66".parse::<ObjectRef>()?;
    /// let segments = reference.segments();
    ///
    /// assert_eq!(segments.len(), 2);
    /// assert_eq!(segments.first().to_string(), "11/22");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn segments(&self) -> &NonEmpty<Segment> {
        &self.0
    }

    /// Returns the segment naming the referenced object (the last one).
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::ObjectRef;
    ///
    /// let reference = "11/22;44/55/66".parse::<ObjectRef>()?;
    /// assert_eq!(reference.target().to_string(), "44/55/66");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn target(&self) -> &Segment {
        self.0.last()
    }

    /// Attempts to build a reference from the individual steps of a path as
    /// returned by the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::ObjectRef;
    ///
    /// let reference = ObjectRef::try_from_path(["1/2/3", "4/5/6"])?;
    /// assert_eq!(reference.to_string(), "1/2/3;4/5/6");
    ///
    /// assert!(ObjectRef::try_from_path(Vec::<String>::new()).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_path<I, S>(path: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = path
            .into_iter()
            .map(|step| step.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&PATH_DELIMITER.to_string());

        joined.parse()
    }
}

/// Returns whether `value` is a syntactically valid object reference.
///
/// Every `;`-separated segment must independently match
/// `<workspace>/<object>[/<version>]`; an empty segment is never valid.
///
/// # Examples
///
/// ```
/// use genome_browser::reference::is_valid;
///
/// assert!(is_valid("11/22/33;44/55"));
/// assert!(!is_valid("11/22;"));
/// ```
pub fn is_valid(value: &str) -> bool {
    value.parse::<ObjectRef>().is_ok()
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_DELIMITER)?;
            }

            write!(f, "{}", segment)?;
        }

        Ok(())
    }
}

impl FromStr for ObjectRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s
            .split(PATH_DELIMITER)
            .enumerate()
            .map(|(i, segment)| {
                segment
                    .parse::<Segment>()
                    .map_err(|err| ParseError::InvalidSegment(err, i))
            });

        // `split()` always yields at least one item, even for an empty string.
        let head = match segments.next() {
            Some(result) => result?,
            None => {
                return Err(ParseError::InvalidSegment(
                    segment::ParseError::InvalidFormat(String::new()),
                    0,
                ));
            }
        };

        let tail = segments.collect::<Result<Vec<_>, _>>()?;
        Ok(Self(NonEmpty { head, tail }))
    }
}

impl From<Segment> for ObjectRef {
    fn from(segment: Segment) -> Self {
        Self::new(segment)
    }
}
