//! Dotted key parsing.
//!
//! A caller key like `"user.items.0"` names one independent document (the
//! root key, `"user"`) and a location inside it (the sub-path, `"items.0"`).
//! Splitting happens at the first `.` only; the remainder is interpreted as
//! nested segments by [`crate::value_path`].

use std::fmt;

use crate::Error;

/// A sub-path inside one document: the dot-separated segments after the
/// root key.
///
/// Numeric segments index into arrays when the addressed value is an array.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dot-separated sub-path. Empty segments are preserved as-is;
    /// a wholly empty string yields an empty path.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return KeyPath {
                segments: Vec::new(),
            };
        }
        KeyPath {
            segments: s.split('.').map(|seg| seg.to_string()).collect(),
        }
    }

    /// Build a path from pre-split segments.
    pub fn from_segments(segments: Vec<String>) -> Self {
        KeyPath { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_str())
    }

    /// The segments before the last one, and the last one.
    ///
    /// Returns `None` for an empty path.
    pub fn split_last(&self) -> Option<(KeyPath, &str)> {
        let (last, parents) = self.segments.split_last()?;
        Some((
            KeyPath {
                segments: parents.to_vec(),
            },
            last.as_str(),
        ))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::ops::Index<usize> for KeyPath {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// A parsed caller key: root key plus optional sub-path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    /// First dot-separated segment; identifies one independent document.
    pub root: String,
    /// Remainder of the key, addressing a location inside the document.
    pub sub: Option<KeyPath>,
}

impl Key {
    /// Split a dotted key into `(root, sub-path)`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidKey` if the key is empty or its root segment is empty
    /// (a key starting with `.`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nestdb_core::Key;
    ///
    /// let key = Key::parse("user.items.0").unwrap();
    /// assert_eq!(key.root, "user");
    /// assert_eq!(key.sub.unwrap().to_string(), "items.0");
    ///
    /// let key = Key::parse("user").unwrap();
    /// assert!(key.sub.is_none());
    /// ```
    pub fn parse(key: &str) -> Result<Self, Error> {
        if key.is_empty() {
            return Err(Error::invalid_key("key must not be empty"));
        }

        match key.split_once('.') {
            None => Ok(Key {
                root: key.to_string(),
                sub: None,
            }),
            Some((root, rest)) => {
                if root.is_empty() {
                    return Err(Error::invalid_key(format!(
                        "key '{}' has an empty root segment",
                        key
                    )));
                }
                // Split the rest directly so a trailing dot keeps its
                // empty segment ("user." addresses property "", which
                // never resolves) instead of collapsing to the whole
                // document.
                Ok(Key {
                    root: root.to_string(),
                    sub: Some(KeyPath::from_segments(
                        rest.split('.').map(str::to_string).collect(),
                    )),
                })
            }
        }
    }

    /// The full dotted form of this key.
    pub fn dotted(&self) -> String {
        match &self.sub {
            Some(sub) if !sub.is_empty() => format!("{}.{}", self.root, sub),
            _ => self.root.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}
