#![forbid(unsafe_code)]

//! Opaque document snapshots.
//!
//! A [`Snapshot`] is the full serialized markup of the document at one
//! instant. It has no internal structure as far as Quill is concerned: the
//! editing surface produces it and the surface is the only thing that knows
//! how to interpret it.
//!
//! Snapshots are backed by `Arc<str>`, so cloning one into the undo stack,
//! the redo stack and the autosave path all share a single allocation.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable, cheaply clonable document content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    /// Wrap serialized document content.
    #[must_use]
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self(content.into())
    }

    /// The empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(""))
    }

    /// Borrow the serialized content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the snapshot contains only whitespace (or nothing).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether two snapshots share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Snapshot {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Snapshot {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for Snapshot {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<Snapshot> for String {
    fn from(value: Snapshot) -> Self {
        value.0.to_string()
    }
}

impl PartialEq<str> for Snapshot {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Snapshot {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 48;
        let mut preview: String = self.0.chars().take(PREVIEW).collect();
        if self.0.chars().count() > PREVIEW {
            preview.push('…');
        }
        f.debug_struct("Snapshot")
            .field("len", &self.0.len())
            .field("content", &preview)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_allocation() {
        let a = Snapshot::from("<p>A</p>");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn equal_content_from_different_sources_compares_equal() {
        let a = Snapshot::from("<p>A</p>");
        let b = Snapshot::from(String::from("<p>A</p>"));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn blank_detection() {
        assert!(Snapshot::empty().is_blank());
        assert!(Snapshot::from("  \n\t").is_blank());
        assert!(!Snapshot::from("<p></p>").is_blank());
    }

    #[test]
    fn compares_against_str() {
        let s = Snapshot::from("<p>X</p>");
        assert_eq!(s, "<p>X</p>");
        assert_eq!(s.as_str(), "<p>X</p>");
        assert_eq!(&*s, "<p>X</p>");
    }

    #[test]
    fn debug_truncates_long_content() {
        let long = "x".repeat(200);
        let s = Snapshot::from(long.as_str());
        let dbg = format!("{s:?}");
        assert!(dbg.contains("len: 200"));
        assert!(dbg.contains('…'));
    }

    #[test]
    fn round_trips_into_string() {
        let s = Snapshot::from("<p>round</p>");
        let owned: String = s.into();
        assert_eq!(owned, "<p>round</p>");
    }
}
