//! Source span types for tracking where a construct came from.
//!
//! Spans are produced by the front end and threaded through lowering
//! unchanged; this crate never inspects source text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a source file in a compilation unit's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl FileId {
    /// A dummy file ID for spans without a known file.
    pub const DUMMY: FileId = FileId(u32::MAX);
}

/// A byte range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// File ID (index into the unit's file table)
    pub file_id: FileId,
    /// Byte offset of start (inclusive)
    pub start: u32,
    /// Byte offset of end (exclusive)
    pub end: u32,
}

impl Span {
    /// A dummy span for cases where no location is available.
    pub const DUMMY: Span = Span {
        file_id: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    pub fn new(file_id: FileId, start: u32, end: u32) -> Self {
        Self { file_id, start, end }
    }

    /// Check if this is a dummy/unknown span.
    pub fn is_dummy(&self) -> bool {
        self.file_id == FileId::DUMMY
    }

    /// Length of this span in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}

/// Resolved location: file path plus byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.file, self.start, self.end)
    }
}

/// File table of a compilation unit, indexed by `FileId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFiles {
    paths: Vec<String>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Register a file path, returning its ID. Paths already present keep their ID.
    pub fn add(&mut self, path: impl Into<String>) -> FileId {
        let path = path.into();
        if let Some(index) = self.paths.iter().position(|p| *p == path) {
            return FileId(index as u32);
        }
        self.paths.push(path);
        FileId((self.paths.len() - 1) as u32)
    }

    pub fn path(&self, id: FileId) -> Option<&str> {
        self.paths.get(id.0 as usize).map(String::as_str)
    }

    /// Resolve a span to a printable location.
    pub fn location(&self, span: Span) -> Option<Location> {
        if span.is_dummy() {
            return None;
        }
        let file = self.path(span.file_id)?;
        Some(Location {
            file: file.to_string(),
            start: span.start,
            end: span.end,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut files = SourceFiles::new();
        let a = files.add("A.java");
        let b = files.add("B.java");
        assert_eq!(files.add("A.java"), a);
        assert_ne!(a, b);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_dummy_span_has_no_location() {
        let mut files = SourceFiles::new();
        files.add("A.java");
        assert!(files.location(Span::DUMMY).is_none());
        let loc = files.location(Span::new(FileId(0), 4, 9)).unwrap();
        assert_eq!(loc.to_string(), "A.java[4..9]");
    }
}
