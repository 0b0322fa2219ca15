//! Issue classification for audit findings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of drift an audit finding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// An Object's single-shot placement points at a remote item that no
    /// longer answers to `get_item`.
    MissingFile,
    /// A Chunk's placement points at a remote item that no longer exists.
    MissingChunk,
    /// The backend call itself failed (auth, transient, or unclassified)
    /// rather than cleanly reporting not-found.
    Inaccessible,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueType::MissingFile => "missing_file",
            IssueType::MissingChunk => "missing_chunk",
            IssueType::Inaccessible => "inaccessible",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_type_display() {
        assert_eq!(IssueType::MissingFile.to_string(), "missing_file");
        assert_eq!(IssueType::MissingChunk.to_string(), "missing_chunk");
        assert_eq!(IssueType::Inaccessible.to_string(), "inaccessible");
    }

    #[test]
    fn issue_type_serialization() {
        let json = serde_json::to_string(&IssueType::MissingChunk).unwrap();
        assert_eq!(json, "\"missing_chunk\"");
        let back: IssueType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IssueType::MissingChunk);
    }
}
