//! Documents, segments and the document lifecycle

use crate::error::DomainError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel the summarization call returns for documents unrelated to the table
pub const INVALID_PARSING: &str = "INVALID_PARSING";

/// Whether a summarization answer rejects the document.
///
/// Empty answers count as rejections. Line breaks and surrounding whitespace
/// are ignored and the sentinel is matched case-insensitively.
pub fn is_invalid_summary(summary: &str) -> bool {
    let normalized: String = summary.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let normalized = normalized.trim();
    normalized.is_empty() || normalized.eq_ignore_ascii_case(INVALID_PARSING)
}

/// Unique identifier for a document (UUIDv7, sortable by load time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Generate a new identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a document
///
/// ```text
/// Raw -> Validating -> {Valid, Rejected}
/// Valid -> Parsing -> {Parsed, ParseFailed}
/// Parsed -> Scoring -> Scored
/// Scored -> Inserting -> {Inserted, InsertFailed}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentState {
    /// Loaded, not yet examined
    Raw,
    /// Summarization call in flight
    Validating,
    /// Accepted by summarization
    Valid,
    /// Unrelated to the table (terminal)
    Rejected,
    /// Segment extraction in flight
    Parsing,
    /// Payload stitched
    Parsed,
    /// A segment exhausted its retries (terminal)
    ParseFailed,
    /// Validation engine running
    Scoring,
    /// Report produced
    Scored,
    /// Insert transaction open
    Inserting,
    /// Rows committed (terminal)
    Inserted,
    /// Insert transaction rolled back (terminal)
    InsertFailed,
}

impl DocumentState {
    /// All states, in lifecycle order
    pub const ALL: [DocumentState; 12] = [
        Self::Raw,
        Self::Validating,
        Self::Valid,
        Self::Rejected,
        Self::Parsing,
        Self::Parsed,
        Self::ParseFailed,
        Self::Scoring,
        Self::Scored,
        Self::Inserting,
        Self::Inserted,
        Self::InsertFailed,
    ];

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Raw, Validating)
                | (Validating, Valid)
                | (Validating, Rejected)
                | (Valid, Parsing)
                | (Parsing, Parsed)
                | (Parsing, ParseFailed)
                | (Parsed, Scoring)
                | (Scoring, Scored)
                | (Scored, Inserting)
                | (Inserting, Inserted)
                | (Inserting, InsertFailed)
        )
    }

    /// No further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::ParseFailed | Self::Inserted | Self::InsertFailed
        )
    }

    /// Terminal failure state
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected | Self::ParseFailed | Self::InsertFailed)
    }

    /// State name as used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Validating => "VALIDATING",
            Self::Valid => "VALID",
            Self::Rejected => "REJECTED",
            Self::Parsing => "PARSING",
            Self::Parsed => "PARSED",
            Self::ParseFailed => "PARSE_FAILED",
            Self::Scoring => "SCORING",
            Self::Scored => "SCORED",
            Self::Inserting => "INSERTING",
            Self::Inserted => "INSERTED",
            Self::InsertFailed => "INSERT_FAILED",
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source document and its progress through the pipeline
#[derive(Debug, Clone)]
pub struct DocumentUnit {
    /// Unique identifier
    pub id: DocumentId,

    /// Position in load order
    pub index: usize,

    /// Where the document came from (usually a file path)
    pub source: String,

    /// Loader metadata (`file_name`, `extension`, ...)
    pub metadata: BTreeMap<String, String>,

    /// Cleaned document text
    pub text: String,

    /// Summary returned by the pre-validation call
    pub summary: Option<String>,

    /// Stitched JSON array of row objects
    pub parsed_payload: Option<Value>,

    /// Reason of a terminal failure
    pub failure: Option<String>,

    state: DocumentState,
}

impl DocumentUnit {
    /// Create a document in the `Raw` state
    pub fn new(index: usize, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            index,
            source: source.into(),
            metadata: BTreeMap::new(),
            text: text.into(),
            summary: None,
            parsed_payload: None,
            failure: None,
            state: DocumentState::Raw,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Move to `next`, enforcing the lifecycle
    pub fn transition(&mut self, next: DocumentState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Move to a terminal failure state and record why
    pub fn fail(&mut self, next: DocumentState, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(next)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    /// Lower-cased file extension, taken from metadata or from the source path
    pub fn extension(&self) -> String {
        if let Some(ext) = self.metadata.get("extension") {
            return ext.to_ascii_lowercase();
        }
        let name = self.metadata.get("file_name").unwrap_or(&self.source);
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Metadata and text as sent to the summarization call
    pub fn context(&self) -> String {
        render_context(&self.metadata, &self.text)
    }
}

/// A slice of a document dispatched as one extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position within the document
    pub index: usize,

    /// Segment text
    pub text: String,

    /// Metadata inherited from the document
    pub metadata: BTreeMap<String, String>,

    /// The segment stands for the whole document (images)
    pub whole_document: bool,
}

impl Segment {
    /// Create a segment with no metadata
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            metadata: BTreeMap::new(),
            whole_document: false,
        }
    }

    /// Metadata and text as sent to the extraction call
    pub fn context(&self) -> String {
        render_context(&self.metadata, &self.text)
    }
}

fn render_context(metadata: &BTreeMap<String, String>, text: &str) -> String {
    if metadata.is_empty() {
        return text.to_string();
    }
    let mut out = String::from("metadata:\n");
    for (key, value) in metadata {
        out.push_str(&format!("  {}: {}\n", key, value));
    }
    out.push_str("text:\n");
    out.push_str(text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut doc = DocumentUnit::new(0, "a.txt", "hello");
        for next in [
            DocumentState::Validating,
            DocumentState::Valid,
            DocumentState::Parsing,
            DocumentState::Parsed,
            DocumentState::Scoring,
            DocumentState::Scored,
            DocumentState::Inserting,
            DocumentState::Inserted,
        ] {
            doc.transition(next).unwrap();
        }
        assert!(doc.state().is_terminal());
        assert!(!doc.state().is_failure());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut doc = DocumentUnit::new(0, "a.txt", "hello");
        let err = doc.transition(DocumentState::Parsing).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: DocumentState::Raw,
                to: DocumentState::Parsing
            }
        );
        assert_eq!(doc.state(), DocumentState::Raw);
    }

    #[test]
    fn test_fail_records_reason() {
        let mut doc = DocumentUnit::new(3, "a.txt", "hello");
        doc.transition(DocumentState::Validating).unwrap();
        doc.fail(DocumentState::Rejected, "unrelated").unwrap();
        assert_eq!(doc.state(), DocumentState::Rejected);
        assert_eq!(doc.failure.as_deref(), Some("unrelated"));
    }

    #[test]
    fn test_invalid_summary_detection() {
        assert!(is_invalid_summary(""));
        assert!(is_invalid_summary("  \n "));
        assert!(is_invalid_summary("INVALID_PARSING"));
        assert!(is_invalid_summary("invalid_parsing\n"));
        assert!(is_invalid_summary("\nINVALID_\nPARSING "));
        assert!(!is_invalid_summary("Invoice listing three payments"));
    }

    #[test]
    fn test_extension_lookup() {
        let doc = DocumentUnit::new(0, "/tmp/Report.CSV", "");
        assert_eq!(doc.extension(), "csv");

        let doc = DocumentUnit::new(0, "/tmp/x", "").with_metadata("extension", "MD");
        assert_eq!(doc.extension(), "md");

        let doc = DocumentUnit::new(0, "/tmp/noext", "");
        assert_eq!(doc.extension(), "");
    }

    #[test]
    fn test_segment_context_includes_metadata() {
        let mut segment = Segment::new(0, "row one");
        assert_eq!(segment.context(), "row one");

        segment.metadata.insert("file_name".into(), "a.csv".into());
        let context = segment.context();
        assert!(context.contains("file_name: a.csv"));
        assert!(context.ends_with("row one"));
    }

    proptest! {
        #[test]
        fn terminal_states_have_no_exit(from in 0usize..12, to in 0usize..12) {
            let from = DocumentState::ALL[from];
            let to = DocumentState::ALL[to];
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }
    }
}
