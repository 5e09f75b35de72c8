use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned note identifier.
/// The API may hand out numeric or string ids; either is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteId {
    Number(i64),
    Text(String),
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteId::Number(n) => write!(f, "{n}"),
            NoteId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NoteId {
    fn from(n: i64) -> Self {
        NoteId::Number(n)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        NoteId::Text(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        NoteId::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: String, // server timestamp, kept verbatim
}

/// Title/content being composed. Also the POST body for a create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftNote {
    pub title: String,
    pub content: String,
}

impl DraftNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Whitespace-only fields count as empty.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Idle,
    Pending,
}

/// Logical slot a request competes in. Only the latest request per slot
/// gets to reconcile its response into local state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationSlot {
    List,
    Create(u64),
    Delete(NoteId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InFlight {
    pub request_id: u64,
    pub slot: OperationSlot,
}

/// Owned view of the store, published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub notes: Vec<Note>,
    pub draft: DraftNote,
    pub status: OperationStatus,
    pub last_error: Option<String>,
    pub in_flight: Vec<InFlight>,
}
