pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod view;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::HttpNotesApi;
use crate::config::ClientConfig;
use crate::store::NoteStore;
use crate::types::{DraftNote, InFlight, Note, OperationSlot, OperationStatus, StoreSnapshot};

/// Session state behind the note store.
#[derive(Default)]
pub struct StoreState {
    /// Cached copy of the server's notes, in server order.
    pub notes: Vec<Note>,
    /// Note being composed. Cleared only after a confirmed create.
    pub draft: DraftNote,
    /// Banner text of the last failed operation, if any.
    pub last_error: Option<String>,
    /// Requests sent but not yet reconciled.
    /// `status()` is derived from this, so several overlapping operations
    /// still read as a single pending flag.
    pub in_flight: Vec<InFlight>,
    /// Latest request id issued per slot. A completion whose id is no longer
    /// here has been superseded and must not touch `notes`.
    pub latest: HashMap<OperationSlot, u64>,
    pub next_request_id: u64,
}

impl StoreState {
    pub fn status(&self) -> OperationStatus {
        if self.in_flight.is_empty() {
            OperationStatus::Idle
        } else {
            OperationStatus::Pending
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notes: self.notes.clone(),
            draft: self.draft.clone(),
            status: self.status(),
            last_error: self.last_error.clone(),
            in_flight: self.in_flight.clone(),
        }
    }

    /// Register a new request and clear the previous error.
    pub fn begin(&mut self, slot: impl FnOnce(u64) -> OperationSlot) -> (u64, OperationSlot) {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let slot = slot(request_id);
        self.latest.insert(slot.clone(), request_id);
        self.in_flight.push(InFlight {
            request_id,
            slot: slot.clone(),
        });
        self.last_error = None;
        (request_id, slot)
    }

    /// Unregister a request. Returns true if it is still the latest for its slot.
    pub fn finish(&mut self, request_id: u64, slot: &OperationSlot) -> bool {
        self.in_flight.retain(|f| f.request_id != request_id);
        let is_latest = self.latest.get(slot) == Some(&request_id);
        if is_latest {
            self.latest.remove(slot);
        }
        is_latest
    }

    /// Replace the cached list, keeping the first of any repeated id.
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        let mut seen = HashSet::new();
        self.notes = notes
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();
    }

    /// Put a confirmed note at the front, dropping any stale copy of it.
    pub fn prepend_note(&mut self, note: Note) {
        self.notes.retain(|n| n.id != note.id);
        self.notes.insert(0, note);
    }
}

/// Type alias used by the store and its background tasks.
pub type StoreMutex = Mutex<StoreState>;

/// Load the notes once and print the page.
pub async fn run() -> anyhow::Result<()> {
    // Only log WARN and above in production to avoid leaking note content
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt::init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();

    let config = ClientConfig::default();
    tracing::info!("Using notes API at {}", config.base_url);
    let api = HttpNotesApi::new(config)?;
    let store = NoteStore::new(Arc::new(api));

    let renderer = view::spawn_renderer(store.subscribe());

    // A failed load is already on the banner; the page still renders.
    let _ = store.refresh().await;

    drop(store);
    renderer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoteId;

    fn note(id: i64) -> Note {
        Note {
            id: NoteId::Number(id),
            title: format!("t{id}"),
            content: "c".to_string(),
            created_at: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn later_request_supersedes_earlier_in_same_slot() {
        let mut s = StoreState::default();
        let (first, slot) = s.begin(|_| OperationSlot::List);
        let (second, _) = s.begin(|_| OperationSlot::List);
        assert_eq!(s.status(), OperationStatus::Pending);

        assert!(s.finish(second, &slot));
        assert!(!s.finish(first, &slot));
        assert_eq!(s.status(), OperationStatus::Idle);
    }

    #[test]
    fn begin_clears_last_error() {
        let mut s = StoreState {
            last_error: Some("Error deleting note".to_string()),
            ..Default::default()
        };
        s.begin(OperationSlot::Create);
        assert!(s.last_error.is_none());
    }

    #[test]
    fn replace_notes_drops_repeated_ids() {
        let mut s = StoreState::default();
        let mut dup = note(1);
        dup.title = "second copy".to_string();
        s.replace_notes(vec![note(1), note(2), dup]);
        assert_eq!(s.notes, vec![note(1), note(2)]);
    }

    #[test]
    fn prepend_replaces_stale_copy() {
        let mut s = StoreState::default();
        s.replace_notes(vec![note(2), note(1)]);
        s.prepend_note(note(1));
        assert_eq!(s.notes, vec![note(1), note(2)]);
    }
}
