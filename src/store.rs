use std::sync::Arc;

use tokio::sync::watch;

use crate::api::NotesApi;
use crate::error::{NoteError, CREATE_MESSAGE, DELETE_MESSAGE, FETCH_MESSAGE, VALIDATION_MESSAGE};
use crate::types::{DraftNote, Note, NoteId, OperationSlot, OperationStatus, StoreSnapshot};
use crate::{StoreMutex, StoreState};

// ─── Store ─────────────────────────────────────────────────────────────────────

/// Session cache of the remote notes plus the three operations that keep it
/// in sync. Cloning is cheap and every clone shares the same state.
///
/// Local state only changes once the server has answered: there is no
/// optimistic insert or removal to roll back.
#[derive(Clone)]
pub struct NoteStore {
    state: Arc<StoreMutex>,
    api: Arc<dyn NotesApi>,
    updates: Arc<watch::Sender<StoreSnapshot>>,
}

impl NoteStore {
    pub fn new(api: Arc<dyn NotesApi>) -> Self {
        let (tx, _rx) = watch::channel(StoreSnapshot::default());
        Self {
            state: Arc::new(StoreMutex::new(StoreState::default())),
            api,
            updates: Arc::new(tx),
        }
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.state.lock().await.notes.clone()
    }

    pub async fn status(&self) -> OperationStatus {
        self.state.lock().await.status()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn draft(&self) -> DraftNote {
        self.state.lock().await.draft.clone()
    }

    pub async fn set_draft_title(&self, title: impl Into<String>) {
        let mut s = self.state.lock().await;
        s.draft.title = title.into();
        self.publish(&s);
    }

    pub async fn set_draft_content(&self, content: impl Into<String>) {
        let mut s = self.state.lock().await;
        s.draft.content = content.into();
        self.publish(&s);
    }

    /// Fetch the full list and replace the local copy with it.
    pub async fn refresh(&self) -> Result<(), NoteError> {
        let request = self.begin(|_| OperationSlot::List).await;
        let request_id = request.request_id;

        let result = self.api.list_notes().await;

        let mut s = self.state.lock().await;
        let is_latest = request.complete(&mut s);
        let outcome = match result {
            Ok(notes) => {
                if is_latest {
                    tracing::info!("Fetched {} notes", notes.len());
                    s.replace_notes(notes);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Fetching notes failed: {e}");
                if is_latest {
                    s.last_error = Some(FETCH_MESSAGE.to_string());
                }
                Err(NoteError::Fetch(e))
            }
        };
        if !is_latest {
            tracing::debug!("Dropping superseded list response (request {request_id})");
        }
        self.publish(&s);
        outcome
    }

    /// Create a note from `draft`. The note only appears locally once the
    /// server has returned it with its id and timestamp.
    pub async fn create_note(&self, draft: DraftNote) -> Result<Note, NoteError> {
        if !draft.is_valid() {
            let mut s = self.state.lock().await;
            s.last_error = Some(VALIDATION_MESSAGE.to_string());
            self.publish(&s);
            tracing::warn!("Rejected note with empty title or content");
            return Err(NoteError::Validation);
        }

        let request = self.begin(OperationSlot::Create).await;

        let result = self.api.create_note(&draft).await;

        let mut s = self.state.lock().await;
        request.complete(&mut s);
        let outcome = match result {
            Ok(note) => {
                tracing::info!("Created note {}", note.id);
                s.prepend_note(note.clone());
                s.draft = DraftNote::default();
                Ok(note)
            }
            Err(e) => {
                tracing::error!("Creating note failed: {e}");
                s.last_error = Some(CREATE_MESSAGE.to_string());
                Err(NoteError::Create(e))
            }
        };
        self.publish(&s);
        outcome
    }

    /// Create a note from the draft currently held by the store.
    pub async fn submit_draft(&self) -> Result<Note, NoteError> {
        let draft = self.draft().await;
        self.create_note(draft).await
    }

    /// Delete a note on the server, then drop it locally.
    /// A note that is already gone locally is not an error.
    pub async fn delete_note(&self, id: &NoteId) -> Result<(), NoteError> {
        let request = self.begin(|_| OperationSlot::Delete(id.clone())).await;
        let request_id = request.request_id;

        let result = self.api.delete_note(id).await;

        let mut s = self.state.lock().await;
        let is_latest = request.complete(&mut s);
        let outcome = match result {
            Ok(()) => {
                if is_latest {
                    let before = s.notes.len();
                    s.notes.retain(|n| &n.id != id);
                    tracing::info!("Deleted note {id} ({} removed locally)", before - s.notes.len());
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Deleting note {id} failed: {e}");
                if is_latest {
                    s.last_error = Some(DELETE_MESSAGE.to_string());
                }
                Err(NoteError::Delete(e))
            }
        };
        if !is_latest {
            tracing::debug!("Dropping superseded delete response for {id} (request {request_id})");
        }
        self.publish(&s);
        outcome
    }

    // ─── Internal helpers ──────────────────────────────────────────────────────

    async fn begin(&self, slot: impl FnOnce(u64) -> OperationSlot) -> PendingRequest {
        let mut s = self.state.lock().await;
        let (request_id, slot) = s.begin(slot);
        self.publish(&s);
        PendingRequest {
            state: self.state.clone(),
            updates: self.updates.clone(),
            request_id,
            slot,
            armed: true,
        }
    }

    fn publish(&self, s: &StoreState) {
        self.updates.send_replace(s.snapshot());
    }
}

/// Registry entry of a request that has been sent but not reconciled.
/// If the operation's future is dropped before the response is applied
/// (timeout, aborted task), dropping this unregisters the request so the
/// store does not stay pending forever.
struct PendingRequest {
    state: Arc<StoreMutex>,
    updates: Arc<watch::Sender<StoreSnapshot>>,
    request_id: u64,
    slot: OperationSlot,
    armed: bool,
}

impl PendingRequest {
    /// Unregister under the caller's lock. Returns true if this request is
    /// still the latest for its slot.
    fn complete(mut self, s: &mut StoreState) -> bool {
        self.armed = false;
        s.finish(self.request_id, &self.slot)
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!("Request {} abandoned before completion", self.request_id);
        let request_id = self.request_id;
        let slot = self.slot.clone();
        match self.state.try_lock() {
            Ok(mut s) => {
                s.finish(request_id, &slot);
                self.updates.send_replace(s.snapshot());
            }
            Err(_) => {
                // Someone holds the lock; finish on the runtime instead.
                let state = self.state.clone();
                let updates = self.updates.clone();
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        let mut s = state.lock().await;
                        s.finish(request_id, &slot);
                        updates.send_replace(s.snapshot());
                    });
                }
            }
        }
    }
}
