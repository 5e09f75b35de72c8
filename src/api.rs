//! Typed client for the Notes REST API.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::types::{DraftNote, Note, NoteId};

/// The three calls the store needs from the backend.
#[async_trait]
pub trait NotesApi: Send + Sync {
    async fn list_notes(&self) -> Result<Vec<Note>, ApiError>;
    async fn create_note(&self, draft: &DraftNote) -> Result<Note, ApiError>;
    async fn delete_note(&self, id: &NoteId) -> Result<(), ApiError>;
}

pub struct HttpNotesApi {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpNotesApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            config,
            client: builder.build()?,
        })
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    /// URL of a single note. The id is pushed as one path segment so reserved
    /// characters in string ids are percent-encoded.
    fn note_url(&self, id: &NoteId) -> Result<reqwest::Url, ApiError> {
        let base = self.config.notes_url();
        let mut url = reqwest::Url::parse(&base).map_err(|e| ApiError::Url(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(base.clone()))?
            .pop_if_empty()
            .push(&id.to_string());
        Ok(url)
    }

    /// Reads the body as text first so a shape mismatch reports the serde error
    /// instead of a generic transport one.
    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl NotesApi for HttpNotesApi {
    async fn list_notes(&self) -> Result<Vec<Note>, ApiError> {
        let resp = self.client.get(self.config.notes_url()).send().await?;
        let resp = Self::check(resp).await?;
        Self::decode(resp).await
    }

    async fn create_note(&self, draft: &DraftNote) -> Result<Note, ApiError> {
        let resp = self
            .client
            .post(self.config.notes_url())
            .json(draft)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Self::decode(resp).await
    }

    async fn delete_note(&self, id: &NoteId) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.note_url(id)?)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
