use thiserror::Error;

pub const VALIDATION_MESSAGE: &str = "Title and content are required";
pub const FETCH_MESSAGE: &str = "Error fetching notes";
pub const CREATE_MESSAGE: &str = "Error creating note";
pub const DELETE_MESSAGE: &str = "Error deleting note";

/// Failure talking to the Notes API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    Url(String),
}

/// User-facing error categories. `Display` is the fixed banner text.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Title and content are required")]
    Validation,

    #[error("Error fetching notes")]
    Fetch(#[source] ApiError),

    #[error("Error creating note")]
    Create(#[source] ApiError),

    #[error("Error deleting note")]
    Delete(#[source] ApiError),
}

impl NoteError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NoteError::Validation => VALIDATION_MESSAGE,
            NoteError::Fetch(_) => FETCH_MESSAGE,
            NoteError::Create(_) => CREATE_MESSAGE,
            NoteError::Delete(_) => DELETE_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_banner_text() {
        let status = || ApiError::Status {
            status: 500,
            body: String::new(),
        };
        for err in [
            NoteError::Validation,
            NoteError::Fetch(status()),
            NoteError::Create(status()),
            NoteError::Delete(status()),
        ] {
            assert_eq!(err.to_string(), err.user_message());
        }
    }
}
