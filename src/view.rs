use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::types::{OperationStatus, StoreSnapshot};

const HEADING: &str = "Murhaf Full Stack Notes";

/// Render a snapshot as a plain-text page.
pub fn render(snapshot: &StoreSnapshot) -> String {
    let mut out = String::new();
    let pending = snapshot.status == OperationStatus::Pending;

    let _ = writeln!(out, "# {HEADING}");
    if let Some(err) = &snapshot.last_error {
        let _ = writeln!(out, "! {err}");
    }

    let _ = writeln!(out, "Title: {}", snapshot.draft.title);
    let _ = writeln!(out, "Content: {}", snapshot.draft.content);
    let _ = writeln!(out, "[{}]", if pending { "Saving..." } else { "Add Note" });
    let _ = writeln!(out, "---");

    if snapshot.notes.is_empty() {
        let _ = writeln!(out, "{}", if pending { "Loading..." } else { "No notes yet." });
    }
    for note in &snapshot.notes {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", note.title);
        let _ = writeln!(out, "{}", note.content);
        let _ = writeln!(out, "Created at: {}", format_created_at(&note.created_at));
        let _ = writeln!(out, "id: {}", note.id);
    }
    out
}

/// Best-effort display form of a server timestamp. Unknown formats are shown raw.
pub fn format_created_at(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%Y-%m-%d 00:00:00").to_string();
    }
    raw.to_string()
}

/// Print the page now and after every store change.
/// Finishes once every handle to the store has been dropped.
pub fn spawn_renderer(mut rx: watch::Receiver<StoreSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let page = render(&rx.borrow_and_update());
        println!("{page}");
        while rx.changed().await.is_ok() {
            let page = render(&rx.borrow_and_update());
            println!("{page}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DraftNote, Note, NoteId};

    fn one_note() -> Note {
        Note {
            id: NoteId::Number(1),
            title: "T".to_string(),
            content: "C".to_string(),
            created_at: "2024-01-01T10:30:00.000Z".to_string(),
        }
    }

    #[test]
    fn empty_idle_page_says_no_notes() {
        let page = render(&StoreSnapshot::default());
        assert!(page.starts_with("# Murhaf Full Stack Notes\n"));
        assert!(page.contains("No notes yet."));
        assert!(page.contains("[Add Note]"));
        assert!(!page.contains("! "));
    }

    #[test]
    fn empty_pending_page_says_loading() {
        let snapshot = StoreSnapshot {
            status: OperationStatus::Pending,
            ..Default::default()
        };
        let page = render(&snapshot);
        assert!(page.contains("Loading..."));
        assert!(page.contains("[Saving...]"));
    }

    #[test]
    fn banner_and_notes_are_shown() {
        let snapshot = StoreSnapshot {
            notes: vec![one_note()],
            draft: DraftNote::new("draft title", ""),
            last_error: Some("Error deleting note".to_string()),
            ..Default::default()
        };
        let page = render(&snapshot);
        assert!(page.contains("! Error deleting note"));
        assert!(page.contains("Title: draft title"));
        assert!(page.contains("## T"));
        assert!(page.contains("Created at: 2024-01-01 10:30:00"));
        assert!(!page.contains("No notes yet."));
    }

    #[test]
    fn created_at_formats() {
        assert_eq!(format_created_at("2024-01-01"), "2024-01-01 00:00:00");
        assert_eq!(format_created_at("2024-01-01 08:00:00"), "2024-01-01 08:00:00");
        assert_eq!(format_created_at("2024-01-01T08:00:00+02:00"), "2024-01-01 06:00:00");
        assert_eq!(format_created_at("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn renderer_stops_when_sender_is_dropped() {
        let (tx, rx) = watch::channel(StoreSnapshot::default());
        let handle = spawn_renderer(rx);
        tx.send_replace(StoreSnapshot {
            notes: vec![one_note()],
            ..Default::default()
        });
        drop(tx);
        handle.await.unwrap();
    }
}
