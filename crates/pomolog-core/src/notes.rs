//! Note identity.
//!
//! The timer only remembers *which* note was active when a session
//! started. Turning that into a link, or finding today's daily note, is
//! up to the host through [`NoteResolver`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a note, usually its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteRef(String);

impl NoteRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without directory or `.md` extension.
    pub fn title(&self) -> &str {
        let name = self.0.rsplit(['/', '\\']).next().unwrap_or(&self.0);
        name.strip_suffix(".md").unwrap_or(name)
    }
}

impl std::fmt::Display for NoteRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait NoteResolver: Send + Sync {
    /// The note the user is looking at right now, if any.
    fn active_note(&self) -> Option<NoteRef>;

    /// Path of the daily note for `date`, if daily notes are available.
    fn daily_note_path(&self, date: NaiveDate) -> Option<String>;

    /// Markdown link to `note`. Defaults to a wiki link.
    fn markdown_link(&self, note: &NoteRef) -> String {
        format!("[[{}]]", note.title())
    }
}

/// Resolver for hosts without notes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotes;

impl NoteResolver for NoNotes {
    fn active_note(&self) -> Option<NoteRef> {
        None
    }

    fn daily_note_path(&self, _date: NaiveDate) -> Option<String> {
        None
    }
}
