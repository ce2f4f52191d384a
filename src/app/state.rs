use std::time::{Duration, Instant};

use strum::{Display, EnumString};
use uuid::Uuid;

use crate::api::{Note, NoteId};

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load notes. Is the backend running?";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveSurface {
    #[default]
    None,
    Form { editing: Option<Note> },
    Viewer { note: Note },
}

impl ActiveSurface {
    pub fn is_none(&self) -> bool {
        matches!(self, ActiveSurface::None)
    }

    pub fn is_form(&self) -> bool {
        matches!(self, ActiveSurface::Form { .. })
    }

    pub fn is_viewer(&self) -> bool {
        matches!(self, ActiveSurface::Viewer { .. })
    }

    pub fn editing_note(&self) -> Option<&Note> {
        match self {
            ActiveSurface::Form { editing } => editing.as_ref(),
            _ => None,
        }
    }

    pub fn viewed_note(&self) -> Option<&Note> {
        match self {
            ActiveSurface::Viewer { note } => Some(note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

impl Notification {
    pub fn expires_at(&self, ttl: Duration) -> Instant {
        self.shown_at + ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeleteToken(Uuid);

impl DeleteToken {
    pub(crate) fn fresh() -> Self {
        DeleteToken(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub token: DeleteToken,
    pub id: NoteId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    // `debounced` is what the last issued list fetch asked for.
    pub term: String,
    pub debounced: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SaveMode {
    Create,
    Update,
}

impl SaveMode {
    pub fn success_message(self) -> &'static str {
        match self {
            SaveMode::Create => "Note created successfully",
            SaveMode::Update => "Note updated successfully",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub notes: Vec<Note>,
    pub search: SearchState,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub surface: ActiveSurface,
    pub notification: Option<Notification>,
    pub pending_delete: Option<PendingDelete>,
}

impl ControllerState {
    pub fn find_note(&self, id: &NoteId) -> Option<&Note> {
        self.notes
            .iter()
            .find(|note| note.id.as_ref() == Some(id))
    }
}
