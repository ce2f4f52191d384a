use std::time::{Duration, Instant};

use crate::api::{Note, NoteDraft, NoteId, RepositoryError};
use crate::config::{AppConfig, RefreshOrdering};
use crate::debounce::Debouncer;
use crate::search::{ListQuery, SortSpec};

use super::state::{
    ActiveSurface, ControllerState, DeleteToken, Notification, PendingDelete, SaveMode, Severity,
    LOAD_ERROR_MESSAGE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchNotes { seq: u64, query: ListQuery },
    CreateNote { draft: NoteDraft },
    UpdateNote { id: NoteId, draft: NoteDraft },
    DeleteNote { id: NoteId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    NotesFetched {
        seq: u64,
        result: Result<Vec<Note>, RepositoryError>,
    },
    Saved {
        mode: SaveMode,
        result: Result<Note, RepositoryError>,
    },
    Deleted {
        id: NoteId,
        result: Result<(), RepositoryError>,
    },
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub debounce: Duration,
    pub notification_ttl: Duration,
    pub sort: SortSpec,
    pub ordering: RefreshOrdering,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ControllerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            debounce: config.search.debounce(),
            notification_ttl: config.notifications.auto_hide(),
            sort: config.default_sort,
            ordering: config.search.refresh_ordering,
        }
    }
}

#[derive(Debug)]
pub struct NoteController {
    state: ControllerState,
    options: ControllerOptions,
    search_debounce: Debouncer<String>,
    issued_seq: u64,
}

impl NoteController {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            state: ControllerState::default(),
            search_debounce: Debouncer::new(options.debounce),
            options,
            issued_seq: 0,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn search_term(&self) -> &str {
        &self.state.search.term
    }

    pub fn debounced_search_term(&self) -> &str {
        &self.state.search.debounced
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn is_saving(&self) -> bool {
        self.state.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn surface(&self) -> &ActiveSurface {
        &self.state.surface
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.state.notification.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.state.pending_delete.as_ref()
    }

    pub fn start(&mut self) -> Effect {
        tracing::info!(sort = %self.options.sort.as_param(), "starting note session");
        self.refresh()
    }

    pub fn refresh(&mut self) -> Effect {
        self.issued_seq += 1;
        self.state.loading = true;
        self.state.error = None;
        let query = ListQuery::new(self.state.search.debounced.clone(), self.options.sort);
        tracing::debug!(seq = self.issued_seq, search = %query.search, "refreshing notes");
        Effect::FetchNotes {
            seq: self.issued_seq,
            query,
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>, now: Instant) {
        let term = term.into();
        self.state.search.term = term.clone();
        self.search_debounce.push(term, now);
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(term) = self.search_debounce.poll(now) {
            if term != self.state.search.debounced {
                self.state.search.debounced = term;
                effects.push(self.refresh());
            }
        }
        let ttl = self.options.notification_ttl;
        if self
            .state
            .notification
            .as_ref()
            .is_some_and(|notification| now >= notification.expires_at(ttl))
        {
            self.state.notification = None;
        }
        effects
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let ttl = self.options.notification_ttl;
        let expiry = self
            .state
            .notification
            .as_ref()
            .map(|notification| notification.expires_at(ttl));
        match (self.search_debounce.deadline(), expiry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn open_create_form(&mut self) {
        self.state.surface = ActiveSurface::Form { editing: None };
    }

    pub fn open_edit_form(&mut self, note: Note) {
        self.state.surface = ActiveSurface::Form {
            editing: Some(note),
        };
    }

    pub fn open_viewer(&mut self, note: Note) -> bool {
        if self.state.surface.is_form() {
            tracing::debug!("viewer request ignored while the form is open");
            return false;
        }
        self.state.surface = ActiveSurface::Viewer { note };
        true
    }

    pub fn edit_viewed_note(&mut self) -> bool {
        let ActiveSurface::Viewer { note } = std::mem::take(&mut self.state.surface) else {
            return false;
        };
        self.open_edit_form(note);
        true
    }

    pub fn close_surface(&mut self) {
        self.state.surface = ActiveSurface::None;
    }

    pub fn save(&mut self, draft: NoteDraft, now: Instant) -> Option<Effect> {
        if !self.state.surface.is_form() {
            tracing::debug!("save ignored, no form is open");
            return None;
        }
        if self.state.saving {
            tracing::debug!("save ignored, another save is in flight");
            return None;
        }
        if let Err(err) = draft.validate() {
            self.notify(err.to_string(), Severity::Error, now);
            return None;
        }
        let target = self
            .state
            .surface
            .editing_note()
            .and_then(|note| note.id.clone());
        self.state.saving = true;
        Some(match target {
            Some(id) => Effect::UpdateNote { id, draft },
            None => Effect::CreateNote { draft },
        })
    }

    // A newer request replaces an older unanswered one.
    pub fn request_delete(&mut self, id: NoteId) -> DeleteToken {
        let token = DeleteToken::fresh();
        if let Some(previous) = self.state.pending_delete.replace(PendingDelete {
            token,
            id,
        }) {
            tracing::debug!(id = %previous.id, "superseded unanswered delete request");
        }
        token
    }

    pub fn confirm_delete(&mut self, token: DeleteToken) -> Option<Effect> {
        let pending = self.take_pending_delete(token)?;
        Some(Effect::DeleteNote { id: pending.id })
    }

    pub fn cancel_delete(&mut self, token: DeleteToken) -> bool {
        self.take_pending_delete(token).is_some()
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.state.notification = Some(Notification {
            message: message.into(),
            severity,
            shown_at: now,
        });
    }

    pub fn dismiss_notification(&mut self) {
        self.state.notification = None;
    }

    pub fn apply(&mut self, completion: Completion, now: Instant) -> Vec<Effect> {
        match completion {
            Completion::NotesFetched { seq, result } => {
                self.apply_fetch(seq, result);
                Vec::new()
            }
            Completion::Saved { mode, result } => self.apply_save(mode, result, now),
            Completion::Deleted { id, result } => self.apply_delete(id, result, now),
        }
    }

    fn apply_fetch(&mut self, seq: u64, result: Result<Vec<Note>, RepositoryError>) {
        if seq < self.issued_seq && self.options.ordering == RefreshOrdering::LatestIssued {
            tracing::warn!(seq, latest = self.issued_seq, "discarding stale list response");
            return;
        }
        match result {
            Ok(notes) => {
                tracing::debug!(seq, count = notes.len(), "notes loaded");
                self.state.notes = notes;
            }
            Err(err) => {
                tracing::warn!(?err, seq, "failed to load notes");
                self.state.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        self.state.loading = false;
    }

    fn apply_save(
        &mut self,
        mode: SaveMode,
        result: Result<Note, RepositoryError>,
        now: Instant,
    ) -> Vec<Effect> {
        let effects = match result {
            Ok(note) => {
                tracing::info!(id = ?note.id, %mode, "note saved");
                if self.state.surface.is_form() {
                    self.close_surface();
                }
                self.notify(mode.success_message(), Severity::Success, now);
                vec![self.refresh()]
            }
            Err(err) => {
                tracing::warn!(?err, %mode, "failed to save note");
                self.notify("Failed to save note", Severity::Error, now);
                Vec::new()
            }
        };
        self.state.saving = false;
        effects
    }

    fn apply_delete(
        &mut self,
        id: NoteId,
        result: Result<(), RepositoryError>,
        now: Instant,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                tracing::info!(%id, "note deleted");
                let viewing_deleted = self
                    .state
                    .surface
                    .viewed_note()
                    .is_some_and(|note| note.id.as_ref() == Some(&id));
                if viewing_deleted {
                    self.close_surface();
                }
                self.notify("Note deleted", Severity::Success, now);
                vec![self.refresh()]
            }
            Err(err) => {
                tracing::warn!(?err, %id, "failed to delete note");
                self.notify("Failed to delete note", Severity::Error, now);
                Vec::new()
            }
        }
    }

    fn take_pending_delete(&mut self, token: DeleteToken) -> Option<PendingDelete> {
        match &self.state.pending_delete {
            Some(pending) if pending.token == token => self.state.pending_delete.take(),
            _ => None,
        }
    }
}
