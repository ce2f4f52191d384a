pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod highlight;
pub mod search;
pub mod ui;

pub use api::{HttpNoteRepository, Note, NoteDraft, NoteId, NoteRepository, RepositoryError};
pub use app::{Completion, ControllerOptions, Effect, NoteController};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use debounce::Debouncer;
