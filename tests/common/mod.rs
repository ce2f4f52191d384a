#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use quicknote::api::{split_tags, HttpNoteRepository, Note, NoteDraft, NoteId};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Store {
    next_id: i64,
    clock: u32,
    notes: Vec<Note>,
    failing: bool,
    list_requests: Vec<ListParams>,
}

impl Store {
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("2024-01-01T00:{:02}:{:02}Z", self.clock / 60, self.clock % 60)
    }

    fn insert(&mut self, draft: &NoteDraft) -> Note {
        self.next_id += 1;
        let stamp = self.tick();
        let note = Note {
            id: Some(NoteId::from(self.next_id)),
            title: draft.title.clone(),
            text: draft.text.clone(),
            tags: draft.tags.clone(),
            tags_list: split_tags(&draft.tags),
            created_at: Some(stamp.clone()),
            updated_at: Some(stamp),
        };
        self.notes.push(note.clone());
        note
    }

    fn position(&self, id: i64) -> Option<usize> {
        let id = NoteId::from(id);
        self.notes.iter().position(|note| note.id.as_ref() == Some(&id))
    }
}

type Shared = Arc<Mutex<Store>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// In-process stand-in for the notes REST service.
pub struct FakeBackend {
    pub addr: SocketAddr,
    store: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let store = Shared::default();
        let router = Router::new()
            .route("/api/notes/", get(list_notes).post(create_note))
            .route(
                "/api/notes/:id/",
                get(get_note)
                    .put(update_note)
                    .patch(patch_note)
                    .delete(delete_note),
            )
            .with_state(store.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve fake backend");
        });
        Self {
            addr,
            store,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn repository(&self) -> HttpNoteRepository {
        HttpNoteRepository::with_client(&self.base_url(), reqwest::Client::new())
    }

    pub async fn seed(&self, title: &str, text: &str, tags: &str) -> Note {
        self.store
            .lock()
            .await
            .insert(&NoteDraft::new(title, text, tags))
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.store.lock().await.notes.clone()
    }

    pub async fn set_failing(&self, failing: bool) {
        self.store.lock().await.failing = failing;
    }

    pub async fn list_requests(&self) -> Vec<ListParams> {
        self.store.lock().await.list_requests.clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

fn blank_title() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"title": ["This field may not be blank."]})),
    )
        .into_response()
}

fn matches_search(note: &Note, search: &str) -> bool {
    let needle = search.to_lowercase();
    [&note.title, &note.text, &note.tags]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

async fn list_notes(State(store): State<Shared>, Query(params): Query<ListParams>) -> Response {
    let mut store = store.lock().await;
    store.list_requests.push(params.clone());
    if store.failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let search = params.search.unwrap_or_default();
    let mut notes: Vec<Note> = store
        .notes
        .iter()
        .filter(|note| matches_search(note, &search))
        .cloned()
        .collect();
    let sort = params.sort.unwrap_or_else(|| "-updated_at".to_string());
    let (descending, field) = match sort.strip_prefix('-') {
        Some(field) => (true, field.to_string()),
        None => (false, sort.clone()),
    };
    notes.sort_by(|a, b| {
        let (left, right) = if field == "created_at" {
            (&a.created_at, &b.created_at)
        } else {
            (&a.updated_at, &b.updated_at)
        };
        left.cmp(right)
    });
    if descending {
        notes.reverse();
    }
    Json(notes).into_response()
}

async fn get_note(State(store): State<Shared>, Path(id): Path<i64>) -> Response {
    let store = store.lock().await;
    match store.position(id) {
        Some(idx) => Json(store.notes[idx].clone()).into_response(),
        None => not_found(),
    }
}

async fn create_note(State(store): State<Shared>, Json(draft): Json<NoteDraft>) -> Response {
    if draft.title.trim().is_empty() {
        return blank_title();
    }
    let note = store.lock().await.insert(&draft);
    (StatusCode::CREATED, Json(note)).into_response()
}

async fn update_note(
    State(store): State<Shared>,
    Path(id): Path<i64>,
    Json(draft): Json<NoteDraft>,
) -> Response {
    if draft.title.trim().is_empty() {
        return blank_title();
    }
    let mut store = store.lock().await;
    let Some(idx) = store.position(id) else {
        return not_found();
    };
    let stamp = store.tick();
    let note = &mut store.notes[idx];
    note.title = draft.title;
    note.text = draft.text;
    note.tags_list = split_tags(&draft.tags);
    note.tags = draft.tags;
    note.updated_at = Some(stamp);
    Json(note.clone()).into_response()
}

async fn patch_note(
    State(store): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = store.lock().await;
    let Some(idx) = store.position(id) else {
        return not_found();
    };
    let stamp = store.tick();
    let note = &mut store.notes[idx];
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        note.title = title.to_string();
    }
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        note.text = text.to_string();
    }
    if let Some(tags) = body.get("tags").and_then(Value::as_str) {
        note.tags = tags.to_string();
        note.tags_list = split_tags(tags);
    }
    note.updated_at = Some(stamp);
    Json(note.clone()).into_response()
}

async fn delete_note(State(store): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut store = store.lock().await;
    match store.position(id) {
        Some(idx) => {
            store.notes.remove(idx);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(),
    }
}
