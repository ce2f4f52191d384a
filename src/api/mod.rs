use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ApiOptions;
use crate::search::ListQuery;

mod errors;
mod model;

pub use errors::{FieldErrors, RepositoryError};
pub use model::{
    parse_timestamp, split_tags, DraftError, Note, NoteDraft, NoteId, NoteIdError, NotePatch,
};

const MAX_ERROR_BODY: usize = 200;

/// Request layer over the notes backend. Every call is a single round trip;
/// failures come back tagged and are never retried here.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, RepositoryError>;

    async fn get(&self, id: &NoteId) -> Result<Note, RepositoryError>;

    async fn create(&self, draft: &NoteDraft) -> Result<Note, RepositoryError>;

    /// Full replacement of the note's writable fields.
    async fn update(&self, id: &NoteId, draft: &NoteDraft) -> Result<Note, RepositoryError>;

    async fn patch(&self, id: &NoteId, patch: &NotePatch) -> Result<Note, RepositoryError>;

    async fn delete(&self, id: &NoteId) -> Result<(), RepositoryError>;
}

pub type SharedRepository = Arc<dyn NoteRepository>;

#[derive(Clone)]
pub struct HttpNoteRepository {
    base_url: Arc<str>,
    client: Client,
}

impl HttpNoteRepository {
    pub fn new(options: &ApiOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_client(&options.base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/notes/", self.base_url)
    }

    fn note_url(&self, id: &NoteId) -> String {
        format!("{}/notes/{}/", self.base_url, id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        tracing::debug!(%method, %url, "notes api request");
        self.client.request(method, url)
    }
}

#[async_trait]
impl NoteRepository for HttpNoteRepository {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, RepositoryError> {
        let response = send(
            self.request(Method::GET, self.collection_url())
                .query(&query.params()),
        )
        .await?;
        decode(response, "notes").await
    }

    async fn get(&self, id: &NoteId) -> Result<Note, RepositoryError> {
        let response = send(self.request(Method::GET, self.note_url(id))).await?;
        decode(response, &note_resource(id)).await
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note, RepositoryError> {
        let response = send(
            self.request(Method::POST, self.collection_url())
                .json(draft),
        )
        .await?;
        decode(response, "notes").await
    }

    async fn update(&self, id: &NoteId, draft: &NoteDraft) -> Result<Note, RepositoryError> {
        let response = send(self.request(Method::PUT, self.note_url(id)).json(draft)).await?;
        decode(response, &note_resource(id)).await
    }

    async fn patch(&self, id: &NoteId, patch: &NotePatch) -> Result<Note, RepositoryError> {
        let response = send(self.request(Method::PATCH, self.note_url(id)).json(patch)).await?;
        decode(response, &note_resource(id)).await
    }

    async fn delete(&self, id: &NoteId) -> Result<(), RepositoryError> {
        let response = send(self.request(Method::DELETE, self.note_url(id))).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body, &note_resource(id)))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, RepositoryError> {
    request
        .send()
        .await
        .map_err(|err| RepositoryError::Network(err.to_string()))
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    resource: &str,
) -> Result<T, RepositoryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_failure(status.as_u16(), &body, resource));
    }
    let body = response
        .bytes()
        .await
        .map_err(|err| RepositoryError::Network(err.to_string()))?;
    serde_json::from_slice(&body).map_err(|err| RepositoryError::Server {
        status: status.as_u16(),
        message: format!("invalid response body: {err}"),
    })
}

fn note_resource(id: &NoteId) -> String {
    format!("note {id}")
}

pub(crate) fn classify_failure(status: u16, body: &str, resource: &str) -> RepositoryError {
    match status {
        404 => RepositoryError::NotFound {
            resource: resource.to_string(),
        },
        400 | 422 => RepositoryError::Validation(FieldErrors::from_body(body)),
        _ => RepositoryError::Server {
            status,
            message: summarize_body(body),
        },
    }
}

fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    let mut summary: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
    if trimmed.chars().count() > MAX_ERROR_BODY {
        summary.push('…');
    }
    summary
}
