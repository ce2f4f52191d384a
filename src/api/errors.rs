use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Failure taxonomy surfaced by every repository operation. Nothing is
/// retried; callers decide how to present each kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Field level messages as returned by the backend, e.g.
/// `{"title": ["This field is required."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    detail: Option<String>,
}

impl FieldErrors {
    pub fn from_body(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            let trimmed = body.trim();
            return Self {
                fields: BTreeMap::new(),
                detail: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            };
        };

        let mut errors = Self::default();
        match value {
            serde_json::Value::Object(map) => {
                for (field, messages) in map {
                    let collected = match messages {
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .map(|item| match item {
                                serde_json::Value::String(text) => text,
                                other => other.to_string(),
                            })
                            .collect(),
                        serde_json::Value::String(text) => vec![text],
                        other => vec![other.to_string()],
                    };
                    if field == "detail" || field == "non_field_errors" {
                        errors.detail = Some(collected.join(" "));
                    } else {
                        errors.fields.insert(field, collected);
                    }
                }
            }
            serde_json::Value::String(text) => errors.detail = Some(text),
            other => errors.detail = Some(other.to_string()),
        }
        errors
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.detail.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("payload rejected");
        }
        let mut parts = Vec::new();
        if let Some(detail) = &self.detail {
            parts.push(detail.clone());
        }
        for (field, messages) in &self.fields {
            parts.push(format!("{field}: {}", messages.join(" ")));
        }
        f.write_str(&parts.join("; "))
    }
}
