use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Backend-assigned identifier. The service hands out integers, but the
/// client never does arithmetic on them, so they are kept and written back
/// as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(String);

impl NoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for NoteId {
    fn from(value: i64) -> Self {
        NoteId(value.to_string())
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        NoteId(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        NoteId(value)
    }
}

impl FromStr for NoteId {
    type Err = NoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(NoteIdError(s.to_string()));
        }
        Ok(NoteId(trimmed.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("invalid note id '{0}'")]
pub struct NoteIdError(String);

impl Serialize for NoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NoteIdVisitor;

        impl<'de> Visitor<'de> for NoteIdVisitor {
            type Value = NoteId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string note id")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<NoteId, E> {
                Ok(NoteId::from(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<NoteId, E> {
                Ok(NoteId(value.to_string()))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<NoteId, E> {
                Ok(NoteId(value.to_string()))
            }
        }

        deserializer.deserialize_any(NoteIdVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Comma separated, exactly as the user typed it.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub tags_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Note {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Tags for display: the server's list when it sent one, otherwise
    /// derived from the raw `tags` string.
    pub fn display_tags(&self) -> Vec<String> {
        if self.tags_list.is_empty() {
            split_tags(&self.tags)
        } else {
            self.tags_list.clone()
        }
    }

    pub fn updated_at_datetime(&self) -> Option<OffsetDateTime> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }

    pub fn updated_label(&self) -> String {
        match self.updated_at_datetime() {
            Some(dt) => dt
                .format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .unwrap_or_else(|_| dt.unix_timestamp().to_string()),
            None => self
                .updated_at
                .clone()
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (taken as
/// midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(dt);
    }
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// The writable fields of a note, as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    pub tags: String,
}

impl NoteDraft {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            tags: tags.into(),
        }
    }

    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            tags: note.tags.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Title is required")]
    MissingTitle,
}

/// Partial update body; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_backend_payload_with_numeric_id() {
        let raw = r#"{
            "id": 7,
            "title": "Groceries",
            "text": "- milk",
            "tags": "home, errands",
            "tags_list": ["home", "errands"],
            "created_at": "2024-03-01T09:00:00Z",
            "updated_at": "2024-03-02T10:30:00.123456Z"
        }"#;
        let note: Note = serde_json::from_str(raw).expect("note");
        assert_eq!(note.id, Some(NoteId::from(7)));
        assert_eq!(note.display_tags(), vec!["home", "errands"]);
        assert_eq!(note.updated_label(), "2024-03-02 10:30");
    }

    #[test]
    fn note_ids_survive_a_json_round_trip() {
        for id in [NoteId::from("007"), NoteId::from(42), NoteId::from("abc-1")] {
            let encoded = serde_json::to_value(&id).expect("json");
            assert_eq!(encoded, serde_json::Value::String(id.to_string()));
            let decoded: NoteId = serde_json::from_value(encoded).expect("id");
            assert_eq!(decoded, id);
        }
    }

    #[test]
    fn minimal_payload_fills_defaults() {
        let note: Note =
            serde_json::from_str(r#"{"id":1,"title":"A","updated_at":"2024-01-01"}"#).expect("note");
        assert_eq!(note.text, "");
        assert!(note.tags_list.is_empty());
        assert_eq!(note.updated_label(), "2024-01-01 00:00");
    }

    #[test]
    fn display_tags_falls_back_to_raw_string() {
        let note = Note {
            id: None,
            title: "t".into(),
            text: String::new(),
            tags: " work ,, ideas,todo ".into(),
            tags_list: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        assert_eq!(note.display_tags(), vec!["work", "ideas", "todo"]);
        assert!(!note.is_persisted());
    }

    #[test]
    fn draft_serializes_only_writable_fields() {
        let draft = NoteDraft::new("B", "", "");
        let value = serde_json::to_value(&draft).expect("json");
        assert_eq!(value, serde_json::json!({"title": "B", "text": "", "tags": ""}));
    }

    #[test]
    fn draft_rejects_blank_title() {
        assert_matches!(
            NoteDraft::new("   ", "body", "").validate(),
            Err(DraftError::MissingTitle)
        );
        assert!(NoteDraft::new("ok", "", "").validate().is_ok());
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = NotePatch {
            tags: Some("a,b".into()),
            ..NotePatch::default()
        };
        let value = serde_json::to_value(&patch).expect("json");
        assert_eq!(value, serde_json::json!({"tags": "a,b"}));
        assert!(NotePatch::default().is_empty());
    }

    #[test]
    fn note_id_parses_from_cli_text() {
        assert_eq!("42".parse::<NoteId>().expect("id"), NoteId::from(42));
        assert!("".parse::<NoteId>().is_err());
        assert!("1/2".parse::<NoteId>().is_err());
    }
}
