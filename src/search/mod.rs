use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortField {
    #[default]
    Updated,
    Created,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Updated => "updated_at",
            SortField::Created => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Value for the backend's `sort` parameter, e.g. `-updated_at`.
    pub fn as_param(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.column().to_string(),
            SortDirection::Descending => format!("-{}", self.field.column()),
        }
    }

    /// Inverse of [`SortSpec::as_param`]; also accepts the bare field names
    /// used on the command line (`updated`, `-created`).
    pub fn parse_param(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (direction, name) = match trimmed.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, trimmed),
        };
        let field = match name {
            "updated_at" | "updated" => SortField::Updated,
            "created_at" | "created" => SortField::Created,
            _ => return None,
        };
        Some(Self { field, direction })
    }
}

/// What a list fetch asks the backend for. Matching against title, text and
/// tags is the backend's business; the client only forwards the term.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub search: String,
    pub sort: SortSpec,
}

impl ListQuery {
    pub fn new(search: impl Into<String>, sort: SortSpec) -> Self {
        Self {
            search: search.into(),
            sort,
        }
    }

    pub fn has_search(&self) -> bool {
        !self.search.trim().is_empty()
    }

    pub fn params(&self) -> [(&'static str, String); 2] {
        [
            ("search", self.search.clone()),
            ("sort", self.sort.as_param()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sort_is_newest_first() {
        assert_eq!(SortSpec::default().as_param(), "-updated_at");
    }

    #[test]
    fn parses_backend_and_cli_spellings() {
        assert_eq!(
            SortSpec::parse_param("created_at"),
            Some(SortSpec::new(SortField::Created, SortDirection::Ascending))
        );
        assert_eq!(
            SortSpec::parse_param("-updated"),
            Some(SortSpec::default())
        );
        assert_eq!(SortSpec::parse_param("title"), None);
    }

    #[test]
    fn query_params_always_carry_sort() {
        let query = ListQuery::new("", SortSpec::default());
        assert!(!query.has_search());
        let params = query.params();
        assert_eq!(params[0], ("search", String::new()));
        assert_eq!(params[1], ("sort", "-updated_at".to_string()));
    }
}
