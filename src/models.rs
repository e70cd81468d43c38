//! Domain models that mirror the `/books` wire format and get passed throughout
//! the TUI. These types stay light-weight data holders so other layers can
//! focus on presentation and transport.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier. Backends in the wild hand these out either as
/// integers or as short strings, so both shapes are accepted and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookId::Number(n) => write!(f, "{n}"),
            BookId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        BookId::Text(value.to_string())
    }
}

/// Circulation status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    Available,
    Issued,
}

impl BookStatus {
    /// The other status. Used by the form toggle.
    pub fn toggled(self) -> Self {
        match self {
            BookStatus::Available => BookStatus::Issued,
            BookStatus::Issued => BookStatus::Available,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Issued => "Issued",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A book as the server returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Immutable once assigned; edit and delete flows key on it.
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    pub status: BookStatus,
}

impl Book {
    /// Attach an identifier to a draft, producing the full record sent on
    /// replacement.
    pub fn from_draft(id: BookId, draft: BookDraft) -> Self {
        Self {
            id,
            title: draft.title,
            author: draft.author,
            genre: draft.genre,
            year: draft.year,
            status: draft.status,
        }
    }

    /// Everything except the identifier, ready to seed an edit form.
    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            year: self.year,
            status: self.status,
        }
    }
}

/// Book fields without an identifier. This is what the form emits and what a
/// create request carries; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub year: i32,
    pub status: BookStatus,
}

/// Older records were posted straight from a browser form, so `year` can show
/// up as `"1965"` instead of `1965`.
fn lenient_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i32),
        Text(String),
    }

    match RawYear::deserialize(deserializer)? {
        RawYear::Number(year) => Ok(year),
        RawYear::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid year `{text}`"))),
    }
}
