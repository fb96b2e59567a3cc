use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patch::PatchDocument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDto {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub page_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateBookDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
}

/// Update representation of a book. It is also the document the patch engine
/// edits, so every member is always present (absent values serialize as `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookDto {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_count: Option<i32>,
}

pub struct GetBooksDto {
    pub author_id: Uuid,
}

pub struct GetBookDto {
    pub author_id: Uuid,
    pub id: Uuid,
}

pub struct CreateBookForAuthorDto {
    pub author_id: Uuid,
    pub book: CreateBookDto,
}

pub struct UpsertBookDto {
    pub author_id: Uuid,
    pub id: Uuid,
    pub book: UpdateBookDto,
}

pub struct PatchBookDto {
    pub author_id: Uuid,
    pub id: Uuid,
    pub patch: PatchDocument,
}

pub struct DeleteBookDto {
    pub author_id: Uuid,
    pub id: Uuid,
}

/// Outcome of a create-or-replace on a client-chosen book id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    Created(BookDto),
    Updated,
}
