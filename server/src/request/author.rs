use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use application::keys::{resolve_keys, KeyListError};
use application::transfer::{
    CreateAuthorDto, DeleteAuthorDto, GetAuthorCollectionDto, GetAuthorDto,
};

use crate::controller::{Intake, TryIntake};
use crate::request::{BookTransformer, CreateBookRequest};

#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    first_name: String,
    last_name: String,
    #[serde(with = "time::serde::rfc3339")]
    date_of_birth: OffsetDateTime,
    genre: String,
    #[serde(default)]
    books: Vec<CreateBookRequest>,
}

#[derive(Debug)]
pub struct GetAuthorRequest {
    id: Uuid,
}

impl GetAuthorRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct DeleteAuthorRequest {
    id: Uuid,
}

impl DeleteAuthorRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// The raw `(id1,id2,...)` path segment of a collection lookup.
#[derive(Debug)]
pub struct GetAuthorCollectionRequest {
    ids: String,
}

impl GetAuthorCollectionRequest {
    pub fn new(ids: String) -> Self {
        Self { ids }
    }
}

pub struct AuthorTransformer;

impl Intake<CreateAuthorRequest> for AuthorTransformer {
    type To = CreateAuthorDto;
    fn emit(&self, input: CreateAuthorRequest) -> Self::To {
        CreateAuthorDto {
            first_name: input.first_name,
            last_name: input.last_name,
            date_of_birth: input.date_of_birth,
            genre: input.genre,
            books: input
                .books
                .into_iter()
                .map(|book| Intake::<CreateBookRequest>::emit(&BookTransformer, book))
                .collect(),
        }
    }
}

impl Intake<Vec<CreateAuthorRequest>> for AuthorTransformer {
    type To = Vec<CreateAuthorDto>;
    fn emit(&self, input: Vec<CreateAuthorRequest>) -> Self::To {
        input
            .into_iter()
            .map(|author| Intake::<CreateAuthorRequest>::emit(self, author))
            .collect()
    }
}

impl Intake<GetAuthorRequest> for AuthorTransformer {
    type To = GetAuthorDto;
    fn emit(&self, input: GetAuthorRequest) -> Self::To {
        GetAuthorDto { id: input.id }
    }
}

impl Intake<DeleteAuthorRequest> for AuthorTransformer {
    type To = DeleteAuthorDto;
    fn emit(&self, input: DeleteAuthorRequest) -> Self::To {
        DeleteAuthorDto { id: input.id }
    }
}

impl TryIntake<GetAuthorCollectionRequest> for AuthorTransformer {
    type To = GetAuthorCollectionDto;
    type Error = KeyListError;
    fn emit(&self, input: GetAuthorCollectionRequest) -> Result<Self::To, Self::Error> {
        let ids = resolve_keys::<Uuid>(&input.ids)?;
        Ok(GetAuthorCollectionDto { ids })
    }
}
