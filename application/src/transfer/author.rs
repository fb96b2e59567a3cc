use time::OffsetDateTime;
use uuid::Uuid;

use crate::transfer::CreateBookDto;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorDto {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAuthorDto {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: OffsetDateTime,
    pub genre: String,
    pub books: Vec<CreateBookDto>,
}

pub struct GetAuthorDto {
    pub id: Uuid,
}

pub struct DeleteAuthorDto {
    pub id: Uuid,
}

pub struct GetAuthorCollectionDto {
    pub ids: Vec<Uuid>,
}
