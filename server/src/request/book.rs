use serde::Deserialize;
use uuid::Uuid;

use application::patch::PatchDocument;
use application::transfer::{
    CreateBookDto, CreateBookForAuthorDto, DeleteBookDto, GetBookDto, GetBooksDto, PatchBookDto,
    UpdateBookDto, UpsertBookDto,
};

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    title: Option<String>,
    description: Option<String>,
    page_count: Option<i32>,
}

/// Full replacement of a book. An `id` member, if sent, is ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    title: Option<String>,
    description: Option<String>,
    page_count: Option<i32>,
}

#[derive(Debug)]
pub struct GetBooksRequest {
    author_id: Uuid,
}

impl GetBooksRequest {
    pub fn new(author_id: Uuid) -> Self {
        Self { author_id }
    }
}

#[derive(Debug)]
pub struct GetBookRequest {
    author_id: Uuid,
    id: Uuid,
}

impl GetBookRequest {
    pub fn new(author_id: Uuid, id: Uuid) -> Self {
        Self { author_id, id }
    }
}

#[derive(Debug)]
pub struct DeleteBookRequest {
    author_id: Uuid,
    id: Uuid,
}

impl DeleteBookRequest {
    pub fn new(author_id: Uuid, id: Uuid) -> Self {
        Self { author_id, id }
    }
}

pub struct BookTransformer;

impl Intake<CreateBookRequest> for BookTransformer {
    type To = CreateBookDto;
    fn emit(&self, input: CreateBookRequest) -> Self::To {
        CreateBookDto {
            title: input.title,
            description: input.description,
            page_count: input.page_count,
        }
    }
}

impl Intake<(Uuid, CreateBookRequest)> for BookTransformer {
    type To = CreateBookForAuthorDto;
    fn emit(&self, (author_id, input): (Uuid, CreateBookRequest)) -> Self::To {
        CreateBookForAuthorDto {
            author_id,
            book: Intake::<CreateBookRequest>::emit(self, input),
        }
    }
}

impl Intake<GetBooksRequest> for BookTransformer {
    type To = GetBooksDto;
    fn emit(&self, input: GetBooksRequest) -> Self::To {
        GetBooksDto {
            author_id: input.author_id,
        }
    }
}

impl Intake<GetBookRequest> for BookTransformer {
    type To = GetBookDto;
    fn emit(&self, input: GetBookRequest) -> Self::To {
        GetBookDto {
            author_id: input.author_id,
            id: input.id,
        }
    }
}

impl Intake<(Uuid, Uuid, UpdateBookRequest)> for BookTransformer {
    type To = UpsertBookDto;
    fn emit(&self, (author_id, id, input): (Uuid, Uuid, UpdateBookRequest)) -> Self::To {
        UpsertBookDto {
            author_id,
            id,
            book: UpdateBookDto {
                title: input.title,
                description: input.description,
                page_count: input.page_count,
            },
        }
    }
}

impl Intake<(Uuid, Uuid, PatchDocument)> for BookTransformer {
    type To = PatchBookDto;
    fn emit(&self, (author_id, id, patch): (Uuid, Uuid, PatchDocument)) -> Self::To {
        PatchBookDto {
            author_id,
            id,
            patch,
        }
    }
}

impl Intake<DeleteBookRequest> for BookTransformer {
    type To = DeleteBookDto;
    fn emit(&self, input: DeleteBookRequest) -> Self::To {
        DeleteBookDto {
            author_id: input.author_id,
            id: input.id,
        }
    }
}
