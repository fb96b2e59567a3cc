use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use application::transfer::{BookDto, Upserted};

use crate::controller::Exhaust;
use crate::format::{Format, Represented};

#[derive(Debug, Serialize)]
pub struct BookResponse {
    id: Uuid,
    author_id: Uuid,
    title: String,
    description: Option<String>,
    page_count: Option<i32>,
}

impl From<BookDto> for BookResponse {
    fn from(value: BookDto) -> Self {
        Self {
            id: value.id,
            author_id: value.author_id,
            title: value.title,
            description: value.description,
            page_count: value.page_count,
        }
    }
}

fn location(book: &BookDto) -> String {
    format!("/authors/{}/books/{}", book.author_id, book.id)
}

pub struct BookPresenter {
    format: Format,
}

impl BookPresenter {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    fn created(&self, book: BookDto) -> Represented<BookResponse> {
        let location = location(&book);
        Represented::one(self.format, "book", BookResponse::from(book)).created(location)
    }
}

impl Exhaust<()> for BookPresenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}

impl Exhaust<BookDto> for BookPresenter {
    type To = Represented<BookResponse>;
    fn emit(&self, input: BookDto) -> Self::To {
        self.created(input)
    }
}

impl Exhaust<Upserted> for BookPresenter {
    type To = Response;
    fn emit(&self, input: Upserted) -> Self::To {
        match input {
            Upserted::Created(book) => self.created(book).into_response(),
            Upserted::Updated => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

impl Exhaust<Option<BookDto>> for BookPresenter {
    type To = Option<Represented<BookResponse>>;
    fn emit(&self, input: Option<BookDto>) -> Self::To {
        input.map(|book| Represented::one(self.format, "book", BookResponse::from(book)))
    }
}

impl Exhaust<Option<Vec<BookDto>>> for BookPresenter {
    type To = Option<Represented<BookResponse>>;
    fn emit(&self, input: Option<Vec<BookDto>>) -> Self::To {
        input.map(|books| {
            let books = books.into_iter().map(BookResponse::from).collect();
            Represented::many(self.format, "books", books)
        })
    }
}
