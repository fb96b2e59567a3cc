use serde::Serialize;
use uuid::Uuid;

use application::transfer::AuthorDto;

use crate::controller::Exhaust;
use crate::format::{Format, Represented};

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    id: Uuid,
    name: String,
    age: i32,
    genre: String,
}

impl From<AuthorDto> for AuthorResponse {
    fn from(value: AuthorDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            age: value.age,
            genre: value.genre,
        }
    }
}

pub struct AuthorPresenter {
    format: Format,
}

impl AuthorPresenter {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl Exhaust<()> for AuthorPresenter {
    type To = axum::http::StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        axum::http::StatusCode::NO_CONTENT
    }
}

impl Exhaust<AuthorDto> for AuthorPresenter {
    type To = Represented<AuthorResponse>;
    fn emit(&self, input: AuthorDto) -> Self::To {
        let location = format!("/authors/{}", input.id);
        Represented::one(self.format, "author", AuthorResponse::from(input)).created(location)
    }
}

impl Exhaust<Option<AuthorDto>> for AuthorPresenter {
    type To = Option<Represented<AuthorResponse>>;
    fn emit(&self, input: Option<AuthorDto>) -> Self::To {
        input.map(|author| Represented::one(self.format, "author", AuthorResponse::from(author)))
    }
}

impl Exhaust<Vec<AuthorDto>> for AuthorPresenter {
    type To = Represented<AuthorResponse>;
    fn emit(&self, input: Vec<AuthorDto>) -> Self::To {
        let authors = input.into_iter().map(AuthorResponse::from).collect();
        Represented::many(self.format, "authors", authors)
    }
}

/// Presents a freshly created batch, located by the list of its ids.
pub struct AuthorCollectionPresenter {
    format: Format,
}

impl AuthorCollectionPresenter {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl Exhaust<Vec<AuthorDto>> for AuthorCollectionPresenter {
    type To = Represented<AuthorResponse>;
    fn emit(&self, input: Vec<AuthorDto>) -> Self::To {
        let ids = input
            .iter()
            .map(|author| author.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let authors = input.into_iter().map(AuthorResponse::from).collect();
        Represented::many(self.format, "authors", authors)
            .created(format!("/authorcollections/({ids})"))
    }
}
