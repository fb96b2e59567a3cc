mod birth;
mod genre;
mod id;
mod name;

pub use self::{birth::*, genre::*, id::*, name::*};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct Author {
    id: AuthorId,
    first_name: AuthorFirstName,
    last_name: AuthorLastName,
    date_of_birth: AuthorDateOfBirth,
    genre: AuthorGenre,
}

impl Author {
    pub fn new(
        id: AuthorId,
        first_name: AuthorFirstName,
        last_name: AuthorLastName,
        date_of_birth: AuthorDateOfBirth,
        genre: AuthorGenre,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            date_of_birth,
            genre,
        }
    }
}
