mod description;
mod id;
mod page_count;
mod title;

pub use self::{description::*, id::*, page_count::*, title::*};
use crate::entity::AuthorId;
use destructure::{Destructure, Mutation};
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Book {
    id: BookId,
    author_id: AuthorId,
    title: BookTitle,
    description: Option<BookDescription>,
    page_count: Option<BookPageCount>,
}

impl Book {
    pub fn new(
        id: BookId,
        author_id: AuthorId,
        title: BookTitle,
        description: Option<BookDescription>,
        page_count: Option<BookPageCount>,
    ) -> Self {
        Self {
            id,
            author_id,
            title,
            description,
            page_count,
        }
    }
}
