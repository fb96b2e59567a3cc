use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct AuthorGenre(String);

impl AuthorGenre {
    pub fn new(genre: impl Into<String>) -> Self {
        Self(genre.into())
    }
}
