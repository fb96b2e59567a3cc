use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookPageCount(i32);

impl BookPageCount {
    pub fn new(pages: impl Into<i32>) -> Self {
        Self(pages.into())
    }
}
