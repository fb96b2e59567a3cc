//! Translation between persisted entities and their representations.
//!
//! Read-side shapes are produced from per-pair tables of [`FieldRule`]s run by
//! [`Mapper::map`]. Computed members (display name, age) are named functions in
//! those tables. Write-side conversions build or mutate entities directly and
//! never take an identifier from an update body.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::{
    Author, AuthorDateOfBirth, AuthorFirstName, AuthorGenre, AuthorId, AuthorLastName, Book,
    BookDescription, BookId, BookPageCount, BookTitle,
};

use crate::transfer::{AuthorDto, BookDto, CreateAuthorDto, CreateBookDto, UpdateBookDto};

const DEFAULT_NAME_SEPARATOR: &str = " ";

type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Copies one target member out of a source value.
pub struct FieldRule<S, T> {
    pub target: &'static str,
    pub apply: fn(&Mapper, &S, &mut T),
}

pub const AUTHOR_READ: &[FieldRule<Author, AuthorDto>] = &[
    FieldRule {
        target: "id",
        apply: |_, author, dto| dto.id = *author.id().as_ref(),
    },
    FieldRule {
        target: "name",
        apply: |mapper, author, dto| dto.name = mapper.display_name(author),
    },
    FieldRule {
        target: "age",
        apply: |mapper, author, dto| dto.age = mapper.age(author),
    },
    FieldRule {
        target: "genre",
        apply: |_, author, dto| dto.genre = author.genre().as_ref().clone(),
    },
];

pub const BOOK_READ: &[FieldRule<Book, BookDto>] = &[
    FieldRule {
        target: "id",
        apply: |_, book, dto| dto.id = *book.id().as_ref(),
    },
    FieldRule {
        target: "author_id",
        apply: |_, book, dto| dto.author_id = *book.author_id().as_ref(),
    },
    FieldRule {
        target: "title",
        apply: |_, book, dto| dto.title = book.title().as_ref().clone(),
    },
    FieldRule {
        target: "description",
        apply: |_, book, dto| dto.description = description_of(book),
    },
    FieldRule {
        target: "page_count",
        apply: |_, book, dto| dto.page_count = page_count_of(book),
    },
];

pub const BOOK_UPDATE: &[FieldRule<Book, UpdateBookDto>] = &[
    FieldRule {
        target: "title",
        apply: |_, book, dto| dto.title = Some(book.title().as_ref().clone()),
    },
    FieldRule {
        target: "description",
        apply: |_, book, dto| dto.description = description_of(book),
    },
    FieldRule {
        target: "page_count",
        apply: |_, book, dto| dto.page_count = page_count_of(book),
    },
];

fn description_of(book: &Book) -> Option<String> {
    book.description()
        .as_ref()
        .map(|description| description.as_ref().clone())
}

fn page_count_of(book: &Book) -> Option<i32> {
    book.page_count().as_ref().map(|pages| *pages.as_ref())
}

/// Process-wide mapping configuration, built once at startup and shared
/// read-only.
#[derive(Clone)]
pub struct Mapper {
    name_separator: String,
    clock: Clock,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Mapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("name_separator", &self.name_separator)
            .finish_non_exhaustive()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self {
            name_separator: DEFAULT_NAME_SEPARATOR.to_string(),
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }

    pub fn with_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.name_separator = separator.into();
        self
    }

    pub fn with_clock(
        mut self,
        clock: impl Fn() -> OffsetDateTime + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn map<S, T: Default>(&self, rules: &[FieldRule<S, T>], source: &S) -> T {
        let mut target = T::default();
        for rule in rules {
            (rule.apply)(self, source, &mut target);
        }
        target
    }

    pub fn author_dto(&self, author: &Author) -> AuthorDto {
        self.map(AUTHOR_READ, author)
    }

    pub fn book_dto(&self, book: &Book) -> BookDto {
        self.map(BOOK_READ, book)
    }

    pub fn update_dto(&self, book: &Book) -> UpdateBookDto {
        self.map(BOOK_UPDATE, book)
    }

    pub fn display_name(&self, author: &Author) -> String {
        display_name(
            author.first_name().as_ref(),
            author.last_name().as_ref(),
            &self.name_separator,
        )
    }

    /// Age in whole years as of the mapper's clock. Recomputed on every call.
    pub fn age(&self, author: &Author) -> i32 {
        age_at(*author.date_of_birth().as_ref(), (self.clock)())
    }

    pub fn author_from_creation(&self, dto: &CreateAuthorDto) -> Author {
        Author::new(
            AuthorId::new(Uuid::new_v4()),
            AuthorFirstName::new(dto.first_name.clone()),
            AuthorLastName::new(dto.last_name.clone()),
            AuthorDateOfBirth::new(dto.date_of_birth),
            AuthorGenre::new(dto.genre.clone()),
        )
    }

    pub fn book_from_creation(&self, author_id: &AuthorId, dto: &CreateBookDto) -> Book {
        Book::new(
            BookId::new(Uuid::new_v4()),
            author_id.clone(),
            BookTitle::new(dto.title.clone().unwrap_or_default()),
            dto.description.clone().map(BookDescription::new),
            dto.page_count.map(BookPageCount::new),
        )
    }

    /// Builds a book whose identifier is dictated by the caller rather than
    /// generated.
    pub fn book_from_update(&self, id: BookId, author_id: AuthorId, dto: &UpdateBookDto) -> Book {
        Book::new(
            id,
            author_id,
            BookTitle::new(dto.title.clone().unwrap_or_default()),
            dto.description.clone().map(BookDescription::new),
            dto.page_count.map(BookPageCount::new),
        )
    }

    /// Copies every member of `dto` onto `book`, leaving its identity alone.
    pub fn merge_update(&self, dto: &UpdateBookDto, book: &mut Book) {
        book.substitute(|book| {
            *book.title = BookTitle::new(dto.title.clone().unwrap_or_default());
            *book.description = dto.description.clone().map(BookDescription::new);
            *book.page_count = dto.page_count.map(BookPageCount::new);
        });
    }
}

pub fn display_name(first_name: &str, last_name: &str, separator: &str) -> String {
    format!("{first_name}{separator}{last_name}")
}

/// Whole years elapsed between `date_of_birth` and `now`, compared in UTC.
pub fn age_at(date_of_birth: OffsetDateTime, now: OffsetDateTime) -> i32 {
    let born = date_of_birth.to_offset(time::UtcOffset::UTC);
    let now = now.to_offset(time::UtcOffset::UTC);
    let mut age = now.year() - born.year();
    let anniversary_pending = (u8::from(now.month()), now.day(), now.time())
        < (u8::from(born.month()), born.day(), born.time());
    if anniversary_pending {
        age -= 1;
    }
    age
}
