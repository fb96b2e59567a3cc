use error_stack::{Report, ResultExt};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{AuthorQuery, BookQuery, DependOnAuthorQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{AuthorId, BookId};
use kernel::KernelError;

use crate::mapper::Mapper;
use crate::service::author::not_found_author;
use crate::transfer::{
    BookDto, CreateBookForAuthorDto, DeleteBookDto, GetBookDto, GetBooksDto, PatchBookDto,
    UpdateBookDto, UpsertBookDto, Upserted,
};
use crate::validate::ensure_valid;

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnAuthorQuery + DependOnBookQuery {
    /// `None` when the author does not exist.
    async fn get_books(
        &self,
        mapper: &Mapper,
        dto: GetBooksDto,
    ) -> error_stack::Result<Option<Vec<BookDto>>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        if !self.author_query().exists(&mut connection, &author_id).await? {
            return Ok(None);
        }

        let books = self
            .book_query()
            .find_by_author(&mut connection, &author_id)
            .await?;
        Ok(Some(books.iter().map(|book| mapper.book_dto(book)).collect()))
    }

    async fn get_book(
        &self,
        mapper: &Mapper,
        dto: GetBookDto,
    ) -> error_stack::Result<Option<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        let id = BookId::new(dto.id);
        let book = self
            .book_query()
            .find_by_id(&mut connection, &author_id, &id)
            .await?;

        Ok(book.map(|book| mapper.book_dto(&book)))
    }
}

impl<T> GetBookService for T where T: DependOnAuthorQuery + DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService:
    'static + Sync + Send + DependOnAuthorQuery + DependOnBookModifier
{
    async fn create_book(
        &self,
        mapper: &Mapper,
        dto: CreateBookForAuthorDto,
    ) -> error_stack::Result<BookDto, KernelError> {
        ensure_valid(&dto.book)?;

        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        if !self.author_query().exists(&mut connection, &author_id).await? {
            return Err(not_found_author(dto.author_id));
        }

        let book = mapper.book_from_creation(&author_id, &dto.book);
        self.book_modifier().create(&mut connection, &book).await?;
        connection.commit().await?;

        Ok(mapper.book_dto(&book))
    }
}

impl<T> CreateBookService for T where T: DependOnAuthorQuery + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpsertBookService:
    'static + Sync + Send + DependOnAuthorQuery + DependOnBookQuery + DependOnBookModifier
{
    /// Replaces the book at a client-chosen id, creating it under that id when
    /// it does not exist yet.
    async fn upsert_book(
        &self,
        mapper: &Mapper,
        dto: UpsertBookDto,
    ) -> error_stack::Result<Upserted, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        if !self.author_query().exists(&mut connection, &author_id).await? {
            return Err(not_found_author(dto.author_id));
        }

        ensure_valid(&dto.book)?;

        let id = BookId::new(dto.id);
        let upserted = store_update(self, mapper, &mut connection, author_id, id, &dto.book).await?;
        connection.commit().await?;

        Ok(upserted)
    }
}

impl<T> UpsertBookService for T where
    T: DependOnAuthorQuery + DependOnBookQuery + DependOnBookModifier
{
}

#[async_trait::async_trait]
pub trait PatchBookService:
    'static + Sync + Send + DependOnAuthorQuery + DependOnBookQuery + DependOnBookModifier
{
    /// Applies the patch to the book's update representation, or to an empty
    /// one when the book is absent, then stores the result like
    /// [`UpsertBookService::upsert_book`]. Nothing is written unless the
    /// patch applies cleanly and the result is valid.
    async fn patch_book(
        &self,
        mapper: &Mapper,
        dto: PatchBookDto,
    ) -> error_stack::Result<Upserted, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        if !self.author_query().exists(&mut connection, &author_id).await? {
            return Err(not_found_author(dto.author_id));
        }

        let id = BookId::new(dto.id);
        let current = self
            .book_query()
            .find_by_id(&mut connection, &author_id, &id)
            .await?
            .map(|book| mapper.update_dto(&book))
            .unwrap_or_default();

        let patched = dto
            .patch
            .apply_to(&current)
            .map_err(Report::new)
            .change_context(KernelError::Malformed)?;
        ensure_valid(&patched)?;

        let upserted = store_update(self, mapper, &mut connection, author_id, id, &patched).await?;
        connection.commit().await?;

        Ok(upserted)
    }
}

impl<T> PatchBookService for T where
    T: DependOnAuthorQuery + DependOnBookQuery + DependOnBookModifier
{
}

#[async_trait::async_trait]
pub trait DeleteBookService: 'static + Sync + Send + DependOnBookQuery + DependOnBookModifier {
    async fn delete_book(&self, dto: DeleteBookDto) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let author_id = AuthorId::new(dto.author_id);
        let id = BookId::new(dto.id);
        let Some(book) = self
            .book_query()
            .find_by_id(&mut connection, &author_id, &id)
            .await?
        else {
            return Err(Report::new(KernelError::NotFound).attach_printable(format!(
                "book {} of author {} does not exist",
                dto.id, dto.author_id
            )));
        };

        self.book_modifier().delete(&mut connection, book.id()).await?;
        connection.commit().await?;

        tracing::info!(
            author_id = %dto.author_id,
            book_id = %dto.id,
            "deleted book"
        );
        Ok(())
    }
}

impl<T> DeleteBookService for T where T: DependOnBookQuery + DependOnBookModifier {}

/// Creates the book under `id` when absent, otherwise merges `update` into the
/// stored one. Shared by the full and partial update paths.
async fn store_update<S>(
    service: &S,
    mapper: &Mapper,
    connection: &mut <S::DatabaseConnection as DatabaseConnection>::Transaction,
    author_id: AuthorId,
    id: BookId,
    update: &UpdateBookDto,
) -> error_stack::Result<Upserted, KernelError>
where
    S: DependOnBookQuery + DependOnBookModifier + ?Sized,
{
    let existing = service
        .book_query()
        .find_by_id(connection, &author_id, &id)
        .await?;

    match existing {
        None => {
            let book = mapper.book_from_update(id, author_id, update);
            service.book_modifier().create(connection, &book).await?;
            tracing::debug!(book_id = %book.id().as_ref(), "created book through update");
            Ok(Upserted::Created(mapper.book_dto(&book)))
        }
        Some(mut book) => {
            mapper.merge_update(update, &mut book);
            service.book_modifier().update(connection, &book).await?;
            Ok(Upserted::Updated)
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use time::macros::datetime;
    use uuid::Uuid;

    use driver::database::InMemoryDatabase;
    use kernel::KernelError;

    use crate::mapper::Mapper;
    use crate::patch::PatchError;
    use crate::service::{
        CreateAuthorService, CreateBookService, DeleteBookService, GetBookService,
        PatchBookService, UpsertBookService,
    };
    use crate::transfer::{
        BookDto, CreateAuthorDto, CreateBookDto, CreateBookForAuthorDto, DeleteBookDto,
        GetBookDto, PatchBookDto, UpdateBookDto, UpsertBookDto, Upserted,
    };
    use crate::validate::ValidationErrors;

    async fn setup() -> error_stack::Result<(InMemoryDatabase, Mapper, Uuid), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = Mapper::new();
        let author = db
            .create_author(
                &mapper,
                CreateAuthorDto {
                    first_name: "Frank".into(),
                    last_name: "Herbert".into(),
                    date_of_birth: datetime!(1920-10-08 0:00 UTC),
                    genre: "Science fiction".into(),
                    books: Vec::new(),
                },
            )
            .await?;
        Ok((db, mapper, author.id))
    }

    fn update(title: &str, description: &str) -> UpdateBookDto {
        UpdateBookDto {
            title: Some(title.into()),
            description: Some(description.into()),
            page_count: Some(412),
        }
    }

    async fn snapshot(
        db: &InMemoryDatabase,
        mapper: &Mapper,
        author_id: Uuid,
        id: Uuid,
    ) -> error_stack::Result<Option<BookDto>, KernelError> {
        db.get_book(mapper, GetBookDto { author_id, id }).await
    }

    #[tokio::test]
    async fn put_creates_then_updates() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let id = Uuid::new_v4();

        let first = db
            .upsert_book(
                &mapper,
                UpsertBookDto {
                    author_id,
                    id,
                    book: update("Dune", "Spice"),
                },
            )
            .await?;
        let Upserted::Created(created) = first else {
            panic!("expected a creation");
        };
        assert_eq!(created.id, id);
        assert_eq!(snapshot(&db, &mapper, author_id, id).await?, Some(created));

        let after_first = snapshot(&db, &mapper, author_id, id).await?;
        let second = db
            .upsert_book(
                &mapper,
                UpsertBookDto {
                    author_id,
                    id,
                    book: update("Dune", "Spice"),
                },
            )
            .await?;
        assert_eq!(second, Upserted::Updated);
        assert_eq!(snapshot(&db, &mapper, author_id, id).await?, after_first);

        let books = db
            .get_books(&mapper, crate::transfer::GetBooksDto { author_id })
            .await?
            .unwrap_or_default();
        assert_eq!(books.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn put_under_missing_author_is_not_found() -> error_stack::Result<(), KernelError> {
        let (db, mapper, _) = setup().await?;
        let failed = db
            .upsert_book(
                &mapper,
                UpsertBookDto {
                    author_id: Uuid::new_v4(),
                    id: Uuid::new_v4(),
                    book: update("Dune", "Spice"),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn put_rejects_description_equal_to_title() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let id = Uuid::new_v4();
        let failed = db
            .upsert_book(
                &mapper,
                UpsertBookDto {
                    author_id,
                    id,
                    book: update("Dune", "Dune"),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::Validation);
        let errors = failed.downcast_ref::<ValidationErrors>().unwrap();
        assert!(errors.field("description").is_some());
        assert_eq!(snapshot(&db, &mapper, author_id, id).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn failed_patches_leave_the_book_untouched() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let created = db
            .create_book(
                &mapper,
                CreateBookForAuthorDto {
                    author_id,
                    book: CreateBookDto {
                        title: Some("Dune".into()),
                        description: Some("Spice".into()),
                        page_count: Some(412),
                    },
                },
            )
            .await?;
        let before = snapshot(&db, &mapper, author_id, created.id).await?;

        let structural = db
            .patch_book(
                &mapper,
                PatchBookDto {
                    author_id,
                    id: created.id,
                    patch: serde_json::from_value(json!([
                        { "op": "replace", "path": "/title", "value": "Changed" },
                        { "op": "test", "path": "/page_count", "value": 1 },
                    ]))
                    .unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(structural.current_context(), &KernelError::Malformed);
        assert!(structural.downcast_ref::<PatchError>().is_some());
        assert_eq!(snapshot(&db, &mapper, author_id, created.id).await?, before);

        let invalid = db
            .patch_book(
                &mapper,
                PatchBookDto {
                    author_id,
                    id: created.id,
                    patch: serde_json::from_value(json!([
                        { "op": "replace", "path": "/description", "value": "Dune" },
                        { "op": "remove", "path": "/title" },
                    ]))
                    .unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(invalid.current_context(), &KernelError::Validation);
        let errors = invalid.downcast_ref::<ValidationErrors>().unwrap();
        assert!(errors.field("title").is_some());
        assert_eq!(snapshot(&db, &mapper, author_id, created.id).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn patch_merges_or_creates() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let created = db
            .create_book(
                &mapper,
                CreateBookForAuthorDto {
                    author_id,
                    book: CreateBookDto {
                        title: Some("Dune".into()),
                        description: Some("Spice".into()),
                        page_count: None,
                    },
                },
            )
            .await?;

        let merged = db
            .patch_book(
                &mapper,
                PatchBookDto {
                    author_id,
                    id: created.id,
                    patch: serde_json::from_value(json!([
                        { "op": "replace", "path": "/page_count", "value": 412 },
                    ]))
                    .unwrap(),
                },
            )
            .await?;
        assert_eq!(merged, Upserted::Updated);
        let stored = snapshot(&db, &mapper, author_id, created.id)
            .await?
            .unwrap();
        assert_eq!(stored.page_count, Some(412));
        assert_eq!(stored.title, "Dune");

        let id = Uuid::new_v4();
        let fresh = db
            .patch_book(
                &mapper,
                PatchBookDto {
                    author_id,
                    id,
                    patch: serde_json::from_value(json!([
                        { "op": "add", "path": "/title", "value": "Dune Messiah" },
                        { "op": "add", "path": "/description", "value": "Twelve years later" },
                    ]))
                    .unwrap(),
                },
            )
            .await?;
        assert!(matches!(fresh, Upserted::Created(ref book) if book.id == id));
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_before_checking_the_author() -> error_stack::Result<(), KernelError>
    {
        let (db, mapper, _) = setup().await?;
        let failed = db
            .create_book(
                &mapper,
                CreateBookForAuthorDto {
                    author_id: Uuid::new_v4(),
                    book: CreateBookDto::default(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::Validation);
        Ok(())
    }

    #[tokio::test]
    async fn failed_commit_keeps_previous_state() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let id = Uuid::new_v4();
        db.upsert_book(
            &mapper,
            UpsertBookDto {
                author_id,
                id,
                book: update("Dune", "Spice"),
            },
        )
        .await?;
        let before = snapshot(&db, &mapper, author_id, id).await?;

        db.fail_next_commit();
        let failed = db
            .upsert_book(
                &mapper,
                UpsertBookDto {
                    author_id,
                    id,
                    book: update("Dune Messiah", "Sequel"),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::Internal);
        assert_eq!(snapshot(&db, &mapper, author_id, id).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn delete_needs_the_book_under_that_author() -> error_stack::Result<(), KernelError> {
        let (db, mapper, author_id) = setup().await?;
        let id = Uuid::new_v4();
        db.upsert_book(
            &mapper,
            UpsertBookDto {
                author_id,
                id,
                book: update("Dune", "Spice"),
            },
        )
        .await?;

        let elsewhere = db
            .delete_book(DeleteBookDto {
                author_id: Uuid::new_v4(),
                id,
            })
            .await
            .unwrap_err();
        assert_eq!(elsewhere.current_context(), &KernelError::NotFound);

        db.delete_book(DeleteBookDto { author_id, id }).await?;
        assert_eq!(snapshot(&db, &mapper, author_id, id).await?, None);
        Ok(())
    }
}
