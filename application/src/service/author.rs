use error_stack::Report;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{AuthorQuery, DependOnAuthorQuery};
use kernel::interface::update::{
    AuthorModifier, BookModifier, DependOnAuthorModifier, DependOnBookModifier,
};
use kernel::prelude::entity::AuthorId;
use kernel::KernelError;

use crate::mapper::Mapper;
use crate::transfer::{
    AuthorDto, CreateAuthorDto, DeleteAuthorDto, GetAuthorCollectionDto, GetAuthorDto,
};
use crate::validate::ensure_valid;

#[async_trait::async_trait]
pub trait GetAuthorService: 'static + Sync + Send + DependOnAuthorQuery {
    async fn get_authors(
        &self,
        mapper: &Mapper,
    ) -> error_stack::Result<Vec<AuthorDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let authors = self.author_query().find_all(&mut connection).await?;

        Ok(authors
            .iter()
            .map(|author| mapper.author_dto(author))
            .collect())
    }

    async fn get_author(
        &self,
        mapper: &Mapper,
        dto: GetAuthorDto,
    ) -> error_stack::Result<Option<AuthorDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = AuthorId::new(dto.id);
        let author = self.author_query().find_by_id(&mut connection, &id).await?;

        Ok(author.map(|author| mapper.author_dto(&author)))
    }

    /// Fetches every requested author or none: one unresolved id fails the
    /// whole request with [`KernelError::NotFound`].
    async fn get_author_collection(
        &self,
        mapper: &Mapper,
        dto: GetAuthorCollectionDto,
    ) -> error_stack::Result<Vec<AuthorDto>, KernelError> {
        if dto.ids.is_empty() {
            return Err(Report::new(KernelError::Malformed)
                .attach_printable("no author ids were requested"));
        }
        let mut connection = self.database_connection().transact().await?;

        let ids = dto.ids.into_iter().map(AuthorId::new).collect::<Vec<_>>();
        let mut authors = self.author_query().find_by_ids(&mut connection, &ids).await?;

        if authors.len() != ids.len() {
            tracing::debug!(
                requested = ids.len(),
                found = authors.len(),
                "author collection is incomplete"
            );
            return Err(Report::new(KernelError::NotFound)
                .attach_printable("at least one requested author does not exist"));
        }

        authors.sort_by_key(|author| ids.iter().position(|id| id == author.id()));
        Ok(authors
            .iter()
            .map(|author| mapper.author_dto(author))
            .collect())
    }
}

impl<T> GetAuthorService for T where T: DependOnAuthorQuery {}

#[async_trait::async_trait]
pub trait CreateAuthorService:
    'static + Sync + Send + DependOnAuthorModifier + DependOnBookModifier
{
    /// Creates the author and the books nested in its creation body as one
    /// unit of work.
    async fn create_author(
        &self,
        mapper: &Mapper,
        dto: CreateAuthorDto,
    ) -> error_stack::Result<AuthorDto, KernelError> {
        let mut created = self.create_author_collection(mapper, vec![dto]).await?;
        created
            .pop()
            .ok_or_else(|| Report::new(KernelError::Internal).attach_printable("no author created"))
    }

    /// Persists all authors in a single commit; if the commit fails nothing
    /// is created.
    async fn create_author_collection(
        &self,
        mapper: &Mapper,
        dtos: Vec<CreateAuthorDto>,
    ) -> error_stack::Result<Vec<AuthorDto>, KernelError> {
        if dtos.is_empty() {
            return Err(Report::new(KernelError::Malformed)
                .attach_printable("the author collection is empty"));
        }
        for dto in &dtos {
            ensure_valid(dto)?;
        }

        let mut connection = self.database_connection().transact().await?;

        let mut created = Vec::with_capacity(dtos.len());
        for dto in &dtos {
            let author = mapper.author_from_creation(dto);
            self.author_modifier()
                .create(&mut connection, &author)
                .await?;
            for book in &dto.books {
                let book = mapper.book_from_creation(author.id(), book);
                self.book_modifier().create(&mut connection, &book).await?;
            }
            created.push(author);
        }

        connection.commit().await?;

        tracing::info!(count = created.len(), "created authors");
        Ok(created
            .iter()
            .map(|author| mapper.author_dto(author))
            .collect())
    }
}

impl<T> CreateAuthorService for T where T: DependOnAuthorModifier + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteAuthorService:
    'static + Sync + Send + DependOnAuthorQuery + DependOnAuthorModifier
{
    async fn delete_author(&self, dto: DeleteAuthorDto) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = AuthorId::new(dto.id);
        if !self.author_query().exists(&mut connection, &id).await? {
            return Err(not_found_author(dto.id));
        }

        self.author_modifier().delete(&mut connection, &id).await?;
        connection.commit().await.map_err(|report| {
            report.attach_printable(format!("deleting author {} failed on save", dto.id))
        })?;

        tracing::info!(author_id = %dto.id, "deleted author");
        Ok(())
    }
}

impl<T> DeleteAuthorService for T where T: DependOnAuthorQuery + DependOnAuthorModifier {}

pub(crate) fn not_found_author(id: Uuid) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(format!("author {id} does not exist"))
}

#[cfg(test)]
mod test {
    use time::macros::datetime;
    use uuid::Uuid;

    use driver::database::InMemoryDatabase;
    use kernel::KernelError;

    use crate::mapper::Mapper;
    use crate::service::{
        CreateAuthorService, DeleteAuthorService, GetAuthorService, GetBookService,
    };
    use crate::transfer::{
        CreateAuthorDto, CreateBookDto, DeleteAuthorDto, GetAuthorCollectionDto, GetAuthorDto,
        GetBookDto,
    };

    fn mapper() -> Mapper {
        Mapper::new().with_clock(|| datetime!(2024-01-01 0:00 UTC))
    }

    fn author(first_name: &str) -> CreateAuthorDto {
        CreateAuthorDto {
            first_name: first_name.into(),
            last_name: "Tolkien".into(),
            date_of_birth: datetime!(1892-01-03 0:00 UTC),
            genre: "Fantasy".into(),
            books: Vec::new(),
        }
    }

    fn book(title: &str) -> CreateBookDto {
        CreateBookDto {
            title: Some(title.into()),
            description: Some(format!("About {title}")),
            page_count: None,
        }
    }

    #[tokio::test]
    async fn created_author_is_readable() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = mapper();

        let created = db.create_author(&mapper, author("John")).await?;
        assert_eq!(created.name, "John Tolkien");
        assert_eq!(created.age, 131);

        let found = db
            .get_author(&mapper, GetAuthorDto { id: created.id })
            .await?;
        assert_eq!(found, Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn collection_fetch_is_all_or_nothing() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = mapper();
        let created = db
            .create_author_collection(&mapper, vec![author("A"), author("B")])
            .await?;
        let ids = created.iter().map(|author| author.id).collect::<Vec<_>>();

        let found = db
            .get_author_collection(&mapper, GetAuthorCollectionDto { ids: vec![ids[1], ids[0]] })
            .await?;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, ids[1]);

        let missing = db
            .get_author_collection(
                &mapper,
                GetAuthorCollectionDto {
                    ids: vec![ids[0], ids[1], Uuid::new_v4()],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(missing.current_context(), &KernelError::NotFound);

        let empty = db
            .get_author_collection(&mapper, GetAuthorCollectionDto { ids: Vec::new() })
            .await
            .unwrap_err();
        assert_eq!(empty.current_context(), &KernelError::Malformed);
        Ok(())
    }

    #[tokio::test]
    async fn failed_commit_creates_nothing() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = mapper();
        db.fail_next_commit();

        let failed = db
            .create_author_collection(&mapper, vec![author("A"), author("B")])
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::Internal);
        assert!(db.get_authors(&mapper).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn nested_books_are_validated_before_anything_is_stored(
    ) -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = mapper();
        let mut invalid = author("A");
        invalid.books = vec![CreateBookDto {
            title: Some("Same".into()),
            description: Some("Same".into()),
            page_count: None,
        }];

        let failed = db
            .create_author_collection(&mapper, vec![author("B"), invalid])
            .await
            .unwrap_err();
        assert_eq!(failed.current_context(), &KernelError::Validation);
        assert!(db.get_authors(&mapper).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn deleting_an_author_removes_its_books() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mapper = mapper();
        let mut with_books = author("Christopher");
        with_books.books = vec![book("The Silmarillion"), book("Unfinished Tales")];
        let created = db.create_author(&mapper, with_books).await?;

        let books = db
            .get_books(&mapper, crate::transfer::GetBooksDto { author_id: created.id })
            .await?
            .unwrap_or_default();
        assert_eq!(books.len(), 2);

        db.delete_author(DeleteAuthorDto { id: created.id }).await?;

        for book in books {
            let found = db
                .get_book(
                    &mapper,
                    GetBookDto {
                        author_id: created.id,
                        id: book.id,
                    },
                )
                .await?;
            assert!(found.is_none());
        }

        let again = db
            .delete_author(DeleteAuthorDto { id: created.id })
            .await
            .unwrap_err();
        assert_eq!(again.current_context(), &KernelError::NotFound);
        Ok(())
    }
}
