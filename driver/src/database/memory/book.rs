use error_stack::Report;

use kernel::interface::query::BookQuery;
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{AuthorId, Book, BookId};
use kernel::KernelError;

use crate::database::memory::{Change, InMemoryTransaction};

pub struct InMemoryBookRepository;

#[async_trait::async_trait]
impl BookQuery for InMemoryBookRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_author(
        &self,
        con: &mut InMemoryTransaction,
        author_id: &AuthorId,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let mut books = con
            .store()
            .books
            .values()
            .filter(|book| book.author_id() == author_id)
            .cloned()
            .collect::<Vec<_>>();
        books.sort_by(|a, b| a.title().as_ref().cmp(b.title().as_ref()));
        Ok(books)
    }

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        author_id: &AuthorId,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(con
            .store()
            .books
            .get(id)
            .filter(|book| book.author_id() == author_id)
            .cloned())
    }
}

#[async_trait::async_trait]
impl BookModifier for InMemoryBookRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        let store = con.store();
        if !store.authors.contains_key(book.author_id()) {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("author {:?} does not exist", book.author_id())));
        }
        if store.books.contains_key(book.id()) {
            return Err(Report::new(KernelError::Concurrency)
                .attach_printable(format!("book {:?} already exists", book.id())));
        }
        con.record(Change::PutBook(book.clone()));
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        if con.store().books.contains_key(book.id()) {
            con.record(Change::PutBook(book.clone()));
        }
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        con.record(Change::RemoveBook(book_id.clone()));
        Ok(())
    }
}
