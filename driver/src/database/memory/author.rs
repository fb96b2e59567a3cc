use kernel::interface::query::AuthorQuery;
use kernel::interface::update::AuthorModifier;
use kernel::prelude::entity::{Author, AuthorId};
use kernel::KernelError;

use crate::database::memory::{Change, InMemoryTransaction};

pub struct InMemoryAuthorRepository;

#[async_trait::async_trait]
impl AuthorQuery for InMemoryAuthorRepository {
    type Transaction = InMemoryTransaction;

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<Vec<Author>, KernelError> {
        let mut authors = con.store().authors.values().cloned().collect::<Vec<_>>();
        authors.sort_by(|a, b| {
            (a.first_name().as_ref(), a.last_name().as_ref())
                .cmp(&(b.first_name().as_ref(), b.last_name().as_ref()))
        });
        Ok(authors)
    }

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &AuthorId,
    ) -> error_stack::Result<Option<Author>, KernelError> {
        Ok(con.store().authors.get(id).cloned())
    }

    async fn find_by_ids(
        &self,
        con: &mut InMemoryTransaction,
        ids: &[AuthorId],
    ) -> error_stack::Result<Vec<Author>, KernelError> {
        let authors = &con.store().authors;
        Ok(ids.iter().filter_map(|id| authors.get(id)).cloned().collect())
    }

    async fn exists(
        &self,
        con: &mut InMemoryTransaction,
        id: &AuthorId,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(con.store().authors.contains_key(id))
    }
}

#[async_trait::async_trait]
impl AuthorModifier for InMemoryAuthorRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        author: &Author,
    ) -> error_stack::Result<(), KernelError> {
        con.record(Change::PutAuthor(author.clone()));
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        author_id: &AuthorId,
    ) -> error_stack::Result<(), KernelError> {
        con.record(Change::RemoveAuthor(author_id.clone()));
        Ok(())
    }
}
