use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use error_stack::Report;
use tokio::sync::RwLock;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnAuthorQuery, DependOnBookQuery};
use kernel::interface::update::{DependOnAuthorModifier, DependOnBookModifier};
use kernel::prelude::entity::{Author, AuthorId, Book, BookId};
use kernel::KernelError;

use crate::error::DriverError;

pub use self::{author::*, book::*};

mod author;
mod book;

#[derive(Debug, Clone, Default)]
pub(in crate::database) struct Store {
    pub(in crate::database) authors: BTreeMap<AuthorId, Author>,
    pub(in crate::database) books: BTreeMap<BookId, Book>,
}

/// One write recorded by a transaction, replayed onto the shared store at
/// commit.
#[derive(Debug, Clone)]
pub(in crate::database) enum Change {
    PutAuthor(Author),
    /// Removes the author together with every book it owns.
    RemoveAuthor(AuthorId),
    PutBook(Book),
    RemoveBook(BookId),
}

impl Store {
    fn apply(&mut self, change: &Change) {
        match change {
            Change::PutAuthor(author) => {
                self.authors.insert(author.id().clone(), author.clone());
            }
            Change::RemoveAuthor(id) => {
                self.books.retain(|_, book| book.author_id() != id);
                self.authors.remove(id);
            }
            Change::PutBook(book) => {
                self.books.insert(book.id().clone(), book.clone());
            }
            Change::RemoveBook(id) => {
                self.books.remove(id);
            }
        }
    }
}

/// Process-local store. A transaction reads a private snapshot, keeps its
/// own writes on top of it and replays only those writes on commit.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    store: Arc<RwLock<Store>>,
    fail_commit: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with [`KernelError::Internal`].
    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }
}

pub struct InMemoryTransaction {
    staged: Store,
    changes: Vec<Change>,
    store: Arc<RwLock<Store>>,
    fail_commit: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    pub(in crate::database) fn store(&self) -> &Store {
        &self.staged
    }

    pub(in crate::database) fn record(&mut self, change: Change) {
        self.staged.apply(&change);
        self.changes.push(change);
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let staged = self.store.read().await.clone();
        Ok(InMemoryTransaction {
            staged,
            changes: Vec::new(),
            store: Arc::clone(&self.store),
            fail_commit: Arc::clone(&self.fail_commit),
        })
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(
                Report::new(DriverError::CommitRefused).change_context(KernelError::Internal)
            );
        }
        let mut store = self.store.write().await;
        for change in &self.changes {
            store.apply(change);
        }
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

impl DependOnAuthorQuery for InMemoryDatabase {
    type AuthorQuery = InMemoryAuthorRepository;
    fn author_query(&self) -> &Self::AuthorQuery {
        &InMemoryAuthorRepository
    }
}

impl DependOnAuthorModifier for InMemoryDatabase {
    type AuthorModifier = InMemoryAuthorRepository;
    fn author_modifier(&self) -> &Self::AuthorModifier {
        &InMemoryAuthorRepository
    }
}

impl DependOnBookQuery for InMemoryDatabase {
    type BookQuery = InMemoryBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &InMemoryBookRepository
    }
}

impl DependOnBookModifier for InMemoryDatabase {
    type BookModifier = InMemoryBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &InMemoryBookRepository
    }
}
