use std::ops::Deref;
use std::sync::Arc;

use application::mapper::Mapper;
use driver::database::PostgresDatabase;
use kernel::interface::query::{DependOnAuthorQuery, DependOnBookQuery};
use kernel::interface::update::{DependOnAuthorModifier, DependOnBookModifier};
use kernel::KernelError;

/// Everything the routes need from persistence.
pub trait Database:
    DependOnAuthorQuery + DependOnAuthorModifier + DependOnBookQuery + DependOnBookModifier
{
}

impl<T> Database for T where
    T: DependOnAuthorQuery + DependOnAuthorModifier + DependOnBookQuery + DependOnBookModifier
{
}

pub struct AppModule<D = PostgresDatabase>(Arc<Handler<D>>);

impl<D> Clone for AppModule<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl AppModule {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        Ok(Self(Arc::new(Handler::init().await?)))
    }
}

impl<D> AppModule<D> {
    pub fn with(database: D, mapper: Mapper) -> Self {
        Self(Arc::new(Handler { database, mapper }))
    }
}

impl<D> Deref for AppModule<D> {
    type Target = Handler<D>;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

pub struct Handler<D> {
    database: D,
    mapper: Mapper,
}

impl Handler<PostgresDatabase> {
    pub async fn init() -> error_stack::Result<Self, KernelError> {
        let database = PostgresDatabase::new().await?;
        let mapper = Mapper::new();
        tracing::debug!(?mapper, "initialized handler");

        Ok(Self { database, mapper })
    }
}

impl<D> Handler<D> {
    pub fn database(&self) -> &D {
        &self.database
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}
