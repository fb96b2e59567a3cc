use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use application::patch::PatchDocument;
use application::service::{
    CreateBookService, DeleteBookService, GetBookService, PatchBookService, UpsertBookService,
};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::format::{Format, JsonPayload, Payload};
use crate::handler::{AppModule, Database};
use crate::request::{
    BookTransformer, CreateBookRequest, DeleteBookRequest, GetBookRequest, GetBooksRequest,
    UpdateBookRequest,
};
use crate::response::BookPresenter;

pub trait BookRouter {
    fn route_book(self) -> Self;
}

impl<D: Database> BookRouter for Router<AppModule<D>> {
    fn route_book(self) -> Self {
        self.route(
            "/authors/:id/books",
            get(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path(author_id): Path<Uuid>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(format))
                        .intake(GetBooksRequest::new(author_id))
                        .handle(|dto| async move {
                            module.database().get_books(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                        .map(|res| {
                            res.map(IntoResponse::into_response)
                                .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
                        })
                },
            )
            .post(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path(author_id): Path<Uuid>,
                 Payload(req): Payload<CreateBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(format))
                        .intake((author_id, req))
                        .handle(|dto| async move {
                            module.database().create_book(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/authors/:id/books/:book_id",
            get(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path((author_id, id)): Path<(Uuid, Uuid)>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(format))
                        .intake(GetBookRequest::new(author_id, id))
                        .handle(|dto| async move {
                            module.database().get_book(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                        .map(|res| {
                            res.map(IntoResponse::into_response)
                                .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
                        })
                },
            )
            .put(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path((author_id, id)): Path<(Uuid, Uuid)>,
                 Payload(req): Payload<UpdateBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(format))
                        .intake((author_id, id, req))
                        .handle(|dto| async move {
                            module.database().upsert_book(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path((author_id, id)): Path<(Uuid, Uuid)>,
                 JsonPayload(patch): JsonPayload<PatchDocument>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(format))
                        .intake((author_id, id, patch))
                        .handle(|dto| async move {
                            module.database().patch_book(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .delete(
                |State(module): State<AppModule<D>>,
                 Path((author_id, id)): Path<(Uuid, Uuid)>| async move {
                    Controller::new(BookTransformer, BookPresenter::new(Format::default()))
                        .intake(DeleteBookRequest::new(author_id, id))
                        .handle(|dto| async move { module.database().delete_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
