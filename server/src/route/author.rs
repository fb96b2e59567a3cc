use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use application::service::{CreateAuthorService, DeleteAuthorService, GetAuthorService};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::format::{Format, Payload};
use crate::handler::{AppModule, Database};
use crate::request::{
    AuthorTransformer, CreateAuthorRequest, DeleteAuthorRequest, GetAuthorRequest,
};
use crate::response::AuthorPresenter;

pub trait AuthorRouter {
    fn route_author(self) -> Self;
}

impl<D: Database> AuthorRouter for Router<AppModule<D>> {
    fn route_author(self) -> Self {
        self.route(
            "/authors",
            get(
                |State(module): State<AppModule<D>>, format: Format| async move {
                    Controller::new((), AuthorPresenter::new(format))
                        .bypass(|| async { module.database().get_authors(module.mapper()).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Payload(req): Payload<CreateAuthorRequest>| async move {
                    Controller::new(AuthorTransformer, AuthorPresenter::new(format))
                        .intake(req)
                        .handle(|dto| async move {
                            module.database().create_author(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/authors/:id",
            get(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(AuthorTransformer, AuthorPresenter::new(format))
                        .intake(GetAuthorRequest::new(id))
                        .handle(|dto| async move {
                            module.database().get_author(module.mapper(), dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                        .map(|res| {
                            res.map(IntoResponse::into_response)
                                .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
                        })
                },
            )
            .delete(
                |State(module): State<AppModule<D>>, Path(id): Path<Uuid>| async move {
                    Controller::new(AuthorTransformer, AuthorPresenter::new(Format::default()))
                        .intake(DeleteAuthorRequest::new(id))
                        .handle(|dto| async move { module.database().delete_author(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
