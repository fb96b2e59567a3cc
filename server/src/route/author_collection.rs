use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use application::service::{CreateAuthorService, GetAuthorService};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::format::{Format, PayloadList};
use crate::handler::{AppModule, Database};
use crate::request::{AuthorTransformer, CreateAuthorRequest, GetAuthorCollectionRequest};
use crate::response::{AuthorCollectionPresenter, AuthorPresenter};

pub trait AuthorCollectionRouter {
    fn route_author_collection(self) -> Self;
}

impl<D: Database> AuthorCollectionRouter for Router<AppModule<D>> {
    fn route_author_collection(self) -> Self {
        self.route(
            "/authorcollections",
            post(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 PayloadList(req): PayloadList<CreateAuthorRequest>| async move {
                    Controller::new(AuthorTransformer, AuthorCollectionPresenter::new(format))
                        .intake(req)
                        .handle(|dtos| async move {
                            module
                                .database()
                                .create_author_collection(module.mapper(), dtos)
                                .await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/authorcollections/:ids",
            get(
                |State(module): State<AppModule<D>>,
                 format: Format,
                 Path(ids): Path<String>| async move {
                    Controller::new(AuthorTransformer, AuthorPresenter::new(format))
                        .try_intake(GetAuthorCollectionRequest::new(ids))
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move {
                            module
                                .database()
                                .get_author_collection(module.mapper(), dto)
                                .await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
