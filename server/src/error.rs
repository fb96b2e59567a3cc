use std::process::{ExitCode, Termination};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use error_stack::Report;

use application::keys::KeyListError;
use application::patch::PatchError;
use application::validate::ValidationErrors;
use kernel::KernelError;

const INTERNAL_MESSAGE: &str = "An unexpected fault happened. Try again later.";

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

impl From<KeyListError> for ErrorStatus {
    fn from(e: KeyListError) -> Self {
        ErrorStatus(Report::new(e).change_context(KernelError::Malformed))
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> Response {
        let report = self.0;
        match report.current_context() {
            KernelError::NotFound => {
                tracing::debug!("{report:?}");
                StatusCode::NOT_FOUND.into_response()
            }
            KernelError::Malformed => {
                let message = report
                    .downcast_ref::<PatchError>()
                    .map(ToString::to_string)
                    .or_else(|| report.downcast_ref::<KeyListError>().map(ToString::to_string))
                    .unwrap_or_else(|| "The request is malformed.".to_string());
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            KernelError::Validation => match report.downcast_ref::<ValidationErrors>() {
                Some(errors) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors.clone())).into_response()
                }
                None => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
            },
            KernelError::Concurrency => StatusCode::CONFLICT.into_response(),
            KernelError::Timeout => StatusCode::REQUEST_TIMEOUT.into_response(),
            KernelError::Internal => {
                tracing::error!("{report:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE).into_response()
            }
        }
    }
}
