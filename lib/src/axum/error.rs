use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;

use crate::{Error, ErrorKind};

impl Error {
    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ErrorKind::BadInput(_) => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::MultipartError(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Turns errors into `{success: false, error}` json responses.
///
/// Unexpected errors are answered with their raw message, the backtrace
/// only ever goes to the logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        let body = json!({
            "success": false,
            "error": self.kind.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::bad_input(rejection.body_text())
    }
}

/// Path parameters only ever carry image ids, one that doesn't parse can't
/// match an entry.
impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => Error::not_found("Image not found"),
            other => ErrorKind::Other(other.body_text()).into(),
        }
    }
}
