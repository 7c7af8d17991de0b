use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    commands,
    ports::{database, storage},
};

const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Error returned by the HTTP handlers, rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        match err {
            commands::Error::Validation(message) => Self::bad_request(message),
            commands::Error::Database(err @ database::Error::Conflict { .. }) => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            commands::Error::Database(database::Error::MemberDoesNotExist(member_id)) => {
                Self::new(
                    StatusCode::NOT_FOUND,
                    format!("member {member_id} not found"),
                )
            }
            commands::Error::Database(err @ database::Error::Adapter(_)) => {
                tracing::error!(error = %err, "database failure");
                Self::internal()
            }
            commands::Error::Storage(err @ storage::Error::Rejected { .. }) => {
                tracing::error!(error = %err, "avatar upload rejected");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "upload failed")
            }
            commands::Error::Storage(err @ storage::Error::Adapter(_)) => {
                tracing::error!(error = %err, "storage failure");
                Self::internal()
            }
        }
    }
}

/// Request decoding failures keep axum's status and message but use the JSON error body
macro_rules! from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    Self::new(rejection.status(), rejection.body_text())
                }
            }
        )*
    };
}

from_rejection!(JsonRejection, PathRejection, QueryRejection);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
