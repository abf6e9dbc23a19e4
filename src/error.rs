use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Error surface of the API. Every variant except `Internal` is a client
/// error: reported once with the offending field, never retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    DuplicateRelationship { message: &'static str },

    #[error("unknown {field} id {id}")]
    InvalidReference { field: &'static str, id: Uuid },

    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("{field} must not be empty")]
    EmptyCollection { field: &'static str },

    #[error("{message}")]
    Conflict {
        field: &'static str,
        message: &'static str,
    },

    #[error("authentication required")]
    Unauthorized,

    #[error("you are not the author of this recipe")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateRelationship { .. }
            | ApiError::InvalidReference { .. }
            | ApiError::InvalidField { .. }
            | ApiError::EmptyCollection { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            ApiError::InvalidReference { field, .. }
            | ApiError::InvalidField { field, .. }
            | ApiError::EmptyCollection { field }
            | ApiError::Conflict { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let field = self.field();
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "field": field, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        let errors = [
            ApiError::DuplicateRelationship {
                message: "recipe is already in favorites",
            },
            ApiError::InvalidReference {
                field: "tags",
                id: Uuid::new_v4(),
            },
            ApiError::InvalidField {
                field: "cooking_time",
                message: "must be positive".into(),
            },
            ApiError::EmptyCollection {
                field: "ingredients",
            },
        ];
        for e in errors {
            assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn field_is_reported_for_validation_errors() {
        let e = ApiError::EmptyCollection { field: "tags" };
        assert_eq!(e.field(), Some("tags"));
        assert_eq!(e.to_string(), "tags must not be empty");

        let e = ApiError::Unauthorized;
        assert_eq!(e.field(), None);
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let e = ApiError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
