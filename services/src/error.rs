//! Error types shared across the crate and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;

/// A descriptor violates a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor name is empty")]
    EmptyName,

    #[error("no primary key declared")]
    MissingPrimaryKey,

    #[error("primary key `{0}` is not one of the columns")]
    PrimaryKeyNotInColumns(String),

    #[error("no data source declared")]
    MissingDataSource,

    #[error("duplicate column field `{0}`")]
    DuplicateColumn(String),

    #[error("duplicate form field `{0}`")]
    DuplicateFormField(String),

    #[error("duplicate action id `{0}`")]
    DuplicateAction(String),

    #[error("joined column `{0}` cannot be editable")]
    EditableJoin(String),

    #[error("joined column `{0}` is not stored on the table and cannot be sorted or filtered")]
    QueriedJoin(String),

    #[error("computed column `{0}` needs a display function and cannot be sorted or filtered")]
    InvalidComputedColumn(String),

    #[error("tab group lists unknown form field `{0}`")]
    UnknownTabField(String),

    #[error("tab headers and groups differ in length")]
    TabShapeMismatch,

    #[error("descriptor built for `{built}` was registered as `{registered}`")]
    NameMismatch { registered: String, built: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown table descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("table descriptor already registered: {0}")]
    DuplicateRegistration(String),

    #[error("malformed table descriptor `{table}`: {source}")]
    MalformedDescriptor {
        table: String,
        #[source]
        source: DescriptorError,
    },
}

/// Failure of a data source. Recovered locally as an empty page.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataSourceError {
    #[error("data source failed: {0}")]
    Failed(String),

    #[error("data source timed out after {0:?}")]
    Timeout(Duration),

    #[error("data source panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown form field: {0}")]
    UnknownField(String),

    #[error("primary key `{0}` is required")]
    MissingPrimaryKey(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("field `{0}` has no dynamic options")]
    NoDynamicOptions(String),
}

/// JSON error body returned by the admin endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: "not_found".to_owned(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: "bad_request".to_owned(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            error: "forbidden".to_owned(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            error: "internal_error".to_owned(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the admin HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            Self::Registry(RegistryError::UnknownDescriptor(_)) | Self::NotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found(message))
            }
            Self::Registry(e) => {
                tracing::error!(error = %e, "Table descriptor could not be resolved");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(message),
                )
            }
            Self::Store(e) => {
                tracing::error!(error = ?e, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error("Store operation failed"),
                )
            }
            Self::Form(_) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message))
            }
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorResponse::forbidden(message)),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_descriptor_maps_to_not_found() {
        let response =
            ApiError::from(RegistryError::UnknownDescriptor("ghosts".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_descriptor_maps_to_internal_error() {
        let response = ApiError::from(RegistryError::MalformedDescriptor {
            table: "posts".to_owned(),
            source: DescriptorError::MissingPrimaryKey,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn form_errors_are_client_errors() {
        let response =
            ApiError::from(FormError::MissingPrimaryKey("id".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiError::Forbidden("no".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn malformed_message_names_table_and_reason() {
        let error = RegistryError::MalformedDescriptor {
            table: "users".to_owned(),
            source: DescriptorError::DuplicateColumn("name".to_owned()),
        };
        assert_eq!(
            error.to_string(),
            "malformed table descriptor `users`: duplicate column field `name`"
        );
    }
}
