use crate::config::ConfigError;
use crate::i18n::{CatalogError, TransportError};
use crate::inventory::{ImportServiceError, ParseError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CatalogError),
    Transport(TransportError),
    Import(ImportServiceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Import(err) => import_status(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Catalog(_)
            | AppError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn import_status(err: &ImportServiceError) -> StatusCode {
    match err {
        ImportServiceError::Parse(ParseError::Csv(_))
        | ImportServiceError::Parse(ParseError::MissingHeader)
        | ImportServiceError::Parse(ParseError::DuplicateColumn(_))
        | ImportServiceError::MissingActor(_)
        | ImportServiceError::MissingProject => StatusCode::BAD_REQUEST,
        ImportServiceError::ImportNotFound(_)
        | ImportServiceError::UnitNotFound(_)
        | ImportServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ImportServiceError::AlreadyProcessed(_)
        | ImportServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ImportServiceError::UnknownColumn(_)
        | ImportServiceError::DuplicateField(_)
        | ImportServiceError::MissingRequiredFields(_)
        | ImportServiceError::Repository(RepositoryError::Constraint(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ImportServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "message catalog error: {}", err),
            AppError::Transport(err) => write!(f, "missing translation transport error: {}", err),
            AppError::Import(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Transport(err) => Some(err),
            AppError::Import(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<TransportError> for AppError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<ImportServiceError> for AppError {
    fn from(value: ImportServiceError) -> Self {
        Self::Import(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{ImportId, UnitField};

    #[test]
    fn import_errors_map_to_client_statuses() {
        let cases = [
            (
                ImportServiceError::ImportNotFound(ImportId("imp-404".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ImportServiceError::AlreadyProcessed(ImportId("imp-1".into())),
                StatusCode::CONFLICT,
            ),
            (
                ImportServiceError::MissingRequiredFields(vec![UnitField::Price]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ImportServiceError::MissingProject, StatusCode::BAD_REQUEST),
            (
                ImportServiceError::Repository(RepositoryError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn missing_fields_are_listed_in_message() {
        let err = AppError::from(ImportServiceError::MissingRequiredFields(vec![
            UnitField::Building,
            UnitField::Price,
        ]));
        assert_eq!(
            err.to_string(),
            "mapping does not cover required fields: building, price"
        );
    }
}
