use crate::maud_conveniences::{page, supertitle};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::num::ParseIntError;

pub type RollcallResult<T> = Result<T, RollcallError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RollcallError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error commiting SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Stored date of birth {} is out of range", stored))]
    InvalidStoredDateTime {
        source: jiff::Error,
        stored: time::OffsetDateTime,
    },
    #[snafu(display("Date of birth {} cannot be stored", timestamp))]
    UnstorableDateTime {
        source: time::error::ComponentRange,
        timestamp: jiff::Timestamp,
    },
    #[snafu(display("Error with a stored email address"))]
    Email { source: email_address::Error },
    #[snafu(display("Error serialising with rmp_serde"))]
    RmpSerdeEncode { source: rmp_serde::encode::Error },
    #[snafu(display("Error deserialising with rmp_serde"))]
    RmpSerdeDecode { source: rmp_serde::decode::Error },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse integer env var `{}`", name))]
    ParseEnvVar {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse boolean env var `{}`: {:?}", name, value))]
    ParseBoolEnvVar { name: &'static str, value: String },
    #[snafu(display("Nothing lives at {}", path))]
    UnknownPath { path: String },
    #[snafu(display("{:?} is not a valid student ID", raw))]
    InvalidStudentId { raw: String },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i32 },
    #[snafu(display("Tried to edit student {} through the page for student {}", submitted, path))]
    StudentIdMismatch { path: i32, submitted: String },
    #[snafu(display("Unable to parse row version {:?}", raw))]
    InvalidRowVersion { raw: String, source: ParseIntError },
    #[snafu(display("Student {} was changed by someone else while being edited", id))]
    ConcurrentUpdate { id: i32 },
    #[snafu(display("Form submitted without an anti-forgery token in the session"))]
    MissingCsrfToken,
    #[snafu(display("Anti-forgery token did not match"))]
    CsrfTokenMismatch,
    #[snafu(display("Error with sessions"))]
    TowerSession {
        source: tower_sessions::session::Error,
    },
}

impl RollcallError {
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const NA: StatusCode = StatusCode::FORBIDDEN; //not allowed
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::CommitTransaction { .. } => ISE,
            Self::InvalidStoredDateTime { .. } | Self::UnstorableDateTime { .. } => ISE,
            Self::Email { .. } => ISE,
            Self::RmpSerdeEncode { .. } | Self::RmpSerdeDecode { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseEnvVar { .. } | Self::ParseBoolEnvVar { .. } => {
                ISE
            }
            Self::UnknownPath { .. } => NF,
            Self::InvalidStudentId { .. } => NF,
            Self::MissingStudent { .. } => NF,
            Self::StudentIdMismatch { .. } => NF,
            Self::InvalidRowVersion { .. } => BI,
            Self::ConcurrentUpdate { .. } => StatusCode::CONFLICT,
            Self::MissingCsrfToken | Self::CsrfTokenMismatch => NA,
            Self::TowerSession { .. } => ISE,
        }
    }
}

impl IntoResponse for RollcallError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = if status_code == StatusCode::NOT_FOUND {
            html! {
                (supertitle("Not Found"))
                p class="text-gray-300 mb-4" {(self.to_string())}
                a href="/students" class="text-blue-300 hover:text-blue-500 underline" {"Back to all students"}
            }
        } else {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Rollcall Error: "}
                    span {(self.to_string())}
                }
            }
        };

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, %status_code, "Request rejected");
        }
        (status_code, Html(page("Rollcall", body).into_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_conditions_share_a_status() {
        for error in [
            RollcallError::InvalidStudentId {
                raw: "abc".to_string(),
            },
            RollcallError::MissingStudent { id: 4 },
            RollcallError::StudentIdMismatch {
                path: 4,
                submitted: "5".to_string(),
            },
            RollcallError::MakeQuery {
                source: sqlx::Error::RowNotFound,
            },
        ] {
            assert_eq!(error.status_code(), StatusCode::NOT_FOUND, "{error}");
        }
    }

    #[test]
    fn anti_forgery_failures_are_forbidden() {
        assert_eq!(
            RollcallError::MissingCsrfToken.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RollcallError::CsrfTokenMismatch.status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflicts_terminate_the_request() {
        let response = RollcallError::ConcurrentUpdate { id: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
