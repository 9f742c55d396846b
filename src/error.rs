use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::db_operations::DbError;

const NOT_FOUND_PAGE: &str = "<!DOCTYPE html><html><head><title>Page not found</title></head>\
<body><h1>404</h1><p>The page you requested does not exist.</p><a href=\"/\">Back to the feed</a></body></html>";

const SERVER_ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Server error</title></head>\
<body><h1>500</h1><p>Something went wrong on our side.</p></body></html>";

/// Errors a request handler can end with.
///
/// Missing rows and posts hidden from the viewer both map to `NotFound`, so the
/// two cases produce byte-identical responses.
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Session error: {0}")]
    Session(#[from] actix_session::SessionInsertError),
}

impl From<rusqlite::Error> for BlogError {
    fn from(e: rusqlite::Error) -> Self {
        BlogError::Database(DbError::Rusqlite(e))
    }
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            BlogError::NotFound => HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(NOT_FOUND_PAGE),
            other => {
                log::error!("Request failed: {}", other);
                HttpResponse::InternalServerError()
                    .content_type("text/html; charset=utf-8")
                    .body(SERVER_ERROR_PAGE)
            }
        }
    }
}
