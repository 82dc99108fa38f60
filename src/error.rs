use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use failure::Fail;
use log::error;

#[derive(Debug, Fail)]
pub enum AppError {
    /// The retry budget ran out before a connection could be checked out.
    #[fail(display = "Database Connection Error")]
    NoConnection,
    #[fail(display = "missing required field: {}", _0)]
    MissingField(&'static str),
    #[fail(display = "database error: {}", _0)]
    Database(#[cause] diesel::result::Error),
    #[fail(display = "blocking task canceled")]
    Canceled,
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::Database(e)
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, body) = match self {
            AppError::NoConnection => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::MissingField(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(e) => {
                error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Canceled => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}
