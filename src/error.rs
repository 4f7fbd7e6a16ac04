use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  // 400
  #[error("validation failed: {0:?}")]
  Validation(Vec<String>),

  // 404
  #[error("not found: {0}")]
  NotFound(String),

  // 409
  #[error("conflict: {0}")]
  Conflict(String),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  #[error("crossbeam recv error")]
  RecvError {
    #[from]
    source: crossbeam_channel::RecvError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl Error {
  pub fn validation<S: Into<String>>(msg: S) -> Self {
    Error::Validation(vec![msg.into()])
  }

  pub fn not_found<S: Into<String>>(what: S) -> Self {
    Error::NotFound(what.into())
  }

  pub fn conflict<S: Into<String>>(what: S) -> Self {
    Error::Conflict(what.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// the ResponseError trait lets us convert errors to http responses with appropriate data
// https://actix.rs/docs/errors/
impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::Validation(ref errors) => {
        HttpResponse::build(StatusCode::BAD_REQUEST).json(serde_json::json!({
          "errors": errors,
        }))
      },
      Error::NotFound(ref what) => {
        HttpResponse::NotFound().json(serde_json::json!({
          "error": what,
        }))
      },
      Error::Conflict(ref what) => {
        HttpResponse::build(StatusCode::CONFLICT).json(serde_json::json!({
          "error": what,
        }))
      },
      Error::DisconnectedError(ref message) => {
        HttpResponse::build(StatusCode::BAD_GATEWAY).json(message)
      },
      ref err => {
        // internal detail stays in the log, never in the response.
        error!("InternalServerError: {:?}", err);
        HttpResponse::InternalServerError().json("Internal Server Error")
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn response_status_mapping() {
    assert_eq!(
      Error::validation("startDate must be YYYY-MM-DD").error_response().status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      Error::conflict("slug 'politiki' already exists").error_response().status(),
      StatusCode::CONFLICT
    );
    assert_eq!(
      Error::not_found("article").error_response().status(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      Error::InternalServerError.error_response().status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
