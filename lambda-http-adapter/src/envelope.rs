use crate::error::{format_error, AdapterError, ErrorCode, HandlerError, ValidationError};
use crate::response::AdaptedResponse;
use crate::StatusCode;

use itertools::Itertools;
use log::error;
use serde::Serialize;

use std::fmt::{Display, Formatter};

/// Client-facing message returned for every unexpected error.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error.";

/// Validation failure for a single request field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
  /// Dotted path to the field (e.g., `address.zip`).
  pub field: String,
  /// Description of the failed check.
  pub error: String,
}

/// Message portion of an [`ErrorEnvelope`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
  /// Free-form message.
  Text(String),
  /// One entry per failed field, in the order the failures were detected.
  Fields(Vec<FieldError>),
}

impl Display for ErrorMessage {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorMessage::Text(text) => f.write_str(text),
      ErrorMessage::Fields(fields) => f.write_str(
        &fields
          .iter()
          .map(|field| format!("{}: {}", field.field, field.error))
          .join("; "),
      ),
    }
  }
}

impl From<String> for ErrorMessage {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl From<&str> for ErrorMessage {
  fn from(text: &str) -> Self {
    Self::Text(text.to_string())
  }
}

impl From<Vec<FieldError>> for ErrorMessage {
  fn from(fields: Vec<FieldError>) -> Self {
    Self::Fields(fields)
  }
}

/// Structured error payload, prior to serialization by an [`ErrorFormatter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEnvelope {
  /// HTTP status code of the response.
  pub status_code: StatusCode,
  /// Machine-readable error code.
  pub code: ErrorCode,
  /// Client-facing message.
  pub message: ErrorMessage,
}

impl ErrorEnvelope {
  /// Envelope returned for every unexpected error.
  pub fn internal_server_error() -> Self {
    Self {
      status_code: StatusCode::INTERNAL_SERVER_ERROR,
      code: ErrorCode::InternalServerError,
      message: ErrorMessage::Text(INTERNAL_SERVER_ERROR_MESSAGE.to_string()),
    }
  }
}

impl From<ValidationError> for ErrorEnvelope {
  fn from(err: ValidationError) -> Self {
    Self {
      status_code: StatusCode::BAD_REQUEST,
      code: ErrorCode::Validation,
      message: ErrorMessage::Fields(
        err
          .issues()
          .iter()
          .map(|issue| FieldError {
            field: issue.field(),
            error: issue.message.clone(),
          })
          .collect(),
      ),
    }
  }
}

impl From<HandlerError> for ErrorEnvelope {
  /// Translate a [`HandlerError`] into the envelope returned to the client.
  ///
  /// Unexpected errors are logged (including their chain of causes) and replaced by a generic
  /// message that reveals nothing about the failure.
  fn from(err: HandlerError) -> Self {
    match err {
      HandlerError::Validation(err) => err.into(),
      HandlerError::Http(err) => Self {
        status_code: err.status_code,
        code: err.code,
        message: err.message,
      },
      HandlerError::Application(err) => Self {
        status_code: err.status_code.unwrap_or(StatusCode::BAD_REQUEST),
        code: err.code,
        message: ErrorMessage::Text(err.message),
      },
      HandlerError::Unexpected(err) => {
        let adapter_err = err.downcast_ref::<AdapterError>();
        let name = adapter_err.map(|err| format!("AdapterError::{}", err.name()));
        error!(
          "{}",
          format_error(
            &*err,
            name.as_deref(),
            adapter_err.and_then(AdapterError::backtrace)
          )
        );

        Self::internal_server_error()
      }
    }
  }
}

/// Serializes an [`ErrorEnvelope`] into the response returned to the client.
pub trait ErrorFormatter: Send + Sync {
  /// Build the response for the given envelope.
  fn format(&self, envelope: ErrorEnvelope) -> AdaptedResponse;
}

/// Default [`ErrorFormatter`].
///
/// Responds with the envelope's status code and a body of the form
/// `{"error":{"code":"NOT_FOUND","message":"..."}}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonErrorFormatter;

#[derive(Serialize)]
struct ErrorBody<'a> {
  error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
  code: &'a ErrorCode,
  message: &'a ErrorMessage,
}

impl ErrorFormatter for JsonErrorFormatter {
  fn format(&self, envelope: ErrorEnvelope) -> AdaptedResponse {
    let body = ErrorBody {
      error: ErrorPayload {
        code: &envelope.code,
        message: &envelope.message,
      },
    };

    match serde_json::to_string(&body) {
      Ok(body) => AdaptedResponse::new(envelope.status_code).with_body(body),
      Err(err) => {
        error!("Failed to serialize error response: {err}");
        AdaptedResponse::new(envelope.status_code)
      }
    }
  }
}
