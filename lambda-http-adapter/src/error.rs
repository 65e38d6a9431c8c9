use crate::envelope::ErrorMessage;
use crate::StatusCode;

// Until std::error::Backtrace is fully stabilized, we can't embed a type named `Backtrace` within
// a thiserror::Error (see https://github.com/dtolnay/thiserror/issues/204).
use backtrace::Backtrace as _Backtrace;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use serde_path_to_error::Segment;
use thiserror::Error;

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;

/// Machine-readable error code included in every error response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
  /// One or more request fields failed validation.
  Validation,
  /// Unexpected failure; details are logged but never returned to the client.
  InternalServerError,
  /// The request body is not valid JSON (or not UTF-8).
  InvalidBody,
  /// Generic client error.
  BadRequest,
  /// The caller is not authenticated.
  Unauthorized,
  /// The caller is authenticated but not allowed to perform the operation.
  Forbidden,
  /// The requested resource does not exist.
  NotFound,
  /// The request conflicts with the current state of a resource.
  Conflict,
  /// Application-defined code (e.g., `ACCOUNT_SUSPENDED`).
  Custom(Cow<'static, str>),
}

impl ErrorCode {
  /// Return the wire representation of the code (e.g., `NOT_FOUND`).
  pub fn as_str(&self) -> &str {
    match self {
      ErrorCode::Validation => "VALIDATION",
      ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
      ErrorCode::InvalidBody => "INVALID_BODY",
      ErrorCode::BadRequest => "BAD_REQUEST",
      ErrorCode::Unauthorized => "UNAUTHORIZED",
      ErrorCode::Forbidden => "FORBIDDEN",
      ErrorCode::NotFound => "NOT_FOUND",
      ErrorCode::Conflict => "CONFLICT",
      ErrorCode::Custom(code) => code,
    }
  }
}

impl Display for ErrorCode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for ErrorCode {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(self.as_str())
  }
}

/// One segment of the path to a value that failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
  /// Object key.
  Key(String),
  /// Array index.
  Index(usize),
}

impl Display for PathSegment {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      PathSegment::Key(key) => f.write_str(key),
      PathSegment::Index(index) => write!(f, "{index}"),
    }
  }
}

impl From<&str> for PathSegment {
  fn from(key: &str) -> Self {
    Self::Key(key.to_string())
  }
}

impl From<String> for PathSegment {
  fn from(key: String) -> Self {
    Self::Key(key)
  }
}

impl From<usize> for PathSegment {
  fn from(index: usize) -> Self {
    Self::Index(index)
  }
}

/// A single failed validation check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
  /// Path from the root of the request body to the offending value. Empty for the body itself.
  pub path: Vec<PathSegment>,
  /// Human-readable description of the failed check.
  pub message: String,
}

impl ValidationIssue {
  /// Construct an issue at the given path.
  ///
  /// ```rust
  /// # use lambda_http_adapter::error::{PathSegment, ValidationIssue};
  /// let path = vec![PathSegment::from("items"), PathSegment::Index(0), PathSegment::from("sku")];
  /// let issue = ValidationIssue::new(path, "Required");
  /// assert_eq!(issue.field(), "items.0.sku");
  /// ```
  pub fn new<I>(path: I, message: impl Into<String>) -> Self
  where
    I: IntoIterator,
    I::Item: Into<PathSegment>,
  {
    Self {
      path: path.into_iter().map(Into::into).collect(),
      message: message.into(),
    }
  }

  /// Construct an issue concerning the request body as a whole.
  pub fn root(message: impl Into<String>) -> Self {
    Self {
      path: Vec::new(),
      message: message.into(),
    }
  }

  /// Dotted representation of [`path`](ValidationIssue::path) (e.g., `items.0.sku`).
  pub fn field(&self) -> String {
    self.path.iter().join(".")
  }
}

/// Structured validation failure carrying every failed check, in the order detected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("request validation failed with {} issue(s)", .issues.len())]
pub struct ValidationError {
  issues: Vec<ValidationIssue>,
}

impl ValidationError {
  /// Construct a validation error from a list of issues.
  pub fn new(issues: Vec<ValidationIssue>) -> Self {
    Self { issues }
  }

  /// Construct a validation error with a single issue.
  pub fn single(issue: ValidationIssue) -> Self {
    Self {
      issues: vec![issue],
    }
  }

  /// Issues in the order they were detected.
  pub fn issues(&self) -> &[ValidationIssue] {
    &self.issues
  }

  /// Append an issue.
  pub fn push(&mut self, issue: ValidationIssue) {
    self.issues.push(issue);
  }

  /// Whether no issues have been recorded.
  pub fn is_empty(&self) -> bool {
    self.issues.is_empty()
  }

  /// Return `Err(self)` if any issues were recorded, or `Ok(())` otherwise.
  ///
  /// Useful for collecting several checks before failing.
  pub fn into_result(self) -> Result<(), Self> {
    if self.issues.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ValidationError {
  fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
    let path = err
      .path()
      .iter()
      .map(|segment| match segment {
        Segment::Seq { index } => PathSegment::Index(*index),
        Segment::Map { key } => PathSegment::Key(key.clone()),
        Segment::Enum { variant } => PathSegment::Key(variant.clone()),
        _ => PathSegment::Key("?".to_string()),
      })
      .collect::<Vec<_>>();

    Self::single(ValidationIssue {
      path,
      message: err.inner().to_string(),
    })
  }
}

/// Error that already knows which HTTP response it corresponds to.
///
/// The status code, error code, and message are returned to the client unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("HTTP {status_code} {code}: {message}")]
pub struct HttpError {
  /// HTTP status code of the response.
  pub status_code: StatusCode,
  /// Machine-readable error code.
  pub code: ErrorCode,
  /// Client-facing message.
  pub message: ErrorMessage,
}

impl HttpError {
  /// Construct an HTTP error.
  pub fn new(status_code: StatusCode, code: ErrorCode, message: impl Into<ErrorMessage>) -> Self {
    Self {
      status_code,
      code,
      message: message.into(),
    }
  }

  /// 400 Bad Request.
  pub fn bad_request(message: impl Into<ErrorMessage>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
  }

  /// 401 Unauthorized.
  pub fn unauthorized(message: impl Into<ErrorMessage>) -> Self {
    Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
  }

  /// 403 Forbidden.
  pub fn forbidden(message: impl Into<ErrorMessage>) -> Self {
    Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
  }

  /// 404 Not Found.
  pub fn not_found(message: impl Into<ErrorMessage>) -> Self {
    Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
  }

  /// 409 Conflict.
  pub fn conflict(message: impl Into<ErrorMessage>) -> Self {
    Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
  }
}

/// Domain error raised by a controller.
///
/// Responds with [`status_code`](ApplicationError::status_code) if set, or 400 Bad Request
/// otherwise.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ApplicationError {
  /// Optional HTTP status code override.
  pub status_code: Option<StatusCode>,
  /// Machine-readable error code.
  pub code: ErrorCode,
  /// Client-facing message.
  pub message: String,
}

impl ApplicationError {
  /// Construct an application error that responds with 400 Bad Request.
  pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
    Self {
      status_code: None,
      code,
      message: message.into(),
    }
  }

  /// Respond with the given status code instead of 400 Bad Request.
  pub fn with_status_code(mut self, status_code: StatusCode) -> Self {
    self.status_code = Some(status_code);
    self
  }
}

/// Error returned while handling a request, classified by how it maps to an HTTP response.
///
/// Variants are listed in the order they take precedence. Opaque [`anyhow::Error`] values are
/// converted with [`From`], which downcasts them in the same order and only falls back to
/// [`HandlerError::Unexpected`] if none of the recognized error types match.
#[derive(Debug, Error)]
pub enum HandlerError {
  /// Schema validation failure (400 `VALIDATION`).
  #[error(transparent)]
  Validation(#[from] ValidationError),
  /// Error carrying its own HTTP status, code, and message.
  #[error(transparent)]
  Http(#[from] HttpError),
  /// Domain error with an optional status code.
  #[error(transparent)]
  Application(#[from] ApplicationError),
  /// Anything else (500 `INTERNAL_SERVER_ERROR`).
  #[error(transparent)]
  Unexpected(anyhow::Error),
}

impl HandlerError {
  /// Classify an arbitrary error.
  pub fn from_error<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    anyhow::Error::new(err).into()
  }

  /// Return the name of the error variant (e.g., `Validation`).
  pub fn name(&self) -> &str {
    match self {
      HandlerError::Validation(_) => "Validation",
      HandlerError::Http(_) => "Http",
      HandlerError::Application(_) => "Application",
      HandlerError::Unexpected(_) => "Unexpected",
    }
  }
}

impl From<anyhow::Error> for HandlerError {
  fn from(err: anyhow::Error) -> Self {
    let err = match err.downcast::<HandlerError>() {
      Ok(err) => return err,
      Err(err) => err,
    };
    let err = match err.downcast::<ValidationError>() {
      Ok(err) => return HandlerError::Validation(err),
      Err(err) => err,
    };
    let err = match err.downcast::<HttpError>() {
      Ok(err) => return HandlerError::Http(err),
      Err(err) => err,
    };
    let err = match err.downcast::<ApplicationError>() {
      Ok(err) => return HandlerError::Application(err),
      Err(err) => err,
    };
    match err.downcast::<AdapterError>() {
      Ok(err) => err.into(),
      Err(err) => HandlerError::Unexpected(err),
    }
  }
}

impl From<AdapterError> for HandlerError {
  fn from(err: AdapterError) -> Self {
    match err {
      // We expose parse errors to the client to provide better 400 Bad Request diagnostics.
      AdapterError::InvalidBodyJson(err, _) => HandlerError::Application(ApplicationError::new(
        ErrorCode::InvalidBody,
        format!("Invalid request body: {err}"),
      )),
      AdapterError::InvalidBodyUtf8(_, _) => HandlerError::Application(ApplicationError::new(
        ErrorCode::InvalidBody,
        "Request body must be UTF-8 encoded",
      )),
      err => HandlerError::Unexpected(anyhow::Error::new(err)),
    }
  }
}

/// Error that occurred inside the adapter itself (as opposed to within a controller).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdapterError {
  /// Registered factory failed to construct the requested type.
  #[error("failed to construct `{type_name}`")]
  Factory {
    /// Name of the type being resolved.
    type_name: &'static str,
    /// Underlying error returned by the factory.
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
    /// Stack trace indicating where the error occurred.
    backtrace: _Backtrace,
  },
  /// Invalid base64 encoding for request body.
  // The base64 encoding comes from AWS, so this is actually an internal error.
  #[error("invalid base64 encoding for request body")]
  InvalidBodyBase64(#[source] Box<base64::DecodeError>, _Backtrace),
  /// Failed to JSON deserialize request body.
  #[error("failed to JSON deserialize request body")]
  InvalidBodyJson(#[source] Box<serde_json::Error>, _Backtrace),
  /// Invalid UTF-8 encoding for request body.
  #[error("invalid UTF-8 encoding for request body")]
  InvalidBodyUtf8(#[source] Box<FromUtf8Error>, _Backtrace),
  /// Request handler panicked.
  #[error("request handler panicked: {0}")]
  Panic(String, _Backtrace),
  /// Nothing is registered for the requested type.
  #[error("no `{0}` registered")]
  UnregisteredType(&'static str, _Backtrace),
}

impl AdapterError {
  /// Return the backtrace associated with the error, if known.
  pub fn backtrace(&self) -> Option<&_Backtrace> {
    match self {
      AdapterError::Factory { backtrace, .. }
      | AdapterError::InvalidBodyBase64(_, backtrace)
      | AdapterError::InvalidBodyJson(_, backtrace)
      | AdapterError::InvalidBodyUtf8(_, backtrace)
      | AdapterError::Panic(_, backtrace)
      | AdapterError::UnregisteredType(_, backtrace) => Some(backtrace),
    }
  }

  /// Return the name of the error variant (e.g., `InvalidBodyBase64`).
  pub fn name(&self) -> &str {
    match self {
      AdapterError::Factory { .. } => "Factory",
      AdapterError::InvalidBodyBase64(_, _) => "InvalidBodyBase64",
      AdapterError::InvalidBodyJson(_, _) => "InvalidBodyJson",
      AdapterError::InvalidBodyUtf8(_, _) => "InvalidBodyUtf8",
      AdapterError::Panic(_, _) => "Panic",
      AdapterError::UnregisteredType(_, _) => "UnregisteredType",
    }
  }
}

/// Helper function for formatting an error as a string containing a human-readable chain of causes.
///
/// This function will walk over the chain of causes returned by
/// [`Error::source`](std::error::Error::source) and append each underlying error (using the
/// [`Display`](std::fmt::Display) trait).
///
/// # Arguments
///
/// * `err` - Error to format.
/// * `name` - Optional name of the error type/variant (e.g., `AdapterError::InvalidBodyJson`).
/// * `backtrace` - Optional [`Backtrace`](backtrace::Backtrace) indicating where the top-level
///   error occurred.
pub fn format_error(
  err: &dyn std::error::Error,
  name: Option<&str>,
  backtrace: Option<&_Backtrace>,
) -> String {
  let err_line = name
    .map(|n| format!("{}: {}", n, err))
    .unwrap_or_else(|| err.to_string());

  let top_error = if let Some(bt) = backtrace {
    format!("{err_line}\n  stack trace:\n{}", format_backtrace(bt, 4))
  } else {
    err_line
  };

  let cause_str = ErrorCauseIterator(err.source())
    .map(|cause| format!("  caused by: {cause}"))
    .join("\n");

  if !cause_str.is_empty() {
    format!("{top_error}\n{cause_str}")
  } else {
    top_error
  }
}

struct ErrorCauseIterator<'a>(Option<&'a (dyn std::error::Error + 'static)>);

impl<'a> Iterator for ErrorCauseIterator<'a> {
  type Item = &'a (dyn std::error::Error + 'static);

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.0;
    self.0 = current.and_then(|err| err.source());
    current
  }
}

fn format_backtrace(backtrace: &_Backtrace, indent: usize) -> String {
  let indent_str = " ".repeat(indent);
  format!("{backtrace:?}")
    .lines()
    .map(|line| format!("{indent_str}{line}"))
    .join("\n")
}
