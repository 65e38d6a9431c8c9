use crate::error::HandlerError;
use crate::request::NormalizedRequest;
use crate::response::HandlerResult;

use async_trait::async_trait;

/// Business logic invoked by the adapter for each request.
///
/// This trait is intended to be used with the [`#[async_trait]`](async_trait::async_trait)
/// attribute.
///
/// Return [`HandlerError::Validation`], [`HandlerError::Http`], or [`HandlerError::Application`]
/// to control the error response. Any other error (including opaque [`anyhow::Error`]s that
/// don't wrap one of those types) results in a generic 500 Internal Server Error.
#[async_trait]
pub trait Controller: Send + Sync {
  /// Handle a single request.
  async fn execute(&self, request: NormalizedRequest) -> Result<HandlerResult, HandlerError>;
}

