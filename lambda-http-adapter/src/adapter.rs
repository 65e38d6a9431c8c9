use crate::body::{BodyParser, JsonBodyParser};
use crate::config::AdapterConfig;
use crate::controller::Controller;
use crate::envelope::{ErrorEnvelope, ErrorFormatter, JsonErrorFormatter};
use crate::error::{AdapterError, HandlerError};
use crate::event::{IncomingEvent, RequestContext};
use crate::registry::Registry;
use crate::request::NormalizedRequest;
use crate::response::AdaptedResponse;
use crate::runtime::run_lambda;

use backtrace::Backtrace;
use futures::FutureExt;
use log::{debug, trace};

use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;


/// Adapts [`IncomingEvent`]s into invocations of controller `C`.
///
/// The controller is resolved from the [`Registry`] on every invocation, so the registry decides
/// whether controllers are shared or constructed per request.
pub struct LambdaHttpAdapter<C, P = JsonBodyParser, F = JsonErrorFormatter> {
  registry: Arc<Registry>,
  body_parser: P,
  error_formatter: F,
  config: AdapterConfig,
  _controller: PhantomData<fn() -> C>,
}

impl<C> LambdaHttpAdapter<C>
where
  C: Controller + 'static,
{
  /// Construct an adapter that uses the default body parser, error formatter, and configuration.
  pub fn new(registry: Arc<Registry>) -> Self {
    Self {
      registry,
      body_parser: JsonBodyParser,
      error_formatter: JsonErrorFormatter,
      config: AdapterConfig::default(),
      _controller: PhantomData,
    }
  }
}

impl<C, P, F> LambdaHttpAdapter<C, P, F>
where
  C: Controller + 'static,
  P: BodyParser,
  F: ErrorFormatter,
{
  /// Replace the adapter configuration.
  pub fn with_config(mut self, config: AdapterConfig) -> Self {
    self.config = config;
    self
  }

  /// Replace the body parser.
  pub fn with_body_parser<P2>(self, body_parser: P2) -> LambdaHttpAdapter<C, P2, F>
  where
    P2: BodyParser,
  {
    LambdaHttpAdapter {
      registry: self.registry,
      body_parser,
      error_formatter: self.error_formatter,
      config: self.config,
      _controller: PhantomData,
    }
  }

  /// Replace the error formatter.
  pub fn with_error_formatter<F2>(self, error_formatter: F2) -> LambdaHttpAdapter<C, P, F2>
  where
    F2: ErrorFormatter,
  {
    LambdaHttpAdapter {
      registry: self.registry,
      body_parser: self.body_parser,
      error_formatter,
      config: self.config,
      _controller: PhantomData,
    }
  }

  /// Adapter configuration.
  pub fn config(&self) -> &AdapterConfig {
    &self.config
  }

  /// Handle a single event.
  ///
  /// This method never fails: errors (and panics) raised while resolving the controller, parsing
  /// the request, or executing the controller are translated into an error response.
  pub async fn handle(&self, event: IncomingEvent) -> AdaptedResponse {
    let result = match AssertUnwindSafe(self.handle_impl(event))
      .catch_unwind()
      .await
    {
      Ok(result) => result,
      // Unfortunately, the panic doesn't give us a stack trace unless we set a panic hook, which
      // might interfere with the user's own error handling. Instead, we just capture a backtrace
      // indicating where we caught the panic, for now.
      Err(panic) => Err(AdapterError::Panic(panic_string(panic), Backtrace::new()).into()),
    };

    let response = match result {
      Ok(response) => response,
      Err(err) => self.respond_to_error(err),
    };
    debug!("Responding with status {}", response.status_code);

    response
  }

  /// Build the error response for `err`.
  ///
  /// Unexpected errors are logged and replaced by a generic 500 Internal Server Error response.
  pub fn respond_to_error(&self, err: HandlerError) -> AdaptedResponse {
    self.error_formatter.format(ErrorEnvelope::from(err))
  }

  /// Convert `event` into the request passed to the controller.
  pub fn normalize(&self, event: IncomingEvent) -> Result<NormalizedRequest, HandlerError> {
    let body = self.body_parser.parse(event.decoded_body()?.as_deref())?;

    let account_id = match &event.request_context {
      RequestContext::JwtAuthorized(authorizer) => authorizer
        .claim(&self.config.account_id_claim)
        .map(str::to_string),
      RequestContext::Unauthenticated => None,
    };

    Ok(NormalizedRequest::new(
      body,
      event.path_parameters.unwrap_or_default(),
      event.query_string_parameters.unwrap_or_default(),
      account_id,
    ))
  }

  /// Start the Lambda runtime and handle every event with this adapter.
  pub async fn run(self) -> Result<(), lambda_runtime::Error> {
    run_lambda(|event| self.handle(event)).await
  }

  async fn handle_impl(&self, event: IncomingEvent) -> Result<AdaptedResponse, HandlerError> {
    trace!("Event: {event:#?}");

    let controller = self.registry.resolve::<C>()?;
    debug!("Resolved controller `{}`", type_name::<C>());

    let request = self.normalize(event)?;
    trace!("Normalized request: {request:#?}");

    let result = controller.execute(request).await?;

    // A `null` body is omitted, the same as no body at all.
    let body = result
      .body
      .filter(|body| !body.is_null())
      .map(|body| body.to_string());

    Ok(AdaptedResponse {
      status_code: result.status_code,
      body,
    })
  }
}

/// Extract the panic string after catching a panic.
fn panic_string(panic: Box<dyn Any + Send>) -> String {
  panic
    .downcast::<String>()
    .map(|panic| *panic)
    .or_else(|panic| panic.downcast::<&str>().map(|panic| panic.to_string()))
    .unwrap_or_else(|_| "panic payload is not a string".to_string())
}
