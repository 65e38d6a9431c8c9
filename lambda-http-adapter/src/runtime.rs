use crate::event::IncomingEvent;
use crate::response::AdaptedResponse;

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use futures::FutureExt;
use lambda_runtime::{service_fn, LambdaEvent};
use log::trace;

use std::future::Future;

/// Start the Lambda runtime to handle API Gateway v2 (HTTP API) events.
///
/// Each payload is converted into an [`IncomingEvent`] before being passed to `handle_event`, and
/// the resulting [`AdaptedResponse`] is converted into an [`ApiGatewayV2httpResponse`].
///
/// # Example
///
/// ```rust,ignore
/// use lambda_http_adapter::{run_lambda, LambdaHttpAdapter, Registry};
///
/// #[tokio::main]
/// pub async fn main() -> Result<(), lambda_runtime::Error> {
///   let registry = ...; // Register your controllers here.
///   let adapter = LambdaHttpAdapter::<MyController>::new(registry);
///
///   run_lambda(|event| adapter.handle(event)).await
/// }
/// ```
pub async fn run_lambda<F, Fut>(mut handle_event: F) -> Result<(), lambda_runtime::Error>
where
  F: FnMut(IncomingEvent) -> Fut,
  Fut: Future<Output = AdaptedResponse>,
{
  lambda_runtime::run(service_fn(
    |event: LambdaEvent<ApiGatewayV2httpRequest>| {
      trace!("Lambda context: {:#?}", event.context);
      handle_event(IncomingEvent::from(event.payload)).map(|response| {
        Result::<_, std::convert::Infallible>::Ok(ApiGatewayV2httpResponse::from(response))
      })
    },
  ))
  .await
}
