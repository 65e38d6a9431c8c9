use crate::error::HandlerError;
use crate::StatusCode;

use aws_lambda_events::apigw::ApiGatewayV2httpResponse;
use aws_lambda_events::encodings::Body;
use aws_lambda_events::http::header::CONTENT_TYPE;
use aws_lambda_events::http::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;

/// Result returned by a successful [`Controller::execute`](crate::Controller::execute) call.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerResult {
  /// HTTP status code of the response.
  pub status_code: StatusCode,
  /// Optional response body, JSON-encoded by the adapter.
  pub body: Option<Value>,
}

impl HandlerResult {
  /// Construct a result without a response body.
  pub fn new(status_code: StatusCode) -> Self {
    Self {
      status_code,
      body: None,
    }
  }

  /// Attach a response body.
  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  /// Construct a result whose body is the JSON representation of `body`.
  pub fn json<T>(status_code: StatusCode, body: &T) -> Result<Self, HandlerError>
  where
    T: Serialize,
  {
    let body = serde_json::to_value(body).map_err(HandlerError::from_error)?;
    Ok(Self::new(status_code).with_body(body))
  }
}

/// Terminal HTTP-shaped output of the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdaptedResponse {
  /// HTTP status code of the response.
  pub status_code: StatusCode,
  /// JSON-encoded body, or `None` to omit the body entirely.
  pub body: Option<String>,
}

impl AdaptedResponse {
  /// Construct a response without a body.
  pub fn new(status_code: StatusCode) -> Self {
    Self {
      status_code,
      body: None,
    }
  }

  /// Attach an (already JSON-encoded) body.
  pub fn with_body(mut self, body: String) -> Self {
    self.body = Some(body);
    self
  }
}

impl From<AdaptedResponse> for ApiGatewayV2httpResponse {
  /// Serialize an [`AdaptedResponse`] as an [`ApiGatewayV2httpResponse`].
  ///
  /// Responses with a body are labeled `Content-Type: application/json`.
  fn from(response: AdaptedResponse) -> Self {
    let mut headers = HeaderMap::new();
    if response.body.is_some() {
      headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    ApiGatewayV2httpResponse {
      status_code: response.status_code.as_u16() as i64,
      headers,
      body: response.body.map(Body::Text),
      ..Default::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn test_json_result() {
    #[derive(Serialize)]
    struct Created {
      id: u64,
    }

    let result = HandlerResult::json(StatusCode::CREATED, &Created { id: 1 }).unwrap();
    assert_eq!(
      result,
      HandlerResult::new(StatusCode::CREATED).with_body(json!({ "id": 1 }))
    );
  }

  #[test]
  fn test_apigw_response_with_body() {
    let response = ApiGatewayV2httpResponse::from(
      AdaptedResponse::new(StatusCode::CREATED).with_body(r#"{"id":1}"#.to_string()),
    );

    assert_eq!(response.status_code, 201);
    assert_eq!(response.body, Some(Body::Text(r#"{"id":1}"#.to_string())));
    assert_eq!(
      response.headers.get(CONTENT_TYPE),
      Some(&HeaderValue::from_static("application/json"))
    );
  }

  #[test]
  fn test_apigw_response_without_body() {
    let response = ApiGatewayV2httpResponse::from(AdaptedResponse::new(StatusCode::NO_CONTENT));

    assert_eq!(response.status_code, 204);
    assert_eq!(response.body, None);
    assert!(response.headers.is_empty());
  }
}
