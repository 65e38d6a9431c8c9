use crate::error::{ValidationError, ValidationIssue};

use serde::de::DeserializeOwned;
use serde_json::Value;

use std::collections::HashMap;

/// Request passed to a [`Controller`](crate::Controller), independent of the originating event
/// shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedRequest {
  body: Option<Value>,
  params: HashMap<String, String>,
  query_params: HashMap<String, String>,
  account_id: Option<String>,
}

impl NormalizedRequest {
  /// Construct a normalized request.
  pub fn new(
    body: Option<Value>,
    params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    account_id: Option<String>,
  ) -> Self {
    Self {
      body,
      params,
      query_params,
      account_id,
    }
  }

  /// Parsed JSON request body, or `None` if the request had no body.
  pub fn body(&self) -> Option<&Value> {
    self.body.as_ref()
  }

  /// Deserialize the request body into `T`.
  ///
  /// A missing body or a body that doesn't match `T` results in a [`ValidationError`] whose issue
  /// path points at the offending value.
  pub fn body_as<T>(&self) -> Result<T, ValidationError>
  where
    T: DeserializeOwned,
  {
    match &self.body {
      Some(body) => serde_path_to_error::deserialize(body).map_err(ValidationError::from),
      None => Err(ValidationError::single(ValidationIssue::root("Required"))),
    }
  }

  /// Path parameters (empty if the route has none).
  pub fn params(&self) -> &HashMap<String, String> {
    &self.params
  }

  /// Return the named path parameter.
  pub fn param(&self, name: &str) -> Option<&str> {
    self.params.get(name).map(String::as_str)
  }

  /// Query string parameters (empty if the request has none).
  pub fn query_params(&self) -> &HashMap<String, String> {
    &self.query_params
  }

  /// Return the named query string parameter.
  pub fn query_param(&self, name: &str) -> Option<&str> {
    self.query_params.get(name).map(String::as_str)
  }

  /// Account identifier of the authenticated caller, or `None` for unauthenticated requests.
  pub fn account_id(&self) -> Option<&str> {
    self.account_id.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;
  use serde::Deserialize;
  use serde_json::json;

  #[derive(Debug, Deserialize, PartialEq)]
  struct CreateAccount {
    name: String,
    tags: Vec<String>,
  }

  fn request_with_body(body: Option<Value>) -> NormalizedRequest {
    NormalizedRequest::new(body, HashMap::new(), HashMap::new(), None)
  }

  #[test]
  fn test_body_as() {
    let request = request_with_body(Some(json!({ "name": "Ada", "tags": ["admin"] })));
    assert_eq!(
      request.body_as::<CreateAccount>().unwrap(),
      CreateAccount {
        name: "Ada".to_string(),
        tags: vec!["admin".to_string()],
      }
    );
  }

  #[test]
  fn test_body_as_missing_body() {
    let err = request_with_body(None)
      .body_as::<CreateAccount>()
      .unwrap_err();
    assert_eq!(err.issues(), &[ValidationIssue::root("Required")]);
  }

  #[test]
  fn test_body_as_reports_path() {
    let request = request_with_body(Some(json!({ "name": "Ada", "tags": ["admin", 3] })));
    let err = request.body_as::<CreateAccount>().unwrap_err();

    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].field(), "tags.1");
  }

  #[test]
  fn test_lookups() {
    let request = NormalizedRequest::new(
      None,
      HashMap::from([("accountId".to_string(), "abc123".to_string())]),
      HashMap::from([("limit".to_string(), "10".to_string())]),
      Some("abc123".to_string()),
    );

    assert_eq!(request.param("accountId"), Some("abc123"));
    assert_eq!(request.param("missing"), None);
    assert_eq!(request.query_param("limit"), Some("10"));
    assert_eq!(request.account_id(), Some("abc123"));
    assert_eq!(request.body(), None);
  }
}
