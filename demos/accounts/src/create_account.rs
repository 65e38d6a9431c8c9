use crate::directory::AccountDirectory;

use lambda_http_adapter::async_trait::async_trait;
use lambda_http_adapter::error::ValidationIssue;
use lambda_http_adapter::{
  Controller, HandlerError, HandlerResult, NormalizedRequest, StatusCode, ValidationError,
};
use log::info;
use serde::Deserialize;

use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody {
  #[serde(default)]
  name: String,
  #[serde(default)]
  email: String,
}

impl CreateAccountBody {
  fn validate(&self) -> Result<(), ValidationError> {
    let mut err = ValidationError::new(Vec::new());

    if self.name.trim().is_empty() {
      err.push(ValidationIssue::new(["name"], "Required"));
    }

    if self.email.is_empty() {
      err.push(ValidationIssue::new(["email"], "Required"));
    } else if !is_plausible_email(&self.email) {
      err.push(ValidationIssue::new(["email"], "Invalid email"));
    }

    err.into_result()
  }
}

fn is_plausible_email(email: &str) -> bool {
  match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
    None => false,
  }
}

/// Creates an account from the request body and responds with 201 Created.
pub struct CreateAccountController {
  directory: Arc<AccountDirectory>,
}

impl CreateAccountController {
  pub fn new(directory: Arc<AccountDirectory>) -> Self {
    Self { directory }
  }
}

#[async_trait]
impl Controller for CreateAccountController {
  async fn execute(&self, request: NormalizedRequest) -> Result<HandlerResult, HandlerError> {
    let body = request.body_as::<CreateAccountBody>()?;
    body.validate()?;

    let account = self
      .directory
      .create(body.name.trim().to_string(), body.email)?;
    info!("Created account `{}`", account.id);

    HandlerResult::json(StatusCode::CREATED, &account)
  }
}
