use crate::directory::AccountDirectory;

use lambda_http_adapter::async_trait::async_trait;
use lambda_http_adapter::{
  Controller, HandlerError, HandlerResult, HttpError, NormalizedRequest, StatusCode,
};

use std::sync::Arc;

/// Path parameter naming the requested account.
pub const ACCOUNT_ID_PARAM: &str = "accountId";

/// Returns the requested account, which must belong to the caller.
pub struct GetAccountController {
  directory: Arc<AccountDirectory>,
}

impl GetAccountController {
  pub fn new(directory: Arc<AccountDirectory>) -> Self {
    Self { directory }
  }
}

#[async_trait]
impl Controller for GetAccountController {
  async fn execute(&self, request: NormalizedRequest) -> Result<HandlerResult, HandlerError> {
    let caller = request
      .account_id()
      .ok_or_else(|| HttpError::unauthorized("Missing account"))?;

    // `/accounts/me` is an alias for the caller's own account.
    let account_id = match request.param(ACCOUNT_ID_PARAM) {
      Some("me") | None => caller,
      Some(account_id) => account_id,
    };
    if account_id != caller {
      return Err(HttpError::forbidden("Access denied").into());
    }

    let account = self
      .directory
      .get(account_id)?
      .ok_or_else(|| HttpError::not_found(format!("Account `{account_id}` not found")))?;

    HandlerResult::json(StatusCode::OK, &account)
  }
}
