use accounts::{registry, Account, AccountDirectory, CreateAccountController, GetAccountController};
use lambda_http_adapter::{
  AdaptedResponse, IncomingEvent, LambdaHttpAdapter, RequestContext, StatusCode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn seeded_directory() -> AccountDirectory {
  AccountDirectory::seeded([Account {
    id: "abc123".to_string(),
    name: "Ada".to_string(),
    email: "ada@example.com".to_string(),
  }])
}

fn json_body(response: &AdaptedResponse) -> serde_json::Value {
  serde_json::from_str(
    response
      .body
      .as_deref()
      .unwrap_or_else(|| panic!("response has no body: {response:?}")),
  )
  .unwrap()
}

fn authorized(account_id: &str) -> RequestContext {
  RequestContext::jwt([("internalId", account_id), ("sub", "user-1")])
}

#[tokio::test]
async fn test_create_account() {
  let adapter = LambdaHttpAdapter::<CreateAccountController>::new(registry(seeded_directory()));

  // Success.
  {
    let response = adapter
      .handle(
        IncomingEvent::new()
          .with_body(r#"{"name": " Grace ", "email": "grace@example.com"}"#)
          .with_request_context(authorized("abc123")),
      )
      .await;

    assert_eq!(response.status_code, StatusCode::CREATED);
    assert_eq!(
      json_body(&response),
      json!({
        "id": "acct-1",
        "name": "Grace",
        "email": "grace@example.com",
      })
    );
  }

  // Every failed field is reported, in order.
  {
    let response = adapter
      .handle(IncomingEvent::new().with_body(r#"{"name": "", "email": "grace"}"#))
      .await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(
      json_body(&response),
      json!({
        "error": {
          "code": "VALIDATION",
          "message": [
            { "field": "name", "error": "Required" },
            { "field": "email", "error": "Invalid email" },
          ],
        },
      })
    );
  }

  // Wrong JSON type.
  {
    let response = adapter
      .handle(IncomingEvent::new().with_body(r#"{"name": 7, "email": "grace@example.com"}"#))
      .await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&response)["error"]["message"][0]["field"], "name");
  }

  // Missing body.
  {
    let response = adapter.handle(IncomingEvent::new()).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(
      json_body(&response),
      json!({
        "error": {
          "code": "VALIDATION",
          "message": [{ "field": "", "error": "Required" }],
        },
      })
    );
  }

  // Malformed JSON.
  {
    let response = adapter
      .handle(IncomingEvent::new().with_body(r#"{"name": "#))
      .await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&response)["error"]["code"], "INVALID_BODY");
  }

  // Duplicate email.
  {
    let response = adapter
      .handle(IncomingEvent::new().with_body(r#"{"name": "Ada", "email": "ADA@example.com"}"#))
      .await;

    assert_eq!(response.status_code, StatusCode::CONFLICT);
    assert_eq!(
      json_body(&response),
      json!({
        "error": {
          "code": "CONFLICT",
          "message": "an account with email `ADA@example.com` already exists",
        },
      })
    );
  }
}

#[tokio::test]
async fn test_get_account() {
  let adapter = LambdaHttpAdapter::<GetAccountController>::new(registry(seeded_directory()));

  // Success.
  {
    let response = adapter
      .handle(
        IncomingEvent::new()
          .with_path_parameter("accountId", "abc123")
          .with_request_context(authorized("abc123")),
      )
      .await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(
      json_body(&response),
      json!({
        "id": "abc123",
        "name": "Ada",
        "email": "ada@example.com",
      })
    );
  }

  // The `me` alias resolves to the caller.
  {
    let response = adapter
      .handle(
        IncomingEvent::new()
          .with_path_parameter("accountId", "me")
          .with_request_context(authorized("abc123")),
      )
      .await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(json_body(&response)["id"], "abc123");
  }

  // Missing authorizer.
  {
    let response = adapter
      .handle(IncomingEvent::new().with_path_parameter("accountId", "abc123"))
      .await;

    assert_eq!(response.status_code, StatusCode::UNAUTHORIZED);
    assert_eq!(
      json_body(&response),
      json!({ "error": { "code": "UNAUTHORIZED", "message": "Missing account" } })
    );
  }

  // Another caller's account.
  {
    let response = adapter
      .handle(
        IncomingEvent::new()
          .with_path_parameter("accountId", "abc123")
          .with_request_context(authorized("xyz789")),
      )
      .await;

    assert_eq!(response.status_code, StatusCode::FORBIDDEN);
  }

  // Authorized caller whose account doesn't exist.
  {
    let response = adapter
      .handle(
        IncomingEvent::new()
          .with_path_parameter("accountId", "xyz789")
          .with_request_context(authorized("xyz789")),
      )
      .await;

    assert_eq!(response.status_code, StatusCode::NOT_FOUND);
    assert_eq!(
      json_body(&response),
      json!({ "error": { "code": "NOT_FOUND", "message": "Account `xyz789` not found" } })
    );
  }
}

#[tokio::test]
async fn test_create_then_get() {
  let registry = registry(AccountDirectory::new());
  let create = LambdaHttpAdapter::<CreateAccountController>::new(registry.clone());
  let get = LambdaHttpAdapter::<GetAccountController>::new(registry);

  let created = create
    .handle(IncomingEvent::new().with_body(r#"{"name": "Lin", "email": "lin@example.com"}"#))
    .await;
  assert_eq!(created.status_code, StatusCode::CREATED);
  let account_id = json_body(&created)["id"].as_str().unwrap().to_string();

  let fetched = get
    .handle(
      IncomingEvent::new()
        .with_path_parameter("accountId", account_id.as_str())
        .with_request_context(authorized(&account_id)),
    )
    .await;
  assert_eq!(fetched.status_code, StatusCode::OK);
  assert_eq!(json_body(&fetched), json_body(&created));
}
