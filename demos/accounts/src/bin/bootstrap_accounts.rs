use accounts::{
  registry, Account, AccountDirectory, CreateAccountController, GetAccountController,
};
use lambda_http_adapter::{AdapterConfig, LambdaHttpAdapter};

/// Selects which controller this deployment serves (`create` or `get`), so that one binary can back
/// every Lambda function of the API.
const ENDPOINT_ENV: &str = "ACCOUNTS_ENDPOINT";

#[tokio::main]
pub async fn main() -> Result<(), lambda_runtime::Error> {
  // TIP: Use the `log4rs` crate for more fine-grained control over logging.
  env_logger::init();

  let registry = registry(AccountDirectory::seeded([Account {
    id: "acct-demo".to_string(),
    name: "Demo".to_string(),
    email: "demo@example.com".to_string(),
  }]));
  let config = AdapterConfig::from_env();

  match std::env::var(ENDPOINT_ENV).as_deref() {
    Ok("create") => {
      LambdaHttpAdapter::<CreateAccountController>::new(registry)
        .with_config(config)
        .run()
        .await
    }
    Ok("get") => {
      LambdaHttpAdapter::<GetAccountController>::new(registry)
        .with_config(config)
        .run()
        .await
    }
    other => Err(format!("unsupported {ENDPOINT_ENV}: {other:?}").into()),
  }
}
