/// Environment variable overriding [`AdapterConfig::account_id_claim`].
pub const ACCOUNT_ID_CLAIM_ENV: &str = "ACCOUNT_ID_CLAIM";

/// Default JWT claim holding the caller's account identifier.
pub const DEFAULT_ACCOUNT_ID_CLAIM: &str = "internalId";

/// Adapter settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterConfig {
  /// Name of the JWT claim copied into
  /// [`NormalizedRequest::account_id`](crate::NormalizedRequest::account_id).
  pub account_id_claim: String,
}

impl Default for AdapterConfig {
  fn default() -> Self {
    Self {
      account_id_claim: DEFAULT_ACCOUNT_ID_CLAIM.to_string(),
    }
  }
}

impl AdapterConfig {
  /// Load the configuration from the Lambda function's environment variables, falling back to
  /// the defaults for any that are unset or empty.
  pub fn from_env() -> Self {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let account_id_claim = lookup(ACCOUNT_ID_CLAIM_ENV)
      .filter(|claim| !claim.is_empty())
      .unwrap_or_else(|| DEFAULT_ACCOUNT_ID_CLAIM.to_string());

    Self { account_id_claim }
  }
}
