use lambda_http_adapter::Registry;

use std::sync::Arc;

/// Account storage shared by the controllers.
pub mod directory;

/// `POST /accounts` implementation.
pub mod create_account;

/// `GET /accounts/{accountId}` implementation.
pub mod get_account;

pub use create_account::CreateAccountController;
pub use directory::{Account, AccountDirectory, DirectoryError};
pub use get_account::GetAccountController;

/// Build the registry used by every account endpoint.
///
/// The directory is shared, while controllers are constructed on each resolution from the
/// registered directory.
pub fn registry(directory: AccountDirectory) -> Arc<Registry> {
  let mut registry = Registry::new();
  registry
    .register(directory)
    .register_factory::<CreateAccountController, _>(|registry| {
      Ok(CreateAccountController::new(
        registry.resolve::<AccountDirectory>()?,
      ))
    })
    .register_factory::<GetAccountController, _>(|registry| {
      Ok(GetAccountController::new(
        registry.resolve::<AccountDirectory>()?,
      ))
    });

  Arc::new(registry)
}
