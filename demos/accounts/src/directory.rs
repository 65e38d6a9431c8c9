use lambda_http_adapter::{ApplicationError, ErrorCode, HandlerError, StatusCode};
use serde::Serialize;
use thiserror::Error;

use std::collections::BTreeMap;
use std::sync::RwLock;

/// A stored account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub id: String,
  pub name: String,
  pub email: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("an account with email `{0}` already exists")]
  DuplicateEmail(String),
  // Another invocation panicked while holding the lock.
  #[error("account directory lock poisoned")]
  Poisoned,
}

impl From<DirectoryError> for HandlerError {
  fn from(err: DirectoryError) -> Self {
    match err {
      DirectoryError::DuplicateEmail(_) => ApplicationError::new(ErrorCode::Conflict, err.to_string())
        .with_status_code(StatusCode::CONFLICT)
        .into(),
      DirectoryError::Poisoned => HandlerError::Unexpected(err.into()),
    }
  }
}

/// Prefix of the IDs assigned by [`AccountDirectory::create`].
const ID_PREFIX: &str = "acct-";

#[derive(Debug)]
struct DirectoryState {
  accounts: BTreeMap<String, Account>,
  // Always past the largest `acct-N` in `accounts`.
  next_id: u64,
}

/// In-memory account store.
#[derive(Debug)]
pub struct AccountDirectory {
  state: RwLock<DirectoryState>,
}

impl Default for AccountDirectory {
  fn default() -> Self {
    Self::seeded([])
  }
}

impl AccountDirectory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Directory pre-populated with the given accounts.
  pub fn seeded<I>(accounts: I) -> Self
  where
    I: IntoIterator<Item = Account>,
  {
    let accounts = accounts
      .into_iter()
      .map(|account| (account.id.clone(), account))
      .collect::<BTreeMap<_, _>>();
    let next_id = accounts
      .keys()
      .filter_map(|id| id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
      .max()
      .map_or(1, |max_id| max_id + 1);

    Self {
      state: RwLock::new(DirectoryState { accounts, next_id }),
    }
  }

  pub fn get(&self, id: &str) -> Result<Option<Account>, DirectoryError> {
    let state = self.state.read().map_err(|_| DirectoryError::Poisoned)?;
    Ok(state.accounts.get(id).cloned())
  }

  /// Insert a new account, assigning it the next unused sequential ID.
  pub fn create(&self, name: String, email: String) -> Result<Account, DirectoryError> {
    let mut state = self.state.write().map_err(|_| DirectoryError::Poisoned)?;

    if state
      .accounts
      .values()
      .any(|account| account.email.eq_ignore_ascii_case(&email))
    {
      return Err(DirectoryError::DuplicateEmail(email));
    }

    let account = Account {
      id: format!("{ID_PREFIX}{}", state.next_id),
      name,
      email,
    };
    state.next_id += 1;
    state.accounts.insert(account.id.clone(), account.clone());

    Ok(account)
  }
}
