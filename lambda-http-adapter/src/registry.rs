use crate::error::AdapterError;

use backtrace::Backtrace;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type Provider<T> = Box<dyn Fn(&Registry) -> anyhow::Result<Arc<T>> + Send + Sync>;

/// Type-keyed collection of controllers and the services they depend on.
///
/// A registry is populated once during cold start and then shared (read-only) by every invocation
/// of the adapter.
///
/// # Example
///
/// ```rust
/// # use lambda_http_adapter::Registry;
/// struct Database;
/// struct AccountService {
///   _db: std::sync::Arc<Database>,
/// }
///
/// let mut registry = Registry::new();
/// registry
///   .register(Database)
///   .register_factory(|registry| {
///     Ok(AccountService {
///       _db: registry.resolve::<Database>()?,
///     })
///   });
///
/// assert!(registry.resolve::<AccountService>().is_ok());
/// ```
#[derive(Default)]
pub struct Registry {
  // Each value is a `Provider<T>` for the `T` identified by the key.
  providers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Registry {
  /// Construct an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a shared instance of `T`, replacing any previous registration.
  pub fn register<T>(&mut self, instance: T) -> &mut Self
  where
    T: Send + Sync + 'static,
  {
    let instance = Arc::new(instance);
    self.insert::<T>(Box::new(move |_| Ok(Arc::clone(&instance))))
  }

  /// Register a factory invoked each time `T` is resolved, replacing any previous registration.
  ///
  /// The factory may resolve its own dependencies from the registry it receives.
  pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Fn(&Registry) -> anyhow::Result<T> + Send + Sync + 'static,
  {
    self.insert::<T>(Box::new(move |registry| factory(registry).map(Arc::new)))
  }

  /// Whether anything is registered for `T`.
  pub fn contains<T>(&self) -> bool
  where
    T: Send + Sync + 'static,
  {
    self.providers.contains_key(&TypeId::of::<T>())
  }

  /// Resolve an instance of `T`.
  pub fn resolve<T>(&self) -> Result<Arc<T>, AdapterError>
  where
    T: Send + Sync + 'static,
  {
    let provider = self
      .providers
      .get(&TypeId::of::<T>())
      .and_then(|provider| provider.downcast_ref::<Provider<T>>())
      .ok_or_else(|| AdapterError::UnregisteredType(type_name::<T>(), Backtrace::new()))?;

    provider(self).map_err(|err| AdapterError::Factory {
      type_name: type_name::<T>(),
      source: err.into(),
      backtrace: Backtrace::new(),
    })
  }

  fn insert<T>(&mut self, provider: Provider<T>) -> &mut Self
  where
    T: Send + Sync + 'static,
  {
    self.providers.insert(TypeId::of::<T>(), Box::new(provider));
    self
  }
}

impl Debug for Registry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry")
      .field("registered", &self.providers.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, PartialEq)]
  struct Greeting(&'static str);

  struct Greeter {
    greeting: Arc<Greeting>,
  }

  #[test]
  fn test_register_instance() {
    let mut registry = Registry::new();
    registry.register(Greeting("hello"));

    let first = registry.resolve::<Greeting>().unwrap();
    let second = registry.resolve::<Greeting>().unwrap();
    assert_eq!(*first, Greeting("hello"));
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[test]
  fn test_register_factory_with_dependency() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);

    let mut registry = Registry::new();
    registry
      .register(Greeting("hi"))
      .register_factory(move |registry| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Greeter {
          greeting: registry.resolve::<Greeting>()?,
        })
      });

    assert_eq!(registry.resolve::<Greeter>().unwrap().greeting.0, "hi");
    registry.resolve::<Greeter>().unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_unregistered_type() {
    let registry = Registry::new();
    assert!(!registry.contains::<Greeting>());
    match registry.resolve::<Greeting>() {
      Err(AdapterError::UnregisteredType(name, _)) => assert!(name.ends_with("Greeting")),
      other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
  }

  #[test]
  fn test_factory_failure() {
    let mut registry = Registry::new();
    registry.register_factory::<Greeter, _>(|registry| {
      Ok(Greeter {
        greeting: registry.resolve::<Greeting>()?,
      })
    });

    match registry.resolve::<Greeter>() {
      Err(err @ AdapterError::Factory { .. }) => {
        assert_eq!(err.name(), "Factory");
        let cause = std::error::Error::source(&err).expect("factory error should have a cause");
        assert!(cause.to_string().contains("Greeting"));
      }
      Err(other) => panic!("unexpected error: {other:?}"),
      Ok(_) => panic!("resolution should fail"),
    }
  }
}
