//! The locator contract consumed by generated factories.

use std::sync::Arc;

use crate::args::Arguments;
use crate::contract::MethodId;
use crate::service::ServiceType;

/// A produced service, type-erased. Generated factories downcast it to the
/// method's declared return type.
pub type Instance = Box<dyn std::any::Any + Send>;

/// Shared handle to a locator. Each factory instance holds one.
pub type SharedLocator = Arc<dyn ServiceLocator>;

/// Produces services by type, optional name and positional arguments.
///
/// This is the only surface of the dependency container the synthesis engine
/// relies on. Lifetimes, scoping and constructor injection stay behind it.
pub trait ServiceLocator: Send + Sync {
    fn resolve(
        &self,
        service: ServiceType,
        name: Option<&str>,
        args: Arguments,
    ) -> Result<Instance, ResolveError>;

    /// Resolve the default (unnamed) registration.
    fn resolve_default(&self, service: ServiceType, args: Arguments) -> Result<Instance, ResolveError> {
        self.resolve(service, None, args)
    }
}

/// Failure to produce a service.
///
/// Raised by locators and passed through generated factory methods as is.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No registration matches the requested key.
    #[error("no registration for `{service}`{}", describe_name(.name.as_deref()))]
    Unresolved {
        service: &'static str,
        name: Option<String>,
    },

    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {index} is not a `{expected}`")]
    ArgumentType { index: usize, expected: &'static str },

    /// The locator produced a value of another type than the method returns.
    #[error("locator produced an instance that is not a `{expected}`")]
    UnexpectedInstance { expected: &'static str },

    /// A generic method was dispatched without its instantiation.
    #[error("`{method}` resolves an open generic service; the call must supply its instantiation")]
    OpenTarget { method: MethodId },

    #[error("factory has no dispatch entry for `{method}`")]
    NoDispatchEntry { method: MethodId },

    /// A producer failed while constructing the service.
    #[error(transparent)]
    Producer(Box<dyn std::error::Error + Send + Sync>),
}

impl ResolveError {
    /// Wrap a producer failure.
    pub fn producer(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ResolveError::Producer(err.into())
    }
}

fn describe_name(name: Option<&str>) -> String {
    name.map(|name| format!(" named `{name}`")).unwrap_or_default()
}
