//! Service identities and resolution keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime identity of a service type, as seen by a locator.
///
/// Equality and hashing use the `TypeId` only. The name is kept for
/// diagnostics and logging.
#[derive(Clone, Copy, Debug)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// Identity of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name (from `std::any::type_name`).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The service a factory method resolves.
///
/// Non-generic methods know their service type when the factory type is
/// synthesized. Methods whose return type mentions their own generic
/// parameters stay open until each call supplies the instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceTarget {
    Closed(ServiceType),
    /// Open over the method's generic parameters, e.g. `Box<dyn Foo<T>>`.
    Open { template: &'static str },
}

impl ServiceTarget {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, ServiceTarget::Open { .. })
    }

    /// Resolve the concrete service type for one call.
    ///
    /// A closed target ignores `supplied`; an open target takes it as is.
    #[inline]
    pub fn close(&self, supplied: Option<ServiceType>) -> Option<ServiceType> {
        match self {
            ServiceTarget::Closed(service) => Some(*service),
            ServiceTarget::Open { .. } => supplied,
        }
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTarget::Closed(service) => service.fmt(f),
            ServiceTarget::Open { template } => f.write_str(template),
        }
    }
}

/// Target service plus optional qualifying name.
///
/// A key without a name addresses the default (unnamed) registration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    target: ServiceTarget,
    name: Option<Arc<str>>,
}

impl ResolutionKey {
    pub fn new(target: ServiceTarget, name: Option<String>) -> Self {
        Self {
            target,
            name: name.map(Arc::from),
        }
    }

    #[inline]
    pub fn target(&self) -> &ServiceTarget {
        &self.target
    }

    /// Qualifying name, `None` for the default registration.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (named `{name}`)", self.target),
            None => write!(f, "{} (default)", self.target),
        }
    }
}
