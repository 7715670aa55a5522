//! Factory instances: a synthesized type bound to one locator.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::args::Arguments;
use crate::contract::{FactoryContract, MethodId};
use crate::emit::FactoryType;
use crate::locator::{Instance, ResolveError, SharedLocator};
use crate::service::ServiceType;

/// Untyped factory instance.
///
/// Holds only the shared factory type and its locator. Cloning is cheap and
/// clones dispatch to the same locator.
#[derive(Clone)]
pub struct FactoryInstance {
    ty: Arc<FactoryType>,
    locator: SharedLocator,
}

impl FactoryInstance {
    pub fn new(ty: Arc<FactoryType>, locator: SharedLocator) -> Self {
        Self { ty, locator }
    }

    #[inline]
    pub fn factory_type(&self) -> &Arc<FactoryType> {
        &self.ty
    }

    #[inline]
    pub fn locator(&self) -> &SharedLocator {
        &self.locator
    }

    /// Dispatch one factory call to the locator.
    ///
    /// `closing` is the call's concrete service type. Open targets require it;
    /// closed targets ignore it. Locator errors are returned unchanged.
    pub fn invoke(
        &self,
        method: &MethodId,
        closing: Option<ServiceType>,
        args: Arguments,
    ) -> Result<Instance, ResolveError> {
        let entry = self
            .ty
            .method(method)
            .ok_or(ResolveError::NoDispatchEntry { method: *method })?;
        let key = entry.key();
        let service = key
            .target()
            .close(closing)
            .ok_or(ResolveError::OpenTarget { method: *method })?;

        tracing::trace!(%method, %service, name = key.name(), args = args.len(), "factory dispatch");
        self.locator.resolve(service, key.name(), args)
    }
}

impl fmt::Debug for FactoryInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryInstance")
            .field("type", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A factory implementing contract `C`.
///
/// `#[auto_factory]` implements each factory trait for `Factory<C>` whenever
/// `C` implements that trait's contract, so a `Factory<FooFactoryContract>`
/// is usable wherever an `impl FooFactory` is expected.
pub struct Factory<C> {
    instance: FactoryInstance,
    _contract: PhantomData<fn() -> C>,
}

impl<C: FactoryContract> Factory<C> {
    pub fn new(instance: FactoryInstance) -> Self {
        Self {
            instance,
            _contract: PhantomData,
        }
    }

    #[inline]
    pub fn instance(&self) -> &FactoryInstance {
        &self.instance
    }

    /// Dispatch `method` and downcast the produced instance to `R`.
    ///
    /// Called from generated method bodies.
    pub fn invoke<R: Any>(&self, method: MethodId, args: Arguments) -> Result<R, ResolveError> {
        let produced = self
            .instance
            .invoke(&method, Some(ServiceType::of::<R>()), args)?;
        produced
            .downcast::<R>()
            .map(|boxed| *boxed)
            .map_err(|_| ResolveError::UnexpectedInstance {
                expected: type_name::<R>(),
            })
    }
}

impl<C> Clone for Factory<C> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            _contract: PhantomData,
        }
    }
}

impl<C> fmt::Debug for Factory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Factory").field(&self.instance).finish()
    }
}
