//! Service container with auto-factory registration.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use autofactory_core::{
    Arguments, BuildError, Factory, FactoryBuilder, FactoryContract, FactoryInstance, FromArgs,
    Instance, IntoArguments, ResolveError, ServiceLocator, ServiceType,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A type-erased producer: builds one service from the container and call arguments.
pub type ProducerFn =
    dyn Fn(&ServiceContainer, Arguments) -> Result<Instance, ResolveError> + Send + Sync;

/// Failure to register a service.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("cannot register a factory for `{contract}`: auto factories are not enabled on this container")]
    AutoFactoriesDisabled { contract: &'static str },

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Producers registered for one service type.
#[derive(Default)]
struct ServiceEntry {
    default: Option<Arc<ProducerFn>>,
    named: FxHashMap<Box<str>, Arc<ProducerFn>>,
}

impl ServiceEntry {
    fn producer(&self, name: Option<&str>) -> Option<Arc<ProducerFn>> {
        match name {
            None => self.default.clone(),
            Some(name) => self.named.get(name).cloned(),
        }
    }
}

#[derive(Default)]
struct ContainerInner {
    registrations: DashMap<ServiceType, ServiceEntry>,
    /// Set once auto factories are enabled.
    factories: RwLock<Option<Arc<FactoryBuilder>>>,
}

/// Registers producers by service type and optional name, and resolves them.
///
/// A cheap, cloneable handle; clones share registrations. Factories created
/// through [`register_auto_factory`](Self::register_auto_factory) hold a
/// clone as their locator.
///
/// ```text
/// let container = ServiceContainer::new();
/// container.enable_auto_factories();
/// container.register(|_, (value,): (i32,)| -> Box<dyn Foo> { Box::new(Foo::new(value)) });
/// container.register_auto_factory::<FooFactoryContract>()?;
///
/// let factory: Factory<FooFactoryContract> = container.get_instance(())?;
/// let foo = factory.get_foo(42)?;
/// ```
#[derive(Clone, Default)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default producer of `T`, replacing any previous one.
    pub fn register<T, A>(
        &self,
        producer: impl Fn(&ServiceContainer, A) -> T + Send + Sync + 'static,
    ) -> &Self
    where
        T: Any + Send,
        A: FromArgs,
    {
        self.try_register(move |container, args| Ok(producer(container, args)))
    }

    /// Register a producer of `T` under `name`.
    pub fn register_named<T, A>(
        &self,
        name: impl Into<Box<str>>,
        producer: impl Fn(&ServiceContainer, A) -> T + Send + Sync + 'static,
    ) -> &Self
    where
        T: Any + Send,
        A: FromArgs,
    {
        self.try_register_named(name, move |container, args| Ok(producer(container, args)))
    }

    /// Register a fallible default producer of `T`. Its errors reach the caller unchanged.
    pub fn try_register<T, A>(
        &self,
        producer: impl Fn(&ServiceContainer, A) -> Result<T, ResolveError> + Send + Sync + 'static,
    ) -> &Self
    where
        T: Any + Send,
        A: FromArgs,
    {
        self.insert(ServiceType::of::<T>(), None, erase(producer));
        self
    }

    /// Register a fallible producer of `T` under `name`.
    pub fn try_register_named<T, A>(
        &self,
        name: impl Into<Box<str>>,
        producer: impl Fn(&ServiceContainer, A) -> Result<T, ResolveError> + Send + Sync + 'static,
    ) -> &Self
    where
        T: Any + Send,
        A: FromArgs,
    {
        self.insert(ServiceType::of::<T>(), Some(name.into()), erase(producer));
        self
    }

    fn insert(&self, service: ServiceType, name: Option<Box<str>>, producer: Arc<ProducerFn>) {
        let mut entry = self.inner.registrations.entry(service).or_default();
        let replaced = match name {
            None => entry.default.replace(producer).is_some(),
            Some(name) => {
                tracing::debug!(%service, name = &*name, "registered named producer");
                entry.named.insert(name, producer).is_some()
            }
        };
        if replaced {
            tracing::debug!(%service, "replaced existing registration");
        }
    }

    /// Whether a producer of `T` is registered under `name` (or as default).
    pub fn is_registered<T: Any>(&self, name: Option<&str>) -> bool {
        self.inner
            .registrations
            .get(&ServiceType::of::<T>())
            .is_some_and(|entry| entry.producer(name).is_some())
    }

    /// Resolve the default registration of `T`.
    pub fn get_instance<T: Any>(&self, args: impl IntoArguments) -> Result<T, ResolveError> {
        self.typed(None, args.into_arguments())
    }

    /// Resolve the registration of `T` named `name`.
    pub fn get_named_instance<T: Any>(
        &self,
        name: &str,
        args: impl IntoArguments,
    ) -> Result<T, ResolveError> {
        self.typed(Some(name), args.into_arguments())
    }

    fn typed<T: Any>(&self, name: Option<&str>, args: Arguments) -> Result<T, ResolveError> {
        self.resolve(ServiceType::of::<T>(), name, args)?
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ResolveError::UnexpectedInstance {
                expected: type_name::<T>(),
            })
    }

    /// Enable auto-factory registration with a private factory builder.
    ///
    /// Has no effect if already enabled.
    pub fn enable_auto_factories(&self) -> &Self {
        let mut factories = self.inner.factories.write();
        if factories.is_none() {
            tracing::debug!("auto factories enabled");
            *factories = Some(Arc::new(FactoryBuilder::default()));
        }
        self
    }

    /// Enable auto-factory registration with a shared builder, so several
    /// containers reuse one type cache.
    pub fn with_factory_builder(&self, builder: Arc<FactoryBuilder>) -> &Self {
        *self.inner.factories.write() = Some(builder);
        self
    }

    pub fn auto_factories_enabled(&self) -> bool {
        self.inner.factories.read().is_some()
    }

    pub fn factory_builder(&self) -> Option<Arc<FactoryBuilder>> {
        self.inner.factories.read().clone()
    }

    /// Register `Factory<C>` as a service.
    ///
    /// The factory type is synthesized here, so contract and naming errors
    /// surface at registration. Each resolution creates a new factory bound
    /// to this container.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = C::NAME))]
    pub fn register_auto_factory<C: FactoryContract>(&self) -> Result<&Self, ContainerError> {
        let builder = self
            .factory_builder()
            .ok_or(ContainerError::AutoFactoriesDisabled { contract: C::NAME })?;
        let ty = builder.factory_type::<C>()?;

        Ok(self.register(move |container: &ServiceContainer, (): ()| {
            Factory::<C>::new(FactoryInstance::new(
                Arc::clone(&ty),
                Arc::new(container.clone()),
            ))
        }))
    }
}

impl ServiceLocator for ServiceContainer {
    fn resolve(
        &self,
        service: ServiceType,
        name: Option<&str>,
        args: Arguments,
    ) -> Result<Instance, ResolveError> {
        // Clone the producer out so the map shard is not locked while it runs
        let producer = self
            .inner
            .registrations
            .get(&service)
            .and_then(|entry| entry.producer(name));
        let producer = producer.ok_or_else(|| ResolveError::Unresolved {
            service: service.name(),
            name: name.map(str::to_owned),
        })?;

        tracing::trace!(%service, name, "resolving");
        producer(self, args)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.inner.registrations.len())
            .field("auto_factories", &self.auto_factories_enabled())
            .finish()
    }
}

fn erase<T, A>(
    producer: impl Fn(&ServiceContainer, A) -> Result<T, ResolveError> + Send + Sync + 'static,
) -> Arc<ProducerFn>
where
    T: Any + Send,
    A: FromArgs,
{
    Arc::new(move |container: &ServiceContainer, args: Arguments| {
        let args = args.into_typed::<A>()?;
        producer(container, args).map(|value| Box::new(value) as Instance)
    })
}
