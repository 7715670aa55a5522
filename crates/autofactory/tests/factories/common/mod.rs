//! Shared services, factory contracts and registrations.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use autofactory::{
    auto_factory, ContractDescriptor, DispatchTableEmitter, EmitError, FactoryMethod,
    FactoryType, ResolveError, ServiceContainer, TypeEmitter,
};

// === Services ===

pub trait Foo: Send {
    fn value(&self) -> i32;
    fn kind(&self) -> &'static str;
}

#[derive(Debug)]
pub struct DefaultFoo {
    pub value: i32,
}

impl Foo for DefaultFoo {
    fn value(&self) -> i32 {
        self.value
    }

    fn kind(&self) -> &'static str {
        "DefaultFoo"
    }
}

#[derive(Debug)]
pub struct AnotherFoo {
    pub value: i32,
}

impl Foo for AnotherFoo {
    fn value(&self) -> i32 {
        self.value
    }

    fn kind(&self) -> &'static str {
        "AnotherFoo"
    }
}

pub trait Disposable: Send + 'static {
    const NAME: &'static str;
}

pub struct Disposer;

impl Disposable for Disposer {
    const NAME: &'static str = "Disposer";
}

pub struct Recycler;

impl Disposable for Recycler {
    const NAME: &'static str = "Recycler";
}

pub trait GenericFoo<T>: Send {
    fn value(&self) -> i32;
    fn argument(&self) -> &'static str;
}

pub struct FooOf<T> {
    value: i32,
    _argument: PhantomData<fn() -> T>,
}

impl<T> FooOf<T> {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            _argument: PhantomData,
        }
    }
}

impl<T: Disposable> GenericFoo<T> for FooOf<T> {
    fn value(&self) -> i32 {
        self.value
    }

    fn argument(&self) -> &'static str {
        T::NAME
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub pages: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Stapler;

/// Never registered.
#[derive(Debug)]
pub struct Clock;

// === Contracts ===

#[auto_factory]
pub trait FooFactory {
    fn get_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
    fn get_another_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
    fn get_generic_foo<T: Disposable + 'static>(
        &self,
        value: i32,
    ) -> Result<Box<dyn GenericFoo<T>>, ResolveError>;
}

/// Factory methods returning concrete types.
#[auto_factory]
pub trait ConcreteFooFactory {
    fn get_default_foo(&self, value: i32) -> Result<DefaultFoo, ResolveError>;
    fn get_another_foo(&self, value: i32) -> Result<AnotherFoo, ResolveError>;
}

/// Trait objects with auto-trait bounds in any position.
#[auto_factory]
pub trait SendFooFactory {
    fn get_foo(&self, value: i32) -> Result<Box<dyn Send + Foo>, ResolveError>;
    fn get_another_foo(&self, value: i32) -> Result<Box<dyn Send + Sync + Foo>, ResolveError>;
}

#[auto_factory]
pub trait ReportFactory {
    fn get_report(&self, title: String, pages: u32) -> Result<Report, ResolveError>;
}

#[auto_factory]
pub trait OfficeFactory: ReportFactory + Send + Sync {
    fn get_stapler(&self) -> Result<Stapler, ResolveError>;
}

/// Two contracts named `LedgerFactory`, told apart by module.
pub mod reports {
    use super::{auto_factory, Report, ResolveError};

    #[auto_factory]
    pub trait LedgerFactory {
        fn get_report(&self, title: String, pages: u32) -> Result<Report, ResolveError>;
    }
}

pub mod archive {
    use super::{auto_factory, Report, ResolveError};

    #[auto_factory]
    pub trait LedgerFactory {
        fn get_report(&self, title: String, pages: u32) -> Result<Report, ResolveError>;
    }
}

#[auto_factory]
pub trait RecordsFactory: reports::LedgerFactory + archive::LedgerFactory {}

/// A method outside the naming convention; compiles, but the builder rejects it.
#[auto_factory]
pub trait MisnamedFactory {
    fn make_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
}

#[derive(Debug)]
pub enum AppError {
    Missing(ResolveError),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        AppError::Missing(err)
    }
}

/// Factory methods with an application error type.
#[auto_factory]
pub trait ClockFactory {
    fn get_clock(&self) -> Result<Clock, AppError>;
}

// === Registrations ===

/// The registrations every dispatch test starts from.
pub fn container() -> ServiceContainer {
    let container = ServiceContainer::new();
    container
        .enable_auto_factories()
        .register(|_, (value,): (i32,)| -> Box<dyn Foo> { Box::new(DefaultFoo { value }) })
        .register_named("AnotherFoo", |_, (value,): (i32,)| -> Box<dyn Foo> {
            Box::new(AnotherFoo { value })
        })
        .register(|_, (value,): (i32,)| -> Box<dyn Foo + Send> {
            Box::new(DefaultFoo { value })
        })
        .register_named("AnotherFoo", |_, (value,): (i32,)| -> Box<dyn Foo + Send + Sync> {
            Box::new(AnotherFoo { value })
        })
        .register(|_, (value,): (i32,)| DefaultFoo { value })
        .register(|_, (value,): (i32,)| AnotherFoo { value })
        .register(|_, (title, pages): (String, u32)| Report { title, pages })
        .register(|_, (): ()| Stapler);
    register_generic_foo::<Disposer>(&container);
    register_generic_foo::<Recycler>(&container);
    container
}

/// Open-generic registrations are made once per instantiation.
pub fn register_generic_foo<T: Disposable>(container: &ServiceContainer) {
    container.register(|_, (value,): (i32,)| -> Box<dyn GenericFoo<T>> {
        Box::new(FooOf::<T>::new(value))
    });
}

// === Emitters ===

/// Counts type definitions, delegating to the default emitter.
#[derive(Clone, Default)]
pub struct CountingEmitter(Arc<AtomicUsize>);

impl CountingEmitter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl TypeEmitter for CountingEmitter {
    fn define_type(
        &self,
        contract: &ContractDescriptor,
        methods: Vec<FactoryMethod>,
    ) -> Result<FactoryType, EmitError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        DispatchTableEmitter.define_type(contract, methods)
    }
}
