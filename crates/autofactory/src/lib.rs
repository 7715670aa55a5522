//! Auto-generated factories over a service locator.
//!
//! Declare a factory trait, let `#[auto_factory]` derive its contract, and a
//! [`FactoryBuilder`] synthesizes an implementation whose every method asks a
//! [`ServiceLocator`] for one service:
//!
//! ```text
//! #[auto_factory]
//! pub trait FooFactory {
//!     fn get_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
//!     fn get_another_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
//! }
//!
//! let container = ServiceContainer::new();
//! container
//!     .enable_auto_factories()
//!     .register(|_, (value,): (i32,)| -> Box<dyn Foo> { Box::new(Foo::new(value)) })
//!     .register_named("AnotherFoo", |_, (value,): (i32,)| -> Box<dyn Foo> {
//!         Box::new(AnotherFoo::new(value))
//!     });
//! container.register_auto_factory::<FooFactoryContract>()?;
//!
//! let factory: Factory<FooFactoryContract> = container.get_instance(())?;
//! factory.get_foo(42)?;          // default `Box<dyn Foo>` registration
//! factory.get_another_foo(42)?;  // registration named "AnotherFoo"
//! ```
//!
//! Method names select registrations: `get_<service>` resolves the default
//! registration of the return type, any other `get_<name>` resolves the
//! registration named `<Name>`. See [`NamingPolicy`] for other conventions.

use std::sync::Once;

pub use autofactory_container::{ContainerError, ProducerFn, ServiceContainer};
pub use autofactory_core::{
    service_short_name, Arguments, BuildError, ContractDescriptor, ContractId, ContractKind,
    ContractMember, ConventionResolver, DispatchTableEmitter, EmitError, Factory, FactoryBuilder,
    FactoryContract, FactoryInstance, FactoryMethod, FactoryType, FactoryTypeId, FromArgs,
    Implements, Instance, IntoArguments, InvalidContractReason, MethodId, MethodSignature,
    NameCase, NamingError, NamingPolicy, ParamType, ResolutionKey, ResolveError, ReturnType,
    ServiceLocator, ServiceNameResolver, ServiceTarget, ServiceType, SharedLocator, TypeEmitter,
    TypeKind, ViolationPolicy,
};
pub use autofactory_macros::auto_factory;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=autofactory_core=debug`, or `trace` to log every dispatch.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
