//! Factory-type synthesis engine.
//!
//! Turns a factory contract (a trait whose methods each produce one service)
//! into a dispatch surface that forwards every call to a [`ServiceLocator`].
//!
//! # Architecture
//!
//! ```text
//! ContractDescriptor
//!     │
//!     ▼
//! FactoryBuilder ──► ServiceNameResolver (method name → qualifying name)
//!     │
//!     ▼
//! TypeEmitter ──► FactoryType (dispatch table, cached per contract)
//!     │
//!     ▼
//! FactoryInstance / Factory<C> ──► ServiceLocator::resolve
//! ```
//!
//! The builder owns the only shared mutable state (the type cache). Factory
//! instances hold an `Arc<FactoryType>` and a locator handle, nothing else.

mod args;
mod builder;
mod contract;
mod emit;
mod instance;
mod locator;
mod naming;
mod service;

pub use args::{Arguments, FromArgs, IntoArguments};
pub use builder::{BuildError, FactoryBuilder, InvalidContractReason};
pub use contract::{
    ContractDescriptor, ContractId, ContractKind, ContractMember, FactoryContract, Implements,
    MethodId, MethodSignature, ParamType, ReturnType, TypeKind,
};
pub use emit::{
    DispatchTableEmitter, EmitError, FactoryMethod, FactoryType, FactoryTypeId, TypeEmitter,
};
pub use instance::{Factory, FactoryInstance};
pub use locator::{Instance, ResolveError, ServiceLocator, SharedLocator};
pub use naming::{
    service_short_name, ConventionResolver, NameCase, NamingError, NamingPolicy,
    ServiceNameResolver, ViolationPolicy,
};
pub use service::{ResolutionKey, ServiceTarget, ServiceType};
