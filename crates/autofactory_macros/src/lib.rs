//! Procedural macros for autofactory.
//!
//! # `#[auto_factory]`
//!
//! Turns a trait whose methods each produce one service into a factory
//! contract that the factory builder can implement at runtime.
//!
//! ```text
//! #[auto_factory]
//! pub trait FooFactory {
//!     fn get_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
//!     fn get_another_foo(&self, value: i32) -> Result<Box<dyn Foo>, ResolveError>;
//!     fn get_generic_foo<T: Disposable + 'static>(&self, value: i32)
//!         -> Result<Box<dyn GenericFoo<T>>, ResolveError>;
//! }
//! ```
//!
//! Besides the trait itself this generates:
//!
//! - `FooFactoryContract`, an uninhabited marker implementing
//!   `FactoryContract`, whose descriptor lists the trait's methods,
//! - `impl FooFactory for Factory<C>` for every contract `C` implementing
//!   `Implements<FooFactoryContract>`; each method packs its arguments and
//!   dispatches through the factory's resolution table,
//! - `Implements` impls for the contract and each factory supertrait.
//!
//! Supertraits other than `Send`, `Sync`, `Sized` and `Unpin` must be
//! `#[auto_factory]` traits themselves. Only direct supertraits are linked,
//! so a contract extending `B: A` lists both `B` and `A`.
//!
//! The generated code refers to `::autofactory`; use the macro through that
//! crate's re-export.

mod contract;
mod expand;
mod utils;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemTrait};

/// Derive a factory contract from a trait declaration.
///
/// Rejected at compile time: generic traits, associated types and consts,
/// methods with default bodies or without `&self`, parameters that are not
/// plain identifiers or not owned, return types other than `Result<R, E>`,
/// and method type parameters without a `'static` bound.
#[proc_macro_attribute]
pub fn auto_factory(attr: TokenStream, item: TokenStream) -> TokenStream {
    if let Err(err) = contract::check_attribute(&proc_macro2::TokenStream::from(attr)) {
        return err.to_compile_error().into();
    }

    let item = parse_macro_input!(item as ItemTrait);
    match contract::parse(&item) {
        Ok(contract) => expand::expand(&item, &contract).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
