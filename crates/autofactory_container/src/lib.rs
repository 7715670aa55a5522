//! Reference service container for autofactory.
//!
//! [`ServiceContainer`] implements [`ServiceLocator`](autofactory_core::ServiceLocator)
//! over a table of producers keyed by service type and optional name, and
//! registers synthesized factories as ordinary services.

mod container;

pub use container::{ContainerError, ProducerFn, ServiceContainer};
