//! Factory builder behavior observed through generated contracts.

use std::sync::{Arc, Mutex};

use autofactory::{
    Arguments, BuildError, ContractDescriptor, ContractId, ConventionResolver, FactoryBuilder,
    FactoryContract, Instance, InvalidContractReason, MethodId, NamingError, NamingPolicy,
    ResolveError, ServiceLocator, ServiceTarget, ServiceType, ViolationPolicy,
};
use pretty_assertions::assert_eq;
use rayon::prelude::*;

use super::common::{
    CountingEmitter, DefaultFoo, Disposer, Foo, FooFactory, FooFactoryContract, GenericFoo,
    MisnamedFactory, MisnamedFactoryContract, OfficeFactoryContract, ReportFactoryContract,
    RecordsFactoryContract, SendFooFactoryContract,
};

/// Records every request and produces nothing.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(ServiceType, Option<String>, usize)>>,
}

impl ServiceLocator for Recorder {
    fn resolve(
        &self,
        service: ServiceType,
        name: Option<&str>,
        args: Arguments,
    ) -> Result<Instance, ResolveError> {
        self.calls
            .lock()
            .unwrap()
            .push((service, name.map(str::to_owned), args.len()));
        Err(ResolveError::Unresolved {
            service: service.name(),
            name: name.map(str::to_owned),
        })
    }
}

// === Caching ===

#[test]
fn repeated_requests_return_the_same_type() {
    let builder = FactoryBuilder::default();
    let first = builder.factory_type::<FooFactoryContract>().unwrap();
    let second = builder
        .get_factory_type(&FooFactoryContract::descriptor())
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builder.cached_types(), 1);
}

#[test]
fn concurrent_first_use_synthesizes_once() {
    let emitter = CountingEmitter::default();
    let builder = FactoryBuilder::new(emitter.clone(), ConventionResolver::default());

    let types: Vec<_> = (0..64)
        .into_par_iter()
        .map(|_| builder.factory_type::<FooFactoryContract>().unwrap())
        .collect();

    assert_eq!(emitter.count(), 1);
    assert!(types.iter().all(|ty| Arc::ptr_eq(ty, &types[0])));
}

#[test]
fn concurrent_use_of_distinct_contracts() {
    let emitter = CountingEmitter::default();
    let builder = FactoryBuilder::new(emitter.clone(), ConventionResolver::default());

    (0..64).into_par_iter().for_each(|i| {
        let ty = if i % 2 == 0 {
            builder.factory_type::<FooFactoryContract>()
        } else {
            builder.factory_type::<ReportFactoryContract>()
        };
        assert!(ty.is_ok());
    });

    assert_eq!(emitter.count(), 2);
    assert_eq!(builder.cached_types(), 2);
}

// === Validation ===

#[test]
fn concrete_contract_is_rejected() {
    let emitter = CountingEmitter::default();
    let builder = FactoryBuilder::new(emitter.clone(), ConventionResolver::default());

    let err = builder
        .get_factory_type(&ContractDescriptor::concrete::<DefaultFoo>("DefaultFoo"))
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::InvalidContract {
            reason: InvalidContractReason::Concrete,
            ..
        }
    ));
    assert_eq!(emitter.count(), 0);
    assert_eq!(builder.cached_types(), 0);
}

#[test]
fn naming_violation_is_reported_and_not_cached() {
    let builder = FactoryBuilder::default();

    let err = builder.factory_type::<MisnamedFactoryContract>().unwrap_err();
    match err {
        BuildError::NamingConventionViolation { method, source } => {
            assert_eq!(method, MethodId::of::<MisnamedFactoryContract>("make_foo"));
            assert_eq!(
                source,
                NamingError::MissingPrefix {
                    method: "make_foo".to_owned(),
                    prefix: "get_".to_owned(),
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!builder.is_cached(ContractId::of::<MisnamedFactoryContract>()));
}

#[test]
fn lenient_policy_names_registrations_after_the_method() {
    let builder = FactoryBuilder::with_policy(
        NamingPolicy::snake().with_violation_policy(ViolationPolicy::UseMethodName),
    );
    let recorder = Arc::new(Recorder::default());
    let factory = builder
        .build::<MisnamedFactoryContract>(Arc::clone(&recorder) as _)
        .unwrap();

    assert!(factory.make_foo(3).is_err());
    assert_eq!(
        recorder.calls.lock().unwrap().as_slice(),
        [(ServiceType::of::<Box<dyn Foo>>(), Some("MakeFoo".to_owned()), 1)]
    );
}

// === Dispatch tables ===

#[test]
fn dispatch_table_lists_methods_with_their_keys() {
    let builder = FactoryBuilder::default();
    let ty = builder.factory_type::<FooFactoryContract>().unwrap();

    let table: Vec<_> = ty
        .methods()
        .iter()
        .map(|method| {
            (
                method.id().method(),
                method.key().name(),
                method.key().target().is_open(),
            )
        })
        .collect();
    assert_eq!(
        table,
        [
            ("get_foo", None, false),
            ("get_another_foo", Some("AnotherFoo"), false),
            ("get_generic_foo", None, true),
        ]
    );
    assert_eq!(
        *ty.methods()[0].key().target(),
        ServiceTarget::Closed(ServiceType::of::<Box<dyn Foo>>())
    );
}

#[test]
fn auto_trait_bounds_are_not_service_names() {
    let builder = FactoryBuilder::default();
    let ty = builder.factory_type::<SendFooFactoryContract>().unwrap();

    let names: Vec<_> = ty.methods().iter().map(|m| m.key().name()).collect();
    assert_eq!(names, [None, Some("AnotherFoo")]);
    assert_eq!(
        *ty.methods()[0].key().target(),
        ServiceTarget::Closed(ServiceType::of::<Box<dyn Foo + Send>>())
    );
}

#[test]
fn extended_contract_methods_are_dispatched_by_their_declaring_contract() {
    let builder = FactoryBuilder::default();
    let ty = builder.factory_type::<OfficeFactoryContract>().unwrap();

    assert!(ty
        .method(&MethodId::of::<OfficeFactoryContract>("get_stapler"))
        .is_some());
    assert!(ty
        .method(&MethodId::of::<ReportFactoryContract>("get_report"))
        .is_some());
    assert_eq!(ty.methods().len(), 2);
}

#[test]
fn same_named_contracts_in_different_modules_are_distinct() {
    use super::common::{archive, reports};

    let builder = FactoryBuilder::default();
    let recorder = Arc::new(Recorder::default());
    let factory = builder
        .build::<RecordsFactoryContract>(Arc::clone(&recorder) as _)
        .unwrap();

    let ty = factory.instance().factory_type();
    assert_eq!(ty.methods().len(), 2);
    assert!(ty
        .method(&MethodId::of::<reports::LedgerFactoryContract>("get_report"))
        .is_some());
    assert!(ty
        .method(&MethodId::of::<archive::LedgerFactoryContract>("get_report"))
        .is_some());

    assert!(reports::LedgerFactory::get_report(&factory, "q1".to_owned(), 1).is_err());
    assert!(archive::LedgerFactory::get_report(&factory, "q2".to_owned(), 2).is_err());
    assert_eq!(recorder.calls.lock().unwrap().len(), 2);
}

#[test]
fn generated_methods_forward_keys_and_arguments() {
    let builder = FactoryBuilder::default();
    let recorder = Arc::new(Recorder::default());
    let factory = builder
        .build::<FooFactoryContract>(Arc::clone(&recorder) as _)
        .unwrap();

    assert!(factory.get_another_foo(42).is_err());
    assert!(factory.get_generic_foo::<Disposer>(42).is_err());

    assert_eq!(
        recorder.calls.lock().unwrap().as_slice(),
        [
            (ServiceType::of::<Box<dyn Foo>>(), Some("AnotherFoo".to_owned()), 1),
            (ServiceType::of::<Box<dyn GenericFoo<Disposer>>>(), None, 1),
        ]
    );
}

#[test]
fn dynamic_instances_dispatch_without_a_typed_surface() {
    let builder = FactoryBuilder::default();
    let recorder = Arc::new(Recorder::default());
    let instance = builder
        .build_dynamic(&FooFactoryContract::descriptor(), Arc::clone(&recorder) as _)
        .unwrap();

    let mut args = Arguments::new();
    args.push(5_i32);
    let err = instance
        .invoke(&MethodId::of::<FooFactoryContract>("get_foo"), None, args)
        .err()
        .unwrap();
    assert!(matches!(err, ResolveError::Unresolved { name: None, .. }));

    let err = instance
        .invoke(&MethodId::of::<FooFactoryContract>("get_generic_foo"), None, Arguments::new())
        .err()
        .unwrap();
    assert!(matches!(err, ResolveError::OpenTarget { .. }));
    assert_eq!(recorder.calls.lock().unwrap().len(), 1);
}
