//! Factory type emission.
//!
//! An emitter turns a validated contract and its resolved method descriptors
//! into a [`FactoryType`]: an immutable dispatch table from method identity to
//! resolution key. The table is the runtime half of a synthesized factory; the
//! `#[auto_factory]` macro provides the statically compiled method bodies that
//! index into it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::contract::{ContractDescriptor, ContractId, MethodId, MethodSignature, ParamType, ReturnType};
use crate::service::ResolutionKey;

/// Process-unique identity of a synthesized factory type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryTypeId(u64);

impl FactoryTypeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        // Relaxed: only uniqueness matters
        FactoryTypeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FactoryTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factory#{}", self.0)
    }
}

/// A contract method together with its precomputed resolution key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryMethod {
    id: MethodId,
    generics: Vec<&'static str>,
    params: Vec<ParamType>,
    returns: ReturnType,
    key: ResolutionKey,
}

impl FactoryMethod {
    pub fn new(id: MethodId, signature: &MethodSignature, key: ResolutionKey) -> Self {
        Self {
            id,
            generics: signature.generics().to_vec(),
            params: signature.params().to_vec(),
            returns: *signature.returns(),
            key,
        }
    }

    #[inline]
    pub fn id(&self) -> MethodId {
        self.id
    }

    #[inline]
    pub fn generics(&self) -> &[&'static str] {
        &self.generics
    }

    #[inline]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    #[inline]
    pub fn returns(&self) -> &ReturnType {
        &self.returns
    }

    #[inline]
    pub fn key(&self) -> &ResolutionKey {
        &self.key
    }
}

/// A synthesized factory type: one per contract, shared by all its instances.
///
/// Immutable after emission, so instances can dispatch concurrently without
/// coordination.
pub struct FactoryType {
    id: FactoryTypeId,
    contract: ContractId,
    name: &'static str,
    /// Declaration order.
    methods: Vec<FactoryMethod>,
    index: FxHashMap<MethodId, usize>,
}

impl FactoryType {
    #[inline]
    pub fn id(&self) -> FactoryTypeId {
        self.id
    }

    #[inline]
    pub fn contract(&self) -> ContractId {
        self.contract
    }

    /// Name of the implemented contract.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dispatch entries in declaration order.
    #[inline]
    pub fn methods(&self) -> &[FactoryMethod] {
        &self.methods
    }

    #[inline]
    pub fn method(&self, id: &MethodId) -> Option<&FactoryMethod> {
        self.index.get(id).map(|&slot| &self.methods[slot])
    }
}

impl fmt::Debug for FactoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// Failure to define a factory type. Not transient; never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("`{method}` is declared more than once")]
    DuplicateMethod { method: MethodId },
}

/// Defines factory types from resolved method descriptors.
pub trait TypeEmitter: Send + Sync {
    fn define_type(
        &self,
        contract: &ContractDescriptor,
        methods: Vec<FactoryMethod>,
    ) -> Result<FactoryType, EmitError>;
}

/// The default emitter: one dispatch entry per method.
#[derive(Clone, Copy, Debug, Default)]
pub struct DispatchTableEmitter;

impl TypeEmitter for DispatchTableEmitter {
    fn define_type(
        &self,
        contract: &ContractDescriptor,
        methods: Vec<FactoryMethod>,
    ) -> Result<FactoryType, EmitError> {
        let mut index = FxHashMap::default();
        index.reserve(methods.len());
        for (slot, method) in methods.iter().enumerate() {
            if index.insert(method.id(), slot).is_some() {
                return Err(EmitError::DuplicateMethod { method: method.id() });
            }
        }

        let ty = FactoryType {
            id: FactoryTypeId::next(),
            contract: contract.id(),
            name: contract.name(),
            methods,
            index,
        };
        tracing::debug!(factory = %ty.id, contract = ty.name, methods = ty.methods.len(), "defined factory type");
        Ok(ty)
    }
}
