//! Factory builder: validation, key resolution, emission and the type cache.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::contract::{
    ContractDescriptor, ContractId, ContractKind, ContractMember, FactoryContract, MethodId,
    MethodSignature,
};
use crate::emit::{DispatchTableEmitter, EmitError, FactoryMethod, FactoryType, TypeEmitter};
use crate::instance::{Factory, FactoryInstance};
use crate::locator::SharedLocator;
use crate::naming::{ConventionResolver, NamingError, NamingPolicy, ServiceNameResolver};
use crate::service::ResolutionKey;

/// Why a contract cannot be implemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidContractReason {
    /// The contract is a constructible type, not a trait.
    Concrete,
    /// The contract declares something other than a factory method.
    NonMethodMember(&'static str),
}

impl fmt::Display for InvalidContractReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidContractReason::Concrete => f.write_str("it is a concrete type, not a trait"),
            InvalidContractReason::NonMethodMember(member) => {
                write!(f, "`{member}` is not a factory method")
            }
        }
    }
}

/// Failure to synthesize a factory type.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("`{contract}` cannot be used as a factory contract: {reason}")]
    InvalidContract {
        contract: &'static str,
        reason: InvalidContractReason,
    },

    #[error("factory method `{method}` does not follow the naming convention: {source}")]
    NamingConventionViolation {
        method: MethodId,
        #[source]
        source: NamingError,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Synthesized types by contract.
///
/// Published types live in `types`; readers take its read lock only. First
/// use of a contract goes through a per-contract gate in `in_flight`, so one
/// contract is synthesized at most once while other contracts proceed.
#[derive(Default)]
struct TypeCache {
    types: RwLock<FxHashMap<ContractId, Arc<FactoryType>>>,
    in_flight: Mutex<FxHashMap<ContractId, Arc<Mutex<()>>>>,
}

impl TypeCache {
    #[inline]
    fn get(&self, id: ContractId) -> Option<Arc<FactoryType>> {
        self.types.read().get(&id).cloned()
    }

    fn get_or_try_insert(
        &self,
        id: ContractId,
        synthesize: impl FnOnce() -> Result<FactoryType, BuildError>,
    ) -> Result<Arc<FactoryType>, BuildError> {
        // Fast path: already published
        if let Some(ty) = self.get(id) {
            return Ok(ty);
        }

        let gate = Arc::clone(self.in_flight.lock().entry(id).or_default());
        let _guard = gate.lock();

        // Double-check after acquiring the contract's gate
        if let Some(ty) = self.get(id) {
            return Ok(ty);
        }

        let result = synthesize().map(Arc::new);
        if let Ok(ty) = &result {
            self.types.write().insert(id, Arc::clone(ty));
        }
        self.in_flight.lock().remove(&id);
        result
    }

    fn len(&self) -> usize {
        self.types.read().len()
    }
}

/// Synthesizes and caches factory types, and binds them to locators.
///
/// Create one per application and share it; the cache lives as long as the
/// builder and is never evicted.
pub struct FactoryBuilder {
    emitter: Box<dyn TypeEmitter>,
    resolver: Box<dyn ServiceNameResolver>,
    cache: TypeCache,
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new(DispatchTableEmitter, ConventionResolver::default())
    }
}

impl FactoryBuilder {
    pub fn new(
        emitter: impl TypeEmitter + 'static,
        resolver: impl ServiceNameResolver + 'static,
    ) -> Self {
        Self {
            emitter: Box::new(emitter),
            resolver: Box::new(resolver),
            cache: TypeCache::default(),
        }
    }

    /// Default emitter, convention resolver configured by `policy`.
    pub fn with_policy(policy: NamingPolicy) -> Self {
        Self::new(DispatchTableEmitter, ConventionResolver::new(policy))
    }

    /// The factory type implementing `contract`, synthesized on first use.
    ///
    /// Repeated calls for the same contract return the same `Arc`.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = contract.name()))]
    pub fn get_factory_type(
        &self,
        contract: &ContractDescriptor,
    ) -> Result<Arc<FactoryType>, BuildError> {
        self.cache
            .get_or_try_insert(contract.id(), || self.synthesize(contract))
    }

    /// The factory type for a generated contract marker.
    pub fn factory_type<C: FactoryContract>(&self) -> Result<Arc<FactoryType>, BuildError> {
        // Probe before building the descriptor
        if let Some(ty) = self.cache.get(ContractId::of::<C>()) {
            return Ok(ty);
        }
        self.get_factory_type(&C::descriptor())
    }

    /// A factory implementing `C`, bound to `locator`.
    pub fn build<C: FactoryContract>(&self, locator: SharedLocator) -> Result<Factory<C>, BuildError> {
        let ty = self.factory_type::<C>()?;
        Ok(Factory::new(FactoryInstance::new(ty, locator)))
    }

    /// An untyped factory for `contract`, bound to `locator`.
    pub fn build_dynamic(
        &self,
        contract: &ContractDescriptor,
        locator: SharedLocator,
    ) -> Result<FactoryInstance, BuildError> {
        let ty = self.get_factory_type(contract)?;
        Ok(FactoryInstance::new(ty, locator))
    }

    pub fn is_cached(&self, contract: ContractId) -> bool {
        self.cache.get(contract).is_some()
    }

    /// Number of synthesized factory types.
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    fn synthesize(&self, contract: &ContractDescriptor) -> Result<FactoryType, BuildError> {
        tracing::debug!("factory type cache miss");
        validate(contract)?;

        let signatures = collect_methods(contract);
        let mut methods = Vec::with_capacity(signatures.len());
        for (owner, signature) in signatures {
            let id = MethodId::declared_by(owner, signature.name());
            let name = self
                .resolver
                .resolve(signature.name(), signature.returns())
                .map_err(|source| BuildError::NamingConventionViolation { method: id, source })?;
            let key = ResolutionKey::new(signature.returns().target(), name);
            tracing::trace!(method = %id, %key, "resolved factory method");
            methods.push(FactoryMethod::new(id, signature, key));
        }

        Ok(self.emitter.define_type(contract, methods)?)
    }
}

impl fmt::Debug for FactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryBuilder")
            .field("cached_types", &self.cached_types())
            .finish_non_exhaustive()
    }
}

/// Reject concrete contracts and non-method members, including on extended contracts.
fn validate(contract: &ContractDescriptor) -> Result<(), BuildError> {
    if contract.kind() == ContractKind::Concrete {
        return Err(BuildError::InvalidContract {
            contract: contract.name(),
            reason: InvalidContractReason::Concrete,
        });
    }

    if let Some(member) = contract
        .members()
        .iter()
        .find(|member| !matches!(member, ContractMember::Method(_)))
    {
        return Err(BuildError::InvalidContract {
            contract: contract.name(),
            reason: InvalidContractReason::NonMethodMember(member.name()),
        });
    }

    contract.extended().iter().try_for_each(validate)
}

/// Methods declared on `contract`, then on each extended contract, each contract visited once.
fn collect_methods(contract: &ContractDescriptor) -> Vec<(&ContractDescriptor, &MethodSignature)> {
    fn visit<'a>(
        contract: &'a ContractDescriptor,
        seen: &mut FxHashSet<ContractId>,
        out: &mut Vec<(&'a ContractDescriptor, &'a MethodSignature)>,
    ) {
        if !seen.insert(contract.id()) {
            return;
        }
        out.extend(contract.methods().map(|sig| (contract, sig)));
        for parent in contract.extended() {
            visit(parent, seen, out);
        }
    }

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    visit(contract, &mut seen, &mut out);
    out
}
