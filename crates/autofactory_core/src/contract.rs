//! Factory contract descriptions.
//!
//! A contract is described at runtime by a [`ContractDescriptor`]: its
//! identity, whether it is a trait, its members and the contracts it
//! extends. `#[auto_factory]` generates descriptors from trait declarations;
//! they can also be assembled by hand.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::service::{ServiceTarget, ServiceType};

/// Identity of a factory contract. Keys the builder's type cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContractId(TypeId);

impl ContractId {
    #[inline]
    pub fn of<C: ?Sized + 'static>() -> Self {
        ContractId(TypeId::of::<C>())
    }
}

/// Whether a contract is an abstraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Trait,
    /// A constructible type. Never a valid factory contract.
    Concrete,
}

/// Whether a return type is an abstraction (`dyn Trait`) or a concrete type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Abstraction,
    Concrete,
}

/// Identity of a contract method: declaring contract plus method name.
///
/// Equality and hashing use the contract's [`ContractId`], so two contracts
/// with the same trait name in different modules never share methods. The
/// contract name is kept for display.
#[derive(Clone, Copy, Debug)]
pub struct MethodId {
    contract: ContractId,
    contract_name: &'static str,
    method: &'static str,
}

impl MethodId {
    #[inline]
    pub fn new(contract: ContractId, contract_name: &'static str, method: &'static str) -> Self {
        Self {
            contract,
            contract_name,
            method,
        }
    }

    /// A method declared by the contract marker `C`.
    #[inline]
    pub fn of<C: FactoryContract>(method: &'static str) -> Self {
        Self::new(ContractId::of::<C>(), C::NAME, method)
    }

    /// A method declared by `contract`.
    #[inline]
    pub fn declared_by(contract: &ContractDescriptor, method: &'static str) -> Self {
        Self::new(contract.id(), contract.name(), method)
    }

    #[inline]
    pub fn contract(&self) -> ContractId {
        self.contract
    }

    #[inline]
    pub fn contract_name(&self) -> &'static str {
        self.contract_name
    }

    #[inline]
    pub fn method(&self) -> &'static str {
        self.method
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.contract == other.contract && self.method == other.method
    }
}

impl Eq for MethodId {}

impl Hash for MethodId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract.hash(state);
        self.method.hash(state);
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.contract_name, self.method)
    }
}

/// A parameter type, recorded by its source rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamType(&'static str);

impl ParamType {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// Declared return type of a factory method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReturnType {
    /// Unqualified name of the produced service (`Foo` for `Box<dyn Foo>`).
    short_name: &'static str,
    kind: TypeKind,
    target: ServiceTarget,
}

impl ReturnType {
    /// A return type known without any call-site information.
    pub fn closed<R: ?Sized + 'static>(short_name: &'static str, kind: TypeKind) -> Self {
        Self {
            short_name,
            kind,
            target: ServiceTarget::Closed(ServiceType::of::<R>()),
        }
    }

    /// A return type built from the method's own generic parameters.
    pub fn open(short_name: &'static str, kind: TypeKind, template: &'static str) -> Self {
        Self {
            short_name,
            kind,
            target: ServiceTarget::Open { template },
        }
    }

    #[inline]
    pub fn short_name(&self) -> &'static str {
        self.short_name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn target(&self) -> ServiceTarget {
        self.target
    }
}

/// Signature of one contract method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    name: &'static str,
    generics: Vec<&'static str>,
    params: Vec<ParamType>,
    returns: ReturnType,
}

impl MethodSignature {
    pub fn new(name: &'static str, returns: ReturnType) -> Self {
        Self {
            name,
            generics: Vec::new(),
            params: Vec::new(),
            returns,
        }
    }

    /// Add a generic type parameter.
    #[must_use]
    pub fn generic(mut self, name: &'static str) -> Self {
        self.generics.push(name);
        self
    }

    /// Add the next positional parameter.
    #[must_use]
    pub fn param(mut self, ty: &'static str) -> Self {
        self.params.push(ParamType(ty));
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
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
}

/// A member declared by a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractMember {
    Method(MethodSignature),
    AssociatedType(&'static str),
    AssociatedConst(&'static str),
}

impl ContractMember {
    /// Name of the member as declared.
    pub fn name(&self) -> &'static str {
        match self {
            ContractMember::Method(sig) => sig.name(),
            ContractMember::AssociatedType(name) | ContractMember::AssociatedConst(name) => *name,
        }
    }
}

/// Runtime description of a factory contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractDescriptor {
    id: ContractId,
    name: &'static str,
    kind: ContractKind,
    members: Vec<ContractMember>,
    extends: Vec<ContractDescriptor>,
}

impl ContractDescriptor {
    /// Describe a trait contract identified by `C`.
    pub fn for_trait<C: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(ContractId::of::<C>(), name, ContractKind::Trait)
    }

    /// Describe a concrete type. Builders reject such contracts.
    pub fn concrete<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(ContractId::of::<T>(), name, ContractKind::Concrete)
    }

    fn with_kind(id: ContractId, name: &'static str, kind: ContractKind) -> Self {
        Self {
            id,
            name,
            kind,
            members: Vec::new(),
            extends: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(self, signature: MethodSignature) -> Self {
        self.member(ContractMember::Method(signature))
    }

    #[must_use]
    pub fn member(mut self, member: ContractMember) -> Self {
        self.members.push(member);
        self
    }

    /// Record a contract this one extends. Its methods are dispatched too.
    #[must_use]
    pub fn extends(mut self, parent: ContractDescriptor) -> Self {
        self.extends.push(parent);
        self
    }

    #[inline]
    pub fn id(&self) -> ContractId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    #[inline]
    pub fn members(&self) -> &[ContractMember] {
        &self.members
    }

    #[inline]
    pub fn extended(&self) -> &[ContractDescriptor] {
        &self.extends
    }

    /// Methods declared directly on this contract.
    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.members.iter().filter_map(|member| match member {
            ContractMember::Method(sig) => Some(sig),
            _ => None,
        })
    }
}

/// A contract marker type, generated by `#[auto_factory]` for each factory trait.
pub trait FactoryContract: 'static {
    /// Name of the described trait.
    const NAME: &'static str;

    fn descriptor() -> ContractDescriptor;
}

/// `Self` is a contract that is, or extends, `C`.
///
/// Bounds the generated trait impls on [`Factory`](crate::Factory) so a
/// factory only exposes the contracts its dispatch table covers.
pub trait Implements<C: FactoryContract> {}
