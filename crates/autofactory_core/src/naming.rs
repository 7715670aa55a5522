//! Service name resolution from factory method names.
//!
//! The convention: a factory method is named `<prefix><Service>`. When
//! `<Service>` is the return type's own name the method resolves the default
//! registration; otherwise `<Service>` is the qualifying name.
//!
//! | method            | returns        | qualifying name |
//! |-------------------|----------------|-----------------|
//! | `get_foo`         | `Box<dyn Foo>` | none            |
//! | `get_another_foo` | `Box<dyn Foo>` | `AnotherFoo`    |
//! | `GetFoo`          | `IFoo`         | none (Pascal)   |

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::contract::{ReturnType, TypeKind};

/// Computes the qualifying name for a factory method.
///
/// Must be pure: identical inputs always produce identical outputs.
pub trait ServiceNameResolver: Send + Sync {
    fn resolve(&self, method: &str, returns: &ReturnType) -> Result<Option<String>, NamingError>;
}

/// Case style of factory method names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NameCase {
    /// `get_another_foo`; qualifying names are rendered in UpperCamelCase.
    #[default]
    Snake,
    /// `GetAnotherFoo`; qualifying names are taken verbatim.
    Pascal,
}

/// What to do with a method name that does not follow the convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViolationPolicy {
    /// Fail with [`NamingError`].
    #[default]
    Reject,
    /// Use the whole method name as the qualifying name.
    UseMethodName,
}

/// Naming convention configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NamingPolicy {
    prefix: String,
    case: NameCase,
    on_violation: ViolationPolicy,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self::snake()
    }
}

impl NamingPolicy {
    /// `get_` prefix, snake_case method names.
    pub fn snake() -> Self {
        Self {
            prefix: "get_".to_owned(),
            case: NameCase::Snake,
            on_violation: ViolationPolicy::Reject,
        }
    }

    /// `Get` prefix, PascalCase method names.
    pub fn pascal() -> Self {
        Self {
            prefix: "Get".to_owned(),
            case: NameCase::Pascal,
            on_violation: ViolationPolicy::Reject,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.on_violation = policy;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn case(&self) -> NameCase {
        self.case
    }

    pub fn violation_policy(&self) -> ViolationPolicy {
        self.on_violation
    }
}

/// A method name outside the naming convention.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("`{method}` does not start with `{prefix}`")]
    MissingPrefix { method: String, prefix: String },

    #[error("`{method}` names no service after the `{prefix}` prefix")]
    EmptyRemainder { method: String, prefix: String },

    #[error("`{method}`: `{remainder}` must start with an uppercase letter")]
    LowercaseRemainder { method: String, remainder: String },
}

/// Name of the service a return type stands for.
///
/// Abstractions drop a leading `I` marker (`IFoo` → `Foo`); concrete types
/// keep their name (`Image` stays `Image`).
pub fn service_short_name(name: &str, kind: TypeKind) -> &str {
    if kind == TypeKind::Abstraction {
        if let Some(rest) = name.strip_prefix('I') {
            if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return rest;
            }
        }
    }
    name
}

/// The default resolver, driven by a [`NamingPolicy`].
#[derive(Clone, Debug, Default)]
pub struct ConventionResolver {
    policy: NamingPolicy,
}

impl ConventionResolver {
    pub fn new(policy: NamingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    fn remainder<'m>(&self, method: &'m str) -> Result<&'m str, NamingError> {
        let prefix = self.policy.prefix.as_str();
        let remainder = method
            .strip_prefix(prefix)
            .ok_or_else(|| NamingError::MissingPrefix {
                method: method.to_owned(),
                prefix: prefix.to_owned(),
            })?;

        if remainder.is_empty() {
            return Err(NamingError::EmptyRemainder {
                method: method.to_owned(),
                prefix: prefix.to_owned(),
            });
        }

        // `Getaway` is not `Get` + `away`
        if self.policy.case == NameCase::Pascal
            && !remainder.starts_with(|c: char| c.is_uppercase())
        {
            return Err(NamingError::LowercaseRemainder {
                method: method.to_owned(),
                remainder: remainder.to_owned(),
            });
        }

        Ok(remainder)
    }

    /// Whether `remainder` spells the return type's name, with or without the
    /// abstraction marker (`IOHandler` is both `io_handler` and `o_handler`).
    fn names_return_type(&self, remainder: &str, returns: &ReturnType) -> bool {
        let full = returns.short_name();
        let service = service_short_name(full, returns.kind());
        [full, service].into_iter().any(|name| match self.policy.case {
            NameCase::Snake => remainder == name.to_snake_case(),
            NameCase::Pascal => remainder == name,
        })
    }

    fn render(&self, name: &str) -> String {
        match self.policy.case {
            NameCase::Snake => name.to_upper_camel_case(),
            NameCase::Pascal => name.to_owned(),
        }
    }
}

impl ServiceNameResolver for ConventionResolver {
    fn resolve(&self, method: &str, returns: &ReturnType) -> Result<Option<String>, NamingError> {
        match self.remainder(method) {
            Ok(remainder) if self.names_return_type(remainder, returns) => Ok(None),
            Ok(remainder) => Ok(Some(self.render(remainder))),
            Err(err) => match self.policy.on_violation {
                ViolationPolicy::Reject => Err(err),
                ViolationPolicy::UseMethodName => Ok(Some(self.render(method))),
            },
        }
    }
}
