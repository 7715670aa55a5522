//! Positional, type-erased call arguments.
//!
//! Generated factory methods pack their parameters into [`Arguments`] in
//! declaration order and hand them to the locator untouched. Producers on the
//! locator side unpack them with [`FromArgs`].

use std::any::{type_name, Any};
use std::fmt;

use smallvec::SmallVec;

use crate::locator::ResolveError;

type Value = Box<dyn Any + Send>;

/// Arguments forwarded from a factory call to a producer.
#[derive(Default)]
pub struct Arguments {
    values: SmallVec<[Value; 4]>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: SmallVec::with_capacity(capacity),
        }
    }

    /// Append the next positional argument.
    #[inline]
    pub fn push<T: Any + Send>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the argument at `index` holds a `T`.
    pub fn is<T: Any>(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(|value| value.is::<T>())
    }

    /// Unpack into typed values.
    #[inline]
    pub fn into_typed<A: FromArgs>(self) -> Result<A, ResolveError> {
        A::from_args(self)
    }

    fn expect_len(&self, expected: usize) -> Result<(), ResolveError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(ResolveError::ArgumentCount {
                expected,
                found: self.values.len(),
            })
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Typed view of [`Arguments`], implemented for tuples of up to six values.
pub trait FromArgs: Sized {
    fn from_args(args: Arguments) -> Result<Self, ResolveError>;
}

/// Conversion of typed values into [`Arguments`], implemented for tuples of up to six values.
pub trait IntoArguments {
    fn into_arguments(self) -> Arguments;
}

impl IntoArguments for Arguments {
    fn into_arguments(self) -> Arguments {
        self
    }
}

fn take_next<T: Any>(
    values: &mut impl Iterator<Item = (usize, Value)>,
    expected: usize,
) -> Result<T, ResolveError> {
    let (index, value) = values.next().ok_or(ResolveError::ArgumentCount {
        expected,
        found: 0,
    })?;
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ResolveError::ArgumentType {
            index,
            expected: type_name::<T>(),
        })
}

macro_rules! impl_tuple_args {
    ($len:expr; $($name:ident),*) => {
        impl<$($name: Any + Send),*> FromArgs for ($($name,)*) {
            #[allow(unused_mut, unused_variables)]
            fn from_args(args: Arguments) -> Result<Self, ResolveError> {
                args.expect_len($len)?;
                let mut values = args.values.into_iter().enumerate();
                Ok(($(take_next::<$name>(&mut values, $len)?,)*))
            }
        }

        impl<$($name: Any + Send),*> IntoArguments for ($($name,)*) {
            #[allow(non_snake_case, unused_mut)]
            fn into_arguments(self) -> Arguments {
                let ($($name,)*) = self;
                let mut args = Arguments::with_capacity($len);
                $(args.push($name);)*
                args
            }
        }
    };
}

impl_tuple_args!(0;);
impl_tuple_args!(1; A);
impl_tuple_args!(2; A, B);
impl_tuple_args!(3; A, B, C);
impl_tuple_args!(4; A, B, C, D);
impl_tuple_args!(5; A, B, C, D, E);
impl_tuple_args!(6; A, B, C, D, E, F);
