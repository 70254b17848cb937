//! Owned, type-erased argument lists.

use std::any::{Any, TypeId};
use std::collections::VecDeque;

use super::signature::{Signature, TypeTag};
use super::value::Value;
use crate::error::DispatchError;
use crate::point::PointRef;

/// One argument and the tag it is dispatched on.
pub(crate) struct Slot {
    pub(crate) tag: TypeTag,
    pub(crate) value: Value,
}

/// Arguments of a pending call, in order.
///
/// Built from a tuple through [`IntoArgs`] and turned back into one through
/// [`FromArgs`]. Strategies that rewrite a call (forwarding, dropping the
/// customizer) pop and push whole arguments without knowing their types.
///
/// A pack also records how many times dispatch was re-entered from inside
/// an override to produce it; points refuse packs deeper than their
/// configured `max_depth`.
#[derive(Default)]
pub struct ArgPack {
    slots: VecDeque<Slot>,
    depth: usize,
}

impl ArgPack {
    /// Creates an empty pack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the pack holds no arguments.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the re-entry depth of this pack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Marks the pack as one re-entry deeper.
    pub(crate) fn descend(&mut self) {
        self.depth += 1;
    }

    /// Argument types, in order.
    pub fn signature(&self) -> Signature {
        Signature::new(self.slots.iter().map(|slot| slot.tag).collect())
    }

    /// Appends an argument.
    pub fn push<T: Send + 'static>(&mut self, value: T) {
        let slot = Self::slot(value);
        self.slots.push_back(slot);
    }

    /// Inserts an argument in front.
    pub fn push_front<T: Send + 'static>(&mut self, value: T) {
        let slot = Self::slot(value);
        self.slots.push_front(slot);
    }

    /// Removes the first argument.
    pub fn pop_front(&mut self) -> Option<Value> {
        self.slots.pop_front().map(|slot| slot.value)
    }

    /// Removes the first argument as a `T`.
    ///
    /// A point argument can be taken as [`PointRef`] or as its
    /// [`SelfRef`](crate::SelfRef). On a type mismatch the argument is
    /// consumed and the error names both types.
    pub fn take<T: 'static>(&mut self) -> Result<T, DispatchError> {
        let expected = Signature::new(vec![TypeTag::of::<T>()]);
        let Some(slot) = self.slots.pop_front() else {
            return Err(DispatchError::ArgumentMismatch {
                expected,
                found: Signature::default(),
            });
        };
        let tag = slot.tag;
        let value = match tag.as_point() {
            Some(point) if tag.id() == TypeId::of::<T>() => {
                point.identity().self_handle(PointRef::new(point))
            }
            _ => slot.value,
        };
        value
            .downcast::<T>()
            .map_err(|_| DispatchError::ArgumentMismatch {
                expected,
                found: Signature::new(vec![tag]),
            })
    }

    /// Appends all arguments of `other`.
    pub fn append(&mut self, mut other: ArgPack) {
        self.slots.append(&mut other.slots);
    }

    pub(crate) fn pop_slot(&mut self) -> Option<Slot> {
        self.slots.pop_front()
    }

    pub(crate) fn push_front_slot(&mut self, slot: Slot) {
        self.slots.push_front(slot);
    }

    fn slot<T: Send + 'static>(value: T) -> Slot {
        let tag = match (&value as &dyn Any).downcast_ref::<PointRef>() {
            Some(point) => TypeTag::point(point.get()),
            None => TypeTag::of::<T>(),
        };
        Slot {
            tag,
            value: Value::new(value),
        }
    }
}

impl std::fmt::Debug for ArgPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArgPack{}", self.signature())
    }
}

/// Conversion of a tuple into an [`ArgPack`].
pub trait IntoArgs {
    fn into_args(self) -> ArgPack;
}

impl IntoArgs for ArgPack {
    fn into_args(self) -> ArgPack {
        self
    }
}

/// Reconstruction of a tuple from an [`ArgPack`].
pub trait FromArgs: Sized {
    /// Declared argument types.
    fn signature() -> Signature;

    /// Takes the arguments back out, failing if their types differ from
    /// [`FromArgs::signature`].
    fn from_args(args: ArgPack) -> Result<Self, DispatchError>;
}

/// Non-empty argument tuples: the first element is the subject a
/// customization point dispatches on.
pub trait Subject: IntoArgs {}

macro_rules! impl_args {
    ($($name:ident),*) => {
        impl<$($name: Send + 'static),*> IntoArgs for ($($name,)*) {
            #[allow(non_snake_case, unused_mut)]
            fn into_args(self) -> ArgPack {
                let ($($name,)*) = self;
                let mut pack = ArgPack::new();
                $(pack.push($name);)*
                pack
            }
        }

        impl<$($name: Send + 'static),*> FromArgs for ($($name,)*) {
            fn signature() -> Signature {
                Signature::new(vec![$(TypeTag::of::<$name>()),*])
            }

            #[allow(non_snake_case, unused_mut)]
            fn from_args(mut args: ArgPack) -> Result<Self, DispatchError> {
                let expected = Self::signature();
                let found = args.signature();
                if expected != found {
                    return Err(DispatchError::ArgumentMismatch { expected, found });
                }
                $(let $name = args.take::<$name>()?;)*
                Ok(($($name,)*))
            }
        }
    };
}

macro_rules! impl_subject {
    ($($name:ident),+) => {
        impl<$($name: Send + 'static),+> Subject for ($($name,)+) {}
    };
}

impl_args!();
impl_args!(A);
impl_args!(A, B);
impl_args!(A, B, C);
impl_args!(A, B, C, D);
impl_args!(A, B, C, D, E);
impl_args!(A, B, C, D, E, F);
impl_args!(A, B, C, D, E, F, G);
impl_args!(A, B, C, D, E, F, G, H);

impl_subject!(A);
impl_subject!(A, B);
impl_subject!(A, B, C);
impl_subject!(A, B, C, D);
impl_subject!(A, B, C, D, E);
impl_subject!(A, B, C, D, E, F);
impl_subject!(A, B, C, D, E, F, G);
impl_subject!(A, B, C, D, E, F, G, H);
