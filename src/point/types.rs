//! Identities and self-references of customization points.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::LazyLock;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::engine::CustomizationPoint;
use crate::error::DispatchError;
use crate::probe::Value;

/// The identity of a customization point.
///
/// Backed by a tag type: two points are the same point exactly when their
/// tags are the same type. The name only appears in diagnostics.
///
/// When the point itself is an argument it is dispatched on as
/// [`SelfRef<Tag>`], never as `Tag`, so a plain value of the tag type is not
/// mistaken for the point.
#[derive(Clone, Copy)]
pub struct Identity {
    id: TypeId,
    arg_id: TypeId,
    name: &'static str,
    self_handle: fn(PointRef) -> Value,
}

impl Identity {
    /// Creates the identity of a point tagged by `T`.
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            arg_id: TypeId::of::<SelfRef<T>>(),
            name,
            self_handle: |point| Value::new(SelfRef::<T>::new(point)),
        }
    }

    /// Returns the `TypeId` of the tag type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the `TypeId` the point has as an argument.
    pub fn arg_id(&self) -> TypeId {
        self.arg_id
    }

    /// Returns the diagnostic name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wraps `point` as this identity's [`SelfRef`].
    pub(crate) fn self_handle(&self, point: PointRef) -> Value {
        (self.self_handle)(point)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Identity {}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.name)
    }
}

static BOUND: LazyLock<Mutex<FxHashSet<TypeId>>> = LazyLock::new(Default::default);

/// Claims `identity` for the rest of the process.
pub(crate) fn bind(identity: Identity) -> Result<(), DispatchError> {
    let mut bound = BOUND.lock();
    if bound.insert(identity.id) {
        Ok(())
    } else {
        Err(DispatchError::DuplicateIdentity {
            name: identity.name,
        })
    }
}

/// A customization point passed as an argument.
///
/// This is what strategies receive as the implicit first argument of every
/// call through a point, and what the invoke protocol receives as target.
/// In a [`Signature`](crate::Signature) it is tagged with the point's
/// identity rather than with `PointRef` itself.
#[derive(Clone, Copy)]
pub struct PointRef(&'static CustomizationPoint);

impl PointRef {
    /// Creates a reference to `point`.
    pub fn new(point: &'static CustomizationPoint) -> Self {
        Self(point)
    }

    /// Returns the referenced point.
    pub fn get(&self) -> &'static CustomizationPoint {
        self.0
    }

    /// Returns the point's name.
    pub fn name(&self) -> &'static str {
        self.0.identity().name()
    }

    /// Whether both refer to the same point instance.
    pub fn same(&self, other: &CustomizationPoint) -> bool {
        std::ptr::eq(self.0, other)
    }
}

impl Deref for PointRef {
    type Target = CustomizationPoint;

    fn deref(&self) -> &CustomizationPoint {
        self.0
    }
}

impl fmt::Debug for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointRef({})", self.name())
    }
}

/// Typed access to the calling point.
///
/// A strategy that declares `SelfRef<Tag>` as an argument type accepts the
/// point tagged by `Tag` in that position, for example the implicit first
/// argument of a chain built with
/// [`CustomizationPoint::from_chain`]. A handle is only ever produced by
/// dispatch; to pass the point on to another call, use [`SelfRef::point`].
pub struct SelfRef<T> {
    point: PointRef,
    _tag: PhantomData<fn() -> T>,
}

impl<T> SelfRef<T> {
    pub(crate) fn new(point: PointRef) -> Self {
        Self {
            point,
            _tag: PhantomData,
        }
    }

    /// Returns the point as a plain argument value.
    pub fn point(&self) -> PointRef {
        self.point
    }
}

impl<T> Clone for SelfRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SelfRef<T> {}

impl<T> Deref for SelfRef<T> {
    type Target = CustomizationPoint;

    fn deref(&self) -> &CustomizationPoint {
        self.point.get()
    }
}

impl<T> fmt::Debug for SelfRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SelfRef({})", self.point.name())
    }
}
