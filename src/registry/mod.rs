//! Link-time implementation tables.
//!
//! Crates add implementations to customization points they do not own by
//! placing entries in these slices, normally through
//! [`register_member!`](crate::register_member),
//! [`register_free!`](crate::register_free) and
//! [`register_override!`](crate::register_override). The slices are read
//! exactly once per point, when the point is built; after that the point's
//! tables never change.

use std::any::TypeId;

use linkme::distributed_slice;

use crate::error::DispatchError;
use crate::invoke::PendingCall;
use crate::probe::{ArgPack, Signature, TypeTag, Value};

/// A member or free implementation of some customization point.
pub struct Implementation {
    /// Tag type of the customization point.
    pub point: fn() -> TypeId,
    /// Scope type of a free implementation; `None` for the point's own
    /// scope and for members.
    pub scope: Option<fn() -> TypeTag>,
    pub name: &'static str,
    /// Argument types, without the point.
    pub signature: fn() -> Signature,
    pub call: fn(ArgPack) -> Result<Value, DispatchError>,
}

/// An invoke override for one customizer and target pair.
pub struct Override {
    pub customizer: fn() -> TypeTag,
    /// The target point, tagged as `SelfRef<Tag>`.
    pub target: fn() -> TypeTag,
    pub name: &'static str,
    pub call: fn(PendingCall) -> Result<Value, DispatchError>,
}

/// Implementations owned by their first argument's type.
#[distributed_slice]
pub static MEMBER_IMPLS: [Implementation];

/// Free implementations.
#[distributed_slice]
pub static FREE_IMPLS: [Implementation];

/// Overrides consulted by every invoke protocol point.
#[distributed_slice]
pub static INVOKE_OVERRIDES: [Override];
