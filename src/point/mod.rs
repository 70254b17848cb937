//! Customization points.
//!
//! A [`CustomizationPoint`] is a named call site that passes itself as the
//! first argument to a [`PriorityChain`](crate::PriorityChain). The standard
//! chain built by [`PointBuilder`] tries, in order, the subject type's own
//! implementation, free implementations visible from the point or from the
//! argument types, the invoke protocol keyed by the first argument, and
//! finally the supplied fallbacks.
//!
//! # Identity
//!
//! Every point is identified by a tag type. Only one point per tag can be
//! built in a process; the tag is also the type under which the point
//! appears, wrapped as [`SelfRef<Tag>`](SelfRef), when it is itself passed
//! as an argument.

mod builder;
mod engine;
mod strategies;
mod types;

pub use builder::PointBuilder;
pub use engine::CustomizationPoint;
pub use types::{Identity, PointRef, SelfRef};
