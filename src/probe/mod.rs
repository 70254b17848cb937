//! Capability probing.
//!
//! Everything a strategy needs to decide "am I callable with these
//! arguments?" without being run:
//!
//! - [`TypeTag`]: the identity of one argument type. Customization points
//!   passed as arguments are tagged with their own identity, so two points
//!   are as distinct as two types.
//! - [`Signature`]: an ordered list of tags, compared by `TypeId`.
//! - [`ArgPack`]: owned, type-erased arguments in call order.
//! - [`IntoArgs`] / [`FromArgs`]: conversions between tuples and packs.
//! - [`Value`]: the type-erased result of a call.

mod args;
mod signature;
mod value;

pub use args::{ArgPack, FromArgs, IntoArgs, Subject};
pub use signature::{Signature, TypeTag};
pub use value::Value;

pub(crate) use args::Slot;
