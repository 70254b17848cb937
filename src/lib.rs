//! Domain-agnostic customization points.
//!
//! A customization point is a named call site whose behavior is chosen
//! among candidate strategies in a fixed priority order. The first strategy
//! that accepts the argument types wins:
//!
//! - **Probe**: argument types as [`Signature`]s, arguments as [`ArgPack`]s
//!   and results as [`Value`]s. Strategies decide from types alone whether
//!   they can take a call.
//! - **Chain**: [`PriorityChain`], an append-only list of [`Strategy`]
//!   values resolved first-match, left to right.
//! - **Point**: [`CustomizationPoint`], which passes itself as the first
//!   argument to its chain. The standard chain tries the subject's own
//!   implementation, free implementations, the invoke protocol and then
//!   fallbacks.
//! - **Invoke**: [`INVOKE`], a point called as
//!   `invoke(customizer, target, args...)` that lets a policy value
//!   intercept calls to a target.
//! - **Registry**: link-time tables through which other crates add
//!   implementations and overrides without touching the point.
//! - **Sequence**: [`FOR_EACH`](sequence::FOR_EACH), a traversal point with
//!   execution policies.
//!
//! # Resolution model
//!
//! Implementations are gathered once, when a point is first used, and the
//! point's tables are immutable afterwards. Resolution is a pure function of
//! the argument types and the chain, so concurrent calls through the same
//! point never affect one another.
//!
//! # Example
//!
//! ```
//! use u_dispatch::{customization_point, register_override};
//!
//! customization_point! {
//!     pub static LABEL: Label = "label", |point| point
//!         .fallback_fn("label_u32", |(n,): (u32,)| format!("#{n}"))
//! }
//!
//! struct Shouting;
//!
//! register_override!(Shouting => Label, fn shout(call) {
//!     let text: String = call.forward()?.take()?;
//!     Ok(u_dispatch::Value::new(text.to_uppercase() + "!"))
//! });
//!
//! assert_eq!(LABEL.call::<String, _>((7u32,)).unwrap(), "#7");
//! assert_eq!(LABEL.call::<String, _>((Shouting, 7u32)).unwrap(), "#7!");
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod invoke;
mod macros;
pub mod point;
pub mod probe;
pub mod registry;
pub mod sequence;

pub use chain::{PriorityChain, ProbeState, Resolution, Resolver, Route, SkipSelf, Strategy, Typed};
pub use config::{DispatchConfig, DropLimit};
pub use error::DispatchError;
pub use invoke::{PendingCall, INVOKE};
pub use point::{CustomizationPoint, Identity, PointBuilder, PointRef, SelfRef};
pub use probe::{ArgPack, FromArgs, IntoArgs, Signature, Subject, TypeTag, Value};

#[doc(hidden)]
pub use linkme;
