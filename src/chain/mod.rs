//! Priority chains.
//!
//! A [`PriorityChain`] holds candidate [`Strategy`] values in a fixed order
//! and resolves a call to the first one whose probe accepts the argument
//! types:
//!
//! - **First match**: candidates are probed left to right; once one accepts,
//!   no later candidate is considered.
//! - **Append-only**: a chain can only grow at the end, so a signature that
//!   resolved before an append resolves to the same candidate after it.
//! - **Resolve, then execute**: [`PriorityChain::resolve`] produces a
//!   [`Resolution`] from types alone; [`PriorityChain::execute`] runs it
//!   without probing again.

mod adapters;
mod engine;
mod types;

pub use adapters::{SkipSelf, Typed};
pub use engine::{Exhausted, PriorityChain, ProbeState, Resolution};
pub use types::{Resolver, Route, Strategy};
