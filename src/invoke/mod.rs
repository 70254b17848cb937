//! The invoke protocol.
//!
//! [`INVOKE`] is a customization point called as
//! `invoke(customizer, target, args...)`. It lets a customizer (a policy or
//! tag value) intercept calls to a target. Its chain is:
//!
//! 1. `override`: a handler registered for the customizer's type and the
//!    target decides the call (see [`register_override!`](crate::register_override)
//!    and [`PendingCall`]).
//! 2. `direct`: the target is a customization point that accepts `args...`;
//!    the customizer is ignored.
//! 3. `drop_and_retry`: the customizer is dropped and the protocol runs
//!    again on `(target, args...)`.
//!
//! Every customization point built with the standard order routes
//! `point(a1, rest...)` through `invoke(a1, point, rest...)`, which is how a
//! policy passed as first argument gets to intercept the call.
//!
//! # Termination
//!
//! A retry needs at least three explicit arguments and removes one, so an
//! invoke call with `n` arguments drops at most `n - 2` customizers.
//! [`DropLimit::Fixed`](crate::DropLimit::Fixed) lowers that bound. If the
//! protocol is exhausted after retries were admissible, the call fails with
//! [`DispatchError::UnboundedDropRetry`].

mod pending;
mod strategies;

use std::sync::LazyLock;

use tracing::debug;

use crate::chain::{Exhausted, PriorityChain};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::point::{CustomizationPoint, Identity};
use crate::registry::INVOKE_OVERRIDES;
use strategies::{DirectCall, DropAndRetry, OverrideEntry, OverrideLookup};

pub use pending::PendingCall;

/// Identity tag of [`INVOKE`].
#[derive(Debug, Clone, Copy)]
pub struct Invoke;

/// The default invoke protocol.
pub static INVOKE: LazyLock<CustomizationPoint> = LazyLock::new(|| {
    match protocol::<Invoke>("invoke", DispatchConfig::default()) {
        Ok(point) => point,
        Err(err) => panic!("failed to build the invoke protocol: {err}"),
    }
});

/// Assembles an invoke protocol point bound to tag `T`.
///
/// All registered overrides are included. The drop-and-retry strategy
/// follows `config.drop_limit`.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use u_dispatch::{invoke, CustomizationPoint, DispatchConfig};
///
/// struct StrictInvoke;
///
/// static STRICT: LazyLock<CustomizationPoint> = LazyLock::new(|| {
///     invoke::protocol::<StrictInvoke>("strict_invoke", DispatchConfig::no_retry()).unwrap()
/// });
///
/// assert_eq!(STRICT.strategy_names(), vec!["override", "direct", "drop_and_retry"]);
/// ```
pub fn protocol<T: 'static>(
    name: &'static str,
    config: DispatchConfig,
) -> Result<CustomizationPoint, DispatchError> {
    let entries = INVOKE_OVERRIDES.iter().map(OverrideEntry::from).collect();
    let overrides = OverrideLookup::build(name, entries)?;
    let count = overrides.len();

    let chain = PriorityChain::labeled(name)
        .with_strategy(overrides)
        .with_strategy(DirectCall)
        .with_strategy(DropAndRetry::new(config.drop_limit));

    let point =
        CustomizationPoint::assemble(Identity::of::<T>(name), chain, config, drop_retry_exhausted)?;
    debug!(point = name, overrides = count, "invoke protocol assembled");
    Ok(point)
}

fn drop_retry_exhausted(exhausted: Exhausted, config: &DispatchConfig) -> DispatchError {
    let signature = exhausted.signature.tail();
    let dropped = config.drop_limit.allowed(signature.len());
    if dropped > 0 {
        DispatchError::UnboundedDropRetry { signature, dropped }
    } else {
        DispatchError::NoViableStrategy {
            point: exhausted.point,
            signature,
            considered: exhausted.considered,
        }
    }
}
