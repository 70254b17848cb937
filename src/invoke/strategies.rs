//! Strategies of the invoke protocol.
//!
//! Every strategy here sees `(invoke, customizer, target, args...)`.

use std::any::TypeId;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::pending::PendingCall;
use crate::chain::{Resolver, Route, Strategy};
use crate::config::DropLimit;
use crate::error::DispatchError;
use crate::point::PointRef;
use crate::probe::{ArgPack, Signature, TypeTag, Value};
use crate::registry::Override;

pub(crate) struct OverrideEntry {
    name: &'static str,
    customizer: TypeTag,
    target: TypeTag,
    handler: fn(PendingCall) -> Result<Value, DispatchError>,
}

impl From<&Override> for OverrideEntry {
    fn from(registered: &Override) -> Self {
        Self {
            name: registered.name,
            customizer: (registered.customizer)(),
            target: (registered.target)(),
            handler: registered.call,
        }
    }
}

/// Overrides keyed by customizer and target type.
pub(crate) struct OverrideLookup {
    entries: Vec<OverrideEntry>,
    index: FxHashMap<(TypeId, TypeId), usize>,
}

impl OverrideLookup {
    pub(crate) fn build(
        point: &'static str,
        entries: Vec<OverrideEntry>,
    ) -> Result<Self, DispatchError> {
        let mut index = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            let key = (entry.customizer.id(), entry.target.id());
            if index.insert(key, i).is_some() {
                return Err(DispatchError::ConflictingImplementations {
                    point,
                    kind: "override",
                    signature: Signature::new(vec![entry.customizer, entry.target]),
                });
            }
        }
        Ok(Self { entries, index })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Strategy for OverrideLookup {
    fn name(&self) -> &'static str {
        "override"
    }

    fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
        let customizer = signature.get(1)?;
        let target = signature.get(2)?;
        let &i = self.index.get(&(customizer.id(), target.id()))?;
        trace!(
            customizer = customizer.name(),
            target = target.name(),
            handler = self.entries[i].name,
            "override found"
        );
        Some(Route::Entry(i))
    }

    fn call(&self, route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
        let i = route.entry("invoke", self.name())?;
        let entry = self.entries.get(i).ok_or(DispatchError::StaleResolution {
            point: "invoke",
            strategy: self.name(),
        })?;
        let invoker = args.take::<PointRef>()?;
        let customizer = args.pop_slot();
        let target = args.pop_slot();
        let (Some(customizer), Some(target)) = (customizer, target) else {
            return Err(DispatchError::MissingSubject {
                point: invoker.name(),
            });
        };
        (entry.handler)(PendingCall::new(invoker, customizer, target, args))
    }
}

/// Calls the target point on the arguments after it, ignoring the
/// customizer.
pub(crate) struct DirectCall;

impl Strategy for DirectCall {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route> {
        let target = signature.get(2)?.as_point()?;
        let rest = signature.skip(3);
        if rest.is_empty() {
            return None;
        }
        let nested = resolver.nested()?;
        let resolution = target.probe_args(&rest, &nested)?;
        Some(Route::Forward(Box::new(resolution)))
    }

    fn call(&self, route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
        let resolution = route.forwarded("invoke", self.name())?;
        args.pop_front();
        args.pop_front();
        let target = args.take::<PointRef>()?;
        target.get().execute(resolution, args)
    }
}

/// Drops the customizer and runs the protocol again on
/// `(target, args...)`, so the target becomes the next customizer.
///
/// Only admissible while at least three explicit arguments remain, so the
/// retried call still has a customizer and a target. Each retry removes one
/// argument; [`DropLimit::Fixed`] caps the number of retries further.
pub(crate) struct DropAndRetry {
    limit: DropLimit,
}

impl DropAndRetry {
    pub(crate) fn new(limit: DropLimit) -> Self {
        Self { limit }
    }
}

impl Strategy for DropAndRetry {
    fn name(&self) -> &'static str {
        "drop_and_retry"
    }

    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route> {
        let this = signature.first()?.as_point()?;
        let explicit = signature.tail();
        if explicit.len() < 3 {
            return None;
        }
        if let DropLimit::Fixed(max) = self.limit {
            if resolver.drops() >= max {
                return None;
            }
        }
        let next = resolver.after_drop()?;
        let resolution = this.probe_args(&explicit.tail(), &next)?;
        Some(Route::Forward(Box::new(resolution)))
    }

    fn call(&self, route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
        let resolution = route.forwarded("invoke", self.name())?;
        let this = args.take::<PointRef>()?;
        args.pop_front();
        this.get().execute(resolution, args)
    }
}
