//! Assembly of customization points in the standard order.

use std::any::TypeId;

use tracing::debug;

use super::engine::{no_viable_strategy, CustomizationPoint};
use super::strategies::{FreeLookup, ImplEntry, ImplTable, MemberStyle, ThroughInvoke};
use super::types::Identity;
use crate::chain::{PriorityChain, SkipSelf, Strategy, Typed};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::invoke;
use crate::probe::{FromArgs, Subject, TypeTag, Value};
use crate::registry::{Implementation, FREE_IMPLS, MEMBER_IMPLS};

fn default_invoker() -> &'static CustomizationPoint {
    &invoke::INVOKE
}

/// Builder for a [`CustomizationPoint`].
///
/// The built chain is, in order:
///
/// 1. `member`: implementations owned by the first argument's type,
/// 2. `free`: free implementations next to the point or in the scope of an
///    argument type,
/// 3. `invoke`: the call routed through the invoke protocol with the first
///    argument as customizer,
/// 4. the fallbacks, in the order they were added.
///
/// Implementations registered with [`register_member!`](crate::register_member)
/// and [`register_free!`](crate::register_free) are merged in by
/// [`PointBuilder::build`].
pub struct PointBuilder {
    identity: Identity,
    members: Vec<ImplEntry>,
    frees: Vec<ImplEntry>,
    fallbacks: Vec<Box<dyn Strategy>>,
    config: DispatchConfig,
    invoker: fn() -> &'static CustomizationPoint,
}

impl PointBuilder {
    pub(crate) fn new(identity: Identity) -> Self {
        Self {
            identity,
            members: Vec::new(),
            frees: Vec::new(),
            fallbacks: Vec::new(),
            config: DispatchConfig::default(),
            invoker: default_invoker,
        }
    }

    /// Adds an implementation owned by the first argument's type.
    pub fn member<A, R, F>(mut self, name: &'static str, f: F) -> Self
    where
        A: Subject + FromArgs,
        R: Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.members.push(entry(name, None, f));
        self
    }

    /// Adds a free implementation next to the point.
    pub fn free<A, R, F>(mut self, name: &'static str, f: F) -> Self
    where
        A: FromArgs,
        R: Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.frees.push(entry(name, None, f));
        self
    }

    /// Adds a free implementation in the scope of an argument type.
    ///
    /// `scope` must be one of the implementation's argument types; otherwise
    /// no call could ever see it and [`build`](Self::build) fails with
    /// [`DispatchError::UnreachableImplementation`].
    pub fn free_in<A, R, F>(mut self, scope: TypeTag, name: &'static str, f: F) -> Self
    where
        A: FromArgs,
        R: Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.frees.push(entry(name, Some(scope), f));
        self
    }

    /// Appends a fallback strategy.
    ///
    /// The strategy does not see the point as first argument.
    pub fn fallback<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.fallbacks.push(Box::new(SkipSelf::new(strategy)));
        self
    }

    /// Appends a typed closure as fallback.
    pub fn fallback_fn<A, R, F>(self, name: &'static str, f: F) -> Self
    where
        A: FromArgs + 'static,
        R: Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.fallback(Typed::new(name, f))
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Routes the `invoke` strategy through another invoke protocol point.
    pub fn with_invoker(mut self, invoker: fn() -> &'static CustomizationPoint) -> Self {
        self.invoker = invoker;
        self
    }

    /// Validates, gathers registered implementations and binds the identity.
    pub fn build(mut self) -> Result<CustomizationPoint, DispatchError> {
        self.config
            .validate()
            .map_err(DispatchError::InvalidConfig)?;

        let id = self.identity.id();
        let name = self.identity.name();
        self.members.extend(registered(&MEMBER_IMPLS, id));
        self.frees.extend(registered(&FREE_IMPLS, id));

        for entry in &self.frees {
            if let Some(scope) = entry.scope {
                if !entry.signature.contains(scope.id()) {
                    return Err(DispatchError::UnreachableImplementation {
                        point: name,
                        name: entry.name,
                        scope: scope.name(),
                    });
                }
            }
        }

        let members = ImplTable::build(name, "member", self.members)?;
        let frees = ImplTable::build(name, "free", self.frees)?;
        let (member_count, free_count) = (members.len(), frees.len());

        let chain = self.fallbacks.into_iter().fold(
            PriorityChain::labeled(name)
                .with_strategy(SkipSelf::new(MemberStyle::new(members)))
                .with_strategy(SkipSelf::new(FreeLookup::new(frees)))
                .with_strategy(ThroughInvoke::new(self.invoker)),
            PriorityChain::with_boxed,
        );

        let point =
            CustomizationPoint::assemble(self.identity, chain, self.config, no_viable_strategy)?;
        debug!(
            point = name,
            members = member_count,
            frees = free_count,
            "implementations gathered"
        );
        Ok(point)
    }
}

fn entry<A, R, F>(name: &'static str, scope: Option<TypeTag>, f: F) -> ImplEntry
where
    A: FromArgs,
    R: Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    ImplEntry {
        name,
        signature: A::signature(),
        scope,
        thunk: Box::new(move |args| Ok(Value::new(f(A::from_args(args)?)))),
    }
}

fn registered(
    slice: &'static [Implementation],
    point: TypeId,
) -> impl Iterator<Item = ImplEntry> {
    slice
        .iter()
        .filter(move |imp| (imp.point)() == point)
        .map(|imp| ImplEntry {
            name: imp.name,
            signature: (imp.signature)(),
            scope: imp.scope.map(|scope| scope()),
            thunk: Box::new(imp.call),
        })
}
