//! The standard strategies of a customization point.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::engine::CustomizationPoint;
use crate::chain::{Resolver, Route, Strategy};
use crate::error::DispatchError;
use crate::probe::{ArgPack, Signature, TypeTag, Value};

pub(crate) type Thunk = Box<dyn Fn(ArgPack) -> Result<Value, DispatchError> + Send + Sync>;

/// One registered implementation.
pub(crate) struct ImplEntry {
    pub(crate) name: &'static str,
    pub(crate) signature: Signature,
    pub(crate) scope: Option<TypeTag>,
    pub(crate) thunk: Thunk,
}

/// Implementations of one kind, indexed by exact signature.
pub(crate) struct ImplTable {
    kind: &'static str,
    entries: Vec<ImplEntry>,
    index: FxHashMap<Signature, usize>,
}

impl ImplTable {
    /// Builds the table, rejecting two entries with the same signature.
    pub(crate) fn build(
        point: &'static str,
        kind: &'static str,
        entries: Vec<ImplEntry>,
    ) -> Result<Self, DispatchError> {
        let mut index = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.signature.clone(), i).is_some() {
                return Err(DispatchError::ConflictingImplementations {
                    point,
                    kind,
                    signature: entry.signature.clone(),
                });
            }
        }
        Ok(Self {
            kind,
            entries,
            index,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn lookup(&self, signature: &Signature) -> Option<Route> {
        let &i = self.index.get(signature)?;
        trace!(
            kind = self.kind,
            implementation = self.entries[i].name,
            "implementation found"
        );
        Some(Route::Entry(i))
    }

    fn run(&self, route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
        let i = route.entry(self.kind, self.kind)?;
        let entry = self
            .entries
            .get(i)
            .ok_or(DispatchError::StaleResolution {
                point: self.kind,
                strategy: self.kind,
            })?;
        (entry.thunk)(args)
    }
}

/// Implementations owned by the subject type.
///
/// An entry's first argument type is its owner; the entry is selected when
/// the call's argument types match its signature exactly.
pub(crate) struct MemberStyle {
    table: ImplTable,
}

impl MemberStyle {
    pub(crate) fn new(table: ImplTable) -> Self {
        Self { table }
    }
}

impl Strategy for MemberStyle {
    fn name(&self) -> &'static str {
        "member"
    }

    fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
        self.table.lookup(signature)
    }

    fn call(&self, route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
        self.table.run(route, args)
    }
}

/// Free implementations.
///
/// Unscoped entries live next to the point and are always visible. Scoped
/// entries belong to an argument type and are visible when that type is
/// among the call's arguments; the builder guarantees this holds for every
/// signature a scoped entry accepts.
pub(crate) struct FreeLookup {
    table: ImplTable,
}

impl FreeLookup {
    pub(crate) fn new(table: ImplTable) -> Self {
        Self { table }
    }
}

impl Strategy for FreeLookup {
    fn name(&self) -> &'static str {
        "free"
    }

    fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
        let route = self.table.lookup(signature)?;
        let Route::Entry(i) = route else {
            return None;
        };
        let visible = match self.table.entries[i].scope {
            None => true,
            Some(scope) => signature.contains(scope.id()),
        };
        visible.then_some(route)
    }

    fn call(&self, route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
        self.table.run(route, args)
    }
}

/// Routes `point(a1, rest...)` to `invoke(a1, point, rest...)`.
pub(crate) struct ThroughInvoke {
    invoker: fn() -> &'static CustomizationPoint,
}

impl ThroughInvoke {
    pub(crate) fn new(invoker: fn() -> &'static CustomizationPoint) -> Self {
        Self { invoker }
    }
}

impl Strategy for ThroughInvoke {
    fn name(&self) -> &'static str {
        "invoke"
    }

    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route> {
        let swapped = signature.swap_front()?;
        let nested = resolver.nested()?;
        let resolution = (self.invoker)().probe_args(&swapped, &nested)?;
        Some(Route::Forward(Box::new(resolution)))
    }

    fn call(&self, route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
        let resolution = route.forwarded("invoke", self.name())?;
        let this = args.pop_slot();
        let subject = args.pop_slot();
        let (Some(this), Some(subject)) = (this, subject) else {
            return Err(DispatchError::MissingSubject { point: self.name() });
        };
        args.push_front_slot(this);
        args.push_front_slot(subject);
        (self.invoker)().execute(resolution, args)
    }
}
