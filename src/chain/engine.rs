//! First-match resolution over an ordered set of strategies.

use tracing::{debug, trace};

use super::types::{Resolver, Route, Strategy};
use crate::error::DispatchError;
use crate::probe::{ArgPack, IntoArgs, Signature, Value};

/// State of a chain resolution.
///
/// Resolution starts at `Probing(0)`. A candidate that accepts moves the
/// chain to `Resolved(i)`; one that passes moves it to `Probing(i + 1)`.
/// Running past the last candidate ends in `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbeState {
    Probing(usize),
    Resolved(usize),
    Exhausted,
}

impl ProbeState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProbeState::Probing(_))
    }
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resolution {
    point: &'static str,
    index: usize,
    strategy: &'static str,
    route: Route,
}

impl Resolution {
    /// Label of the chain that produced this resolution.
    pub fn point(&self) -> &'static str {
        self.point
    }

    /// Position of the selected candidate.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name of the selected candidate.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The innermost resolution, following forwarded routes.
    pub fn leaf(&self) -> &Resolution {
        let mut current = self;
        while let Route::Forward(next) = &current.route {
            current = next;
        }
        current
    }

    /// `point:strategy` for this resolution and every forwarded one.
    pub fn path(&self) -> Vec<String> {
        let mut path = vec![format!("{}:{}", self.point, self.strategy)];
        let mut current = self;
        while let Route::Forward(next) = &current.route {
            path.push(format!("{}:{}", next.point, next.strategy));
            current = next;
        }
        path
    }
}

/// Record of a failed resolution.
#[derive(Debug, Clone)]
pub struct Exhausted {
    /// Label of the exhausted chain.
    pub point: &'static str,
    /// The probed signature.
    pub signature: Signature,
    /// Strategy names, in probe order.
    pub considered: Vec<&'static str>,
}

impl Exhausted {
    pub fn into_error(self) -> DispatchError {
        DispatchError::NoViableStrategy {
            point: self.point,
            signature: self.signature,
            considered: self.considered,
        }
    }
}

/// Ordered candidate strategies for one operation.
///
/// # Examples
///
/// ```
/// use u_dispatch::{PriorityChain, Typed};
///
/// let chain = PriorityChain::labeled("describe")
///     .with_strategy(Typed::new("number", |(n,): (i64,)| format!("number {n}")))
///     .with_strategy(Typed::new("text", |(s,): (String,)| format!("text {s}")));
///
/// let out = chain.call((7i64,)).unwrap().take::<String>().unwrap();
/// assert_eq!(out, "number 7");
/// assert!(chain.call((1.5f64,)).is_err());
/// ```
pub struct PriorityChain {
    label: &'static str,
    strategies: Vec<Box<dyn Strategy>>,
}

impl PriorityChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::labeled("chain")
    }

    /// Creates an empty chain with a label used in diagnostics.
    pub fn labeled(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy with the lowest priority so far.
    pub fn with_strategy<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Appends an already boxed strategy.
    pub fn with_boxed(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub(crate) fn relabel(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns the number of strategies in this chain.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Returns the names of all strategies in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves a signature with a fresh [`Resolver`].
    pub fn resolve(&self, signature: &Signature) -> Result<Resolution, DispatchError> {
        self.resolve_with(signature, &Resolver::default())
            .map_err(Exhausted::into_error)
    }

    /// Runs the probe state machine.
    pub fn resolve_with(
        &self,
        signature: &Signature,
        resolver: &Resolver,
    ) -> Result<Resolution, Exhausted> {
        let mut state = ProbeState::Probing(0);
        let mut route = None;

        while let ProbeState::Probing(i) = state {
            state = match self.strategies.get(i) {
                None => ProbeState::Exhausted,
                Some(strategy) => match strategy.probe(signature, resolver) {
                    Some(accepted) => {
                        route = Some(accepted);
                        ProbeState::Resolved(i)
                    }
                    None => ProbeState::Probing(i + 1),
                },
            };
        }

        match (state, route) {
            (ProbeState::Resolved(index), Some(route)) => {
                let strategy = self.strategies[index].name();
                trace!(
                    point = self.label,
                    index,
                    strategy,
                    depth = resolver.depth(),
                    %signature,
                    "candidate accepted"
                );
                Ok(Resolution {
                    point: self.label,
                    index,
                    strategy,
                    route,
                })
            }
            _ => {
                if resolver.depth() == 0 {
                    debug!(point = self.label, %signature, "no viable strategy");
                }
                Err(Exhausted {
                    point: self.label,
                    signature: signature.clone(),
                    considered: self.strategy_names(),
                })
            }
        }
    }

    /// Runs a resolution produced by this chain.
    pub fn execute(&self, resolution: &Resolution, args: ArgPack) -> Result<Value, DispatchError> {
        let stale = || DispatchError::StaleResolution {
            point: self.label,
            strategy: resolution.strategy,
        };
        if resolution.point != self.label {
            return Err(stale());
        }
        let strategy = self.strategies.get(resolution.index).ok_or_else(stale)?;
        if strategy.name() != resolution.strategy {
            return Err(stale());
        }
        strategy.call(&resolution.route, args)
    }

    /// Resolves and runs a call.
    pub fn call<A: IntoArgs>(&self, args: A) -> Result<Value, DispatchError> {
        self.call_args(args.into_args())
    }

    /// Resolves and runs a call on an already erased argument list.
    pub fn call_args(&self, args: ArgPack) -> Result<Value, DispatchError> {
        let resolution = self.resolve(&args.signature())?;
        self.execute(&resolution, args)
    }
}

impl Default for PriorityChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PriorityChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityChain")
            .field("label", &self.label)
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Strategy, Typed};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Test strategy: accepts a fixed set of signatures and returns its own tag.
    struct Accepts {
        name: &'static str,
        tag: usize,
        signatures: Vec<Signature>,
    }

    impl Strategy for Accepts {
        fn name(&self) -> &'static str {
            self.name
        }
        fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
            self.signatures.contains(signature).then_some(Route::Direct)
        }
        fn call(&self, _route: &Route, _args: ArgPack) -> Result<Value, DispatchError> {
            Ok(Value::new(self.tag))
        }
    }

    // Test strategy: accepts everything and counts how often it is probed.
    struct Counting {
        probes: Arc<AtomicUsize>,
    }

    impl Strategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn probe(&self, _signature: &Signature, _resolver: &Resolver) -> Option<Route> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Some(Route::Direct)
        }
        fn call(&self, _route: &Route, _args: ArgPack) -> Result<Value, DispatchError> {
            Ok(Value::new("counting"))
        }
    }

    fn universe() -> Vec<Signature> {
        vec![
            Signature::of::<(u8,)>(),
            Signature::of::<(u16,)>(),
            Signature::of::<(u8, u16)>(),
            Signature::of::<(String,)>(),
            Signature::of::<(bool, u8)>(),
        ]
    }

    fn chain_from(accepted: &[Vec<usize>]) -> PriorityChain {
        let all = universe();
        accepted
            .iter()
            .enumerate()
            .fold(PriorityChain::labeled("prop"), |chain, (tag, set)| {
                chain.with_strategy(Accepts {
                    name: "accepts",
                    tag,
                    signatures: set.iter().map(|&i| all[i].clone()).collect(),
                })
            })
    }

    #[test]
    fn test_first_match_wins() {
        let chain = PriorityChain::labeled("describe")
            .with_strategy(Typed::new("u8", |(n,): (u8,)| format!("u8 {n}")))
            .with_strategy(Typed::new("u8_again", |(n,): (u8,)| format!("again {n}")))
            .with_strategy(Typed::new("text", |(s,): (String,)| s));

        let resolution = chain.resolve(&Signature::of::<(u8,)>()).unwrap();
        assert_eq!(resolution.index(), 0);
        assert_eq!(resolution.strategy(), "u8");

        let out: String = chain.call((5u8,)).unwrap().take().unwrap();
        assert_eq!(out, "u8 5");

        let out: String = chain.call((String::from("hi"),)).unwrap().take().unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn test_later_candidates_not_probed_after_success() {
        let probes = Arc::new(AtomicUsize::new(0));
        let chain = PriorityChain::new()
            .with_strategy(Typed::new("u8", |(n,): (u8,)| n))
            .with_strategy(Counting {
                probes: Arc::clone(&probes),
            });

        chain.call((1u8,)).unwrap();
        assert_eq!(probes.load(Ordering::SeqCst), 0);

        chain.call((1u16,)).unwrap();
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain = PriorityChain::labeled("empty");
        match chain.call((1u8,)) {
            Err(DispatchError::NoViableStrategy {
                point,
                signature,
                considered,
            }) => {
                assert_eq!(point, "empty");
                assert_eq!(signature, Signature::of::<(u8,)>());
                assert!(considered.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_exhaustion_lists_considered() {
        let chain = PriorityChain::labeled("strict")
            .with_strategy(Typed::new("a", |(n,): (u8,)| n))
            .with_strategy(Typed::new("b", |(n,): (u16,)| n));
        let exhausted = chain
            .resolve_with(&Signature::of::<(u32,)>(), &Resolver::default())
            .unwrap_err();
        assert_eq!(exhausted.considered, vec!["a", "b"]);
        assert_eq!(exhausted.point, "strict");
    }

    #[test]
    fn test_execute_rejects_foreign_resolution() {
        let a = PriorityChain::labeled("a").with_strategy(Typed::new("u8", |(n,): (u8,)| n));
        let b = PriorityChain::labeled("b").with_strategy(Typed::new("u8", |(n,): (u8,)| n));

        let resolution = a.resolve(&Signature::of::<(u8,)>()).unwrap();
        let result = b.execute(&resolution, (1u8,).into_args());
        assert!(matches!(result, Err(DispatchError::StaleResolution { .. })));
    }

    #[test]
    fn test_result_passes_through_unchanged() {
        let chain = PriorityChain::new().with_strategy(Typed::new("parse", |(s,): (String,)| {
            s.parse::<i32>()
        }));

        let ok: Result<i32, std::num::ParseIntError> =
            chain.call((String::from("42"),)).unwrap().take().unwrap();
        assert_eq!(ok, Ok(42));

        let failed: Result<i32, std::num::ParseIntError> =
            chain.call((String::from("x"),)).unwrap().take().unwrap();
        assert!(failed.is_err());
    }

    #[test]
    fn test_probe_state_terminal() {
        assert!(!ProbeState::Probing(0).is_terminal());
        assert!(ProbeState::Resolved(2).is_terminal());
        assert!(ProbeState::Exhausted.is_terminal());
    }

    #[test]
    fn test_path_of_direct_resolution() {
        let chain = PriorityChain::labeled("solo").with_strategy(Typed::new("u8", |(n,): (u8,)| n));
        let resolution = chain.resolve(&Signature::of::<(u8,)>()).unwrap();
        assert_eq!(resolution.path(), vec!["solo:u8".to_string()]);
        assert_eq!(resolution.leaf().strategy(), "u8");
    }

    #[test]
    fn test_labels_and_names() {
        let chain = PriorityChain::labeled("x")
            .with_strategy(Typed::new("first", |(n,): (u8,)| n))
            .with_strategy(Typed::new("second", |(n,): (u16,)| n));
        assert_eq!(chain.label(), "x");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.strategy_names(), vec!["first", "second"]);
    }

    fn accepted_sets() -> impl proptest::strategy::Strategy<Value = Vec<Vec<usize>>> {
        proptest::collection::vec(proptest::collection::vec(0..5usize, 0..4), 0..6)
    }

    proptest! {
        #[test]
        fn prop_resolved_index_is_first_accepting(sets in accepted_sets(), probe in 0..5usize) {
            let chain = chain_from(&sets);
            let signature = universe()[probe].clone();
            let expected = sets.iter().position(|set| set.contains(&probe));

            match chain.resolve(&signature) {
                Ok(resolution) => {
                    prop_assert_eq!(Some(resolution.index()), expected);
                    for earlier in &sets[..resolution.index()] {
                        prop_assert!(!earlier.contains(&probe));
                    }
                }
                Err(_) => prop_assert_eq!(expected, None),
            }
        }

        #[test]
        fn prop_append_never_changes_resolved_index(
            sets in accepted_sets(),
            extra in proptest::collection::vec(0..5usize, 0..5),
            probe in 0..5usize,
        ) {
            let signature = universe()[probe].clone();
            let before = chain_from(&sets).resolve(&signature).ok().map(|r| r.index());

            let mut extended = sets.clone();
            extended.push(extra);
            let after = chain_from(&extended).resolve(&signature).ok().map(|r| r.index());

            if let Some(index) = before {
                prop_assert_eq!(after, Some(index));
            }
        }
    }
}
