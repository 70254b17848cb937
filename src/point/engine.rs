//! Customization point runtime.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::builder::PointBuilder;
use super::types::{bind, Identity, PointRef};
use crate::chain::{Exhausted, PriorityChain, Resolution, Resolver};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::probe::{ArgPack, FromArgs, Signature, Subject, TypeTag, Value};

/// Maps an exhausted chain to the error the caller sees.
pub(crate) type ExhaustedFn = fn(Exhausted, &DispatchConfig) -> DispatchError;

/// Reports exhaustion with the caller's argument types, without the point.
pub(crate) fn no_viable_strategy(exhausted: Exhausted, _config: &DispatchConfig) -> DispatchError {
    DispatchError::NoViableStrategy {
        point: exhausted.point,
        signature: exhausted.signature.tail(),
        considered: exhausted.considered,
    }
}

/// A named, extensible call site.
///
/// Calling `point.call((a1, rest...))` runs the point's priority chain on
/// `(point, a1, rest...)`: the point always passes itself in front, so its
/// strategies can recognize which point called them. Points live for the
/// whole process and are used through `&'static` references, normally as a
/// [`LazyLock`](std::sync::LazyLock) static (see
/// [`customization_point!`](crate::customization_point)).
///
/// A signature is resolved once. Later calls with the same argument types
/// reuse the stored [`Resolution`] without probing.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use u_dispatch::CustomizationPoint;
///
/// struct Area;
/// struct Square(f64);
///
/// static AREA: LazyLock<CustomizationPoint> = LazyLock::new(|| {
///     CustomizationPoint::builder::<Area>("area")
///         .member("square_area", |(s,): (Square,)| s.0 * s.0)
///         .fallback_fn("zero", |(_,): (String,)| 0.0f64)
///         .build()
///         .unwrap()
/// });
///
/// assert_eq!(AREA.call::<f64, _>((Square(3.0),)).unwrap(), 9.0);
/// ```
pub struct CustomizationPoint {
    identity: Identity,
    chain: PriorityChain,
    config: DispatchConfig,
    on_exhausted: ExhaustedFn,
    resolved: RwLock<FxHashMap<Signature, Arc<Resolution>>>,
}

impl CustomizationPoint {
    /// Starts building a point with the standard strategy order.
    pub fn builder<T: 'static>(name: &'static str) -> PointBuilder {
        PointBuilder::new(Identity::of::<T>(name))
    }

    /// Wraps a caller-assembled chain.
    ///
    /// Strategies of `chain` see the point itself as their first argument.
    pub fn from_chain<T: 'static>(
        name: &'static str,
        chain: PriorityChain,
    ) -> Result<Self, DispatchError> {
        Self::assemble(
            Identity::of::<T>(name),
            chain,
            DispatchConfig::default(),
            no_viable_strategy,
        )
    }

    pub(crate) fn assemble(
        identity: Identity,
        chain: PriorityChain,
        config: DispatchConfig,
        on_exhausted: ExhaustedFn,
    ) -> Result<Self, DispatchError> {
        config.validate().map_err(DispatchError::InvalidConfig)?;
        bind(identity)?;
        debug!(
            point = identity.name(),
            strategies = ?chain.strategy_names(),
            "customization point bound"
        );
        Ok(Self {
            identity,
            chain: chain.relabel(identity.name()),
            config,
            on_exhausted,
            resolved: RwLock::new(FxHashMap::default()),
        })
    }

    /// Moves the point to the heap for the rest of the process.
    pub fn leak(self) -> &'static CustomizationPoint {
        Box::leak(Box::new(self))
    }

    /// Returns the point's identity.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Returns the point's name.
    pub fn name(&self) -> &'static str {
        self.identity.name()
    }

    /// Returns the point's configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Strategy names in priority order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.strategy_names()
    }

    /// The value this point passes to its strategies as first argument.
    pub fn self_ref(&'static self) -> PointRef {
        PointRef::new(self)
    }

    /// Calls the point and takes the result as an `R`.
    pub fn call<R: 'static, A: Subject>(&'static self, args: A) -> Result<R, DispatchError> {
        self.dispatch(args)?.take()
    }

    /// Calls the point and returns the erased result.
    pub fn dispatch<A: Subject>(&'static self, args: A) -> Result<Value, DispatchError> {
        self.dispatch_args(args.into_args())
    }

    /// Calls the point on an erased argument list.
    ///
    /// Fails with [`DispatchError::MissingSubject`] when `args` is empty and
    /// with [`DispatchError::DepthExceeded`] when `args` was re-entered
    /// `max_depth` times.
    pub fn dispatch_args(&'static self, args: ArgPack) -> Result<Value, DispatchError> {
        if args.is_empty() {
            return Err(DispatchError::MissingSubject { point: self.name() });
        }
        let depth = args.depth();
        if depth >= self.config.max_depth {
            return Err(DispatchError::DepthExceeded {
                point: self.name(),
                max_depth: self.config.max_depth,
            });
        }
        let resolution = self.cached(&args.signature())?;
        self.execute(&resolution, args)
    }

    /// Resolves a call with the given argument types without running it.
    pub fn resolve(&'static self, signature: &Signature) -> Result<Resolution, DispatchError> {
        self.cached(signature).map(|resolution| (*resolution).clone())
    }

    fn cached(&'static self, signature: &Signature) -> Result<Arc<Resolution>, DispatchError> {
        if let Some(hit) = self.resolved.read().get(signature) {
            return Ok(Arc::clone(hit));
        }
        let full = signature.prepend(TypeTag::point(self));
        let resolution = self
            .chain
            .resolve_with(&full, &Resolver::new(&self.config))
            .map_err(|exhausted| (self.on_exhausted)(exhausted, &self.config))?;
        let resolution = Arc::new(resolution);
        trace!(point = self.name(), %signature, "resolution stored");
        self.resolved
            .write()
            .entry(signature.clone())
            .or_insert_with(|| Arc::clone(&resolution));
        Ok(resolution)
    }

    /// Checks that a call with argument types `A` resolves.
    ///
    /// Meant for start-up code, so a missing implementation is reported
    /// before any call runs.
    pub fn verify<A: FromArgs>(&'static self) -> Result<Resolution, DispatchError> {
        self.resolve(&A::signature())
    }

    /// Probes on behalf of another strategy.
    pub(crate) fn probe_args(
        &'static self,
        signature: &Signature,
        resolver: &Resolver,
    ) -> Option<Resolution> {
        let full = signature.prepend(TypeTag::point(self));
        self.chain.resolve_with(&full, resolver).ok()
    }

    /// Runs a resolution of this point on arguments without the point.
    pub(crate) fn execute(
        &'static self,
        resolution: &Resolution,
        mut args: ArgPack,
    ) -> Result<Value, DispatchError> {
        args.push_front(self.self_ref());
        self.chain.execute(resolution, args)
    }
}

impl fmt::Debug for CustomizationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomizationPoint")
            .field("name", &self.identity.name())
            .field("strategies", &self.chain.strategy_names())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Route, Strategy, Typed};
    use crate::point::SelfRef;
    use crate::probe::IntoArgs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, LazyLock, Mutex};
    use std::thread;

    // Accepts every call with a subject and counts how often it is consulted.
    struct Counting {
        lookups: Arc<AtomicUsize>,
    }

    impl Strategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            (signature.len() >= 2).then_some(Route::Direct)
        }

        fn call(&self, _route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
            Ok(Value::new(args.len()))
        }
    }

    // Records the signature and first argument it was called with.
    struct Recorder {
        seen: Arc<Mutex<Option<(Signature, usize)>>>,
    }

    impl Strategy for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
            (signature.len() >= 2).then_some(Route::Direct)
        }

        fn call(&self, _route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
            let signature = args.signature();
            let this = args.take::<PointRef>()?;
            let address = this.get() as *const CustomizationPoint as usize;
            *self.seen.lock().unwrap() = Some((signature, address));
            Ok(Value::new(args.len()))
        }
    }

    #[test]
    fn test_self_injection() {
        struct Recording;
        let seen = Arc::new(Mutex::new(None));
        let chain = PriorityChain::new().with_strategy(Recorder {
            seen: Arc::clone(&seen),
        });
        let point = CustomizationPoint::from_chain::<Recording>("recording", chain)
            .unwrap()
            .leak();

        let rest: usize = point.call((1u8, String::from("x"))).unwrap();
        assert_eq!(rest, 2);

        let (signature, address) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(signature.len(), 3);
        assert_eq!(signature.first(), Some(&TypeTag::point(point)));
        assert_eq!(signature.tail(), Signature::of::<(u8, String)>());
        assert_eq!(address, point as *const CustomizationPoint as usize);
        assert!(point.self_ref().same(point));
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        struct Twice;
        let first = CustomizationPoint::from_chain::<Twice>("twice", PriorityChain::new());
        assert!(first.is_ok());
        let second = CustomizationPoint::from_chain::<Twice>("twice", PriorityChain::new());
        assert!(matches!(
            second,
            Err(DispatchError::DuplicateIdentity { name: "twice" })
        ));
    }

    #[test]
    fn test_invalid_config_rejected_before_binding() {
        struct BadConfig;
        let err = CustomizationPoint::builder::<BadConfig>("bad_config")
            .with_config(DispatchConfig::default().with_max_depth(0))
            .build();
        assert!(matches!(err, Err(DispatchError::InvalidConfig(_))));

        let retry = CustomizationPoint::builder::<BadConfig>("bad_config").build();
        assert!(retry.is_ok());
    }

    #[test]
    fn test_exhaustion_reports_caller_signature() {
        struct Empty;
        let point = CustomizationPoint::from_chain::<Empty>("empty", PriorityChain::new())
            .unwrap()
            .leak();
        match point.dispatch((1u8, 2u16)) {
            Err(DispatchError::NoViableStrategy {
                point, signature, ..
            }) => {
                assert_eq!(point, "empty");
                assert_eq!(signature, Signature::of::<(u8, u16)>());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_subject() {
        struct NeedsSubject;
        let point = CustomizationPoint::from_chain::<NeedsSubject>(
            "needs_subject",
            PriorityChain::new(),
        )
        .unwrap()
        .leak();
        let err = point.dispatch_args(ArgPack::new()).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingSubject {
                point: "needs_subject"
            }
        ));
    }

    #[test]
    fn test_result_type_mismatch() {
        struct Typing;
        static TYPING: LazyLock<CustomizationPoint> = LazyLock::new(|| {
            CustomizationPoint::builder::<Typing>("typing")
                .fallback_fn("to_string", |(n,): (u32,)| n.to_string())
                .build()
                .unwrap()
        });

        assert_eq!(TYPING.call::<String, _>((4u32,)).unwrap(), "4");
        let err = TYPING.call::<u32, _>((4u32,)).unwrap_err();
        assert!(matches!(err, DispatchError::ResultType { .. }));
    }

    #[test]
    fn test_resolve_without_running() {
        struct Lazy;
        static LAZY: LazyLock<CustomizationPoint> = LazyLock::new(|| {
            CustomizationPoint::builder::<Lazy>("lazy")
                .fallback_fn("panics", |(_,): (u8,)| -> u8 { panic!("must not run") })
                .build()
                .unwrap()
        });

        let resolution = LAZY.verify::<(u8,)>().unwrap();
        assert_eq!(resolution.strategy(), "panics");
        assert!(LAZY.verify::<(u16,)>().is_err());
    }

    #[test]
    fn test_typed_self_handle() {
        struct SelfAware;
        let chain = PriorityChain::new()
            .with_strategy(Typed::new("tag_value", |(_, n): (SelfAware, u8)| {
                format!("tag {n}")
            }))
            .with_strategy(Typed::new("with_self", |(me, n): (SelfRef<SelfAware>, u8)| {
                format!("{} {}", me.name(), n + 1)
            }));
        let point = CustomizationPoint::from_chain::<SelfAware>("self_aware", chain)
            .unwrap()
            .leak();

        let resolution = point.verify::<(u8,)>().unwrap();
        assert_eq!(resolution.strategy(), "with_self");
        assert_eq!(point.call::<String, _>((3u8,)).unwrap(), "self_aware 4");
    }

    #[test]
    fn test_tag_value_is_not_the_point() {
        struct Tagged;
        let chain = PriorityChain::new().with_strategy(Typed::new(
            "tag_value",
            |(_, n): (Tagged, u8)| n,
        ));
        let point = CustomizationPoint::from_chain::<Tagged>("tagged", chain)
            .unwrap()
            .leak();

        assert_ne!(TypeTag::point(point), TypeTag::of::<Tagged>());
        assert!(matches!(
            point.dispatch((1u8,)),
            Err(DispatchError::NoViableStrategy { .. })
        ));
    }

    #[test]
    fn test_repeated_calls_reuse_resolution() {
        struct Repeated;
        let lookups = Arc::new(AtomicUsize::new(0));
        let chain = PriorityChain::new().with_strategy(Counting {
            lookups: Arc::clone(&lookups),
        });
        let point = CustomizationPoint::from_chain::<Repeated>("repeated", chain)
            .unwrap()
            .leak();

        for _ in 0..5 {
            let with_self: usize = point.call((1u8, 2u16)).unwrap();
            assert_eq!(with_self, 3);
        }
        assert_eq!(lookups.load(Ordering::SeqCst), 1);

        let _: usize = point.call((1u8,)).unwrap();
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        assert!(point.verify::<(u8, u16)>().is_ok());
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentered_args_beyond_max_depth_refused() {
        struct Deep;
        let lookups = Arc::new(AtomicUsize::new(0));
        let chain = PriorityChain::new().with_strategy(Counting {
            lookups: Arc::clone(&lookups),
        });
        let point = CustomizationPoint::from_chain::<Deep>("deep", chain)
            .unwrap()
            .leak();

        let mut args = (1u8,).into_args();
        for _ in 0..point.config().max_depth {
            args.descend();
        }
        assert!(matches!(
            point.dispatch_args(args),
            Err(DispatchError::DepthExceeded {
                point: "deep",
                max_depth: 64
            })
        ));
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_use_race_builds_once() {
        crate::customization_point! {
            static RACED: Raced = "raced", |point| point
                .fallback_fn("double", |(n,): (u32,)| n * 2)
        }

        let barrier = Barrier::new(8);
        thread::scope(|scope| {
            for i in 0..8u32 {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    assert_eq!(RACED.call::<u32, _>((i,)).unwrap(), i * 2);
                });
            }
        });
        assert_eq!(RACED.name(), "raced");
    }
}
