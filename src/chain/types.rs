//! Core trait for dispatch strategies.

use super::engine::Resolution;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::probe::{ArgPack, Signature, Value};

/// One candidate implementation of an operation.
///
/// A strategy is split into a pure capability probe and the call itself.
/// The probe looks at argument *types* only and must not have effects; the
/// chain may probe a strategy many times and never call it.
///
/// # Examples
///
/// ```
/// use u_dispatch::{ArgPack, DispatchError, Resolver, Route, Signature, Strategy, Value};
///
/// /// Accepts any single argument and reports its type name.
/// struct DescribeAny;
///
/// impl Strategy for DescribeAny {
///     fn name(&self) -> &'static str {
///         "describe_any"
///     }
///
///     fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
///         (signature.len() == 1).then_some(Route::Direct)
///     }
///
///     fn call(&self, _route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
///         Ok(Value::new(args.signature().to_string()))
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &'static str;

    /// Decides whether this strategy can take arguments of these types.
    ///
    /// Returns how the call will be carried out, or `None` to pass.
    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route>;

    /// Performs the call along a route this strategy's probe returned.
    fn call(&self, route: &Route, args: ArgPack) -> Result<Value, DispatchError>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route> {
        (**self).probe(signature, resolver)
    }

    fn call(&self, route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
        (**self).call(route, args)
    }
}

/// How an accepted call is carried out.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Route {
    /// The strategy runs its own body.
    Direct,

    /// The strategy runs entry `n` of a table it owns.
    Entry(usize),

    /// The strategy rewrites the arguments and hands them to another
    /// customization point, whose resolution is already decided.
    Forward(Box<Resolution>),
}

impl Route {
    /// The forwarded resolution, or a stale-route error naming `strategy`.
    pub fn forwarded(
        &self,
        point: &'static str,
        strategy: &'static str,
    ) -> Result<&Resolution, DispatchError> {
        match self {
            Route::Forward(resolution) => Ok(resolution),
            _ => Err(DispatchError::StaleResolution { point, strategy }),
        }
    }

    /// The table entry index, or a stale-route error naming `strategy`.
    pub fn entry(
        &self,
        point: &'static str,
        strategy: &'static str,
    ) -> Result<usize, DispatchError> {
        match self {
            Route::Entry(index) => Ok(*index),
            _ => Err(DispatchError::StaleResolution { point, strategy }),
        }
    }
}

/// Bookkeeping for one resolution that spans several points.
///
/// Strategies that probe into another point (invoke forwarding, direct
/// calls, retries) descend through [`Resolver::nested`], which refuses once
/// the configured depth is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    depth: usize,
    max_depth: usize,
    drops: usize,
}

impl Resolver {
    /// Creates a root resolver for `config`.
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            depth: 0,
            max_depth: config.max_depth,
            drops: 0,
        }
    }

    /// Number of points entered above this one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of customizers dropped so far.
    pub fn drops(&self) -> usize {
        self.drops
    }

    /// Resolver for probing one level deeper, if depth allows.
    pub fn nested(&self) -> Option<Resolver> {
        (self.depth < self.max_depth).then(|| Resolver {
            depth: self.depth + 1,
            ..*self
        })
    }

    /// Resolver for probing after dropping one customizer.
    pub fn after_drop(&self) -> Option<Resolver> {
        self.nested().map(|next| Resolver {
            drops: self.drops + 1,
            ..next
        })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&DispatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_respects_max_depth() {
        let config = DispatchConfig::default().with_max_depth(2);
        let root = Resolver::new(&config);
        let one = root.nested().unwrap();
        let two = one.nested().unwrap();
        assert_eq!(two.depth(), 2);
        assert!(two.nested().is_none());
    }

    #[test]
    fn test_after_drop_counts() {
        let root = Resolver::default();
        let next = root.after_drop().unwrap().after_drop().unwrap();
        assert_eq!(next.drops(), 2);
        assert_eq!(next.depth(), 2);
        assert_eq!(root.drops(), 0);
    }

    #[test]
    fn test_route_accessors() {
        assert_eq!(Route::Entry(3).entry("p", "s").ok(), Some(3));
        assert!(Route::Direct.entry("p", "s").is_err());
        assert!(Route::Direct.forwarded("p", "s").is_err());
    }
}
