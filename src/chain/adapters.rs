//! Strategy adapters.

use std::marker::PhantomData;

use super::types::{Resolver, Route, Strategy};
use crate::error::DispatchError;
use crate::probe::{ArgPack, FromArgs, Signature, Value};

/// A strategy backed by a typed closure.
///
/// Accepts exactly the argument types of `A` and produces an `R`.
///
/// # Examples
///
/// ```
/// use u_dispatch::{PriorityChain, Typed};
///
/// let chain = PriorityChain::new().with_strategy(Typed::new("add", |(a, b): (u32, u32)| a + b));
/// assert_eq!(chain.call((2u32, 3u32)).unwrap().take::<u32>().unwrap(), 5);
/// ```
pub struct Typed<A, R, F> {
    name: &'static str,
    signature: Signature,
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R, F> Typed<A, R, F>
where
    A: FromArgs,
    R: Send + 'static,
    F: Fn(A) -> R + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            signature: A::signature(),
            f,
            _marker: PhantomData,
        }
    }

    /// The accepted argument types.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl<A, R, F> Strategy for Typed<A, R, F>
where
    A: FromArgs,
    R: Send + 'static,
    F: Fn(A) -> R + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&self, signature: &Signature, _resolver: &Resolver) -> Option<Route> {
        (*signature == self.signature).then_some(Route::Direct)
    }

    fn call(&self, _route: &Route, args: ArgPack) -> Result<Value, DispatchError> {
        let args = A::from_args(args)?;
        Ok(Value::new((self.f)(args)))
    }
}

/// Hides the first argument from the wrapped strategy.
///
/// Customization points put themselves in front of every call; strategies
/// that do not care about the point are wrapped in `SkipSelf`.
pub struct SkipSelf<S> {
    inner: S,
}

impl<S: Strategy> SkipSelf<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Strategy> Strategy for SkipSelf<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn probe(&self, signature: &Signature, resolver: &Resolver) -> Option<Route> {
        if signature.is_empty() {
            return None;
        }
        self.inner.probe(&signature.tail(), resolver)
    }

    fn call(&self, route: &Route, mut args: ArgPack) -> Result<Value, DispatchError> {
        args.pop_front();
        self.inner.call(route, args)
    }
}
