//! Dispatch errors.
//!
//! Resolution failures (`NoViableStrategy`, `UnboundedDropRetry`) mean an
//! implementation is missing; configuration failures are reported when a
//! customization point is built. Errors produced by the selected strategy
//! itself are never wrapped: they travel inside the returned
//! [`Value`](crate::Value) unchanged.

use thiserror::Error;

use crate::probe::Signature;

/// Errors raised by the dispatch layer.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Every candidate in the chain rejected the argument types.
    #[error(
        "no viable strategy for `{point}` with arguments {signature} (considered: {})",
        .considered.join(", ")
    )]
    NoViableStrategy {
        /// Label of the exhausted chain.
        point: &'static str,
        /// Argument types as supplied by the caller.
        signature: Signature,
        /// Strategy names, in probe order.
        considered: Vec<&'static str>,
    },

    /// An invoke call dropped every droppable customizer without reaching an
    /// override or a directly callable target.
    #[error("invoke exhausted for {signature} after dropping {dropped} customizer(s)")]
    UnboundedDropRetry {
        /// Argument types of the invoke call.
        signature: Signature,
        /// Number of drop-and-retry steps that were admissible.
        dropped: usize,
    },

    /// A customization point was called with an empty argument list.
    #[error("`{point}` requires at least one argument")]
    MissingSubject {
        /// The point that was called.
        point: &'static str,
    },

    /// A strategy was handed arguments it did not declare.
    #[error("argument mismatch: expected {expected}, found {found}")]
    ArgumentMismatch {
        /// Declared argument types.
        expected: Signature,
        /// Supplied argument types.
        found: Signature,
    },

    /// The selected strategy produced a different type than requested.
    #[error("result type mismatch: expected `{expected}`, found `{found}`")]
    ResultType {
        /// Requested result type.
        expected: &'static str,
        /// Produced result type.
        found: &'static str,
    },

    /// A second customization point tried to bind an identity already in use.
    #[error("customization point identity `{name}` is already bound")]
    DuplicateIdentity {
        /// Name of the identity.
        name: &'static str,
    },

    /// Two implementations of the same kind share a signature.
    #[error("conflicting {kind} implementations of `{point}` for {signature}")]
    ConflictingImplementations {
        /// The point being built.
        point: &'static str,
        /// `member`, `free` or `override`.
        kind: &'static str,
        /// The shared signature.
        signature: Signature,
    },

    /// A scoped free implementation whose scope type is absent from its own
    /// arguments, so argument-scope lookup can never find it.
    #[error("free implementation `{name}` of `{point}` is scoped to `{scope}`, which is not among its arguments")]
    UnreachableImplementation {
        /// The point being built.
        point: &'static str,
        /// Name of the implementation.
        name: &'static str,
        /// The scope type.
        scope: &'static str,
    },

    /// An override tried to call a target that is not a customization point.
    #[error("`{target}` is not a customization point and cannot be called")]
    TargetNotCallable {
        /// Type name of the target.
        target: &'static str,
    },

    /// Dispatch was re-entered from overrides more often than the point's
    /// `max_depth` allows.
    #[error("`{point}` re-entered beyond max_depth {max_depth}")]
    DepthExceeded {
        /// The point that refused the call.
        point: &'static str,
        /// The configured limit.
        max_depth: usize,
    },

    /// A resolution was executed against a chain that did not produce it.
    #[error("stale resolution: `{strategy}` is not the resolved strategy of `{point}`")]
    StaleResolution {
        /// The executing chain.
        point: &'static str,
        /// The strategy named in the resolution.
        strategy: &'static str,
    },

    /// A [`DispatchConfig`](crate::DispatchConfig) failed validation.
    #[error("invalid dispatch config: {0}")]
    InvalidConfig(String),
}
