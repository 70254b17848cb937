//! Calls intercepted by an invoke override.

use crate::error::DispatchError;
use crate::point::{CustomizationPoint, PointRef};
use crate::probe::{ArgPack, Signature, Slot, Value};

/// A call `invoke(customizer, target, args...)` handed to an override.
///
/// The override decides the outcome. It can inspect the customizer and the
/// remaining arguments, and re-enter dispatch in one of three ways:
///
/// - [`forward`](Self::forward): call the target on `args...`,
/// - [`call_target_with`](Self::call_target_with): call the target with a
///   new subject in front,
/// - [`reinvoke_with`](Self::reinvoke_with): run the invoke protocol again
///   with another customizer, which layers policies.
///
/// Each re-entry counts one level against the callee's `max_depth`, so
/// overrides that keep re-entering each other end in
/// [`DispatchError::DepthExceeded`].
pub struct PendingCall {
    invoker: &'static CustomizationPoint,
    customizer: Slot,
    target: Slot,
    args: ArgPack,
}

impl PendingCall {
    pub(crate) fn new(
        invoker: PointRef,
        customizer: Slot,
        target: Slot,
        args: ArgPack,
    ) -> Self {
        Self {
            invoker: invoker.get(),
            customizer,
            target,
            args,
        }
    }

    /// The customizer as a `C`, if it is one.
    pub fn customizer<C: 'static>(&self) -> Option<&C> {
        self.customizer.value.downcast_ref()
    }

    pub fn customizer_name(&self) -> &'static str {
        self.customizer.tag.name()
    }

    pub fn target_name(&self) -> &'static str {
        self.target.tag.name()
    }

    /// The target, when it is a customization point.
    pub fn target_point(&self) -> Option<&'static CustomizationPoint> {
        self.target.tag.as_point()
    }

    /// The target as a `T`, for targets that are plain values.
    pub fn target<T: 'static>(&self) -> Option<&T> {
        self.target.value.downcast_ref()
    }

    /// The invoke point that intercepted the call.
    pub fn invoker(&self) -> &'static CustomizationPoint {
        self.invoker
    }

    /// Number of re-entries that led to this call.
    pub fn depth(&self) -> usize {
        self.args.depth()
    }

    /// Arguments after the target.
    pub fn args(&self) -> &ArgPack {
        &self.args
    }

    /// Types of the arguments after the target.
    pub fn signature(&self) -> Signature {
        self.args.signature()
    }

    pub fn into_args(self) -> ArgPack {
        self.args
    }

    /// Calls the target on the remaining arguments, dropping the customizer.
    pub fn forward(self) -> Result<Value, DispatchError> {
        let target = self.callable_target()?;
        let mut args = self.args;
        args.descend();
        target.dispatch_args(args)
    }

    /// Calls the target with `subject` in front of the remaining arguments.
    pub fn call_target_with<C: Send + 'static>(self, subject: C) -> Result<Value, DispatchError> {
        let target = self.callable_target()?;
        let mut args = self.args;
        args.push_front(subject);
        args.descend();
        target.dispatch_args(args)
    }

    /// Runs `invoke(customizer, target, args...)` with a new customizer.
    pub fn reinvoke_with<C: Send + 'static>(self, customizer: C) -> Result<Value, DispatchError> {
        let mut args = self.args;
        args.push_front_slot(self.target);
        args.push_front(customizer);
        args.descend();
        self.invoker.dispatch_args(args)
    }

    fn callable_target(&self) -> Result<&'static CustomizationPoint, DispatchError> {
        self.target_point()
            .ok_or(DispatchError::TargetNotCallable {
                target: self.target.tag.name(),
            })
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("invoker", &self.invoker.name())
            .field("customizer", &self.customizer.tag)
            .field("target", &self.target.tag)
            .field("args", &self.args)
            .finish()
    }
}
