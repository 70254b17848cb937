//! Execution policies for [`FOR_EACH`](super::FOR_EACH).

use tracing::info;

use super::{ForEach, Visit};
use crate::error::DispatchError;
use crate::probe::{ArgPack, FromArgs, Signature, Value};

/// Sequential execution: elements are visited in order on the calling
/// thread.
///
/// `Seq` has no override; the invoke protocol drops it and calls the
/// target directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Seq;

/// Parallel execution.
///
/// With the `parallel` feature, vectors of the built-in element types are
/// visited on rayon's thread pool; visiting order is unspecified. Without
/// the feature, or for other element types, the call runs as [`Seq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Par;

/// Logs the intercepted call at `info` level, then runs it as [`Seq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Traced;

crate::register_override!(Par => ForEach, fn par_for_each(call) {
    let signature = call.signature();
    macro_rules! kernels {
        ($($t:ty),*) => {
            $(
                if signature == Signature::of::<(Vec<$t>, Visit<$t>)>() {
                    return par_kernel::<$t>(call.into_args());
                }
            )*
        };
    }
    kernels!(i32, i64, u32, u64, f32, f64, String);
    call.call_target_with(Seq)
});

crate::register_override!(Traced => ForEach, fn traced_for_each(call) {
    info!(
        policy = "traced",
        target = call.target_name(),
        args = %call.signature(),
        "invoke intercepted"
    );
    call.call_target_with(Seq)
});

fn par_kernel<T: Send + Sync + 'static>(args: ArgPack) -> Result<Value, DispatchError> {
    let (data, f) = <(Vec<T>, Visit<T>)>::from_args(args)?;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        data.par_iter().for_each(|x| f(x));
    }
    #[cfg(not(feature = "parallel"))]
    data.iter().for_each(|x| f(x));

    Ok(Value::new(data.len()))
}
