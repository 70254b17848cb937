//! Sequence traversal as a customization point.
//!
//! [`FOR_EACH`] calls a visitor on every element of a sequence and returns
//! the number of elements visited:
//!
//! ```
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//! use u_dispatch::sequence::{visit, Traced, FOR_EACH};
//!
//! let sum = Arc::new(AtomicI64::new(0));
//! let acc = Arc::clone(&sum);
//! let f = visit(move |x: &i64| {
//!     acc.fetch_add(*x, Ordering::Relaxed);
//! });
//!
//! let n: usize = FOR_EACH.call((vec![1i64, 2, 3], f.clone())).unwrap();
//! assert_eq!(n, 3);
//!
//! // A policy in front is routed through the invoke protocol.
//! let n: usize = FOR_EACH.call((Traced, vec![4i64], f)).unwrap();
//! assert_eq!(n, 1);
//! assert_eq!(sum.load(Ordering::Relaxed), 10);
//! ```
//!
//! Sequence types can bring their own traversal with
//! [`register_member!`](crate::register_member), and policies can take over
//! traversal with [`register_override!`](crate::register_override).

mod policies;

use std::sync::Arc;

use crate::point::PointBuilder;

pub use policies::{Par, Seq, Traced};

/// A shared visitor.
pub type Visit<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Wraps a closure as a [`Visit`].
pub fn visit<T, F>(f: F) -> Visit<T>
where
    F: Fn(&T) + Send + Sync + 'static,
{
    Arc::new(f)
}

crate::customization_point! {
    /// Calls a visitor on every element: `for_each(data, visit)` or
    /// `for_each(policy, data, visit)`.
    pub static FOR_EACH: ForEach = "for_each", defaults
}

fn defaults(point: PointBuilder) -> PointBuilder {
    point
        .fallback_fn("default_for_each", default_for_each::<i32>)
        .fallback_fn("default_for_each", default_for_each::<i64>)
        .fallback_fn("default_for_each", default_for_each::<u32>)
        .fallback_fn("default_for_each", default_for_each::<u64>)
        .fallback_fn("default_for_each", default_for_each::<f32>)
        .fallback_fn("default_for_each", default_for_each::<f64>)
        .fallback_fn("default_for_each", default_for_each::<String>)
}

fn default_for_each<T>((data, f): (Vec<T>, Visit<T>)) -> usize {
    data.iter().for_each(|x| f(x));
    data.len()
}
