//! Traversal with execution policies.
//!
//! Run with `RUST_LOG=debug cargo run --example for_each` to see points
//! binding and the `Traced` policy intercepting its call.

use std::io::Write;

use tracing_subscriber::EnvFilter;
use u_dispatch::sequence::{visit, Seq, Traced, FOR_EACH};
use u_dispatch::{register_override, DispatchError};

/// A policy defined outside the library.
struct Fancy;

register_override!(Fancy => u_dispatch::sequence::ForEach, fn fancy_for_each(call) {
    println!("fancy policy intercepted `{}`", call.target_name());
    call.call_target_with(Seq)
});

fn main() -> Result<(), DispatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let numbers: Vec<i32> = (0..10).collect();
    let print = visit(|x: &i32| {
        print!("{x} ");
        let _ = std::io::stdout().flush();
    });

    FOR_EACH.call::<usize, _>((numbers.clone(), print.clone()))?;
    println!("\n");

    FOR_EACH.call::<usize, _>((Fancy, numbers.clone(), print.clone()))?;
    println!("\n");

    FOR_EACH.call::<usize, _>((Seq, numbers.clone(), print.clone()))?;
    println!("\n");

    FOR_EACH.call::<usize, _>((Traced, numbers, print))?;
    println!("\n");

    println!("OK");
    Ok(())
}
