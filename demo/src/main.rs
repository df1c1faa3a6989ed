//! Profiles a plain function, a self-recursive one and a mutually recursive pair.
//!
//! Run with `--no-default-features --features flat` to compare with the flat profiler.
//! The report goes to `profile.out` unless `CALLGRAPH_PROFILE_OUT` says otherwise, or to
//! the path given as first argument.
use callgraph_profile::{profile, set_omit_recursive_calls};

/// A normal function.
fn f(n: u64) -> u64 {
    profile!();
    let mut result: u64 = 1;
    for i in 1..n {
        result = result.wrapping_mul(i);
    }
    result
}

/// In flat mode `g(9)` is counted as a single call.
fn g(n: u64) -> u64 {
    profile!();
    if n < 2 {
        return 1;
    }
    g(n - 1) * n
}

/// `h1` and `h2` call each other. In flat mode `h1(9)` counts one call to each.
fn h1(n: u64) -> u64 {
    profile!();
    if n < 2 {
        return 1;
    }
    h2(n - 1) * n
}

fn h2(n: u64) -> u64 {
    profile!();
    if n < 2 {
        return 1;
    }
    h1(n - 1) * n
}

fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let iterations = std::env::var("DEMO_ITERATIONS")
        .map_err(anyhow::Error::new)
        .and_then(|n| n.parse().map_err(anyhow::Error::new))
        .unwrap_or_else(|err| {
            log::debug!("Using default iteration count: {}", err);
            100_000_000
        });
    let report = std::env::args().nth(1);

    {
        profile!();
        set_omit_recursive_calls!(std::env::var("DEMO_OMIT_RECURSIVE").is_ok());

        // Two calls to f, the call count should be 2.
        let f_large = f(iterations);
        let f_small = f(100);
        let g_res = g(9);
        let h_res = h1(9);

        log::info!("f({}) = {}", iterations, f_large);
        log::info!("f(100) = {}", f_small);
        log::info!("g(9) = {}", g_res);
        log::info!("h1(9) = {}", h_res);
    }

    if let Some(path) = report {
        log::info!("Writing report to {}", path);
        callgraph_profile::print_stats(&path);
    }
    Ok(())
}
