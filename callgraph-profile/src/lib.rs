//! Records how much time is spent in named scopes, either as a flat table or as a call-graph.
//!
//! Scopes are measured by [Profiler](./struct.Profiler.html) guards, usually created with the
//! `profile!` macro. Every thread aggregates into its own [Registry](./struct.Registry.html); the
//! main thread writes its report to `profile.out` when the program exits, which can be
//! overwritten by setting the `CALLGRAPH_PROFILE_OUT` environment variable. Reports can be
//! written at any time with [print_stats](./fn.print_stats.html).
//!
//! Disabling both mode features turns the macros into no-ops and replaces `Profiler` with an
//! empty struct. Allowing you to roll release builds without the profiler overhead and also
//! without modifying code.
//!
//! ## Features
//!
//! | Name         | Enabled by default | Description                                                             |
//! | ------------ | ------------------ | ----------------------------------------------------------------------- |
//! | `flat`       | `false`            | One record per scope name, reentrant activations are not measured.     |
//! | `call-graph` | `false`            | One record per call path. Mutually exclusive with `flat`.              |
//! | `cpu-time`   | `false`            | Also accumulate process user and system time (unix only).              |
//! | `json`       | `false`            | Write reports as JSON as well.                                          |
//! | `log`        | `false`            | Logs errors using the log crate, instead of stderr.                    |
//!
//! ## Recursion
//!
//! In call-graph mode a scope entered while a scope of the same name is already active is
//! skipped by default. Calling `set_omit_recursive_calls!(false)` records such activations under
//! `RECURSIVE@<name>` instead.
//!
//! ## Example
//!
//! ```no_run
//! use callgraph_profile::profile;
//!
//! fn foo() {
//!     profile!("foo");
//!     bar();
//! }
//!
//! fn bar() {
//!     profile!();
//! }
//!
//! foo();
//! foo();
//!
//! // With the `call-graph` feature the report reads something like
//! // (children are indented with one tab):
//!
//! // foo  T(s):0.000003  #:2  A(ms):0.001500
//! // 	my_crate::bar:12  T(s):0.000001  #:2  A(ms):0.000500
//! ```

#[cfg(all(feature = "flat", feature = "call-graph"))]
compile_error!("The `flat` and `call-graph` features can not be enabled at the same time");

macro_rules! trace {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::trace!($($args),*);
        #[cfg(not(feature="log"))]
        {
            $(let _ = &$args;)*
        }
    }
}

macro_rules! warn {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::warn!($($args),*);
        #[cfg(not(feature="log"))]
        eprintln!($($args),*);
    }
}

macro_rules! error {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::error!($($args),*);
        #[cfg(not(feature="log"))]
        eprintln!($($args),*);
    }
}

mod config;
mod record;
mod registry;
mod report;
mod timer;

#[cfg(any(feature = "flat", feature = "call-graph"))]
mod profiler;

pub use config::{Config, CONFIG, DEFAULT_REPORT_PATH};
pub use profiler::*;
pub use record::{Record, RecordId};
pub use registry::{Mode, Order, Registry, RECURSION_MARKER};
pub use report::Node;
pub use timer::{CpuTimes, Timer};

/// Path of the enclosing function, e.g. `my_crate::module::function`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name[..name.len() - 3].trim_end_matches("::{{closure}}")
    }};
}

/// Measure the rest of the enclosing block.
///
/// - `profile!()` names the scope after the enclosing function and line.
/// - `profile!(name)` uses `name`.
/// - `profile!(name, id)` uses `name:id`.
#[cfg(any(feature = "flat", feature = "call-graph"))]
#[macro_export]
macro_rules! profile {
    () => {
        let _profile = {
            use $crate::Profiler;

            Profiler::new(format!("{}:{}", $crate::function_name!(), std::line!()))
        };
    };
    ($name: expr) => {
        let _profile = {
            use $crate::Profiler;

            Profiler::new($name)
        };
    };
    ($name: expr, $id: expr) => {
        let _profile = {
            use $crate::Profiler;

            Profiler::new(format!("{}:{}", $name, $id))
        };
    };
}

/// Like `profile!()` with an extra identifier appended to the name: `function:line:id`.
#[cfg(any(feature = "flat", feature = "call-graph"))]
#[macro_export]
macro_rules! profile_id {
    ($id: expr) => {
        let _profile = {
            use $crate::Profiler;

            Profiler::new(format!(
                "{}:{}:{}",
                $crate::function_name!(),
                std::line!(),
                $id
            ))
        };
    };
}

#[cfg(feature = "call-graph")]
#[macro_export]
macro_rules! set_omit_recursive_calls {
    ($omit: expr) => {
        $crate::set_omit_recursive_calls($omit);
    };
}

#[cfg(not(any(feature = "flat", feature = "call-graph")))]
#[macro_export]
macro_rules! profile {
    () => {};
    ($name: expr) => {};
    ($name: expr, $id: expr) => {};
}

#[cfg(not(any(feature = "flat", feature = "call-graph")))]
#[macro_export]
macro_rules! profile_id {
    ($id: expr) => {};
}

#[cfg(not(feature = "call-graph"))]
#[macro_export]
macro_rules! set_omit_recursive_calls {
    ($omit: expr) => {};
}

// In case profiling is disabled we replace the `Profiler` struct with a unit struct.
#[cfg(not(any(feature = "flat", feature = "call-graph")))]
mod profiler {
    use crate::registry::{Order, Registry};
    use std::path::Path;

    pub struct Profiler;

    impl Profiler {
        pub fn new<S: AsRef<str>>(_name: S) -> Self {
            Self
        }

        pub fn is_active(&self) -> bool {
            false
        }
    }

    pub fn with_registry<R>(_f: impl FnOnce(&Registry) -> R) -> Option<R> {
        None
    }

    pub fn print_stats<P: AsRef<Path>>(_path: P) {}

    pub fn print_default_stats() {}

    #[cfg(feature = "json")]
    pub fn print_stats_json<P: AsRef<Path>>(_path: P) {}

    pub fn set_omit_recursive_calls(_omit: bool) {}

    pub fn omit_recursive_calls() -> bool {
        true
    }

    pub fn set_order(_order: Order) {}
}
