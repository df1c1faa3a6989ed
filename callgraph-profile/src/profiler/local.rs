//! The registry used by the `profile!` macros.
//!
//! Every thread records into its own registry, so nesting is never mixed up
//! between threads. The main thread's registry writes its report to
//! `CONFIG.report_path` when the thread-local storage is torn down at exit.
use crate::config::CONFIG;
use crate::registry::{Mode, Registry};

use std::cell::RefCell;

#[cfg(feature = "call-graph")]
pub const MODE: Mode = Mode::CallGraph;
#[cfg(not(feature = "call-graph"))]
pub const MODE: Mode = Mode::Flat;

thread_local!(
    pub static LOCAL_REGISTRY: RefCell<LocalRegistry> = {
        let report_on_exit = CONFIG.exit_report && std::thread::current().name() == Some("main");
        let res = LocalRegistry {
            registry: Registry::with_config(MODE, &CONFIG),
            report_on_exit,
        };
        RefCell::new(res)
    };
);

pub struct LocalRegistry {
    pub registry: Registry,
    report_on_exit: bool,
}

impl Drop for LocalRegistry {
    fn drop(&mut self) {
        if !self.report_on_exit || self.registry.is_empty() {
            return;
        }
        trace!(
            "Writing profile of {} records to {}",
            self.registry.len(),
            CONFIG.report_path.display()
        );
        self.registry.print_stats(&CONFIG.report_path);
    }
}
