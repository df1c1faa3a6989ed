mod local;

use self::local::LOCAL_REGISTRY;
use crate::record::RecordId;
use crate::registry::{Order, Registry};

use std::marker::PhantomData;
use std::path::Path;

/// Measures its scope into the current thread's registry.
///
/// Inert if the activation is not measured (reentrant flat record, omitted
/// recursive call) or the registry can not be reached.
pub struct Profiler {
    id: Option<RecordId>,
    // Must be dropped on the thread that created it.
    _local: PhantomData<*const ()>,
}

impl Profiler {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let name = name.as_ref();
        let id = LOCAL_REGISTRY
            .try_with(|local| match local.try_borrow_mut() {
                Ok(mut local) => local.registry.enter(name),
                Err(err) => {
                    error!("Cannot start scoped profiler {}: {}", name, err);
                    None
                }
            })
            .unwrap_or_else(|err| {
                error!("Cannot start scoped profiler {}: {}", name, err);
                None
            });
        Self {
            id,
            _local: PhantomData,
        }
    }

    /// Whether this activation is being measured.
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for Profiler {
    fn drop(&mut self) {
        let id = match self.id.take() {
            Some(id) => id,
            None => return,
        };
        let res = LOCAL_REGISTRY.try_with(|local| match local.try_borrow_mut() {
            Ok(mut local) => local.registry.exit(id),
            Err(err) => {
                error!("Cannot stop scoped profiler {:?}: {}", id, err);
            }
        });
        if let Err(err) = res {
            trace!("Registry is gone, dropping {:?}: {}", id, err);
        }
    }
}

/// Run `f` on the current thread's registry.
pub fn with_registry<R>(f: impl FnOnce(&Registry) -> R) -> Option<R> {
    LOCAL_REGISTRY
        .try_with(|local| local.try_borrow().ok().map(|local| f(&local.registry)))
        .ok()
        .flatten()
}

fn with_registry_mut(f: impl FnOnce(&mut Registry)) {
    let res = LOCAL_REGISTRY.try_with(|local| match local.try_borrow_mut() {
        Ok(mut local) => f(&mut local.registry),
        Err(err) => {
            error!("Profiler registry is busy: {}", err);
        }
    });
    if let Err(err) = res {
        error!("Profiler registry is gone: {}", err);
    }
}

/// Write the current thread's report to `path`. Failures are logged.
pub fn print_stats<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if with_registry(|registry| registry.print_stats(path)).is_none() {
        error!("Cannot write profiler output {}", path.display());
    }
}

/// Write the current thread's report to the configured path.
pub fn print_default_stats() {
    print_stats(&crate::CONFIG.report_path)
}

#[cfg(feature = "json")]
pub fn print_stats_json<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if with_registry(|registry| registry.print_stats_json(path)).is_none() {
        error!("Cannot write profiler output {}", path.display());
    }
}

/// Only affects scopes entered afterwards. Has no effect in flat mode.
pub fn set_omit_recursive_calls(omit: bool) {
    with_registry_mut(|registry| registry.set_omit_recursive_calls(omit));
}

pub fn omit_recursive_calls() -> bool {
    with_registry(|registry| registry.omit_recursive_calls()).unwrap_or(true)
}

pub fn set_order(order: Order) {
    with_registry_mut(|registry| registry.set_order(order));
}
