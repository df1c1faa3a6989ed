use crate::timer::Timer;
use crate::Mode;

use std::collections::BTreeMap;
use std::time::Duration;

/// Index of a [Record](./struct.Record.html) inside its [Registry](./struct.Registry.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

/// Aggregated timings of one named region.
///
/// In call-graph mode the same name may own several records, one per distinct
/// call path.
#[derive(Debug, Clone)]
pub struct Record {
    name: String,
    call_count: u64,
    wall_time: Duration,
    user_time: Duration,
    system_time: Duration,
    timer: Timer,
    children: BTreeMap<String, RecordId>,
}

impl Record {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            call_count: 0,
            wall_time: Duration::ZERO,
            user_time: Duration::ZERO,
            system_time: Duration::ZERO,
            timer: Timer::new(),
            children: BTreeMap::new(),
        }
    }

    /// Returns false without touching the timer if a flat record is already running.
    pub(crate) fn start(&mut self, mode: Mode) -> bool {
        if mode == Mode::Flat && self.timer.is_running() {
            return false;
        }
        self.timer.start();
        true
    }

    /// Returns false if a flat record is not running.
    pub(crate) fn stop(&mut self, mode: Mode) -> bool {
        if mode == Mode::Flat && !self.timer.is_running() {
            return false;
        }
        self.timer.stop();
        let cpu = self.timer.elapsed_cpu();
        self.wall_time += self.timer.elapsed();
        self.user_time += cpu.user;
        self.system_time += cpu.system;
        self.call_count += 1;
        true
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<String, RecordId> {
        &mut self.children
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn wall_time(&self) -> Duration {
        self.wall_time
    }

    pub fn user_time(&self) -> Duration {
        self.user_time
    }

    pub fn system_time(&self) -> Duration {
        self.system_time
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Child records by name. Always empty in flat mode.
    pub fn children(&self) -> &BTreeMap<String, RecordId> {
        &self.children
    }

    /// Average wall time per call in milliseconds, `None` if never completed.
    pub fn average_ms(&self) -> Option<f64> {
        if self.call_count == 0 {
            return None;
        }
        Some(self.wall_time.as_secs_f64() * 1000.0 / self.call_count as f64)
    }

    /// Share of the wall time spent on the CPU, in percent.
    pub fn cpu_percent(&self) -> Option<f64> {
        let wall = self.wall_time.as_secs_f64();
        if wall <= 0.0 {
            return None;
        }
        Some(100.0 * (self.user_time + self.system_time).as_secs_f64() / wall)
    }
}
