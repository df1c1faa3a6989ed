use std::time::{Duration, Instant};

/// User and system CPU time consumed by the process.
///
/// Always zero unless the `cpu-time` feature is enabled on a unix target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: Duration,
    pub system: Duration,
}

impl CpuTimes {
    #[cfg(all(feature = "cpu-time", unix))]
    pub fn now() -> Self {
        fn to_duration(tv: libc::timeval) -> Duration {
            Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64)
        }

        let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        // SAFETY: `usage` is a valid out pointer and RUSAGE_SELF is always accepted.
        let res = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
        if res != 0 {
            return Self::default();
        }
        // SAFETY: getrusage succeeded, so the struct is initialized.
        let usage = unsafe { usage.assume_init() };
        Self {
            user: to_duration(usage.ru_utime),
            system: to_duration(usage.ru_stime),
        }
    }

    #[cfg(not(all(feature = "cpu-time", unix)))]
    pub fn now() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Duration {
        self.user + self.system
    }

    fn since(&self, start: &CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_sub(start.user),
            system: self.system.saturating_sub(start.system),
        }
    }
}

/// Start/stop stopwatch over the monotonic clock.
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    cpu_start: CpuTimes,
    stopped: Duration,
    cpu_stopped: CpuTimes,
    running: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            cpu_start: CpuTimes::default(),
            stopped: Duration::ZERO,
            cpu_stopped: CpuTimes::default(),
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.cpu_start = CpuTimes::now();
        self.start = Instant::now();
    }

    pub fn stop(&mut self) {
        self.stopped = self.start.elapsed();
        self.cpu_stopped = CpuTimes::now().since(&self.cpu_start);
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Duration of the last start/stop pair, or the time since `start` while running.
    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.start.elapsed()
        } else {
            self.stopped
        }
    }

    /// Same as [elapsed](#method.elapsed) for process CPU time.
    pub fn elapsed_cpu(&self) -> CpuTimes {
        if self.running {
            CpuTimes::now().since(&self.cpu_start)
        } else {
            self.cpu_stopped
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_timer_reports_zero() {
        let timer = Timer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(timer.elapsed_cpu(), CpuTimes::default());
    }

    #[test]
    fn stopped_timer_keeps_its_duration() {
        let mut timer = Timer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(5));
        timer.stop();

        let first = timer.elapsed();
        assert!(first >= Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(timer.elapsed(), first);
    }

    #[test]
    fn running_timer_can_be_inspected() {
        let mut timer = Timer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        let a = timer.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        let b = timer.elapsed();
        assert!(timer.is_running());
        assert!(b > a);
    }

    #[test]
    fn restart_measures_from_new_origin() {
        let mut timer = Timer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(20));
        timer.stop();

        timer.start();
        timer.stop();
        assert!(timer.elapsed() < Duration::from_millis(20));
    }
}
