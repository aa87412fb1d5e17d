//! Host stand-ins for the cycle counter and the console UART.
use std::{io::Write as _, time::Instant};

use axis_coproc::{time::Hertz, timing::CycleCounter};

/// Nominal clock of the [HostCounter]. One tick is one nanosecond.
pub const HOST_COUNTER_CLOCK: Hertz = Hertz::from_raw(1_000_000_000);

/// [CycleCounter] backed by the monotonic host clock.
#[derive(Debug, Copy, Clone)]
pub struct HostCounter {
    origin: Instant,
}

impl Default for HostCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCounter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl CycleCounter for HostCounter {
    fn read_ticks(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn clock(&self) -> Hertz {
        HOST_COUNTER_CLOCK
    }
}

/// Console sink which writes to the standard output.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdoutSink;

impl core::fmt::Write for StdoutSink {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        std::io::stdout()
            .lock()
            .write_all(s.as_bytes())
            .map_err(|_| core::fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axis_coproc::timing::Stopwatch;
    use std::time::Duration;

    #[test]
    fn test_host_counter_advances() {
        let counter = HostCounter::new();
        let stopwatch = Stopwatch::start(&counter);
        std::thread::sleep(Duration::from_millis(2));
        let elapsed = stopwatch.elapsed(&counter);
        assert!(elapsed.micros().to_micros() >= 2000);
        approx::assert_relative_eq!(
            elapsed.as_secs_f32(),
            elapsed.ticks() as f32 / 1e9,
            max_relative = 1e-6
        );
    }
}
