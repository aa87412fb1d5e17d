//! # Software and hardware run time measurement
//!
//! The labs compare the time of the software reference computation against the time of the
//! coprocessor transfers. Both are measured with a free running cycle counter, for example the
//! global timer or an AXI timer in the programmable logic.
use crate::time::{Hertz, Micros};

/// Free running up-counter.
pub trait CycleCounter {
    /// Current counter value. The counter is expected to wrap at [u64::MAX].
    fn read_ticks(&self) -> u64;

    /// Counter clock.
    fn clock(&self) -> Hertz;
}

impl<C: CycleCounter + ?Sized> CycleCounter for &C {
    #[inline]
    fn read_ticks(&self) -> u64 {
        (**self).read_ticks()
    }

    #[inline]
    fn clock(&self) -> Hertz {
        (**self).clock()
    }
}

/// Counter ticks together with the counter clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Elapsed {
    ticks: u64,
    clock: Hertz,
}

impl Elapsed {
    #[inline]
    pub const fn new(ticks: u64, clock: Hertz) -> Self {
        Self { ticks, clock }
    }

    #[inline]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub const fn clock(&self) -> Hertz {
        self.clock
    }

    /// Elapsed time, rounded down to full microseconds.
    pub fn micros(&self) -> Micros {
        let clock = self.clock.raw().max(1) as u128;
        let micros = (self.ticks as u128 * 1_000_000) / clock;
        Micros::from_ticks(micros.min(u64::MAX as u128) as u64)
    }

    pub fn as_secs_f32(&self) -> f32 {
        self.ticks as f32 / self.clock.raw().max(1) as f32
    }
}

/// Measures the ticks between a start point and later points.
#[derive(Debug, Copy, Clone)]
pub struct Stopwatch {
    start: u64,
    clock: Hertz,
}

impl Stopwatch {
    pub fn start<C: CycleCounter>(counter: &C) -> Self {
        Self {
            start: counter.read_ticks(),
            clock: counter.clock(),
        }
    }

    #[inline]
    pub fn elapsed_ticks<C: CycleCounter>(&self, counter: &C) -> u64 {
        counter.read_ticks().wrapping_sub(self.start)
    }

    pub fn elapsed<C: CycleCounter>(&self, counter: &C) -> Elapsed {
        Elapsed::new(self.elapsed_ticks(counter), self.clock)
    }

    /// Elapsed time since the last lap or the start, then restart at the current tick.
    pub fn lap<C: CycleCounter>(&mut self, counter: &C) -> Elapsed {
        let now = counter.read_ticks();
        let ticks = now.wrapping_sub(self.start);
        self.start = now;
        Elapsed::new(ticks, self.clock)
    }
}

/// Blocking delay provider which busy waits on a [CycleCounter].
pub struct TickDelay<C> {
    counter: C,
}

impl<C: CycleCounter> TickDelay<C> {
    #[inline]
    pub const fn new(counter: C) -> Self {
        Self { counter }
    }

    #[inline]
    pub fn release(self) -> C {
        self.counter
    }
}

impl<C: CycleCounter> embedded_hal::delay::DelayNs for TickDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        // Can not overflow for clocks below 4 GHz.
        let ticks = (ns as u64 * self.counter.clock().raw() as u64).div_ceil(1_000_000_000);
        let start = self.counter.read_ticks();
        while self.counter.read_ticks().wrapping_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}

/// Run times printed at the end of a lab session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LabTiming {
    /// Software reference computation.
    pub software: Elapsed,
    /// All coprocessor transfers, including the driver overhead.
    pub hardware: Elapsed,
}

impl LabTiming {
    /// Software time divided by hardware time.
    pub fn speedup(&self) -> Option<f32> {
        let hardware = self.hardware.as_secs_f32();
        if hardware == 0.0 {
            return None;
        }
        Some(self.software.as_secs_f32() / hardware)
    }

    pub fn log(&self) {
        log::info!(
            "software: {} ticks ({} us), hardware: {} ticks ({} us)",
            self.software.ticks(),
            self.software.micros().to_micros(),
            self.hardware.ticks(),
            self.hardware.micros().to_micros()
        );
    }
}
