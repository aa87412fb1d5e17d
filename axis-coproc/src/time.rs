//! # Time units used by the lab timing measurements

/// Counter clock frequency.
pub type Hertz = fugit::HertzU32;

// Cycle counters are 64 bits wide, so the derived durations are as well.

pub type Micros = fugit::MicrosDurationU64;
