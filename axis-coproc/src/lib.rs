//! # Coprocessor exchange support for Zynq 7000 AXI-Stream labs
//!
//! This crate contains everything the processing system (PS) side of the coprocessor labs needs
//! which is not tied to a specific register block:
//!
//! - Decimal ASCII ingestion of the A/B/C matrices from a serial byte stream ([ingest]) and the
//!   decimal serializer for the results ([egress]).
//! - The software reference pipeline ([reference]): a quantized matrix-vector product and a
//!   two-layer quantized perceptron with an optional sigmoid lookup table.
//! - The transmit-then-receive handshake with the programmable logic (PL) coprocessor over an
//!   AXI-Stream FIFO (polled or interrupt driven) or an AXI DMA engine ([transfer]).
//! - Verification, timing and a small diagnostic console logger.
//! - The [lab::LabSession] driver, which ties all of the above together for a number of test
//!   vectors, and the embedded [vectors] of every lab variant.
//!
//! The peripherals themselves are abstracted by the [transfer::StreamFifo] and
//! [transfer::DmaEngine] traits, and the byte stream by the
//! [embedded-hal-nb](https://docs.rs/embedded-hal-nb) serial traits.
#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod console;
pub mod egress;
pub mod error;
pub mod ingest;
pub mod lab;
pub mod layout;
pub mod matrix;
pub mod reference;
pub mod time;
pub mod timing;
pub mod transfer;
pub mod vectors;
pub mod verify;

pub use error::LabError;

/// Size of one AXI-Stream data beat in bytes.
pub const WORD_SIZE_IN_BYTES: usize = 4;

/// Upper bound for the element count of a single matrix. The largest matrix in all lab variants
/// is the 64x8 feature matrix.
pub const MAX_MATRIX_ELEMENTS: usize = 512;

/// Upper bound for the request size in words.
pub const MAX_INPUT_WORDS: usize = 520;

/// Upper bound for the response size in words, per test vector.
pub const MAX_OUTPUT_WORDS: usize = 64;
