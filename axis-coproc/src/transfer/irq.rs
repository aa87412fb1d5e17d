//! Interrupt driven AXI-Stream FIFO transfers.
//!
//! The FIFO interrupt handler and the main flow only share a [TransferShared] structure:
//!
//! | Field              | Written by                 | Read by                               |
//! |--------------------|----------------------------|---------------------------------------|
//! | transmit counter   | interrupt handler          | main flow                             |
//! | packet counter     | interrupt handler          | main flow                             |
//! | response buffer    | interrupt handler          | main flow, once the packet count is reached |
//! | overrun flag       | interrupt handler          | main flow, once the packet count is reached |
//!
//! The handler discards the previous response and overrun flag on every transmit complete event,
//! which always precedes the receive complete events of the same transfer. The counters only
//! ever increase. The main flow samples them before arming a transfer and
//! waits for them to move past the sampled value, so it never has to reset them.
use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use critical_section::Mutex;
use heapless::Vec;

use crate::{MAX_OUTPUT_WORDS, WORD_SIZE_IN_BYTES, error::InitError};

use super::{
    InterruptStatus, Policy, StreamFifo, TransferChannel, TransferError, check_fifo_reset,
    push_request, spin_until,
};

/// State shared between the FIFO interrupt handler and an [InterruptFifo].
pub struct TransferShared<const N: usize = MAX_OUTPUT_WORDS> {
    tx_completions: AtomicU32,
    packets_received: AtomicU32,
    // Set when the handler had to drop response words.
    overrun: AtomicBool,
    response: Mutex<RefCell<Vec<u32, N>>>,
}

impl<const N: usize> Default for TransferShared<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferShared<N> {
    pub const fn new() -> Self {
        Self {
            tx_completions: AtomicU32::new(0),
            packets_received: AtomicU32::new(0),
            overrun: AtomicBool::new(false),
            response: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of transmit complete events handled so far.
    #[inline]
    pub fn tx_completions(&self) -> u32 {
        self.tx_completions.load(Ordering::Acquire)
    }

    /// Number of response packets drained so far.
    #[inline]
    pub fn packets_received(&self) -> u32 {
        self.packets_received.load(Ordering::Acquire)
    }

    /// FIFO interrupt handler.
    ///
    /// The user has to call this in the interrupt handler of the AXI-Stream FIFO interrupt line,
    /// with a FIFO handle for the same peripheral. The handler loops until no status bit is
    /// pending anymore, because events can arrive back-to-back.
    pub fn on_interrupt<F: StreamFifo>(&self, fifo: &mut F) {
        let mut pending = fifo.pending();
        while !pending.is_empty() {
            if pending.transmit_complete() {
                self.discard_response();
                self.tx_completions.fetch_add(1, Ordering::Release);
                fifo.clear(InterruptStatus::TRANSMIT_COMPLETE);
            } else if pending.receive_complete() {
                self.drain(fifo);
                fifo.clear(InterruptStatus::RECEIVE_COMPLETE);
            } else {
                log::warn!("unexpected FIFO interrupt status {:#010x}", pending.raw_value());
                fifo.clear(pending);
            }
            pending = fifo.pending();
        }
    }

    fn drain<F: StreamFifo>(&self, fifo: &mut F) {
        critical_section::with(|cs| {
            let mut response = self.response.borrow(cs).borrow_mut();
            // One receive complete event can stand for several packets.
            while fifo.rx_occupancy() > 0 {
                let words = fifo.rx_len() / WORD_SIZE_IN_BYTES;
                for _ in 0..words {
                    if response.push(fifo.rx_read_word()).is_err() {
                        self.overrun.store(true, Ordering::Relaxed);
                    }
                }
                self.packets_received.fetch_add(1, Ordering::Release);
            }
        });
    }

    fn discard_response(&self) {
        critical_section::with(|cs| {
            self.response.borrow(cs).borrow_mut().clear();
        });
        self.overrun.store(false, Ordering::Relaxed);
    }

    fn take_response(&self, out: &mut [u32]) -> Result<usize, TransferError> {
        if self.overrun.load(Ordering::Relaxed) {
            return Err(TransferError::ResponseOverflow { capacity: N });
        }
        critical_section::with(|cs| {
            let response = self.response.borrow(cs).borrow();
            let capacity = out.len();
            let target = out
                .get_mut(..response.len())
                .ok_or(TransferError::ResponseOverflow { capacity })?;
            target.copy_from_slice(&response);
            Ok(response.len())
        })
    }
}

/// FIFO channel which relies on the FIFO interrupt handler for completion events.
///
/// [TransferShared::on_interrupt] must be called for every FIFO interrupt. The handle kept here
/// is only used for the transmit side.
pub struct InterruptFifo<'shared, F, const N: usize = MAX_OUTPUT_WORDS> {
    fifo: F,
    shared: &'shared TransferShared<N>,
    expected_packets: u32,
    spin_limit: Option<u32>,
    tx_mark: u32,
    rx_mark: u32,
}

impl<'shared, F: StreamFifo, const N: usize> InterruptFifo<'shared, F, N> {
    /// Create the channel and enable the completion interrupts.
    ///
    /// The completion waits spin forever if `spin_limit` is [None]. An unresponsive coprocessor
    /// then hangs the caller.
    pub fn new(
        mut fifo: F,
        shared: &'shared TransferShared<N>,
        expected_packets: u32,
        spin_limit: Option<u32>,
    ) -> Result<Self, InitError> {
        check_fifo_reset(&mut fifo)?;
        fifo.enable_interrupts(InterruptStatus::COMPLETION);
        Ok(Self {
            fifo,
            tx_mark: shared.tx_completions(),
            rx_mark: shared.packets_received(),
            shared,
            expected_packets,
            spin_limit,
        })
    }

    #[inline]
    pub fn release(self) -> F {
        self.fifo
    }
}

impl<F: StreamFifo, const N: usize> TransferChannel for InterruptFifo<'_, F, N> {
    #[inline]
    fn policy(&self) -> Policy {
        Policy::FifoInterrupt
    }

    fn send(&mut self, request: &[u32]) -> Result<(), TransferError> {
        // Sample the counters before the transfer starts, the interrupt can fire right after the
        // length write.
        self.tx_mark = self.shared.tx_completions();
        self.rx_mark = self.shared.packets_received();
        push_request(&mut self.fifo, request)
    }

    fn wait_transmit_complete(&mut self) -> Result<(), TransferError> {
        let (shared, mark) = (self.shared, self.tx_mark);
        spin_until(self.spin_limit, || shared.tx_completions() != mark)
            .map_err(TransferError::CompletionTimeout)
    }

    fn receive(&mut self, response: &mut [u32]) -> Result<usize, TransferError> {
        let (shared, mark, expected) = (self.shared, self.rx_mark, self.expected_packets);
        spin_until(self.spin_limit, || {
            shared.packets_received().wrapping_sub(mark) >= expected
        })
        .map_err(TransferError::CompletionTimeout)?;
        let received = self.shared.take_response(response)?;
        if received != response.len() {
            return Err(TransferError::ResponseLength {
                received,
                expected: response.len(),
            });
        }
        Ok(received)
    }
}
