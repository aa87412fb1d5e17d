//! Request/response exchange with the programmable logic coprocessor.
//!
//! Every test vector goes through one transmit-then-receive transaction: the request words are
//! streamed to the coprocessor, the software waits until the transmission completed and then
//! drains the fixed-length response.
//!
//! The peripherals carrying the stream are abstracted by [StreamFifo] (AXI-Stream FIFO) and
//! [DmaEngine] (AXI DMA in simple transfer mode). Three [TransferChannel] implementations drive
//! them:
//!
//! - [PollingFifo]: busy-waits on the FIFO status and drains the receive FIFO itself.
//! - [InterruptFifo]: the FIFO interrupt handler drains the receive FIFO into a
//!   [TransferShared] structure, the main flow only watches its completion counters.
//! - [DmaChannel]: busy-waits on the DMA channel status.
//!
//! The [Handshake] state machine sequences one transaction per vector on top of any channel.
use crate::{WORD_SIZE_IN_BYTES, error::InitError};

pub mod dispatch;
pub mod dma;
pub mod handshake;
pub mod irq;
pub mod polling;

pub use dispatch::{DispatchError, IrqDispatcher, IrqLine};
pub use dma::DmaChannel;
pub use handshake::{Handshake, HandshakeState};
pub use irq::{InterruptFifo, TransferShared};
pub use polling::PollingFifo;

/// AXI-Stream FIFO interrupt status. Only the completion bits are used, all other bits are
/// treated as unknown.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptStatus {
    /// Transmit complete (TC).
    #[bit(27, rw)]
    transmit_complete: bool,
    /// Receive complete (RC). One event can stand for more than one received packet.
    #[bit(26, rw)]
    receive_complete: bool,
}

impl InterruptStatus {
    pub const TRANSMIT_COMPLETE: Self = Self::DEFAULT.with_transmit_complete(true);
    pub const RECEIVE_COMPLETE: Self = Self::DEFAULT.with_receive_complete(true);
    pub const COMPLETION: Self = Self::TRANSMIT_COMPLETE.with_receive_complete(true);
    pub const ALL: Self = Self::new_with_raw_value(0xffff_ffff);

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.raw_value() == 0
    }
}

/// DMA channel direction.
#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Direction {
    /// Memory-mapped to stream (MM2S): main memory to coprocessor.
    ToDevice = 0,
    /// Stream to memory-mapped (S2MM): coprocessor to main memory.
    FromDevice = 1,
}

/// Transfer policy of a [TransferChannel].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    FifoPolling,
    FifoInterrupt,
    DmaPolling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("transmit FIFO full after {written} of {len} words")]
    TxFifoFull { written: usize, len: usize },
    #[error("no response data after {0} polls")]
    RxTimeout(u32),
    #[error("no completion after {0} spins")]
    CompletionTimeout(u32),
    #[error("receive complete not signalled after draining the response")]
    RxIncomplete,
    #[error("response does not fit into {capacity} words")]
    ResponseOverflow { capacity: usize },
    #[error("received {received} response words, expected {expected}")]
    ResponseLength { received: usize, expected: usize },
    #[error("request has {actual} words, expected {expected}")]
    RequestLength { actual: usize, expected: usize },
    #[error("transfer already outstanding in state {0:?}")]
    SessionBusy(HandshakeState),
    #[error("DMA channel {0:?} rejected the transfer")]
    DmaRejected(Direction),
}

/// AXI-Stream FIFO operations, in words of [WORD_SIZE_IN_BYTES] bytes.
pub trait StreamFifo {
    /// Free word slots in the transmit FIFO.
    fn tx_vacancy(&mut self) -> usize;
    fn tx_write_word(&mut self, word: u32);
    /// Write the transmit length in bytes. This starts the transmission of the written words.
    fn tx_set_len(&mut self, bytes: usize);

    /// Occupied word slots in the receive FIFO. Only updated after a complete packet was
    /// received.
    fn rx_occupancy(&mut self) -> usize;
    /// Length in bytes of the next received packet.
    fn rx_len(&mut self) -> usize;
    fn rx_read_word(&mut self) -> u32;

    fn pending(&mut self) -> InterruptStatus;
    /// Clear the given status bits.
    fn clear(&mut self, status: InterruptStatus);
    fn enable_interrupts(&mut self, mask: InterruptStatus);

    #[inline]
    fn is_tx_done(&mut self) -> bool {
        self.pending().transmit_complete()
    }

    #[inline]
    fn is_rx_done(&mut self) -> bool {
        self.pending().receive_complete()
    }
}

/// AXI DMA operations in simple (register direct) transfer mode.
pub trait DmaEngine {
    fn has_scatter_gather(&self) -> bool;
    /// Start streaming the words to the coprocessor.
    fn start_to_device(&mut self, words: &[u32]) -> Result<(), TransferError>;
    /// Arm the receive channel for the given number of words.
    fn start_from_device(&mut self, words: usize) -> Result<(), TransferError>;
    fn is_busy(&mut self, direction: Direction) -> bool;
    /// Make the received words visible to the processor and copy them out. Returns the number of
    /// words written into `buf`.
    fn complete_from_device(&mut self, buf: &mut [u32]) -> usize;
}

/// One transmit-then-receive transaction.
///
/// [Handshake] calls the three steps in order and never overlaps two transactions.
pub trait TransferChannel {
    fn policy(&self) -> Policy;

    /// Push all request words into the channel and arm the transfer. Does not wait.
    fn send(&mut self, request: &[u32]) -> Result<(), TransferError>;

    /// Wait until the request left the channel.
    fn wait_transmit_complete(&mut self) -> Result<(), TransferError>;

    /// Fill `response` completely. Returns the number of words received.
    fn receive(&mut self, response: &mut [u32]) -> Result<usize, TransferError>;
}

/// Clear all interrupt status bits and check that none remain set, which is the reset state of
/// the FIFO.
pub fn check_fifo_reset<F: StreamFifo>(fifo: &mut F) -> Result<(), InitError> {
    fifo.clear(InterruptStatus::ALL);
    let status = fifo.pending();
    if !status.is_empty() {
        return Err(InitError::ResetStatus(status.raw_value()));
    }
    Ok(())
}

/// Push the request into the transmit FIFO and write the transmit length.
pub(crate) fn push_request<F: StreamFifo>(
    fifo: &mut F,
    request: &[u32],
) -> Result<(), TransferError> {
    for (written, word) in request.iter().enumerate() {
        if fifo.tx_vacancy() == 0 {
            return Err(TransferError::TxFifoFull {
                written,
                len: request.len(),
            });
        }
        fifo.tx_write_word(*word);
    }
    fifo.tx_set_len(request.len() * WORD_SIZE_IN_BYTES);
    Ok(())
}

/// Busy-wait until `done` returns true. Returns the configured limit as error if it is
/// exhausted first.
pub(crate) fn spin_until(limit: Option<u32>, mut done: impl FnMut() -> bool) -> Result<(), u32> {
    let mut spins: u32 = 0;
    while !done() {
        if let Some(limit) = limit {
            if spins >= limit {
                return Err(limit);
            }
            spins += 1;
        }
        core::hint::spin_loop();
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use std::collections::VecDeque;

    /// FIFO model which completes a transmission instantly and queues prepared response packets.
    #[derive(Default)]
    pub struct MockFifo {
        pub tx: std::vec::Vec<u32>,
        pub tx_capacity: usize,
        pub tx_len: Option<usize>,
        pub rx_packets: VecDeque<std::vec::Vec<u32>>,
        pub current: VecDeque<u32>,
        pub status: u32,
        pub enabled: u32,
        pub clears: std::vec::Vec<u32>,
        /// Deliver the response packets only after this many occupancy polls.
        pub rx_delay: usize,
    }

    impl MockFifo {
        pub fn with_response(packets: &[&[u32]]) -> Self {
            Self {
                tx_capacity: 1024,
                rx_packets: packets.iter().map(|p| p.to_vec()).collect(),
                ..Default::default()
            }
        }

        pub fn raise(&mut self, status: InterruptStatus) {
            self.status |= status.raw_value();
        }
    }

    impl StreamFifo for MockFifo {
        fn tx_vacancy(&mut self) -> usize {
            self.tx_capacity - self.tx.len()
        }

        fn tx_write_word(&mut self, word: u32) {
            self.tx.push(word);
        }

        fn tx_set_len(&mut self, bytes: usize) {
            self.tx_len = Some(bytes);
            self.raise(InterruptStatus::TRANSMIT_COMPLETE);
            if !self.rx_packets.is_empty() {
                self.raise(InterruptStatus::RECEIVE_COMPLETE);
            }
        }

        fn rx_occupancy(&mut self) -> usize {
            if self.rx_delay > 0 {
                self.rx_delay -= 1;
                return 0;
            }
            self.current.len() + self.rx_packets.iter().map(|p| p.len()).sum::<usize>()
        }

        fn rx_len(&mut self) -> usize {
            let packet = self.rx_packets.pop_front().unwrap_or_default();
            let len = packet.len() * WORD_SIZE_IN_BYTES;
            self.current.extend(packet);
            len
        }

        fn rx_read_word(&mut self) -> u32 {
            self.current.pop_front().unwrap_or(0)
        }

        fn pending(&mut self) -> InterruptStatus {
            InterruptStatus::new_with_raw_value(self.status)
        }

        fn clear(&mut self, status: InterruptStatus) {
            self.clears.push(status.raw_value());
            self.status &= !status.raw_value();
        }

        fn enable_interrupts(&mut self, mask: InterruptStatus) {
            self.enabled |= mask.raw_value();
        }
    }

    #[test]
    fn test_interrupt_status_bits() {
        assert_eq!(InterruptStatus::TRANSMIT_COMPLETE.raw_value(), 0x0800_0000);
        assert_eq!(InterruptStatus::RECEIVE_COMPLETE.raw_value(), 0x0400_0000);
        assert_eq!(InterruptStatus::COMPLETION.raw_value(), 0x0c00_0000);
        assert!(InterruptStatus::DEFAULT.is_empty());
        let unknown = InterruptStatus::new_with_raw_value(1 << 31);
        assert!(!unknown.transmit_complete());
        assert!(!unknown.receive_complete());
        assert!(!unknown.is_empty());
    }

    #[test]
    fn test_push_request() {
        let mut fifo = MockFifo::with_response(&[]);
        push_request(&mut fifo, &[1, 2, 3]).unwrap();
        assert_eq!(fifo.tx, [1, 2, 3]);
        assert_eq!(fifo.tx_len, Some(12));
    }

    #[test]
    fn test_push_request_full() {
        let mut fifo = MockFifo::with_response(&[]);
        fifo.tx_capacity = 2;
        assert_eq!(
            push_request(&mut fifo, &[1, 2, 3]),
            Err(TransferError::TxFifoFull { written: 2, len: 3 })
        );
        // Transmission is never started for a partial request.
        assert_eq!(fifo.tx_len, None);
    }

    #[test]
    fn test_reset_check() {
        let mut fifo = MockFifo::with_response(&[]);
        fifo.status = 0xffff_ffff;
        assert!(check_fifo_reset(&mut fifo).is_ok());
        assert_eq!(fifo.clears, [0xffff_ffff]);
    }

    struct StuckFifo(MockFifo);

    impl StreamFifo for StuckFifo {
        fn tx_vacancy(&mut self) -> usize {
            self.0.tx_vacancy()
        }
        fn tx_write_word(&mut self, word: u32) {
            self.0.tx_write_word(word)
        }
        fn tx_set_len(&mut self, bytes: usize) {
            self.0.tx_set_len(bytes)
        }
        fn rx_occupancy(&mut self) -> usize {
            self.0.rx_occupancy()
        }
        fn rx_len(&mut self) -> usize {
            self.0.rx_len()
        }
        fn rx_read_word(&mut self) -> u32 {
            self.0.rx_read_word()
        }
        fn pending(&mut self) -> InterruptStatus {
            InterruptStatus::new_with_raw_value(0x8000_0000)
        }
        fn clear(&mut self, _status: InterruptStatus) {}
        fn enable_interrupts(&mut self, mask: InterruptStatus) {
            self.0.enable_interrupts(mask)
        }
    }

    #[test]
    fn test_reset_check_fails() {
        let mut fifo = StuckFifo(MockFifo::with_response(&[]));
        assert_eq!(
            check_fifo_reset(&mut fifo),
            Err(InitError::ResetStatus(0x8000_0000))
        );
    }

    #[test]
    fn test_spin_until() {
        let mut calls = 0;
        assert_eq!(
            spin_until(Some(3), || {
                calls += 1;
                false
            }),
            Err(3)
        );
        assert_eq!(calls, 4);
        let mut countdown = 5;
        assert!(
            spin_until(None, || {
                countdown -= 1;
                countdown == 0
            })
            .is_ok()
        );
    }
}
