//! Polled AXI-Stream FIFO transfers.
use crate::{WORD_SIZE_IN_BYTES, error::InitError};

use super::{
    InterruptStatus, Policy, StreamFifo, TransferChannel, TransferError, check_fifo_reset,
    push_request,
};

/// FIFO channel which waits for the transmit and receive status by polling.
///
/// Waiting for the transmission has no timeout. Waiting for response data is bounded by the
/// configured number of occupancy polls, see [crate::layout::DEFAULT_RX_TIMEOUT].
pub struct PollingFifo<F> {
    fifo: F,
    rx_timeout: u32,
}

impl<F: StreamFifo> PollingFifo<F> {
    pub fn new(mut fifo: F, rx_timeout: u32) -> Result<Self, InitError> {
        check_fifo_reset(&mut fifo)?;
        Ok(Self { fifo, rx_timeout })
    }

    #[inline]
    pub fn fifo(&mut self) -> &mut F {
        &mut self.fifo
    }

    #[inline]
    pub fn release(self) -> F {
        self.fifo
    }

    fn wait_for_data(&mut self) -> Result<(), TransferError> {
        let mut polls = 0;
        while self.fifo.rx_occupancy() == 0 {
            polls += 1;
            if polls >= self.rx_timeout {
                log::error!("timeout while waiting for response data");
                return Err(TransferError::RxTimeout(self.rx_timeout));
            }
        }
        Ok(())
    }
}

impl<F: StreamFifo> TransferChannel for PollingFifo<F> {
    #[inline]
    fn policy(&self) -> Policy {
        Policy::FifoPolling
    }

    fn send(&mut self, request: &[u32]) -> Result<(), TransferError> {
        push_request(&mut self.fifo, request)
    }

    fn wait_transmit_complete(&mut self) -> Result<(), TransferError> {
        while !self.fifo.is_tx_done() {
            core::hint::spin_loop();
        }
        self.fifo.clear(InterruptStatus::TRANSMIT_COMPLETE);
        Ok(())
    }

    fn receive(&mut self, response: &mut [u32]) -> Result<usize, TransferError> {
        let capacity = response.len();
        let mut received = 0;
        while received < capacity {
            self.wait_for_data()?;
            let words = self.fifo.rx_len() / WORD_SIZE_IN_BYTES;
            let slots = response
                .get_mut(received..received + words)
                .ok_or(TransferError::ResponseOverflow { capacity })?;
            for slot in slots {
                *slot = self.fifo.rx_read_word();
            }
            received += words;
        }
        if !self.fifo.is_rx_done() {
            return Err(TransferError::RxIncomplete);
        }
        self.fifo.clear(InterruptStatus::RECEIVE_COMPLETE);
        Ok(received)
    }
}
