//! Polled AXI DMA transfers in simple transfer mode.
use crate::error::InitError;

use super::{DmaEngine, Direction, Policy, TransferChannel, TransferError, spin_until};

/// DMA channel which polls the channel busy flags.
///
/// The receive channel is only armed after the transmit channel went idle, so the coprocessor
/// holds its result in the stream until then.
pub struct DmaChannel<D> {
    dma: D,
    spin_limit: Option<u32>,
}

impl<D: DmaEngine> DmaChannel<D> {
    pub fn new(dma: D, spin_limit: Option<u32>) -> Result<Self, InitError> {
        if dma.has_scatter_gather() {
            log::error!("DMA configured for scatter-gather");
            return Err(InitError::ScatterGatherConfigured);
        }
        Ok(Self { dma, spin_limit })
    }

    #[inline]
    pub fn release(self) -> D {
        self.dma
    }

    fn wait_idle(&mut self, direction: Direction) -> Result<(), TransferError> {
        let dma = &mut self.dma;
        spin_until(self.spin_limit, || !dma.is_busy(direction))
            .map_err(TransferError::CompletionTimeout)
    }
}

impl<D: DmaEngine> TransferChannel for DmaChannel<D> {
    #[inline]
    fn policy(&self) -> Policy {
        Policy::DmaPolling
    }

    fn send(&mut self, request: &[u32]) -> Result<(), TransferError> {
        self.dma.start_to_device(request)
    }

    fn wait_transmit_complete(&mut self) -> Result<(), TransferError> {
        self.wait_idle(Direction::ToDevice)
    }

    fn receive(&mut self, response: &mut [u32]) -> Result<usize, TransferError> {
        self.dma.start_from_device(response.len())?;
        self.wait_idle(Direction::FromDevice)?;
        let received = self.dma.complete_from_device(response);
        if received != response.len() {
            return Err(TransferError::ResponseLength {
                received,
                expected: response.len(),
            });
        }
        Ok(received)
    }
}
