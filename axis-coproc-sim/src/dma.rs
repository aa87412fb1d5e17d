//! Simulated AXI DMA in simple transfer mode.
use std::collections::VecDeque;

use axis_coproc::transfer::{Direction, DmaEngine, TransferError};

use crate::coprocessor::SoftCoprocessor;

/// DMA engine with the coprocessor between its MM2S and S2MM channels.
///
/// A started channel reports busy for a fixed number of status polls. The receive channel stays
/// busy for as long as the coprocessor has not produced the armed number of words.
pub struct SimDma {
    coprocessor: SoftCoprocessor,
    scatter_gather: bool,
    busy_polls: u32,
    remaining: [u32; 2],
    stream: VecDeque<u32>,
    armed: Option<usize>,
}

impl SimDma {
    pub fn new(coprocessor: SoftCoprocessor, busy_polls: u32) -> Self {
        Self {
            coprocessor,
            scatter_gather: false,
            busy_polls,
            remaining: [0; 2],
            stream: VecDeque::new(),
            armed: None,
        }
    }

    /// Report the scatter-gather engine as present.
    pub fn with_scatter_gather(mut self) -> Self {
        self.scatter_gather = true;
        self
    }

    fn remaining(&mut self, direction: Direction) -> &mut u32 {
        &mut self.remaining[direction.raw_value().value() as usize]
    }
}

impl DmaEngine for SimDma {
    fn has_scatter_gather(&self) -> bool {
        self.scatter_gather
    }

    fn start_to_device(&mut self, words: &[u32]) -> Result<(), TransferError> {
        if *self.remaining(Direction::ToDevice) > 0 {
            return Err(TransferError::DmaRejected(Direction::ToDevice));
        }
        match self.coprocessor.process(words) {
            Ok(result) => self.stream.extend(result),
            Err(e) => log::warn!("coprocessor dropped request: {e}"),
        }
        *self.remaining(Direction::ToDevice) = self.busy_polls;
        Ok(())
    }

    fn start_from_device(&mut self, words: usize) -> Result<(), TransferError> {
        if self.armed.is_some() {
            return Err(TransferError::DmaRejected(Direction::FromDevice));
        }
        self.armed = Some(words);
        *self.remaining(Direction::FromDevice) = self.busy_polls;
        Ok(())
    }

    fn is_busy(&mut self, direction: Direction) -> bool {
        if direction == Direction::FromDevice {
            match self.armed {
                Some(words) if self.stream.len() < words => return true,
                None => return false,
                _ => (),
            }
        }
        let remaining = self.remaining(direction);
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }

    fn complete_from_device(&mut self, buf: &mut [u32]) -> usize {
        let armed = self.armed.take().unwrap_or(0);
        let len = armed.min(buf.len()).min(self.stream.len());
        for (slot, word) in buf.iter_mut().zip(self.stream.drain(..len)) {
            *slot = word;
        }
        len
    }
}
