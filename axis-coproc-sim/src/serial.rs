//! Byte stream stand-in for the PS UART.
use std::collections::VecDeque;

use embedded_hal_nb::serial::{ErrorKind, ErrorType, Read, Write};

/// Serial port which reads from a prepared input buffer and records everything written.
///
/// Every `stall_every`-th read or write reports [nb::Error::WouldBlock] first, like a UART whose
/// FIFO is momentarily empty or full. Reading past the end of the input fails with
/// [ErrorKind::Other].
#[derive(Debug, Default)]
pub struct SerialLoopback {
    input: VecDeque<u8>,
    output: Vec<u8>,
    stall_every: Option<usize>,
    calls: usize,
    stalls: usize,
}

impl SerialLoopback {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into().into(),
            ..Default::default()
        }
    }

    pub fn with_stall_every(mut self, calls: usize) -> Self {
        self.stall_every = Some(calls.max(1));
        self
    }

    #[inline]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Number of [nb::Error::WouldBlock] results handed out so far.
    #[inline]
    pub fn stalls(&self) -> usize {
        self.stalls
    }

    fn stall(&mut self) -> bool {
        let Some(every) = self.stall_every else {
            return false;
        };
        self.calls += 1;
        if self.calls % every == 0 {
            self.stalls += 1;
            return true;
        }
        false
    }
}

impl ErrorType for SerialLoopback {
    type Error = ErrorKind;
}

impl Read<u8> for SerialLoopback {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.stall() {
            return Err(nb::Error::WouldBlock);
        }
        self.input
            .pop_front()
            .ok_or(nb::Error::Other(ErrorKind::Other))
    }
}

impl Write<u8> for SerialLoopback {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.stall() {
            return Err(nb::Error::WouldBlock);
        }
        self.output.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
