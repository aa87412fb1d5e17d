//! Decimal ASCII serialization of the result buffer.
//!
//! Each result is written as 1 to 4 decimal digits. The serial transmitter signals a full FIFO
//! with [nb::Error::WouldBlock], and every byte waits until the transmitter accepts it.
use embedded_hal_nb::serial::{Error as _, ErrorKind};

use crate::ingest::{COMMA, NEW_LINE};

/// Largest value the serializer emits. Results of the lab coprocessors stay below 2048.
pub const MAX_RESULT_VALUE: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("value {0} needs more than 4 decimal digits")]
    ValueTooWide(u32),
    #[error("serial write error: {0:?}")]
    Serial(ErrorKind),
    #[error("output buffer is full")]
    BufferFull,
}

/// Delimiters emitted between and after the results.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DelimiterStyle {
    /// A newline after every element.
    #[default]
    NewlinePerElement,
    /// A comma between elements, none after the last element, then one newline.
    CommaSeparated,
}

/// Decimal representation of one result value.
#[derive(Debug, Copy, Clone)]
pub struct DecimalDigits {
    buf: [u8; 4],
    start: usize,
}

impl DecimalDigits {
    pub fn new(value: u32) -> Result<Self, SerializeError> {
        if value > MAX_RESULT_VALUE {
            return Err(SerializeError::ValueTooWide(value));
        }
        let mut buf = [b'0'; 4];
        let mut start = buf.len();
        let mut remaining = value;
        loop {
            start -= 1;
            buf[start] = b'0' + (remaining % 10) as u8;
            remaining /= 10;
            if remaining == 0 {
                break;
            }
        }
        Ok(Self { buf, start })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

fn for_each_byte<E: From<SerializeError>>(
    results: &[u32],
    style: DelimiterStyle,
    mut emit: impl FnMut(u8) -> Result<(), E>,
) -> Result<(), E> {
    for (idx, value) in results.iter().enumerate() {
        for byte in DecimalDigits::new(*value)?.as_bytes() {
            emit(*byte)?;
        }
        match style {
            DelimiterStyle::NewlinePerElement => emit(NEW_LINE)?,
            DelimiterStyle::CommaSeparated if idx + 1 < results.len() => emit(COMMA)?,
            DelimiterStyle::CommaSeparated => (),
        }
    }
    if style == DelimiterStyle::CommaSeparated {
        emit(NEW_LINE)?;
    }
    Ok(())
}

/// Write all results to a serial transmitter and flush it. Returns the number of bytes written.
pub fn write_results<Tx: embedded_hal_nb::serial::Write<u8>>(
    tx: &mut Tx,
    results: &[u32],
    style: DelimiterStyle,
) -> Result<usize, SerializeError> {
    let mut written = 0;
    for_each_byte(results, style, |byte| {
        nb::block!(tx.write(byte)).map_err(|e| SerializeError::Serial(e.kind()))?;
        written += 1;
        Ok::<(), SerializeError>(())
    })?;
    nb::block!(tx.flush()).map_err(|e| SerializeError::Serial(e.kind()))?;
    Ok(written)
}

/// Serialize all results into a buffer.
pub fn encode_results<const N: usize>(
    results: &[u32],
    style: DelimiterStyle,
    out: &mut heapless::Vec<u8, N>,
) -> Result<(), SerializeError> {
    for_each_byte(results, style, |byte| {
        out.push(byte).map_err(|_| SerializeError::BufferFull)
    })
}
