//! Decimal ASCII ingestion of the input matrices.
//!
//! The matrices arrive as a CSV-like byte stream: decimal tokens separated by `,` or `\n`. The
//! stream carries no length prefix or sentinel. Ingestion stops once the element count of the
//! [Layout] has been received, and the running element count decides whether an element belongs
//! to A, B or C.
//!
//! The input file must use Unix line endings and must end with a newline. Otherwise the last
//! token is never finalized.
use heapless::Vec;

use crate::{
    MAX_INPUT_WORDS,
    layout::Layout,
    matrix::{CapacityError, Matrix},
};

pub const NEW_LINE: u8 = b'\n';
pub const COMMA: u8 = b',';

/// A token holds at most three decimal digits, which covers 0 to 255.
pub const MAX_TOKEN_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid input byte {0:#04x}")]
    InvalidByte(u8),
    #[error("token has more than three digits")]
    TokenTooLong,
    #[error("value {0} does not fit into 8 bits")]
    ValueOutOfRange(u16),
    #[error("byte stream ended after {received} of {expected} elements")]
    Truncated { received: usize, expected: usize },
    #[error("serial read error: {0:?}")]
    Serial(embedded_hal_nb::serial::ErrorKind),
    #[error("matrix capacity: {0}")]
    Capacity(#[from] CapacityError),
}

/// Handling of bytes which are neither digits nor delimiters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InvalidBytePolicy {
    /// Log the byte and drop it. Digits on either side of it keep accumulating into the same
    /// token.
    #[default]
    Skip,
    /// Abort ingestion with [ParseError::InvalidByte].
    Reject,
}

/// Matrix an element was routed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    A,
    B,
    C,
}

/// Digits of the token which is currently being received.
#[derive(Debug, Default)]
pub struct TokenAccumulator {
    digits: Vec<u8, MAX_TOKEN_DIGITS>,
}

impl TokenAccumulator {
    pub const fn new() -> Self {
        Self { digits: Vec::new() }
    }

    /// Append an ASCII digit.
    pub fn push_digit(&mut self, ascii: u8) -> Result<(), ParseError> {
        if !ascii.is_ascii_digit() {
            return Err(ParseError::InvalidByte(ascii));
        }
        self.digits
            .push(ascii - b'0')
            .map_err(|_| ParseError::TokenTooLong)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Convert the accumulated digits with a positional value summation and reset the
    /// accumulator. An empty token has the value 0.
    pub fn finalize(&mut self) -> Result<u8, ParseError> {
        // Tail to head: the last digit received is the ones digit.
        let value = self
            .digits
            .iter()
            .rev()
            .enumerate()
            .fold(0u16, |sum, (position, digit)| {
                sum + *digit as u16 * place_value(position)
            });
        self.digits.clear();
        u8::try_from(value).map_err(|_| ParseError::ValueOutOfRange(value))
    }
}

#[inline]
const fn place_value(position: usize) -> u16 {
    match position {
        0 => 1,
        1 => 10,
        _ => 100,
    }
}

/// Outcome of feeding one byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Byte was consumed, no element finalized.
    Pending,
    /// A delimiter finalized an element. Every delimiter does, even without digits before it.
    Element { target: Target, value: u8 },
    /// All elements have been received. Further bytes are ignored.
    Complete,
}

/// Byte-at-a-time parser which fills the matrices of a [Layout].
#[derive(Debug)]
pub struct Ingestor {
    layout: Layout,
    policy: InvalidBytePolicy,
    token: TokenAccumulator,
    received: usize,
    invalid_bytes: usize,
    a: Matrix,
    b: Matrix,
    c: Option<Matrix>,
}

impl Ingestor {
    pub fn new(layout: Layout, policy: InvalidBytePolicy) -> Result<Self, ParseError> {
        Ok(Self {
            layout,
            policy,
            token: TokenAccumulator::new(),
            received: 0,
            invalid_bytes: 0,
            a: Matrix::new(layout.a)?,
            b: Matrix::new(layout.b)?,
            c: match layout.c {
                Some(dims) => Some(Matrix::new(dims)?),
                None => None,
            },
        })
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.received == self.layout.input_words()
    }

    /// Elements received so far.
    #[inline]
    pub fn received(&self) -> usize {
        self.received
    }

    /// Bytes which were skipped because they were neither digits nor delimiters.
    #[inline]
    pub fn invalid_bytes(&self) -> usize {
        self.invalid_bytes
    }

    pub fn feed(&mut self, byte: u8) -> Result<Feed, ParseError> {
        if self.is_complete() {
            return Ok(Feed::Complete);
        }
        match byte {
            b'0'..=b'9' => {
                self.token.push_digit(byte)?;
                Ok(Feed::Pending)
            }
            NEW_LINE | COMMA => {
                let value = self.token.finalize()?;
                let target = self.store(value)?;
                Ok(Feed::Element { target, value })
            }
            _ => match self.policy {
                InvalidBytePolicy::Skip => {
                    log::warn!("detected invalid character {:#04x}, skipping", byte);
                    self.invalid_bytes += 1;
                    Ok(Feed::Pending)
                }
                InvalidBytePolicy::Reject => {
                    self.token.clear();
                    Err(ParseError::InvalidByte(byte))
                }
            },
        }
    }

    fn store(&mut self, value: u8) -> Result<Target, ParseError> {
        let a_len = self.layout.a.len();
        let b_len = self.layout.b.len();
        let target = if self.received < a_len {
            self.a.push(value)?;
            Target::A
        } else if self.received < a_len + b_len {
            self.b.push(value)?;
            Target::B
        } else {
            self.c.as_mut().ok_or(CapacityError::Full)?.push(value)?;
            Target::C
        };
        self.received += 1;
        Ok(target)
    }

    /// Hand out the filled matrices.
    pub fn finish(self) -> Result<Ingested, ParseError> {
        if !self.is_complete() {
            return Err(ParseError::Truncated {
                received: self.received,
                expected: self.layout.input_words(),
            });
        }
        Ok(Ingested {
            layout: self.layout,
            a: self.a,
            b: self.b,
            c: self.c,
        })
    }
}

/// Completely filled input matrices of one lab variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    layout: Layout,
    a: Matrix,
    b: Matrix,
    c: Option<Matrix>,
}

impl Ingested {
    /// Split a flat element sequence in token order into the matrices of the layout.
    pub fn from_elements(layout: Layout, elements: &[u8]) -> Result<Self, CapacityError> {
        if elements.len() != layout.input_words() {
            return Err(CapacityError::LengthMismatch {
                expected: layout.input_words(),
                actual: elements.len(),
            });
        }
        let (a, rest) = elements.split_at(layout.a.len());
        let (b, c) = rest.split_at(layout.b.len());
        Ok(Self {
            layout,
            a: Matrix::from_slice(layout.a, a)?,
            b: Matrix::from_slice(layout.b, b)?,
            c: match layout.c {
                Some(dims) => Some(Matrix::from_slice(dims, c)?),
                None => None,
            },
        })
    }

    #[inline]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub const fn a(&self) -> &Matrix {
        &self.a
    }

    #[inline]
    pub const fn b(&self) -> &Matrix {
        &self.b
    }

    #[inline]
    pub const fn c(&self) -> Option<&Matrix> {
        self.c.as_ref()
    }

    /// Concatenate A, B and C into the request buffer which is streamed to the coprocessor,
    /// one element per 32-bit word.
    pub fn request_words(&self) -> Result<Vec<u32, MAX_INPUT_WORDS>, CapacityError> {
        let mut words = Vec::new();
        let c = self.c.as_ref().map(|c| c.as_slice()).unwrap_or(&[]);
        for element in self.a.as_slice().iter().chain(self.b.as_slice()).chain(c) {
            words
                .push(*element as u32)
                .map_err(|_| CapacityError::TooLarge {
                    rows: self.layout.input_words(),
                    cols: 1,
                    capacity: MAX_INPUT_WORDS,
                })?;
        }
        Ok(words)
    }
}

/// Ingest the matrices from an in-memory byte stream.
pub fn ingest_slice(
    layout: Layout,
    policy: InvalidBytePolicy,
    bytes: &[u8],
) -> Result<Ingested, ParseError> {
    let mut ingestor = Ingestor::new(layout, policy)?;
    for byte in bytes {
        if ingestor.feed(*byte)? == Feed::Complete {
            break;
        }
    }
    ingestor.finish()
}

/// Ingest the matrices from a serial receiver, busy-waiting for every byte.
///
/// Returns once the element count of the layout has been received.
pub fn ingest_serial<Rx: embedded_hal_nb::serial::Read<u8>>(
    rx: &mut Rx,
    layout: Layout,
    policy: InvalidBytePolicy,
) -> Result<Ingested, ParseError> {
    use embedded_hal_nb::serial::Error as _;

    let mut ingestor = Ingestor::new(layout, policy)?;
    while !ingestor.is_complete() {
        let byte = nb::block!(rx.read()).map_err(|e| ParseError::Serial(e.kind()))?;
        ingestor.feed(byte)?;
    }
    log::debug!(
        "received {} elements, skipped {} invalid bytes",
        ingestor.received(),
        ingestor.invalid_bytes()
    );
    ingestor.finish()
}
