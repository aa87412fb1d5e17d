//! Per test vector transfer sequencing.
use crate::layout::Layout;

use super::{TransferChannel, TransferError};

/// State of the [Handshake].
///
/// `Idle -> Transmitting -> AwaitingCompletion -> Receiving -> Done`, then back to `Idle` for the
/// next test vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Transmitting,
    AwaitingCompletion,
    Receiving,
    Done,
}

/// Drives exactly one outstanding transfer per test vector over a [TransferChannel].
///
/// Errors are fatal: the handshake stays in the state in which the error happened and rejects any
/// further vector with [TransferError::SessionBusy].
pub struct Handshake<C> {
    channel: C,
    state: HandshakeState,
    request_words: usize,
    response_words: usize,
    vectors_done: usize,
}

impl<C: TransferChannel> Handshake<C> {
    /// Handshake with the request and response lengths of a lab layout.
    pub fn new(channel: C, layout: &Layout) -> Self {
        Self::with_lengths(channel, layout.input_words(), layout.output_words())
    }

    pub fn with_lengths(channel: C, request_words: usize, response_words: usize) -> Self {
        Self {
            channel,
            state: HandshakeState::Idle,
            request_words,
            response_words,
            vectors_done: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Number of test vectors which completed.
    #[inline]
    pub fn vectors_done(&self) -> usize {
        self.vectors_done
    }

    #[inline]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    #[inline]
    pub fn release(self) -> C {
        self.channel
    }

    fn transition(&mut self, next: HandshakeState) {
        log::trace!(
            "vector {}: {:?} -> {:?}",
            self.vectors_done,
            self.state,
            next
        );
        self.state = next;
    }

    /// Transfer one test vector. `response` must hold exactly one response.
    pub fn run_vector(
        &mut self,
        request: &[u32],
        response: &mut [u32],
    ) -> Result<usize, TransferError> {
        match self.state {
            HandshakeState::Idle => (),
            HandshakeState::Done => self.transition(HandshakeState::Idle),
            busy => return Err(TransferError::SessionBusy(busy)),
        }
        if request.len() != self.request_words {
            return Err(TransferError::RequestLength {
                actual: request.len(),
                expected: self.request_words,
            });
        }
        if response.len() != self.response_words {
            return Err(TransferError::ResponseLength {
                received: 0,
                expected: self.response_words,
            });
        }

        self.transition(HandshakeState::Transmitting);
        self.channel.send(request)?;
        self.transition(HandshakeState::AwaitingCompletion);
        self.channel.wait_transmit_complete()?;
        self.transition(HandshakeState::Receiving);
        let received = self.channel.receive(response)?;
        self.transition(HandshakeState::Done);
        self.vectors_done += 1;
        log::debug!(
            "vector {} done over {:?}, {} words received",
            self.vectors_done,
            self.channel.policy(),
            received
        );
        Ok(received)
    }

    /// Transfer consecutive test vectors. `requests` and `responses` hold the vectors back to
    /// back. Returns the number of transferred vectors.
    pub fn run_all(
        &mut self,
        requests: &[u32],
        responses: &mut [u32],
    ) -> Result<usize, TransferError> {
        let vectors = requests.len() / self.request_words.max(1);
        if requests.len() != vectors * self.request_words {
            return Err(TransferError::RequestLength {
                actual: requests.len(),
                expected: vectors * self.request_words,
            });
        }
        if responses.len() != vectors * self.response_words {
            return Err(TransferError::ResponseLength {
                received: 0,
                expected: vectors * self.response_words,
            });
        }
        for (request, response) in requests
            .chunks_exact(self.request_words)
            .zip(responses.chunks_exact_mut(self.response_words))
        {
            self.run_vector(request, response)?;
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{PollingFifo, tests::MockFifo};

    fn handshake(packets: &[&[u32]]) -> Handshake<PollingFifo<MockFifo>> {
        let channel = PollingFifo::new(MockFifo::with_response(packets), 32).unwrap();
        Handshake::with_lengths(channel, 2, 3)
    }

    #[test]
    fn test_single_vector() {
        let mut handshake = handshake(&[&[7, 8], &[9]]);
        assert_eq!(handshake.state(), HandshakeState::Idle);
        let mut response = [0; 3];
        assert_eq!(handshake.run_vector(&[1, 2], &mut response), Ok(3));
        assert_eq!(response, [7, 8, 9]);
        assert_eq!(handshake.state(), HandshakeState::Done);
        assert_eq!(handshake.vectors_done(), 1);
    }

    #[test]
    fn test_two_vectors() {
        let mut handshake = handshake(&[&[1, 2, 3], &[4, 5, 6]]);
        let mut responses = [0; 6];
        assert_eq!(handshake.run_all(&[10, 11, 12, 13], &mut responses), Ok(2));
        assert_eq!(responses, [1, 2, 3, 4, 5, 6]);
        assert_eq!(handshake.vectors_done(), 2);
        assert_eq!(handshake.release().release().tx, [10, 11, 12, 13]);
    }

    #[test]
    fn test_length_checks() {
        let mut handshake = handshake(&[]);
        let mut response = [0; 3];
        assert_eq!(
            handshake.run_vector(&[1], &mut response),
            Err(TransferError::RequestLength {
                actual: 1,
                expected: 2
            })
        );
        let mut short = [0; 2];
        assert!(matches!(
            handshake.run_vector(&[1, 2], &mut short),
            Err(TransferError::ResponseLength { expected: 3, .. })
        ));
        let mut responses = [0; 6];
        assert!(matches!(
            handshake.run_all(&[1, 2, 3], &mut responses),
            Err(TransferError::RequestLength { .. })
        ));
        assert_eq!(handshake.state(), HandshakeState::Idle);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut handshake = handshake(&[]);
        let mut response = [0; 3];
        assert_eq!(
            handshake.run_vector(&[1, 2], &mut response),
            Err(TransferError::RxTimeout(32))
        );
        assert_eq!(handshake.state(), HandshakeState::Receiving);
        assert_eq!(
            handshake.run_vector(&[1, 2], &mut response),
            Err(TransferError::SessionBusy(HandshakeState::Receiving))
        );
        assert_eq!(handshake.vectors_done(), 0);
    }
}
