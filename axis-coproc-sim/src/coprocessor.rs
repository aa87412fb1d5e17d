//! Behavioral model of the HLS coprocessor IP.
use axis_coproc::{
    ingest::Ingested,
    layout::{Layout, Model},
    matrix::CapacityError,
    reference::{self, PipelineError},
    vectors::TestVector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("coprocessor received {actual} words, expects {expected}")]
    RequestLength { actual: usize, expected: usize },
    #[error("coprocessor is stalled")]
    Stalled,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Coprocessor which reads one request packet from its slave stream and writes the results to
/// its master stream.
///
/// Every request word carries one 8-bit element in its low byte. The result is written as one
/// packet by default, with TLAST on the final word. With [Self::with_bursts] the result is split
/// into several packets, each closed by TLAST.
#[derive(Debug, Clone)]
pub struct SoftCoprocessor {
    layout: Layout,
    model: Model,
    bursts: usize,
    corrupt: Option<usize>,
    stalled: bool,
}

impl SoftCoprocessor {
    pub fn new(layout: Layout, model: Model) -> Self {
        Self {
            layout,
            model,
            bursts: 1,
            corrupt: None,
            stalled: false,
        }
    }

    pub fn for_vector(vector: &TestVector) -> Self {
        Self::new(vector.layout, vector.model)
    }

    /// Deliver the result in `bursts` packets. Clamped to one packet per result word.
    pub fn with_bursts(mut self, bursts: usize) -> Self {
        self.bursts = bursts.clamp(1, self.layout.output_words().max(1));
        self
    }

    /// Flip the lowest bit of one result word.
    pub fn with_corrupted_result(mut self, index: usize) -> Self {
        self.corrupt = Some(index);
        self
    }

    /// Consume requests without ever answering.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn bursts(&self) -> usize {
        self.bursts
    }

    /// Compute the result words for one request.
    pub fn process(&self, request: &[u32]) -> Result<Vec<u32>, SimError> {
        if self.stalled {
            return Err(SimError::Stalled);
        }
        if request.len() != self.layout.input_words() {
            return Err(SimError::RequestLength {
                actual: request.len(),
                expected: self.layout.input_words(),
            });
        }
        let elements: Vec<u8> = request.iter().map(|word| *word as u8).collect();
        let ingested = Ingested::from_elements(self.layout, &elements)?;
        let mut result = vec![0; self.layout.output_words()];
        reference::compute(&ingested, self.model, &mut result)?;
        if let Some(word) = self.corrupt.and_then(|index| result.get_mut(index)) {
            *word ^= 1;
        }
        Ok(result)
    }

    /// Split a result into the configured number of packets. Earlier packets are one word longer
    /// if the result does not split evenly.
    pub fn packetize(&self, result: Vec<u32>) -> Vec<Vec<u32>> {
        let base = result.len() / self.bursts;
        let longer = result.len() % self.bursts;
        let mut words = result.into_iter();
        (0..self.bursts)
            .map(|packet| {
                let len = base + usize::from(packet < longer);
                words.by_ref().take(len).collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(vector: &TestVector) -> Vec<u32> {
        vector.input.iter().map(|e| *e as u32).collect()
    }

    #[test]
    fn test_matmul_result() {
        let coprocessor = SoftCoprocessor::for_vector(&TestVector::MATMUL);
        let result = coprocessor.process(&request(&TestVector::MATMUL)).unwrap();
        assert_eq!(result, TestVector::MATMUL.expected);
    }

    #[test]
    fn test_only_low_byte_is_used() {
        let coprocessor = SoftCoprocessor::for_vector(&TestVector::LAB2);
        let request: Vec<u32> = request(&TestVector::LAB2)
            .into_iter()
            .map(|w| w | 0xabcd_0000)
            .collect();
        assert_eq!(
            coprocessor.process(&request).unwrap(),
            TestVector::LAB2.expected
        );
    }

    #[test]
    fn test_wrong_request_length() {
        let coprocessor = SoftCoprocessor::for_vector(&TestVector::LAB2);
        assert_eq!(
            coprocessor.process(&[1, 2, 3]),
            Err(SimError::RequestLength {
                actual: 3,
                expected: 6
            })
        );
        assert_eq!(
            coprocessor.stalled().process(&request(&TestVector::LAB2)),
            Err(SimError::Stalled)
        );
    }

    #[test]
    fn test_corrupted_result() {
        let coprocessor = SoftCoprocessor::for_vector(&TestVector::LAB2).with_corrupted_result(1);
        assert_eq!(
            coprocessor.process(&request(&TestVector::LAB2)).unwrap(),
            [125, 86]
        );
    }

    #[test]
    fn test_packetize() {
        let coprocessor = SoftCoprocessor::for_vector(&TestVector::MATMUL).with_bursts(9);
        let packets = coprocessor.packetize((0..64).collect());
        assert_eq!(packets.len(), 9);
        assert_eq!(packets[0].len(), 8);
        assert_eq!(packets[8].len(), 7);
        assert_eq!(packets.concat(), (0..64).collect::<Vec<u32>>());
        let single = SoftCoprocessor::for_vector(&TestVector::LAB2).with_bursts(10);
        assert_eq!(single.bursts(), 2);
    }
}
