//! Lab variant dimensions and session configuration.
use crate::{
    egress::DelimiterStyle, ingest::InvalidBytePolicy, matrix::Dims, reference::Activation,
};

/// Default number of occupancy polls before a polled receive gives up.
pub const DEFAULT_RX_TIMEOUT: u32 = 1 << 20;

/// Matrix dimensions of one lab variant, in token order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Input features.
    pub a: Dims,
    /// Weights of the first (or only) layer.
    pub b: Dims,
    /// Weights of the output layer of the two-layer variant.
    pub c: Option<Dims>,
}

impl Layout {
    /// 2x2 times 2x1 product computed in software only.
    pub const LAB2: Layout = Layout::new(Dims::new(2, 2), Dims::new(2, 1), None);
    /// 64x8 times 8x1 product. 520 words in, 64 words out.
    pub const MATMUL: Layout = Layout::new(Dims::new(64, 8), Dims::new(8, 1), None);
    /// 64 datapoints with 7 features, 2 hidden neurons and 1 output neuron. The first row of B and
    /// the first element of C are the bias terms. 467 words in, 64 words out.
    pub const MLP: Layout = Layout::new(
        Dims::new(64, 7),
        Dims::new(8, 2),
        Some(Dims::new(3, 1)),
    );

    #[inline]
    pub const fn new(a: Dims, b: Dims, c: Option<Dims>) -> Self {
        Self { a, b, c }
    }

    /// Number of request words sent to the coprocessor per test vector.
    pub const fn input_words(&self) -> usize {
        let c_len = match self.c {
            Some(c) => c.len(),
            None => 0,
        };
        self.a.len() + self.b.len() + c_len
    }

    /// Number of result words per test vector, one per row of A.
    #[inline]
    pub const fn output_words(&self) -> usize {
        self.a.rows
    }

    /// Default reference model for this layout.
    pub const fn model(&self) -> Model {
        match self.c {
            Some(_) => Model::TwoLayer {
                activation: Activation::Linear,
            },
            None => Model::SingleLayer,
        }
    }
}

/// Reference computation matching the coprocessor of the variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Model {
    /// `(A * B) >> 8`
    SingleLayer,
    /// Input, hidden and output layer perceptron.
    TwoLayer { activation: Activation },
}

/// Configuration of one lab session.
#[derive(Debug, Copy, Clone)]
pub struct LabConfig {
    layout: Layout,
    model: Model,
    delimiter: DelimiterStyle,
    invalid_bytes: InvalidBytePolicy,
    rx_timeout: u32,
    spin_limit: Option<u32>,
    test_vectors: usize,
    packets_per_vector: u32,
}

impl LabConfig {
    /// Configuration with the defaults of the lab firmware for the given layout.
    pub const fn new(layout: Layout) -> Self {
        Self {
            layout,
            model: layout.model(),
            delimiter: DelimiterStyle::NewlinePerElement,
            invalid_bytes: InvalidBytePolicy::Skip,
            rx_timeout: DEFAULT_RX_TIMEOUT,
            spin_limit: None,
            test_vectors: 1,
            packets_per_vector: 1,
        }
    }

    #[inline]
    pub const fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    #[inline]
    pub const fn with_delimiter(mut self, delimiter: DelimiterStyle) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[inline]
    pub const fn with_invalid_bytes(mut self, policy: InvalidBytePolicy) -> Self {
        self.invalid_bytes = policy;
        self
    }

    #[inline]
    pub const fn with_rx_timeout(mut self, polls: u32) -> Self {
        self.rx_timeout = polls;
        self
    }

    /// Bound the completion spin loops of the event-driven transfer policy and the DMA
    /// transfer policy. `None` spins forever.
    #[inline]
    pub const fn with_spin_limit(mut self, spins: Option<u32>) -> Self {
        self.spin_limit = spins;
        self
    }

    #[inline]
    pub const fn with_test_vectors(mut self, count: usize) -> Self {
        self.test_vectors = count;
        self
    }

    #[inline]
    pub const fn with_packets_per_vector(mut self, packets: u32) -> Self {
        self.packets_per_vector = packets;
        self
    }

    #[inline]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub const fn model(&self) -> Model {
        self.model
    }

    #[inline]
    pub const fn delimiter(&self) -> DelimiterStyle {
        self.delimiter
    }

    #[inline]
    pub const fn invalid_bytes(&self) -> InvalidBytePolicy {
        self.invalid_bytes
    }

    #[inline]
    pub const fn rx_timeout(&self) -> u32 {
        self.rx_timeout
    }

    #[inline]
    pub const fn spin_limit(&self) -> Option<u32> {
        self.spin_limit
    }

    #[inline]
    pub const fn test_vectors(&self) -> usize {
        self.test_vectors
    }

    #[inline]
    pub const fn packets_per_vector(&self) -> u32 {
        self.packets_per_vector
    }
}
