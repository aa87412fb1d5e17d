//! Software reference pipeline.
//!
//! Computes the same results as the coprocessor IP so that the hardware response can be
//! verified. All elements are 8-bit unsigned fixed-point values with [FRACTIONAL_BITS]
//! fractional bits, so every product is rescaled with a right shift by 8 after accumulation.
use crate::{
    ingest::Ingested,
    layout::Model,
    matrix::{IndexError, Matrix},
};

/// Number of fractional bits of all operands.
pub const FRACTIONAL_BITS: u32 = 8;

/// Hidden layer width of the two-layer perceptron.
pub const HIDDEN_NEURONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("A has {a_cols} columns but the weights expect {expected}")]
    InnerDimension { a_cols: usize, expected: usize },
    #[error("weights are {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    WeightShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
    #[error("result buffer holds {actual} elements, {expected} required")]
    ResultLength { expected: usize, actual: usize },
    #[error("two-layer model requires output layer weights")]
    MissingOutputLayer,
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Activation applied to the hidden layer neurons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Activation {
    /// The neuron value is passed on unchanged. The shipped coprocessor uses this.
    #[default]
    Linear,
    /// The neuron value is mapped through [SIGMOID_LUT].
    Sigmoid,
}

impl Activation {
    #[inline]
    pub const fn apply(&self, neuron: u8) -> u8 {
        match self {
            Activation::Linear => neuron,
            Activation::Sigmoid => sigmoid(neuron),
        }
    }
}

/// Quantized sigmoid. Index `i` encodes the pre-activation `(i - 128) * 3 / 128`, an entry is
/// `floor(256 * sigmoid(x))`.
pub const SIGMOID_LUT: [u8; 256] = [
    12, 12, 12, 12, 13, 13, 13, 14, 14, 14, 15, 15, 15, 16, 16, 16, //
    17, 17, 18, 18, 18, 19, 19, 20, 20, 21, 21, 21, 22, 22, 23, 23, //
    24, 24, 25, 26, 26, 27, 27, 28, 28, 29, 30, 30, 31, 32, 32, 33, //
    34, 34, 35, 36, 36, 37, 38, 39, 39, 40, 41, 42, 43, 44, 44, 45, //
    46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, //
    62, 63, 64, 66, 67, 68, 69, 70, 72, 73, 74, 75, 76, 78, 79, 80, //
    82, 83, 84, 86, 87, 88, 90, 91, 92, 94, 95, 97, 98, 99, 101, 102, //
    104, 105, 107, 108, 110, 111, 113, 114, 116, 117, 119, 120, 122, 123, 125, 126, //
    128, 129, 130, 132, 133, 135, 136, 138, 139, 141, 142, 144, 145, 147, 148, 150, //
    151, 153, 154, 156, 157, 158, 160, 161, 163, 164, 165, 167, 168, 169, 171, 172, //
    173, 175, 176, 177, 179, 180, 181, 182, 183, 185, 186, 187, 188, 189, 191, 192, //
    193, 194, 195, 196, 197, 198, 199, 200, 201, 202, 203, 204, 205, 206, 207, 208, //
    209, 210, 211, 211, 212, 213, 214, 215, 216, 216, 217, 218, 219, 219, 220, 221, //
    221, 222, 223, 223, 224, 225, 225, 226, 227, 227, 228, 228, 229, 229, 230, 231, //
    231, 232, 232, 233, 233, 234, 234, 234, 235, 235, 236, 236, 237, 237, 237, 238, //
    238, 239, 239, 239, 240, 240, 240, 241, 241, 241, 242, 242, 242, 243, 243, 243, //
];

#[inline]
pub const fn sigmoid(x: u8) -> u8 {
    SIGMOID_LUT[x as usize]
}

/// Recompute a [SIGMOID_LUT] entry in floating point.
pub fn sigmoid_exact(index: u8) -> u8 {
    let x = (index as f64 - 128.0) * 3.0 / 128.0;
    let y = libm::floor(256.0 / (1.0 + libm::exp(-x)));
    if y >= 255.0 { 255 } else { y as u8 }
}

fn check_result_len(out: &[u32], expected: usize) -> Result<(), PipelineError> {
    if out.len() != expected {
        return Err(PipelineError::ResultLength {
            expected,
            actual: out.len(),
        });
    }
    Ok(())
}

/// `out[i] = (sum_j A[i,j] * B[j]) >> 8`
pub fn single_layer(a: &Matrix, b: &Matrix, out: &mut [u32]) -> Result<(), PipelineError> {
    let (a_dims, b_dims) = (a.dims(), b.dims());
    if b_dims.cols != 1 {
        return Err(PipelineError::WeightShape {
            rows: b_dims.rows,
            cols: b_dims.cols,
            expected_rows: a_dims.cols,
            expected_cols: 1,
        });
    }
    if a_dims.cols != b_dims.rows {
        return Err(PipelineError::InnerDimension {
            a_cols: a_dims.cols,
            expected: b_dims.rows,
        });
    }
    check_result_len(out, a_dims.rows)?;
    for (i, result) in out.iter_mut().enumerate() {
        let sum: u32 = a
            .row(i)?
            .iter()
            .zip(b.as_slice())
            .map(|(x, w)| *x as u32 * *w as u32)
            .sum();
        *result = sum >> FRACTIONAL_BITS;
    }
    Ok(())
}

/// Two-layer quantized perceptron with [HIDDEN_NEURONS] hidden neurons and one output neuron.
///
/// The first row of B holds the hidden layer bias terms, row `j + 1` the weights of input
/// feature `j` for every hidden neuron. C holds the output bias followed by one weight per hidden
/// neuron.
///
/// Hidden and output neurons are 8 bits wide like the coprocessor registers, so only the low byte
/// of a rescaled sum is kept.
pub fn two_layer(
    a: &Matrix,
    b: &Matrix,
    c: &Matrix,
    activation: Activation,
    out: &mut [u32],
) -> Result<(), PipelineError> {
    let (a_dims, b_dims, c_dims) = (a.dims(), b.dims(), c.dims());
    if b_dims.cols != HIDDEN_NEURONS {
        return Err(PipelineError::WeightShape {
            rows: b_dims.rows,
            cols: b_dims.cols,
            expected_rows: a_dims.cols + 1,
            expected_cols: HIDDEN_NEURONS,
        });
    }
    if b_dims.rows != a_dims.cols + 1 {
        return Err(PipelineError::InnerDimension {
            a_cols: a_dims.cols,
            expected: b_dims.rows.saturating_sub(1),
        });
    }
    if c_dims.rows != HIDDEN_NEURONS + 1 || c_dims.cols != 1 {
        return Err(PipelineError::WeightShape {
            rows: c_dims.rows,
            cols: c_dims.cols,
            expected_rows: HIDDEN_NEURONS + 1,
            expected_cols: 1,
        });
    }
    check_result_len(out, a_dims.rows)?;

    for (i, result) in out.iter_mut().enumerate() {
        let features = a.row(i)?;
        let mut hidden = [0u8; HIDDEN_NEURONS];
        for (k, neuron) in hidden.iter_mut().enumerate() {
            let mut sum = b.get(0, k)? as u32;
            for (j, feature) in features.iter().enumerate() {
                sum += *feature as u32 * b.get(j + 1, k)? as u32;
            }
            *neuron = activation.apply((sum >> FRACTIONAL_BITS) as u8);
        }
        let mut sum = c.get(0, 0)? as u32;
        for (k, neuron) in hidden.iter().enumerate() {
            sum += *neuron as u32 * c.get(k + 1, 0)? as u32;
        }
        *result = ((sum >> FRACTIONAL_BITS) as u8) as u32;
    }
    Ok(())
}

/// Run the reference model on ingested matrices.
pub fn compute(ingested: &Ingested, model: Model, out: &mut [u32]) -> Result<(), PipelineError> {
    match model {
        Model::SingleLayer => single_layer(ingested.a(), ingested.b(), out),
        Model::TwoLayer { activation } => {
            let c = ingested.c().ok_or(PipelineError::MissingOutputLayer)?;
            two_layer(ingested.a(), ingested.b(), c, activation, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::Layout, matrix::Dims};
    use approx::abs_diff_eq;

    fn matrix(rows: usize, cols: usize, data: &[u8]) -> Matrix {
        Matrix::from_slice(Dims::new(rows, cols), data).unwrap()
    }

    /// Linear congruential generator for test matrices.
    fn fill_pseudo_random(seed: u32, buf: &mut [u8]) {
        let mut state = seed;
        for value in buf.iter_mut() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            *value = (state >> 16) as u8;
        }
    }

    #[test]
    fn test_single_layer_small() {
        let a = matrix(2, 2, &[1, 2, 3, 4]);
        let b = matrix(2, 1, &[5, 6]);
        let mut out = [u32::MAX; 2];
        single_layer(&a, &b, &mut out).unwrap();
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn test_single_layer_max() {
        let a = matrix(1, 2, &[255, 255]);
        let b = matrix(2, 1, &[255, 255]);
        let mut out = [0; 1];
        single_layer(&a, &b, &mut out).unwrap();
        assert_eq!(out, [508]);
    }

    #[test]
    fn test_single_layer_against_naive() {
        let mut a_data = [0u8; 512];
        let mut b_data = [0u8; 8];
        fill_pseudo_random(7, &mut a_data);
        fill_pseudo_random(99, &mut b_data);
        let mut out = [0u32; 64];
        single_layer(
            &matrix(64, 8, &a_data),
            &matrix(8, 1, &b_data),
            &mut out,
        )
        .unwrap();

        for row in 0..64 {
            let mut sum = 0u32;
            for col in 0..8 {
                sum += a_data[row * 8 + col] as u32 * b_data[col] as u32;
            }
            assert_eq!(out[row], sum / 256, "row {}", row);
        }
    }

    #[test]
    fn test_single_layer_shape_errors() {
        let a = matrix(2, 3, &[0; 6]);
        let b = matrix(2, 1, &[0; 2]);
        let mut out = [0; 2];
        assert_eq!(
            single_layer(&a, &b, &mut out),
            Err(PipelineError::InnerDimension {
                a_cols: 3,
                expected: 2
            })
        );
        let a = matrix(2, 2, &[0; 4]);
        let mut short = [0; 1];
        assert_eq!(
            single_layer(&a, &b, &mut short),
            Err(PipelineError::ResultLength {
                expected: 2,
                actual: 1
            })
        );
    }

    fn mlp_weights() -> (Matrix, Matrix) {
        #[rustfmt::skip]
        let b = matrix(8, 2, &[
            10, 20,
            128, 255,
            64, 0,
            0, 0,
            0, 0,
            0, 0,
            0, 0,
            0, 0,
        ]);
        let c = matrix(3, 1, &[30, 200, 10]);
        (b, c)
    }

    #[test]
    fn test_two_layer_zero_input_propagates_bias() {
        let (b, c) = mlp_weights();
        let a = matrix(1, 7, &[0; 7]);
        let mut out = [u32::MAX; 1];
        two_layer(&a, &b, &c, Activation::Linear, &mut out).unwrap();
        let hidden_0 = 10u32 >> 8;
        let hidden_1 = 20u32 >> 8;
        let expected = (hidden_0 * 200 + hidden_1 * 10 + 30) >> 8;
        assert_eq!(out, [expected]);
        assert_eq!(out, [0]);
    }

    #[test]
    fn test_two_layer_linear() {
        let (b, c) = mlp_weights();
        let a = matrix(1, 7, &[200, 100, 0, 0, 0, 0, 0]);
        let mut out = [0; 1];
        two_layer(&a, &b, &c, Activation::Linear, &mut out).unwrap();
        // Hidden: (200*128 + 100*64 + 10) >> 8 = 125, (200*255 + 20) >> 8 = 199
        // Output: (125*200 + 199*10 + 30) >> 8 = 105
        assert_eq!(out, [105]);
    }

    #[test]
    fn test_two_layer_sigmoid() {
        let (b, c) = mlp_weights();
        let a = matrix(1, 7, &[200, 100, 0, 0, 0, 0, 0]);
        let mut out = [0; 1];
        two_layer(&a, &b, &c, Activation::Sigmoid, &mut out).unwrap();
        assert_eq!(sigmoid(125), 123);
        assert_eq!(sigmoid(199), 215);
        // (123*200 + 215*10 + 30) >> 8 = 104
        assert_eq!(out, [104]);
    }

    #[test]
    fn test_two_layer_keeps_low_byte() {
        let b = matrix(8, 2, &[255; 16]);
        let c = matrix(3, 1, &[0, 255, 0]);
        let a = matrix(1, 7, &[255; 7]);
        let mut out = [0; 1];
        two_layer(&a, &b, &c, Activation::Linear, &mut out).unwrap();
        // Hidden sum 455430 >> 8 = 1779, stored as 1779 & 0xff = 243.
        assert_eq!(out, [(243 * 255) >> 8]);
    }

    #[test]
    fn test_two_layer_shape_errors() {
        let (b, c) = mlp_weights();
        let a = matrix(1, 6, &[0; 6]);
        let mut out = [0; 1];
        assert_eq!(
            two_layer(&a, &b, &c, Activation::Linear, &mut out),
            Err(PipelineError::InnerDimension {
                a_cols: 6,
                expected: 7
            })
        );
        let a = matrix(1, 7, &[0; 7]);
        let wide_c = matrix(1, 3, &[0; 3]);
        assert!(matches!(
            two_layer(&a, &b, &wide_c, Activation::Linear, &mut out),
            Err(PipelineError::WeightShape { .. })
        ));
    }

    #[test]
    fn test_compute_requires_output_layer() {
        let ingested = Ingested::from_elements(Layout::LAB2, &[1, 2, 3, 4, 5, 6]).unwrap();
        let mut out = [0; 2];
        assert_eq!(
            compute(
                &ingested,
                Model::TwoLayer {
                    activation: Activation::Linear
                },
                &mut out
            ),
            Err(PipelineError::MissingOutputLayer)
        );
        compute(&ingested, Model::SingleLayer, &mut out).unwrap();
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn test_sigmoid_table() {
        for index in 0..=255u8 {
            assert_eq!(SIGMOID_LUT[index as usize], sigmoid_exact(index), "index {}", index);
        }
        assert_eq!(sigmoid(128), 128);
        assert!(SIGMOID_LUT.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_sigmoid_close_to_logistic() {
        for index in 0..=255u8 {
            let x = (index as f64 - 128.0) * 3.0 / 128.0;
            let logistic = 1.0 / (1.0 + libm::exp(-x));
            assert!(abs_diff_eq!(
                sigmoid(index) as f64 / 256.0,
                logistic,
                epsilon = 1.0 / 256.0
            ));
        }
    }
}
