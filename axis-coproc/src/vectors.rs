//! Embedded test vectors with their expected coprocessor results.
//!
//! The matrix multiply vector is the one shipped with the FIFO and DMA labs. The MLP vector
//! reuses its first seven features per datapoint with a fixed set of quantized weights.
use crate::{
    layout::{Layout, Model},
    reference::Activation,
};

/// Input elements of one test vector in token order together with the expected results.
#[derive(Debug, Copy, Clone)]
pub struct TestVector {
    pub name: &'static str,
    pub layout: Layout,
    pub model: Model,
    pub input: &'static [u8],
    pub expected: &'static [u32],
}

impl TestVector {
    pub const LAB2: TestVector = TestVector {
        name: "lab2",
        layout: Layout::LAB2,
        model: Model::SingleLayer,
        input: &LAB2_INPUT,
        expected: &LAB2_EXPECTED,
    };
    pub const MATMUL: TestVector = TestVector {
        name: "matmul",
        layout: Layout::MATMUL,
        model: Model::SingleLayer,
        input: &MATMUL_INPUT,
        expected: &MATMUL_EXPECTED,
    };
    pub const MLP: TestVector = TestVector {
        name: "mlp",
        layout: Layout::MLP,
        model: Model::TwoLayer {
            activation: Activation::Linear,
        },
        input: &MLP_INPUT,
        expected: &MLP_EXPECTED,
    };
    pub const MLP_SIGMOID: TestVector = TestVector {
        name: "mlp-sigmoid",
        layout: Layout::MLP,
        model: Model::TwoLayer {
            activation: Activation::Sigmoid,
        },
        input: &MLP_INPUT,
        expected: &MLP_SIGMOID_EXPECTED,
    };
}

pub const LAB2_INPUT: [u8; 6] = [200, 100, 50, 250, 128, 64];
pub const LAB2_EXPECTED: [u32; 2] = [125, 87];

/// 64x8 features followed by 8 weights.
pub const MATMUL_INPUT: [u8; 520] = [
    160, 129, 104, 71, 184, 193, 55, 86, 39, 31, 145, 150, 32, 65, 90, 45,
    153, 159, 93, 24, 149, 136, 108, 61, 133, 73, 183, 124, 151, 39, 68, 67,
    91, 24, 115, 144, 125, 0, 255, 42, 148, 92, 126, 71, 175, 204, 100, 156,
    170, 149, 168, 58, 198, 192, 48, 86, 91, 79, 47, 91, 104, 71, 146, 75,
    64, 73, 151, 145, 78, 41, 78, 39, 96, 12, 126, 98, 177, 40, 118, 78,
    26, 108, 116, 129, 0, 85, 54, 92, 135, 167, 172, 73, 161, 159, 58, 64,
    116, 104, 171, 124, 132, 166, 108, 72, 57, 64, 157, 177, 83, 71, 156, 22,
    146, 14, 127, 144, 151, 94, 0, 45, 138, 111, 101, 84, 175, 136, 48, 103,
    137, 140, 111, 45, 157, 255, 98, 75, 161, 156, 172, 124, 170, 189, 110, 125,
    69, 64, 77, 98, 92, 178, 136, 67, 151, 181, 181, 82, 175, 152, 95, 89,
    104, 90, 177, 106, 121, 128, 85, 89, 61, 25, 71, 117, 129, 53, 63, 45,
    255, 34, 255, 236, 192, 36, 60, 136, 95, 2, 118, 98, 124, 85, 115, 50,
    166, 219, 156, 82, 253, 225, 43, 120, 92, 184, 107, 84, 120, 153, 83, 67,
    43, 41, 119, 98, 57, 55, 68, 117, 137, 117, 144, 131, 147, 165, 88, 83,
    117, 73, 127, 91, 142, 149, 33, 92, 89, 111, 129, 137, 210, 63, 75, 86,
    83, 60, 214, 124, 60, 49, 136, 92, 140, 19, 141, 137, 162, 57, 15, 33,
    86, 12, 114, 157, 83, 94, 93, 106, 156, 225, 129, 98, 170, 207, 141, 97,
    118, 18, 111, 137, 138, 70, 43, 42, 100, 138, 116, 71, 143, 201, 88, 72,
    148, 41, 47, 58, 173, 140, 108, 22, 177, 159, 141, 11, 184, 251, 141, 58,
    96, 0, 88, 111, 122, 65, 173, 45, 149, 226, 137, 112, 162, 172, 100, 100,
    160, 214, 149, 61, 200, 214, 90, 117, 136, 116, 197, 116, 170, 191, 141, 103,
    124, 141, 107, 8, 143, 146, 90, 83, 73, 86, 81, 55, 74, 88, 93, 184,
    64, 40, 130, 161, 63, 76, 161, 56, 58, 43, 131, 157, 51, 136, 38, 42,
    180, 167, 145, 45, 255, 188, 80, 114, 117, 135, 101, 65, 120, 137, 123, 78,
    83, 6, 79, 111, 116, 80, 43, 61, 137, 23, 116, 98, 161, 85, 183, 50,
    152, 184, 183, 157, 175, 182, 125, 86, 120, 110, 203, 65, 138, 152, 100, 111,
    191, 255, 153, 78, 203, 213, 136, 106, 0, 44, 0, 0, 81, 90, 90, 50,
    83, 21, 48, 71, 78, 135, 125, 45, 118, 73, 164, 99, 122, 90, 125, 78,
    123, 175, 183, 117, 170, 184, 141, 173, 111, 185, 149, 53, 129, 226, 83, 72,
    176, 184, 156, 80, 212, 181, 50, 106, 146, 183, 186, 124, 157, 220, 95, 139,
    96, 120, 115, 111, 129, 97, 118, 255, 126, 200, 181, 86, 175, 185, 110, 125,
    111, 80, 115, 108, 101, 114, 118, 45, 141, 144, 146, 66, 157, 216, 88, 159,
    75, 66, 57, 0, 1, 46, 14, 37,
];
pub const MATMUL_EXPECTED: [u32; 64] = [
    154, 74, 146, 119, 78, 160, 175, 89, 88, 84, 92, 162, 145, 92, 98, 134,
    163, 184, 103, 177, 134, 60, 170, 83, 200, 140, 80, 149, 123, 112, 117, 93,
    91, 192, 85, 142, 99, 186, 75, 183, 196, 171, 140, 109, 88, 90, 183, 134,
    69, 105, 185, 158, 217, 39, 78, 124, 188, 169, 185, 196, 145, 186, 112, 178,
];
/// 64x7 features, 8x2 hidden layer weights with the bias row first, then the output bias and
/// the two output weights.
pub const MLP_INPUT: [u8; 467] = [
    160, 129, 104, 71, 184, 193, 55, 39, 31, 145, 150, 32, 65, 90, 153, 159,
    93, 24, 149, 136, 108, 133, 73, 183, 124, 151, 39, 68, 91, 24, 115, 144,
    125, 0, 255, 148, 92, 126, 71, 175, 204, 100, 170, 149, 168, 58, 198, 192,
    48, 91, 79, 47, 91, 104, 71, 146, 64, 73, 151, 145, 78, 41, 78, 96,
    12, 126, 98, 177, 40, 118, 26, 108, 116, 129, 0, 85, 54, 135, 167, 172,
    73, 161, 159, 58, 116, 104, 171, 124, 132, 166, 108, 57, 64, 157, 177, 83,
    71, 156, 146, 14, 127, 144, 151, 94, 0, 138, 111, 101, 84, 175, 136, 48,
    137, 140, 111, 45, 157, 255, 98, 161, 156, 172, 124, 170, 189, 110, 69, 64,
    77, 98, 92, 178, 136, 151, 181, 181, 82, 175, 152, 95, 104, 90, 177, 106,
    121, 128, 85, 61, 25, 71, 117, 129, 53, 63, 255, 34, 255, 236, 192, 36,
    60, 95, 2, 118, 98, 124, 85, 115, 166, 219, 156, 82, 253, 225, 43, 92,
    184, 107, 84, 120, 153, 83, 43, 41, 119, 98, 57, 55, 68, 137, 117, 144,
    131, 147, 165, 88, 117, 73, 127, 91, 142, 149, 33, 89, 111, 129, 137, 210,
    63, 75, 83, 60, 214, 124, 60, 49, 136, 140, 19, 141, 137, 162, 57, 15,
    86, 12, 114, 157, 83, 94, 93, 156, 225, 129, 98, 170, 207, 141, 118, 18,
    111, 137, 138, 70, 43, 100, 138, 116, 71, 143, 201, 88, 148, 41, 47, 58,
    173, 140, 108, 177, 159, 141, 11, 184, 251, 141, 96, 0, 88, 111, 122, 65,
    173, 149, 226, 137, 112, 162, 172, 100, 160, 214, 149, 61, 200, 214, 90, 136,
    116, 197, 116, 170, 191, 141, 124, 141, 107, 8, 143, 146, 90, 73, 86, 81,
    55, 74, 88, 93, 64, 40, 130, 161, 63, 76, 161, 58, 43, 131, 157, 51,
    136, 38, 180, 167, 145, 45, 255, 188, 80, 117, 135, 101, 65, 120, 137, 123,
    83, 6, 79, 111, 116, 80, 43, 137, 23, 116, 98, 161, 85, 183, 152, 184,
    183, 157, 175, 182, 125, 120, 110, 203, 65, 138, 152, 100, 191, 255, 153, 78,
    203, 213, 136, 0, 44, 0, 0, 81, 90, 90, 83, 21, 48, 71, 78, 135,
    125, 118, 73, 164, 99, 122, 90, 125, 123, 175, 183, 117, 170, 184, 141, 111,
    185, 149, 53, 129, 226, 83, 176, 184, 156, 80, 212, 181, 50, 146, 183, 186,
    124, 157, 220, 95, 96, 120, 115, 111, 129, 97, 118, 126, 200, 181, 86, 175,
    185, 110, 111, 80, 115, 108, 101, 114, 118, 141, 144, 146, 66, 157, 216, 88,
    16, 8, 40, 12, 25, 30, 18, 44, 33, 9, 21, 27, 10, 36, 29, 15,
    20, 150, 110,
];
pub const MLP_EXPECTED: [u32; 64] = [
    87, 54, 81, 78, 73, 89, 98, 60, 63, 65, 50, 92, 90, 75, 66, 78,
    91, 107, 68, 101, 80, 49, 108, 62, 113, 80, 47, 91, 71, 80, 73, 66,
    61, 111, 62, 83, 68, 104, 62, 105, 107, 104, 75, 54, 67, 59, 105, 78,
    50, 78, 114, 88, 122, 27, 53, 78, 107, 92, 103, 110, 77, 105, 73, 94,
];
/// Results of [MLP_INPUT] with the sigmoid applied to the hidden layer.
pub const MLP_SIGMOID_EXPECTED: [u32; 64] = [
    70, 38, 63, 60, 56, 72, 84, 43, 45, 47, 35, 76, 74, 56, 48, 60,
    75, 96, 49, 88, 62, 34, 98, 44, 105, 63, 33, 75, 53, 62, 55, 48,
    44, 101, 44, 66, 50, 92, 45, 93, 97, 92, 57, 37, 49, 41, 93, 60,
    35, 60, 106, 72, 118, 21, 37, 60, 96, 76, 91, 100, 58, 94, 55, 79,
];
