//! Element-wise comparison of result buffers.

/// One result element which differs from the expected value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("verification failed with {count} mismatching elements")]
    Mismatch { count: usize },
    #[error("result has {actual} elements, expected {expected}")]
    Length { actual: usize, expected: usize },
}

/// Outcome of [verify].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Verification {
    /// Number of compared elements which differ.
    pub mismatches: usize,
    pub first_mismatch: Option<Mismatch>,
    /// Set to `(actual, expected)` if the buffers differ in length.
    pub len_mismatch: Option<(usize, usize)>,
}

impl Verification {
    #[inline]
    pub const fn passed(&self) -> bool {
        self.mismatches == 0 && self.len_mismatch.is_none()
    }

    pub fn into_result(self) -> Result<(), VerifyError> {
        if let Some((actual, expected)) = self.len_mismatch {
            return Err(VerifyError::Length { actual, expected });
        }
        if self.mismatches > 0 {
            return Err(VerifyError::Mismatch {
                count: self.mismatches,
            });
        }
        Ok(())
    }
}

fn mismatches<'a>(
    received: &'a [u32],
    expected: &'a [u32],
) -> impl Iterator<Item = Mismatch> + 'a {
    received
        .iter()
        .zip(expected)
        .enumerate()
        .filter(|(_, (actual, expected))| actual != expected)
        .map(|(index, (&actual, &expected))| Mismatch {
            index,
            expected,
            actual,
        })
}

/// Compare `received` against `expected`. Every mismatch is logged.
pub fn verify(received: &[u32], expected: &[u32]) -> Verification {
    let mut verification = Verification::default();
    if received.len() != expected.len() {
        log::error!(
            "result has {} elements, expected {}",
            received.len(),
            expected.len()
        );
        verification.len_mismatch = Some((received.len(), expected.len()));
    }
    for mismatch in mismatches(received, expected) {
        log::error!(
            "error at index {}: expected {}, got {}",
            mismatch.index,
            mismatch.expected,
            mismatch.actual
        );
        verification.first_mismatch.get_or_insert(mismatch);
        verification.mismatches += 1;
    }
    verification
}

/// All mismatching elements, in index order.
#[cfg(feature = "alloc")]
pub fn collect_mismatches(received: &[u32], expected: &[u32]) -> alloc::vec::Vec<Mismatch> {
    mismatches(received, expected).collect()
}
