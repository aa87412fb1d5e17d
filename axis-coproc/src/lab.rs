//! # Lab session
//!
//! A session ingests the matrices once, computes the software reference, then runs the
//! configured number of test vectors through the coprocessor and verifies every response
//! against the reference.
//!
//! Errors are fatal and abort the session. A verification mismatch is part of the [LabReport].
use heapless::Vec;

use crate::{
    LabError, MAX_OUTPUT_WORDS,
    egress::write_results,
    ingest::{Ingested, ingest_serial, ingest_slice},
    layout::LabConfig,
    reference,
    timing::{CycleCounter, LabTiming, Stopwatch},
    transfer::{Handshake, TransferChannel, TransferError},
    verify::{Mismatch, verify},
};

/// Outcome of a lab session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LabReport {
    pub passed: bool,
    /// Mismatching result elements summed over all test vectors.
    pub mismatches: usize,
    pub first_mismatch: Option<Mismatch>,
    pub vectors: usize,
    pub timing: LabTiming,
}

pub struct LabSession<C, K> {
    config: LabConfig,
    handshake: Handshake<C>,
    counter: K,
}

impl<C: TransferChannel, K: CycleCounter> LabSession<C, K> {
    pub fn new(channel: C, counter: K, config: LabConfig) -> Self {
        Self {
            handshake: Handshake::new(channel, &config.layout()),
            config,
            counter,
        }
    }

    #[inline]
    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    #[inline]
    pub fn handshake(&self) -> &Handshake<C> {
        &self.handshake
    }

    #[inline]
    pub fn release(self) -> (C, K) {
        (self.handshake.release(), self.counter)
    }

    /// Number of result words the `results` buffer of [Self::run] needs.
    #[inline]
    pub fn results_len(&self) -> usize {
        self.config.test_vectors() * self.config.layout().output_words()
    }

    /// Run the session on already ingested matrices. `results` receives the coprocessor
    /// responses of all test vectors back to back.
    pub fn run(
        &mut self,
        ingested: &Ingested,
        results: &mut [u32],
    ) -> Result<LabReport, LabError> {
        let layout = self.config.layout();
        let output_words = layout.output_words();
        let vectors = self.config.test_vectors();
        if output_words == 0 || vectors == 0 {
            return Err(LabError::NoResults {
                vectors,
                output_words,
            });
        }
        if results.len() != self.results_len() {
            return Err(TransferError::ResponseLength {
                received: results.len(),
                expected: self.results_len(),
            }
            .into());
        }

        let mut expected: Vec<u32, MAX_OUTPUT_WORDS> = Vec::new();
        expected
            .resize(output_words, 0)
            .map_err(|_| TransferError::ResponseOverflow {
                capacity: MAX_OUTPUT_WORDS,
            })?;
        let mut stopwatch = Stopwatch::start(&self.counter);
        reference::compute(ingested, self.config.model(), &mut expected)?;
        let software = stopwatch.lap(&self.counter);

        let request = ingested.request_words()?;
        for response in results.chunks_exact_mut(output_words) {
            self.handshake.run_vector(&request, response)?;
        }
        let hardware = stopwatch.lap(&self.counter);

        let mut report = LabReport {
            passed: true,
            mismatches: 0,
            first_mismatch: None,
            vectors,
            timing: LabTiming { software, hardware },
        };
        for (vector, response) in results.chunks_exact(output_words).enumerate() {
            let verification = verify(response, &expected);
            if !verification.passed() {
                log::error!(
                    "test vector {} failed with {} mismatches",
                    vector,
                    verification.mismatches
                );
                report.passed = false;
                report.mismatches += verification.mismatches;
                if report.first_mismatch.is_none() {
                    report.first_mismatch = verification.first_mismatch;
                }
            }
        }
        report.timing.log();
        if report.passed {
            log::info!("verification passed for {} test vectors", report.vectors);
        } else {
            log::error!("verification failed");
        }
        Ok(report)
    }

    /// Ingest the matrices from a byte buffer, then [Self::run].
    pub fn run_slice(
        &mut self,
        bytes: &[u8],
        results: &mut [u32],
    ) -> Result<LabReport, LabError> {
        let ingested = ingest_slice(self.config.layout(), self.config.invalid_bytes(), bytes)?;
        self.run(&ingested, results)
    }

    /// Ingest the matrices from a serial port, [Self::run] the session and echo the
    /// coprocessor results back over the same port.
    pub fn run_serial<S>(
        &mut self,
        serial: &mut S,
        results: &mut [u32],
    ) -> Result<LabReport, LabError>
    where
        S: embedded_hal_nb::serial::Read<u8> + embedded_hal_nb::serial::Write<u8>,
    {
        let ingested = ingest_serial(serial, self.config.layout(), self.config.invalid_bytes())?;
        let report = self.run(&ingested, results)?;
        let written = write_results(serial, results, self.config.delimiter())?;
        log::debug!("wrote {} result bytes", written);
        Ok(report)
    }
}
