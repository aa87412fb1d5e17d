//! Error types which span more than one module.
use crate::{
    egress::SerializeError, ingest::ParseError, matrix::CapacityError, reference::PipelineError,
    transfer::TransferError, verify::VerifyError,
};

/// Peripheral setup failures. These abort a session before any transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("no configuration found for device {0}")]
    ConfigNotFound(u16),
    #[error("interrupt status {0:#010x} not cleared after reset")]
    ResetStatus(u32),
    #[error("DMA engine is configured for scatter-gather")]
    ScatterGatherConfigured,
}

/// Fatal errors of a lab session. A verification mismatch is only fatal when the caller asks for
/// it with [crate::verify::Verification::into_result].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LabError {
    #[error("initialization failed: {0}")]
    Init(#[from] InitError),
    #[error("ingestion failed: {0}")]
    Parse(#[from] ParseError),
    #[error("reference computation failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("serialization failed: {0}")]
    Serialize(#[from] SerializeError),
    #[error("buffer setup failed: {0}")]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("session produces no results ({vectors} test vectors of {output_words} words)")]
    NoResults { vectors: usize, output_words: usize },
}
