//! Error types for consensus validation.

use thiserror::Error;

/// Consensus validation errors.
///
/// Proof-of-work rejections are not errors; `check_proof_of_work` returns a
/// plain boolean. Errors here mean the chain index handed the core an
/// impossible walk, which a node must treat as corruption.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Parent block missing where the chain index must provide one.
    #[error("Parent block not found: {0}")]
    ParentNotFound(String),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
