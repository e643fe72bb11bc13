//! # doriancoin-consensus
//!
//! Proof-of-work consensus rules for Doriancoin.
//!
//! This crate provides:
//! - Difficulty retargeting across all four algorithm eras (BTC-style
//!   periodic, LWMA, stabilized LWMAv2, ASERT)
//! - Compact target ("nBits") encoding and decoding
//! - Proof-of-work validation against a claimed target
//! - Chain-work accounting for fork choice
//!
//! ## Algorithm eras
//!
//! Doriancoin changed its difficulty algorithm twice after launch. The
//! active algorithm is selected by the height of the block being validated:
//!
//! | Heights | Algorithm |
//! |---|---|
//! | below `lwma_height` | BTC-style periodic retarget |
//! | `lwma_height` up to `lwma_fix_height - 1` | LWMA |
//! | `lwma_fix_height` up to `asert_height` | LWMAv2 (stabilized) |
//! | above `asert_height` | ASERT |
//!
//! All arithmetic is integer-only. The computed target is consensus: two
//! nodes must agree bit-for-bit on every height of every network or they
//! will fork.
//!
//! The crate reads the chain through the [`BlockRef`] trait and owns no
//! state beyond the one-slot ASERT anchor cache inside
//! [`DifficultyCalculator`]. Storage, networking and hashing live in other
//! crates; this one only does the arithmetic.

pub mod asert;
pub mod chain;
pub mod chain_params;
pub mod classic;
pub mod compact;
mod error;
pub mod lwma;
pub mod pow;
pub mod work;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod testutil;

pub use asert::AsertAnchorCache;
pub use chain::BlockRef;
pub use chain_params::{ChainParams, ChainParamsConfig, ChainParamsError};
pub use compact::{decode_compact_bits, decode_target, encode_compact_bits, DecodedTarget};
pub use error::{ConsensusError, ConsensusResult};
pub use pow::{check_proof_of_work, DifficultyCalculator};
pub use work::block_proof;
