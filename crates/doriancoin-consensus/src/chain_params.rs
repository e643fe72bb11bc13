//! Chain parameters for the Doriancoin networks.
//!
//! Consensus parameters are loaded once at startup and treated as
//! immutable. The stable networks use the preset constructors; private
//! networks go through [`ChainParams::from_config`], which validates every
//! field and names the offending one on failure.

use crate::compact::{decode_target, encode_compact_bits};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Deserialize;
use std::fmt;

/// Error when constructing ChainParams from configuration.
#[derive(Debug, Clone)]
pub struct ChainParamsError {
    /// The field that is missing or invalid.
    pub field: &'static str,
    /// Description of the error.
    pub message: String,
}

impl fmt::Display for ChainParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainParams error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ChainParamsError {}

/// Configuration for loading ChainParams from TOML/JSON.
///
/// All fields are optional so partial configs can be validated with clear
/// errors. The boolean flags default to off when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainParamsConfig {
    /// Easiest permitted target as a hex string, e.g.
    /// "00000fffff000000000000000000000000000000000000000000000000000000".
    pub pow_limit_hex: Option<String>,
    /// Desired seconds between blocks.
    pub pow_target_spacing: Option<i64>,
    /// Desired seconds per periodic retarget window. Must be a multiple of
    /// the spacing.
    pub pow_target_timespan: Option<i64>,
    /// Testnet exception: blocks arriving late may use minimum difficulty.
    pub allow_min_difficulty_blocks: Option<bool>,
    /// Regtest flag: every block reuses its parent's target.
    pub no_retargeting: Option<bool>,
    /// LWMA averaging window size.
    pub lwma_window: Option<i64>,
    /// Height at which LWMA replaces the periodic retarget.
    pub lwma_height: Option<i64>,
    /// Height at which the stabilized LWMAv2 replaces LWMA.
    pub lwma_fix_height: Option<i64>,
    /// ASERT anchor height; strictly greater heights use ASERT.
    pub asert_height: Option<i64>,
    /// Compact target fixed at the ASERT anchor.
    pub asert_anchor_bits: Option<u32>,
    /// Seconds of schedule drift that double or halve the difficulty.
    pub asert_half_life: Option<i64>,
}

/// Network-specific consensus parameters.
///
/// Passed to every retarget and proof-of-work check. Not hardcoded:
/// mainnet, testnet and regtest carry different values.
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// Easiest permitted target. Retarget results are clamped to this.
    pub pow_limit: BigUint,
    /// Desired seconds between blocks.
    pub pow_target_spacing: i64,
    /// Desired seconds per periodic retarget window.
    pub pow_target_timespan: i64,
    /// Testnet exception: blocks arriving late may use minimum difficulty.
    pub allow_min_difficulty_blocks: bool,
    /// Regtest flag: every block reuses its parent's target.
    pub no_retargeting: bool,
    /// LWMA averaging window size.
    pub lwma_window: i64,
    /// Height at which LWMA replaces the periodic retarget.
    pub lwma_height: i64,
    /// Height at which the stabilized LWMAv2 replaces LWMA.
    pub lwma_fix_height: i64,
    /// ASERT anchor height; strictly greater heights use ASERT.
    pub asert_height: i64,
    /// Compact target fixed at the ASERT anchor.
    pub asert_anchor_bits: u32,
    /// Seconds of schedule drift that double or halve the difficulty.
    pub asert_half_life: i64,
}

impl ChainParams {
    /// Mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            pow_limit: decode_target(0x1e0fffff),
            pow_target_spacing: 150,
            pow_target_timespan: 302_400, // 3.5 days
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            lwma_window: 45,
            lwma_height: 1_250_000,
            lwma_fix_height: 1_300_000,
            asert_height: 1_350_000,
            asert_anchor_bits: 0x1d18ffe7, // ~0.04 difficulty equilibrium
            asert_half_life: 172_800, // 2 days
        }
    }

    /// Testnet parameters.
    pub fn testnet() -> Self {
        Self {
            pow_limit: decode_target(0x1e0fffff),
            pow_target_spacing: 150,
            pow_target_timespan: 302_400,
            allow_min_difficulty_blocks: true,
            no_retargeting: false,
            lwma_window: 45,
            lwma_height: 2_000,
            lwma_fix_height: 2_100,
            asert_height: 2_200,
            asert_anchor_bits: 0x1e0fffff,
            asert_half_life: 172_800,
        }
    }

    /// Regtest parameters. Difficulty never moves; the dispatch logic is
    /// still exercised, with LWMA activating at height 500.
    pub fn regtest() -> Self {
        Self {
            pow_limit: decode_target(0x207fffff),
            pow_target_spacing: 150,
            pow_target_timespan: 302_400,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            lwma_window: 45,
            lwma_height: 500,
            lwma_fix_height: 600,
            asert_height: 700,
            asert_anchor_bits: 0x207fffff,
            asert_half_life: 3_600,
        }
    }

    /// Create ChainParams from configuration.
    ///
    /// Returns an error naming the specific field if any required field is
    /// missing or invalid.
    ///
    /// Note: `pow_limit_hex` is trimmed and accepts an optional "0x" prefix.
    pub fn from_config(config: &ChainParamsConfig) -> Result<Self, ChainParamsError> {
        let pow_limit_hex = config.pow_limit_hex.as_ref().ok_or_else(|| ChainParamsError {
            field: "pow_limit_hex",
            message: "required field missing".to_string(),
        })?;

        let hex_cleaned = pow_limit_hex.trim();
        let hex_cleaned = hex_cleaned
            .strip_prefix("0x")
            .or_else(|| hex_cleaned.strip_prefix("0X"))
            .unwrap_or(hex_cleaned);

        let pow_limit =
            BigUint::parse_bytes(hex_cleaned.as_bytes(), 16).ok_or_else(|| ChainParamsError {
                field: "pow_limit_hex",
                message: format!("invalid hex string: '{}'", pow_limit_hex),
            })?;

        if pow_limit.is_zero() {
            return Err(ChainParamsError {
                field: "pow_limit_hex",
                message: "proof-of-work limit cannot be zero".to_string(),
            });
        }

        let params = Self {
            pow_limit,
            pow_target_spacing: config.pow_target_spacing.ok_or_else(|| ChainParamsError {
                field: "pow_target_spacing",
                message: "required field missing".to_string(),
            })?,
            pow_target_timespan: config.pow_target_timespan.ok_or_else(|| ChainParamsError {
                field: "pow_target_timespan",
                message: "required field missing".to_string(),
            })?,
            allow_min_difficulty_blocks: config.allow_min_difficulty_blocks.unwrap_or(false),
            no_retargeting: config.no_retargeting.unwrap_or(false),
            lwma_window: config.lwma_window.ok_or_else(|| ChainParamsError {
                field: "lwma_window",
                message: "required field missing".to_string(),
            })?,
            lwma_height: config.lwma_height.ok_or_else(|| ChainParamsError {
                field: "lwma_height",
                message: "required field missing".to_string(),
            })?,
            lwma_fix_height: config.lwma_fix_height.ok_or_else(|| ChainParamsError {
                field: "lwma_fix_height",
                message: "required field missing".to_string(),
            })?,
            asert_height: config.asert_height.ok_or_else(|| ChainParamsError {
                field: "asert_height",
                message: "required field missing".to_string(),
            })?,
            asert_anchor_bits: config.asert_anchor_bits.ok_or_else(|| ChainParamsError {
                field: "asert_anchor_bits",
                message: "required field missing".to_string(),
            })?,
            asert_half_life: config.asert_half_life.ok_or_else(|| ChainParamsError {
                field: "asert_half_life",
                message: "required field missing".to_string(),
            })?,
        };

        params.validate()
    }

    /// Blocks per periodic retarget window.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    /// The proof-of-work limit in compact form.
    pub fn pow_limit_bits(&self) -> u32 {
        encode_compact_bits(&self.pow_limit)
    }

    fn validate(self) -> Result<Self, ChainParamsError> {
        if self.pow_target_spacing <= 0 {
            return Err(ChainParamsError {
                field: "pow_target_spacing",
                message: "must be positive".to_string(),
            });
        }
        if self.pow_target_timespan <= 0
            || self.pow_target_timespan % self.pow_target_spacing != 0
        {
            return Err(ChainParamsError {
                field: "pow_target_timespan",
                message: "must be a positive multiple of pow_target_spacing".to_string(),
            });
        }
        if self.lwma_window < 3 {
            return Err(ChainParamsError {
                field: "lwma_window",
                message: "a window shorter than 3 blocks cannot average".to_string(),
            });
        }
        if self.lwma_height < 0 {
            return Err(ChainParamsError {
                field: "lwma_height",
                message: "must be non-negative".to_string(),
            });
        }
        if self.lwma_fix_height < self.lwma_height {
            return Err(ChainParamsError {
                field: "lwma_fix_height",
                message: "must not precede lwma_height".to_string(),
            });
        }
        if self.asert_height < self.lwma_fix_height {
            return Err(ChainParamsError {
                field: "asert_height",
                message: "must not precede lwma_fix_height".to_string(),
            });
        }
        if self.asert_half_life <= 0 {
            return Err(ChainParamsError {
                field: "asert_half_life",
                message: "must be positive".to_string(),
            });
        }
        // The limit must survive a compact round trip, otherwise a clamped
        // retarget result could encode above the limit it was clamped to.
        if decode_target(encode_compact_bits(&self.pow_limit)) != self.pow_limit {
            return Err(ChainParamsError {
                field: "pow_limit_hex",
                message: "must survive a compact round trip".to_string(),
            });
        }
        Ok(self)
    }
}
