//! ASERT retargeting (absolutely scheduled exponential rise target).
//!
//! Every block's target is an exponential function of how far the chain
//! has drifted from its ideal schedule since a fixed anchor block:
//!
//! ```text
//! target = anchor_target * 2^((time_delta - T * height_delta) / half_life)
//! ```
//!
//! The input is the total deviation since the anchor rather than a recent
//! window, so constant hashrate produces a flat target and there is
//! nothing to oscillate; each block responds individually. The exponential
//! is evaluated in 16.16 fixed point with a cubic approximation whose
//! coefficients are consensus constants.

use crate::chain::BlockRef;
use crate::chain_params::ChainParams;
use crate::compact::{decode_target, encode_compact_bits};
use crate::{ConsensusError, ConsensusResult};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::sync::RwLock;
use tracing::debug;

/// Resolved anchor data. The anchor block never changes once the
/// activation height is buried, so its parent timestamp is all later
/// calls need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AsertAnchor {
    height: i64,
    parent_time: i64,
}

/// One-slot cache for the resolved ASERT anchor.
///
/// Writes are idempotent: every retarget on a given chain resolves the
/// same anchor, so racing first writers overwrite each other harmlessly.
/// Callers must [`reset`](Self::reset) when a reorg rewinds history across
/// the anchor height, and must quiesce retargeting while doing so.
#[derive(Debug, Default)]
pub struct AsertAnchorCache {
    anchor: RwLock<Option<AsertAnchor>>,
}

impl AsertAnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached anchor. Called on reorgs that cross the anchor
    /// height and by tests that switch chains.
    pub fn reset(&self) {
        *self.anchor.write().expect("anchor cache poisoned") = None;
    }

    fn get(&self) -> Option<AsertAnchor> {
        *self.anchor.read().expect("anchor cache poisoned")
    }

    fn store(&self, anchor: AsertAnchor) {
        *self.anchor.write().expect("anchor cache poisoned") = Some(anchor);
    }
}

/// Locate the anchor block at `asert_height` by walking parents from the
/// tip, consulting the cache first.
fn anchor_for<B: BlockRef>(
    tip: &B,
    params: &ChainParams,
    cache: &AsertAnchorCache,
) -> ConsensusResult<AsertAnchor> {
    if let Some(anchor) = cache.get() {
        return Ok(anchor);
    }

    let mut index = tip.clone();
    while index.height() > params.asert_height {
        index = index
            .parent()
            .ok_or_else(|| ConsensusError::ParentNotFound("ASERT anchor walk".to_string()))?;
    }
    debug_assert_eq!(index.height(), params.asert_height);

    // The anchor's parent supplies the reference timestamp; an anchor at
    // genesis would leave the schedule undefined.
    let parent = index
        .parent()
        .ok_or_else(|| ConsensusError::ParentNotFound("ASERT anchor parent".to_string()))?;

    let anchor = AsertAnchor {
        height: index.height(),
        parent_time: parent.time(),
    };
    cache.store(anchor);
    Ok(anchor)
}

/// Compute the required nBits for the block following `tip` under ASERT.
pub fn next_work_required<B: BlockRef>(
    tip: &B,
    params: &ChainParams,
    cache: &AsertAnchorCache,
) -> ConsensusResult<u32> {
    if params.no_retargeting {
        return Ok(tip.bits());
    }

    let anchor = anchor_for(tip, params, cache)?;
    let anchor_target = decode_target(params.asert_anchor_bits);

    // Parent timestamps on both ends keep the candidate block's own
    // timestamp out of its target.
    let time_delta = tip.time() - anchor.parent_time;
    let height_delta = (tip.height() + 1) - anchor.height;

    let t = params.pow_target_spacing;

    // Schedule deviation in 16.16 fixed point.
    let exponent = ((time_delta - t * height_delta) * 65536) / params.asert_half_life;

    // Split into whole powers of two and a fraction in [0, 65536).
    let (shifts, frac) = if exponent >= 0 {
        ((exponent >> 16) as i32, (exponent & 0xffff) as u16)
    } else {
        let abs = -exponent;
        let shifts = -((abs >> 16) as i32);
        let remainder = (abs & 0xffff) as u16;
        if remainder != 0 {
            (shifts - 1, (65536 - remainder as u32) as u16)
        } else {
            (shifts, 0)
        }
    };

    // 65536 * 2^(frac / 65536) by cubic approximation. The coefficients
    // and the 2^47 rounding term are consensus constants; the error stays
    // under 0.013%.
    let mut factor: u64 = 65536;
    if frac > 0 {
        let f = frac as u64;
        factor = 65536
            + ((195_766_423_245_049 * f + 971_821_376 * f * f + 5_127 * f * f * f + (1 << 47))
                >> 48);
    }

    let mut next_target: BigUint = anchor_target * factor;
    next_target >>= 16usize;

    // Whole shifts past the 256-bit range saturate at the two extremes.
    if shifts >= 256 {
        return Ok(params.pow_limit_bits());
    }
    if shifts <= -256 {
        return Ok(encode_compact_bits(&BigUint::one()));
    }
    if shifts > 0 {
        next_target <<= shifts as usize;
    } else if shifts < 0 {
        next_target >>= (-shifts) as usize;
    }

    debug!(time_delta, height_delta, exponent, shifts, factor, "asert retarget");

    // A zero target would make every hash invalid.
    if next_target.is_zero() {
        next_target = BigUint::one();
    }
    if next_target > params.pow_limit {
        next_target = params.pow_limit.clone();
    }

    Ok(encode_compact_bits(&next_target))
}
