//! Linear weighted moving average retargeting.
//!
//! Both LWMA eras compute a recency-weighted average of the last
//! `lwma_window` solvetimes and scale a reference target by its ratio to
//! the on-schedule average. They differ in the reference target and in how
//! hard the result is capped:
//!
//! - The original algorithm scales the previous block's target, with a
//!   symmetric 10x cap per block.
//! - The stabilized v2 scales the target at the start of the window, with
//!   a 3x cap. Scaling the window-start target removes the feedback loop
//!   that let the original oscillate under steady hashrate.

use crate::chain::BlockRef;
use crate::chain_params::ChainParams;
use crate::compact::{decode_target, encode_compact_bits};
use crate::{ConsensusError, ConsensusResult};
use num_bigint::BigUint;
use tracing::debug;

/// Accumulate position-weighted solvetimes over the last `blocks` pairs.
///
/// The newest pair carries weight `blocks`, the oldest weight 1. Each
/// solvetime is clamped to `[1, 6 * t]` so that out-of-order or stalled
/// timestamps cannot swing the average. Returns the weighted sum and the
/// sum of weights; the walk stops short if the chain runs out of parents.
fn weighted_solvetimes<B: BlockRef>(tip: &B, blocks: i64, t: i64) -> (i64, i64) {
    let mut sum_weighted = 0;
    let mut sum_weights = 0;

    let mut block = tip.clone();
    for i in (1..=blocks).rev() {
        let Some(prev) = block.parent() else { break };

        let solvetime = (block.time() - prev.time()).clamp(1, 6 * t);
        sum_weighted += solvetime * i;
        sum_weights += i;

        block = prev;
    }

    (sum_weighted, sum_weights)
}

/// Compute the required nBits for the block following `tip` under the
/// original LWMA rules.
pub fn next_work_required<B: BlockRef>(tip: &B, params: &ChainParams) -> ConsensusResult<u32> {
    let t = params.pow_target_spacing;

    if params.no_retargeting {
        return Ok(tip.bits());
    }

    let height = tip.height() + 1;
    let blocks = params.lwma_window.min(height - params.lwma_height);

    // The first blocks after activation have no usable window yet.
    if blocks < 3 {
        return Ok(tip.bits());
    }

    let prev_target = decode_target(tip.bits());

    let (mut sum_weighted, sum_weights) = weighted_solvetimes(tip, blocks, t);
    if sum_weights == 0 {
        return Err(ConsensusError::ParentNotFound("LWMA window".to_string()));
    }

    let expected = sum_weights * t;

    // Symmetric cap: at most a 10x swing per block in either direction.
    sum_weighted = sum_weighted.clamp(expected / 10, expected * 10);

    debug!(blocks, sum_weighted, expected, "lwma retarget");

    let mut next_target: BigUint = prev_target * sum_weighted as u64 / expected as u64;
    if next_target > params.pow_limit {
        next_target = params.pow_limit.clone();
    }

    Ok(encode_compact_bits(&next_target))
}

/// Compute the required nBits for the block following `tip` under the
/// stabilized LWMAv2 rules.
pub fn next_work_required_v2<B: BlockRef>(tip: &B, params: &ChainParams) -> ConsensusResult<u32> {
    let t = params.pow_target_spacing;

    if params.no_retargeting {
        return Ok(tip.bits());
    }

    let height = tip.height() + 1;
    let blocks = params.lwma_window.min(height - params.lwma_height);

    if blocks < 3 {
        return Ok(tip.bits());
    }

    // The reference target comes from the start of the window, not from
    // the previous block.
    let mut window_start = tip.clone();
    for _ in 0..blocks {
        match window_start.parent() {
            Some(prev) => window_start = prev,
            None => break,
        }
    }
    let reference_target = decode_target(window_start.bits());

    let (mut sum_weighted, sum_weights) = weighted_solvetimes(tip, blocks, t);
    if sum_weights == 0 {
        return Err(ConsensusError::ParentNotFound("LWMA window".to_string()));
    }

    let expected = sum_weights * t;

    // Tighter 3x cap; with a window-start reference the cap is a safety
    // valve rather than the steady-state limiter.
    sum_weighted = sum_weighted.clamp(expected / 3, expected * 3);

    debug!(blocks, sum_weighted, expected, "lwma v2 retarget");

    let mut next_target: BigUint = reference_target * sum_weighted as u64 / expected as u64;
    if next_target > params.pow_limit {
        next_target = params.pow_limit.clone();
    }

    Ok(encode_compact_bits(&next_target))
}
