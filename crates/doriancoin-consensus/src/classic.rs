//! BTC-style periodic difficulty retargeting.
//!
//! The pre-LWMA era algorithm inherited from upstream Bitcoin: once per
//! `pow_target_timespan / pow_target_spacing` blocks, scale the previous
//! target by the ratio of the window's actual duration to the desired one,
//! clamped to 4x in either direction. Between retarget boundaries the
//! target is carried forward unchanged, except for the testnet
//! minimum-difficulty rules.

use crate::chain::BlockRef;
use crate::chain_params::ChainParams;
use crate::compact::{decode_target, encode_compact_bits};
use crate::{ConsensusError, ConsensusResult};
use tracing::debug;

/// Compute the required nBits for the block following `tip`.
///
/// `header_time` is the candidate block's own timestamp; only the testnet
/// minimum-difficulty exception reads it.
pub fn next_work_required<B: BlockRef>(
    tip: &B,
    header_time: i64,
    params: &ChainParams,
) -> ConsensusResult<u32> {
    let pow_limit_bits = params.pow_limit_bits();
    let interval = params.difficulty_adjustment_interval();
    let height = tip.height() + 1;

    // Only change once per difficulty adjustment interval.
    if height % interval != 0 {
        if params.allow_min_difficulty_blocks {
            // Special difficulty rule for testnet: a block arriving more
            // than two spacings late may be mined at minimum difficulty.
            if header_time > tip.time() + params.pow_target_spacing * 2 {
                return Ok(pow_limit_bits);
            }
            // Otherwise return the last non-minimum-difficulty target.
            let mut index = tip.clone();
            while let Some(prev) = index.parent() {
                if index.height() % interval == 0 || index.bits() != pow_limit_bits {
                    break;
                }
                index = prev;
            }
            return Ok(index.bits());
        }
        return Ok(tip.bits());
    }

    // Go back one full interval, except for the first retarget after
    // genesis which steps one block short. Inherited from upstream;
    // changing it would fork the chain.
    let blocks_to_go_back = if height == interval {
        interval - 1
    } else {
        interval
    };

    let mut first = tip.clone();
    for _ in 0..blocks_to_go_back {
        first = first
            .parent()
            .ok_or_else(|| ConsensusError::ParentNotFound("retarget window start".to_string()))?;
    }

    Ok(calculate_next_work(tip.bits(), tip.time(), first.time(), params))
}

/// Scale the tip's target by the window's actual duration.
///
/// Exposed separately from the parent walk so historical retargets can be
/// checked from recorded endpoint timestamps alone.
pub fn calculate_next_work(
    last_bits: u32,
    last_time: i64,
    first_time: i64,
    params: &ChainParams,
) -> u32 {
    if params.no_retargeting {
        return last_bits;
    }

    // Limit adjustment step.
    let timespan = params.pow_target_timespan;
    let actual = (last_time - first_time).clamp(timespan / 4, timespan * 4);

    let mut new_target = decode_target(last_bits);

    // The product below can need one bit more than the 256 the target
    // historically carried. Dropping the low bit first keeps the high bit;
    // the lost precision is part of consensus.
    let shift = new_target.bits() > params.pow_limit.bits() - 1;
    if shift {
        new_target >>= 1usize;
    }
    new_target *= actual as u64;
    new_target /= timespan as u64;
    if shift {
        new_target <<= 1usize;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit.clone();
    }

    let nbits = encode_compact_bits(&new_target);
    debug!(
        actual,
        timespan,
        nbits = format!("0x{:08x}", nbits),
        "periodic retarget"
    );
    nbits
}
