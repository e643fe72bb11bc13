//! Next-work dispatch and proof-of-work validation.

use crate::asert::{self, AsertAnchorCache};
use crate::chain::BlockRef;
use crate::chain_params::ChainParams;
use crate::classic;
use crate::compact::decode_compact_bits;
use crate::error::ConsensusResult;
use crate::lwma;
use num_bigint::BigUint;
use num_traits::Zero;

/// Computes required targets for the next block on a chain.
///
/// Borrows the network parameters and owns the ASERT anchor cache; a node
/// keeps one per active chain, while tests build a fresh one per scenario.
/// All methods are safe to call from any thread on a read-consistent view
/// of the index.
pub struct DifficultyCalculator<'a> {
    params: &'a ChainParams,
    anchor_cache: AsertAnchorCache,
}

impl<'a> DifficultyCalculator<'a> {
    /// Create a calculator with an empty anchor cache.
    pub fn new(params: &'a ChainParams) -> Self {
        Self {
            params,
            anchor_cache: AsertAnchorCache::new(),
        }
    }

    /// Required nBits for the block following `tip`.
    ///
    /// The algorithm is selected by the height of the block being built.
    /// `header_time` is the candidate block's timestamp; only the testnet
    /// minimum-difficulty rule of the periodic era reads it.
    pub fn next_work_required<B: BlockRef>(
        &self,
        tip: &B,
        header_time: i64,
    ) -> ConsensusResult<u32> {
        let height = tip.height() + 1;

        if height > self.params.asert_height {
            return asert::next_work_required(tip, self.params, &self.anchor_cache);
        }
        if height >= self.params.lwma_fix_height {
            return lwma::next_work_required_v2(tip, self.params);
        }
        if height >= self.params.lwma_height {
            return lwma::next_work_required(tip, self.params);
        }
        classic::next_work_required(tip, header_time, self.params)
    }

    /// Forget the cached ASERT anchor. Must be called when a reorg rewinds
    /// the chain across the anchor height; callers quiesce retargeting
    /// around the reorg.
    pub fn reset_anchor_cache(&self) {
        self.anchor_cache.reset();
    }
}

/// Validate a block hash against its claimed compact target.
///
/// The boolean is the entire contract; a malformed claim is simply
/// invalid. Rejected claims: negative or overflowing compacts, a zero
/// target, a target above the network limit, and a hash above the target.
pub fn check_proof_of_work(hash: &BigUint, claimed_bits: u32, params: &ChainParams) -> bool {
    let decoded = decode_compact_bits(claimed_bits);

    if decoded.negative || decoded.overflow || decoded.target.is_zero() {
        return false;
    }
    if decoded.target > params.pow_limit {
        return false;
    }

    *hash <= decoded.target
}
