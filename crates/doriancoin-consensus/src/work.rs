//! Chain-work accounting.

use crate::compact::decode_compact_bits;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Work contributed by a block with the given compact target.
///
/// Defined as `floor(2^256 / (target + 1))`, computed without a 257-bit
/// intermediate as `(~target / (target + 1)) + 1` over 256 bits. Fork
/// choice sums these per branch; an invalid compact contributes nothing.
pub fn block_proof(bits: u32) -> BigUint {
    let decoded = decode_compact_bits(bits);
    if decoded.negative || decoded.overflow || decoded.target.is_zero() {
        return BigUint::zero();
    }

    let inverted = (BigUint::one() << 256usize) - BigUint::one() - &decoded.target;
    inverted / (decoded.target + BigUint::one()) + BigUint::one()
}
