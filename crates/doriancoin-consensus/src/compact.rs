//! Compact target ("nBits") encoding.
//!
//! A target is a 256-bit unsigned integer stored in block headers as a
//! 32-bit floating-point-like value: bits 31-24 hold a base-256 exponent,
//! bit 23 is a sign flag and bits 22-0 hold the mantissa. The decoded value
//! is `mantissa * 256^(exponent - 3)`. The encoding is lossy; only the top
//! 23 bits of a target survive a round trip.
//!
//! The layout is consensus-critical. Every header's nBits field feeds
//! directly into retarget arithmetic and proof-of-work checks, so the
//! decode rules below (including the sign and overflow flags) must match
//! the network bit for bit.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// A compact value unpacked into its full target plus the two flags header
/// validation cares about.
#[derive(Debug, Clone)]
pub struct DecodedTarget {
    /// The expanded target. Zero when the mantissa is zero.
    pub target: BigUint,
    /// The sign flag was set on a non-zero mantissa. Never valid in a
    /// header; the flag exists only as a negativity indicator.
    pub negative: bool,
    /// The encoded value needs more than 256 bits.
    pub overflow: bool,
}

/// Unpack a compact value into a target and its validity flags.
pub fn decode_compact_bits(compact: u32) -> DecodedTarget {
    let size = compact >> 24;
    let word = compact & 0x007f_ffff;

    let target = if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3)) as usize
    };

    DecodedTarget {
        target,
        negative: word != 0 && (compact & 0x0080_0000) != 0,
        overflow: word != 0
            && (size > 34 || (size > 33 && word > 0xff) || (size > 32 && word > 0xffff)),
    }
}

/// Expand a compact value to its target, ignoring the validity flags.
///
/// Retarget arithmetic starts from a previous block's nBits, which header
/// validation already accepted; only `check_proof_of_work` looks at the
/// flags of an untrusted claim.
pub fn decode_target(compact: u32) -> BigUint {
    decode_compact_bits(compact).target
}

/// Encode a target in compact form with the minimal exponent.
///
/// If the mantissa would land on the sign flag it is shifted down a byte
/// and the exponent bumped, so a valid target never encodes as negative.
pub fn encode_compact_bits(target: &BigUint) -> u32 {
    let mut size = ((target.bits() + 7) / 8) as u32;
    let mut compact = if size <= 3 {
        (target.to_u64().unwrap_or(0) << (8 * (3 - size))) as u32
    } else {
        let shifted: BigUint = target >> (8 * (size - 3)) as usize;
        shifted.to_u32().unwrap_or(0)
    };

    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | (size << 24)
}
