//! Property-based tests using proptest.
//!
//! These check the invariants every retarget result must satisfy for
//! arbitrary chains and compact values, with shrinking support.

use crate::asert::{self, AsertAnchorCache};
use crate::chain_params::ChainParams;
use crate::compact::{decode_compact_bits, decode_target, encode_compact_bits};
use crate::lwma;
use crate::pow::check_proof_of_work;
use crate::testutil::HeaderChain;
use num_traits::Zero;
use proptest::prelude::*;

/// Generate compact values that decode positive and within 256 bits.
fn arb_valid_compact() -> impl Strategy<Value = u32> {
    (1u32..=32, 1u32..=0x007f_ffff).prop_map(|(size, word)| (size << 24) | word)
}

/// Generate solvetime sequences around the 150-second schedule, including
/// stalls and backwards timestamps.
fn arb_solvetimes() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-600i64..=6_000, 3..60)
}

proptest! {
    #[test]
    fn reencoding_a_decoded_compact_is_stable(compact in arb_valid_compact()) {
        let once = decode_target(compact);
        let reencoded = encode_compact_bits(&once);
        prop_assert_eq!(decode_target(reencoded), once.clone());
        prop_assert_eq!(encode_compact_bits(&once), reencoded);
    }

    #[test]
    fn decoded_compacts_never_misreport_flags(compact in arb_valid_compact()) {
        let decoded = decode_compact_bits(compact);
        prop_assert!(!decoded.negative);
        prop_assert!(!decoded.overflow);
    }

    #[test]
    fn check_pow_boundary_is_exact(compact in arb_valid_compact()) {
        let params = ChainParams::mainnet();
        let target = decode_target(compact);
        prop_assume!(!target.is_zero() && target <= params.pow_limit);

        prop_assert!(check_proof_of_work(&target, compact, &params));
        prop_assert!(!check_proof_of_work(&(&target + 1u32), compact, &params));
    }

    #[test]
    fn lwma_results_stay_within_range(solvetimes in arb_solvetimes()) {
        let mut params = ChainParams::mainnet();
        params.lwma_height = 0;
        params.lwma_fix_height = 0;
        params.asert_height = 1 << 40;

        let mut chain = HeaderChain::new(0, 1_600_000_000, 0x1e0ffff0);
        for solvetime in &solvetimes {
            chain.add(*solvetime, 0x1e0ffff0);
        }

        for bits in [
            lwma::next_work_required(&chain.tip(), &params).unwrap(),
            lwma::next_work_required_v2(&chain.tip(), &params).unwrap(),
        ] {
            let target = decode_target(bits);
            prop_assert!(!target.is_zero());
            prop_assert!(target <= params.pow_limit);
        }
    }

    #[test]
    fn asert_results_stay_within_range(drift in -1_000_000i64..=1_000_000) {
        let mut params = ChainParams::mainnet();
        params.lwma_height = 50;
        params.lwma_fix_height = 80;
        params.asert_height = 100;
        params.asert_anchor_bits = 0x1e0ffff0;

        let mut chain = HeaderChain::new(99, 1_600_000_000, 0x1e0ffff0);
        chain.extend(5, 150, 0x1e0ffff0);
        chain.add(150 + drift, 0x1e0ffff0);

        let cache = AsertAnchorCache::new();
        let bits = asert::next_work_required(&chain.tip(), &params, &cache).unwrap();
        let target = decode_target(bits);
        prop_assert!(!target.is_zero());
        prop_assert!(target <= params.pow_limit);
    }
}
