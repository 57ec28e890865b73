//! Tests for native fee quoting.

use ethereum_types::{Address, U256};
use oft_core::{AdapterParams, DstPrice, FeeQuoter, GasOracle, OmniError, PriceTable};

const DST_CHAIN_ID: u32 = 2;

fn price() -> DstPrice {
    DstPrice {
        gas_price: U256::from(2u64),
        price_ratio: U256::from(5_000_000_000u64),
        base_gas: 1_000,
        gas_per_byte: 10,
        airdrop_cap: U256::from(1_000u64),
    }
}

fn table() -> PriceTable {
    let mut table = PriceTable::new();
    table.set_price(DST_CHAIN_ID, price());
    table
}

// ============================================================================
// QUOTES
// ============================================================================

/// 1. Test: Fee Formula
/// Verifies ((base + adapter gas + bytes * per byte) * gas price) * ratio / 1e10.
/// Why: Senders must be charged exactly the destination execution cost.
#[test]
fn test_quote_follows_gas_formula() {
    let fee = FeeQuoter::quote(&table(), DST_CHAIN_ID, &[0u8; 10], &AdapterParams::v1(2_000)).unwrap();

    // (1_000 + 2_000 + 100) * 2 = 6_200, halved by the 0.5 ratio
    assert_eq!(fee.native_fee, U256::from(3_100u64));
    assert_eq!(fee.zro_fee, U256::zero());
}

/// 2. Test: Airdrop Is Priced
/// Verifies that version 2 params add the airdrop to the destination cost.
/// Why: Native value delivered on the destination is paid for on the source.
#[test]
fn test_quote_includes_airdrop() {
    let params = AdapterParams::V2 {
        gas: U256::from(2_000u64),
        native_for_dst: U256::from(800u64),
        native_receiver: Address::from_low_u64_be(5),
    };

    let fee = FeeQuoter::quote(&table(), DST_CHAIN_ID, &[0u8; 10], &params).unwrap();

    assert_eq!(fee.native_fee, U256::from(3_500u64));
}

/// 3. Test: Airdrop Cap
/// Verifies AirdropExceedsCap when the requested airdrop is above the cap.
/// Why: The destination only holds a bounded native budget.
#[test]
fn test_quote_rejects_airdrop_above_cap() {
    let params = AdapterParams::V2 {
        gas: U256::from(2_000u64),
        native_for_dst: U256::from(1_001u64),
        native_receiver: Address::from_low_u64_be(5),
    };

    let err = FeeQuoter::quote(&table(), DST_CHAIN_ID, &[], &params).unwrap_err();

    assert_eq!(
        err,
        OmniError::AirdropExceedsCap {
            requested: U256::from(1_001u64),
            cap: U256::from(1_000u64)
        }
    );
}

/// 4. Test: Unconfigured Destination
/// Verifies UnconfiguredDestination for a chain without prices.
/// Why: A quote without an oracle entry would be meaningless.
#[test]
fn test_quote_unconfigured_destination() {
    let err = FeeQuoter::quote(&table(), 9, &[], &AdapterParams::v1(1)).unwrap_err();

    assert_eq!(err, OmniError::UnconfiguredDestination(9));
}

/// 5. Test: Custom Oracle
/// Verifies that any GasOracle implementation can price quotes.
/// Why: Prices come from an external, read-only collaborator.
#[test]
fn test_quote_with_custom_oracle() {
    struct FlatOracle;
    impl GasOracle for FlatOracle {
        fn dst_price(&self, _dst_chain_id: u32) -> Option<DstPrice> {
            Some(DstPrice {
                gas_price: U256::one(),
                price_ratio: U256::from(10_000_000_000u64),
                base_gas: 0,
                gas_per_byte: 0,
                airdrop_cap: U256::zero(),
            })
        }
    }

    let fee = FeeQuoter::quote(&FlatOracle, 42, &[1, 2, 3], &AdapterParams::v1(7)).unwrap();

    assert_eq!(fee.native_fee, U256::from(7u64));
}
