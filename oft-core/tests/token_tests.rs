//! Tests for omnichain token sends, receives and administration.

mod helpers;

use ethereum_types::U256;
use helpers::{
    adapter_params, build_network, build_unconfigured_network, fee_value, token_config, units,
    DUMMY_ALICE, DUMMY_BOB, DUMMY_CAROL, DUMMY_DST_TOKEN, DUMMY_MALLORY, DUMMY_OWNER,
    DUMMY_SRC_TOKEN, DST_CHAIN_ID, MIN_DST_GAS, SRC_CHAIN_ID,
};
use oft_core::{
    AdapterParams, Chain, Custody, DeliveryStatus, ErrorKind, Event, InProcessTransport, Network,
    OmniError, TokenConfig, PT_SEND,
};

fn send(
    network: &mut oft_core::Network<InProcessTransport>,
    amount: U256,
    params: &[u8],
    value: U256,
) -> oft_core::Result<oft_core::DeliveryReceipt> {
    network.send_from(
        SRC_CHAIN_ID,
        DUMMY_ALICE,
        DST_CHAIN_ID,
        DUMMY_BOB,
        amount,
        params,
        value,
    )
}

fn funded_network(amount: U256) -> oft_core::Network<InProcessTransport> {
    let mut network = build_network(InProcessTransport::new());
    network
        .chain_mut(SRC_CHAIN_ID)
        .unwrap()
        .mint(&DUMMY_OWNER, DUMMY_ALICE, amount)
        .unwrap();
    network
}

// ============================================================================
// SEND AND RECEIVE
// ============================================================================

/// 1. Test: Lock On Source, Mint On Destination
/// Verifies a plain send locks the amount at the proxy and mints it on the native side.
/// Why: Custody on both chains must move in lockstep.
#[test]
fn test_send_locks_and_mints() {
    let mut network = funded_network(units(10));

    let receipt = send(&mut network, units(4), &AdapterParams::v1(MIN_DST_GAS).encode(), fee_value())
        .unwrap();

    assert_eq!(receipt.nonce, 1);
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert_eq!(src.balance_of(&DUMMY_ALICE), units(6));
    assert_eq!(src.token().locked(), units(4));
    let dst = network.chain(DST_CHAIN_ID).unwrap();
    assert_eq!(dst.balance_of(&DUMMY_BOB), units(4));
    assert_eq!(dst.token().ledger().total_supply(), units(4));
    assert_eq!(network.delivery_log()[0].status, DeliveryStatus::Credited);
}

/// 2. Test: Round Trip Back To Proxy
/// Verifies that sending back from the native chain burns there and unlocks on the proxy.
/// Why: Both custody directions must be inverse to each other.
#[test]
fn test_send_back_burns_and_unlocks() {
    let mut network = funded_network(units(10));
    let params = AdapterParams::v1(MIN_DST_GAS).encode();
    send(&mut network, units(4), &params, fee_value()).unwrap();

    network
        .send_from(DST_CHAIN_ID, DUMMY_BOB, SRC_CHAIN_ID, DUMMY_ALICE, units(3), &params, fee_value())
        .unwrap();

    let dst = network.chain(DST_CHAIN_ID).unwrap();
    assert_eq!(dst.balance_of(&DUMMY_BOB), units(1));
    assert_eq!(dst.token().ledger().total_supply(), units(1));
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert_eq!(src.balance_of(&DUMMY_ALICE), units(9));
    assert_eq!(src.token().locked(), units(1));
}

/// 3. Test: Dust Stays With The Sender
/// Verifies that the part of an amount below shared precision is not debited.
/// Why: Only representable value may leave the source chain.
#[test]
fn test_send_leaves_dust_with_sender() {
    let mut network = funded_network(units(2));
    let dust = U256::from(123_456u64);

    send(&mut network, units(1) + dust, &adapter_params(), fee_value()).unwrap();

    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert_eq!(src.balance_of(&DUMMY_ALICE), units(1));
    assert_eq!(network.chain(DST_CHAIN_ID).unwrap().balance_of(&DUMMY_BOB), units(1));
}

/// 4. Test: Excess Value Is Refunded
/// Verifies that the receipt reports value above the quoted fee as refund.
/// Why: Callers overpay to be safe and must get the difference back.
#[test]
fn test_receipt_reports_refund() {
    let mut network = funded_network(units(1));
    let params = adapter_params();
    let quote = network
        .chain(SRC_CHAIN_ID)
        .unwrap()
        .quote_send(DST_CHAIN_ID, DUMMY_BOB, units(1), &params)
        .unwrap();

    let receipt = send(&mut network, units(1), &params, fee_value()).unwrap();

    assert!(!quote.native_fee.is_zero());
    assert_eq!(quote.zro_fee, U256::zero());
    assert_eq!(receipt.native_fee, quote.native_fee);
    assert_eq!(receipt.refund, fee_value() - quote.native_fee);
}

// ============================================================================
// SOURCE-SIDE VALIDATION
// ============================================================================

/// 5. Test: Insufficient Fee
/// Verifies InsufficientFee and that no balance, nonce or event changed.
/// Why: Validation failures must abort before the commitment point.
#[test]
fn test_insufficient_fee_changes_nothing() {
    let mut network = funded_network(units(1));
    let events_before = network.chain(SRC_CHAIN_ID).unwrap().events().len();

    let err = send(&mut network, units(1), &adapter_params(), U256::one()).unwrap_err();

    assert!(matches!(err, OmniError::InsufficientFee { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert_eq!(src.balance_of(&DUMMY_ALICE), units(1));
    assert_eq!(src.endpoint().outbound_nonce(DST_CHAIN_ID, DUMMY_SRC_TOKEN, DUMMY_DST_TOKEN), 0);
    assert_eq!(src.events().len(), events_before);
    assert!(network.delivery_log().is_empty());
}

/// 6. Test: Insufficient Balance
/// Verifies InsufficientBalance for an amount above the sender's balance.
/// Why: Nobody may send value they do not hold.
#[test]
fn test_insufficient_balance_is_rejected() {
    let mut network = funded_network(units(1));

    let err = send(&mut network, units(2), &adapter_params(), fee_value()).unwrap_err();

    assert_eq!(
        err,
        OmniError::InsufficientBalance {
            required: units(2),
            available: units(1)
        }
    );
}

/// 7. Test: Zero Amount
/// Verifies that an amount consisting only of dust is rejected as zero.
/// Why: A send that moves nothing must not consume a nonce.
#[test]
fn test_dust_only_amount_is_rejected() {
    let mut network = funded_network(units(1));

    let err = send(&mut network, U256::from(5u64), &adapter_params(), fee_value()).unwrap_err();

    assert_eq!(err, OmniError::ZeroAmount);
}

/// 8. Test: Insufficient Gas Params
/// Verifies that adapter params below the configured minimum are rejected.
/// Why: The destination must be able to execute the message.
#[test]
fn test_adapter_gas_below_minimum_is_rejected() {
    let mut network = funded_network(units(1));
    let params = AdapterParams::v1(MIN_DST_GAS - 1).encode();

    let err = send(&mut network, units(1), &params, fee_value()).unwrap_err();

    assert_eq!(
        err,
        OmniError::InsufficientGasParams {
            required: U256::from(MIN_DST_GAS),
            provided: U256::from(MIN_DST_GAS - 1)
        }
    );
    assert_eq!(network.chain(SRC_CHAIN_ID).unwrap().balance_of(&DUMMY_ALICE), units(1));
}

/// 9. Test: Min Gas Not Set
/// Verifies that custom adapter params require a configured minimum gas.
/// Why: An unset minimum would let any gas value through.
#[test]
fn test_custom_params_without_min_gas_fails() {
    let mut network = funded_network(units(1));
    network
        .chain_mut(SRC_CHAIN_ID)
        .unwrap()
        .set_min_dst_gas(&DUMMY_OWNER, DST_CHAIN_ID, PT_SEND, 0)
        .unwrap();

    let err = send(&mut network, units(1), &adapter_params(), fee_value()).unwrap_err();

    assert_eq!(
        err,
        OmniError::MinGasNotSet {
            chain_id: DST_CHAIN_ID,
            packet_type: PT_SEND
        }
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

/// 10. Test: Default Adapter Params
/// Verifies that without custom params the caller passes none and non-empty params fail.
/// Why: The token chooses destination gas unless the owner opts in to custom params.
#[test]
fn test_default_adapter_params_mode() {
    let mut network = build_unconfigured_network(InProcessTransport::new());
    network
        .chain_mut(SRC_CHAIN_ID)
        .unwrap()
        .mint(&DUMMY_OWNER, DUMMY_ALICE, units(2))
        .unwrap();

    let err = send(&mut network, units(1), &adapter_params(), fee_value()).unwrap_err();
    assert_eq!(err, OmniError::AdapterParamsNotAllowed);

    send(&mut network, units(1), &[], fee_value()).unwrap();
    assert_eq!(network.chain(DST_CHAIN_ID).unwrap().balance_of(&DUMMY_BOB), units(1));
}

/// 11. Test: Unpaired Destination
/// Verifies that a send to a chain with no configuration fails with a configuration error.
/// Why: Value must not be locked for a destination that cannot receive it.
#[test]
fn test_send_to_unpaired_chain_fails() {
    let mut network = funded_network(units(1));

    let err = network
        .send_from(SRC_CHAIN_ID, DUMMY_ALICE, 99, DUMMY_BOB, units(1), &adapter_params(), fee_value())
        .unwrap_err();

    assert!(matches!(
        err,
        OmniError::MinGasNotSet { .. } | OmniError::NoTrustedRemote(99)
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(network.chain(SRC_CHAIN_ID).unwrap().balance_of(&DUMMY_ALICE), units(1));
}

// ============================================================================
// ADMINISTRATION
// ============================================================================

/// 12. Test: Owner-Only Configuration
/// Verifies that every administrative setter rejects a non-owner.
/// Why: Paths, gas minimums and adapter policy are privileged configuration.
#[test]
fn test_admin_setters_require_owner() {
    let mut network = funded_network(units(1));
    let src = network.chain_mut(SRC_CHAIN_ID).unwrap();
    let unauthorized = OmniError::Unauthorized {
        caller: DUMMY_MALLORY,
    };

    assert_eq!(
        src.set_trusted_remote(&DUMMY_MALLORY, DST_CHAIN_ID, vec![1; 40]).unwrap_err(),
        unauthorized
    );
    assert_eq!(
        src.set_min_dst_gas(&DUMMY_MALLORY, DST_CHAIN_ID, PT_SEND, 1).unwrap_err(),
        unauthorized
    );
    assert_eq!(
        src.set_use_custom_adapter_params(&DUMMY_MALLORY, false).unwrap_err(),
        unauthorized
    );
    assert_eq!(
        src.mint(&DUMMY_MALLORY, DUMMY_MALLORY, units(1)).unwrap_err(),
        unauthorized
    );
    assert_eq!(src.token().min_dst_gas(DST_CHAIN_ID, PT_SEND), MIN_DST_GAS);
    assert!(src.token().use_custom_adapter_params());
}

/// 13. Test: Ownership Transfer
/// Verifies that the new owner gains and the old owner loses the capability.
/// Why: Administration must be transferable without sharing keys.
#[test]
fn test_token_ownership_transfer() {
    let mut network = funded_network(units(1));
    let src = network.chain_mut(SRC_CHAIN_ID).unwrap();

    src.transfer_token_ownership(&DUMMY_OWNER, DUMMY_BOB).unwrap();

    assert_eq!(src.token().owner(), DUMMY_BOB);
    assert!(src.set_use_custom_adapter_params(&DUMMY_OWNER, false).is_err());
    src.set_use_custom_adapter_params(&DUMMY_BOB, false).unwrap();
    assert!(src
        .events()
        .iter()
        .any(|e| matches!(e, Event::OwnershipTransferred { new_owner, .. } if *new_owner == DUMMY_BOB)));
}

/// 14. Test: Invalid Decimals
/// Verifies that shared decimals above local decimals are rejected at construction.
/// Why: Shared amounts must always convert back to local amounts exactly.
#[test]
fn test_shared_decimals_above_local_rejected() {
    let err = Chain::new(
        7,
        TokenConfig {
            address: DUMMY_SRC_TOKEN,
            owner: DUMMY_OWNER,
            custody: Custody::Native,
            local_decimals: 6,
            shared_decimals: 8,
        },
    )
    .unwrap_err();

    assert_eq!(err, OmniError::InvalidDecimals { local: 6, shared: 8 });
}

/// 15. Test: Shared Amount Overflow
/// Verifies that an amount whose shared form exceeds u64 is rejected.
/// Why: Shared amounts travel as u64 on the wire.
#[test]
fn test_amount_too_large_for_shared_decimals() {
    let mut network = funded_network(U256::MAX);

    let err = send(&mut network, U256::MAX, &adapter_params(), fee_value()).unwrap_err();

    assert!(matches!(err, OmniError::AmountTooLarge(_)));
}

// ============================================================================
// FAILED CREDIT
// ============================================================================

/// Path of messages from the native chain's token to the proxy chain's token.
fn reverse_token_path() -> Vec<u8> {
    let mut path = DUMMY_DST_TOKEN.as_bytes().to_vec();
    path.extend_from_slice(DUMMY_SRC_TOKEN.as_bytes());
    path
}

/// 16. Test: Credit Fails On An Empty Proxy
/// Verifies that value sent to a proxy chain with nothing locked is stored whole
/// instead of dropped, and is credited exactly once by a retry after value is locked.
/// Why: Value burned on the source must stay recoverable even when the credit fails.
#[test]
fn test_failed_credit_is_stored_and_retried() {
    let mut network = build_network(InProcessTransport::new());
    network
        .chain_mut(DST_CHAIN_ID)
        .unwrap()
        .mint(&DUMMY_OWNER, DUMMY_ALICE, units(5))
        .unwrap();

    network
        .send_from(
            DST_CHAIN_ID,
            DUMMY_ALICE,
            SRC_CHAIN_ID,
            DUMMY_BOB,
            units(5),
            &adapter_params(),
            fee_value(),
        )
        .unwrap();

    let last = network.delivery_log().last().unwrap();
    match &last.status {
        DeliveryStatus::Stored { reason, .. } => assert!(reason.contains("Insufficient balance")),
        other => panic!("expected a stored message, got {:?}", other),
    }
    assert!(network.chain(DST_CHAIN_ID).unwrap().token().ledger().total_supply().is_zero());
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert!(src.balance_of(&DUMMY_BOB).is_zero());
    assert_eq!(src.endpoint().inbound_nonce(DST_CHAIN_ID, &reverse_token_path()), 1);
    let stored = src.stored_messages().next().unwrap().message.clone();
    assert_eq!(src.stored_messages().count(), 1);

    // Nothing locked yet: the retry fails and the record stays
    let err = network.retry_message(SRC_CHAIN_ID, &stored).unwrap_err();
    assert!(matches!(err, OmniError::InsufficientBalance { .. }));
    assert_eq!(network.chain(SRC_CHAIN_ID).unwrap().stored_messages().count(), 1);

    // Lock 5 on the proxy chain, then retry
    network
        .chain_mut(SRC_CHAIN_ID)
        .unwrap()
        .mint(&DUMMY_OWNER, DUMMY_CAROL, units(5))
        .unwrap();
    network
        .send_from(
            SRC_CHAIN_ID,
            DUMMY_CAROL,
            DST_CHAIN_ID,
            DUMMY_CAROL,
            units(5),
            &adapter_params(),
            fee_value(),
        )
        .unwrap();
    let report = network.retry_message(SRC_CHAIN_ID, &stored).unwrap();

    assert_eq!(report.status, DeliveryStatus::Credited);
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert_eq!(src.balance_of(&DUMMY_BOB), units(5));
    assert!(src.token().locked().is_zero());
    assert_eq!(src.stored_messages().count(), 0);
    let dst = network.chain(DST_CHAIN_ID).unwrap();
    assert_eq!(dst.token().ledger().total_supply(), units(5));

    let err = network.retry_message(SRC_CHAIN_ID, &stored).unwrap_err();
    assert_eq!(err, OmniError::NoStoredMessage);
    assert_eq!(err.kind(), ErrorKind::Retry);
}

/// 17. Test: Altered Stored Message
/// Verifies that a retry presenting a different payload than the stored one fails.
/// Why: A stored record may only release the value it was created for.
#[test]
fn test_retry_message_requires_identical_message() {
    let mut network = build_network(InProcessTransport::new());
    network
        .chain_mut(DST_CHAIN_ID)
        .unwrap()
        .mint(&DUMMY_OWNER, DUMMY_ALICE, units(1))
        .unwrap();
    network
        .send_from(
            DST_CHAIN_ID,
            DUMMY_ALICE,
            SRC_CHAIN_ID,
            DUMMY_BOB,
            units(1),
            &adapter_params(),
            fee_value(),
        )
        .unwrap();
    let mut altered = network
        .chain(SRC_CHAIN_ID)
        .unwrap()
        .stored_messages()
        .next()
        .unwrap()
        .message
        .clone();
    let last = altered.payload.len() - 1;
    altered.payload[last] ^= 0xff;

    let err = network.retry_message(SRC_CHAIN_ID, &altered).unwrap_err();

    assert_eq!(err, OmniError::NoStoredMessage);
}

// ============================================================================
// PAIRING
// ============================================================================

/// 18. Test: Shared Decimals Mismatch
/// Verifies that tokens with different shared decimals cannot be paired.
/// Why: Amounts travel in shared decimals; a mismatch would credit the wrong amount.
#[test]
fn test_pairing_with_different_shared_decimals_fails() {
    let mut network = Network::new(InProcessTransport::new());
    network
        .add_chain(Chain::new(SRC_CHAIN_ID, token_config(DUMMY_SRC_TOKEN, Custody::Proxy)).unwrap())
        .unwrap();
    let mut wide = token_config(DUMMY_DST_TOKEN, Custody::Native);
    wide.shared_decimals = 8;
    network.add_chain(Chain::new(DST_CHAIN_ID, wide).unwrap()).unwrap();

    let err = network.pair_tokens(SRC_CHAIN_ID, DST_CHAIN_ID).unwrap_err();

    assert_eq!(
        err,
        OmniError::SharedDecimalsMismatch {
            a: SRC_CHAIN_ID,
            a_shared: 6,
            b: DST_CHAIN_ID,
            b_shared: 8,
        }
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let src = network.chain(SRC_CHAIN_ID).unwrap();
    assert!(src.token().paths().trusted_remote(DST_CHAIN_ID).is_none());
}
