//! Integration tests for NTT routes using fake implementations
//!
//! Two in-memory manager deployments (Sepolia and Base Sepolia) share one
//! fake clock, so rate-limit windows, queue expiries and tracking timeouts
//! all move together when the route sleeps.

use std::collections::BTreeMap;
use std::time::Duration;

use alloy_primitives::U256;
use futures::StreamExt;
use ntt_rs::layout::Schema;
use ntt_rs::protocol::{NttMessage, NATIVE_TOKEN_TRANSFER_PREFIX};
use ntt_rs::route::{Automatic, Manual, RoutePolicy};
use ntt_rs::testing::{
    FakeAttestationSource, FakeClock, FakeNttAdapter, FakeSigner, FakeTransaction,
};
use ntt_rs::{
    parse_units, Chain, Clock, ChainFamily, Network, NttAdapter, NttError, NttRoute, NttRouteConfig,
    Signer, TransferParams, TransferRecord, TransferState, TrimmedAmount, UniversalAddress,
    ValidationError,
};
use rstest::rstest;

type Route<R> = NttRoute<R, FakeNttAdapter, FakeNttAdapter, FakeAttestationSource, FakeClock>;

const CORE_FEE: u64 = 1_000;
const RELAY_FEE: u64 = 50_000;

struct Harness {
    clock: FakeClock,
    source: FakeNttAdapter,
    destination: FakeNttAdapter,
    attestations: FakeAttestationSource,
}

impl Harness {
    fn new(source_decimals: u8, destination_decimals: u8) -> Self {
        let clock = FakeClock::new();
        let source =
            FakeNttAdapter::new(Chain::Sepolia, source_decimals).with_clock(clock.clone());
        let destination = FakeNttAdapter::new(Chain::BaseSepolia, destination_decimals)
            .with_clock(clock.clone());
        source.connect(&destination).unwrap();
        source.set_auto_finalize(true);
        destination.set_auto_finalize(true);
        source.set_delivery_prices(U256::from(CORE_FEE), U256::from(RELAY_FEE));
        source.mint(
            source.signer_address(),
            parse_units("100", source_decimals).unwrap(),
        );

        Self {
            clock,
            source,
            destination,
            attestations: FakeAttestationSource::new(),
        }
    }

    fn config(&self) -> NttRouteConfig {
        NttRouteConfig {
            network: Network::Testnet,
            chains: BTreeMap::from([
                (Chain::Sepolia, self.source.deployment()),
                (Chain::BaseSepolia, self.destination.deployment()),
            ]),
        }
    }

    fn route<R: RoutePolicy>(&self) -> Route<R> {
        NttRoute::builder()
            .config(self.config())
            .source(self.source.clone())
            .destination(self.destination.clone())
            .attestations(self.attestations.clone())
            .clock(self.clock.clone())
            .build()
    }

    fn params(&self, amount: &str) -> TransferParams {
        TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::BaseSepolia)
            .amount(amount)
            .sender(self.source.signer_address())
            .recipient(self.destination.signer_address())
            .build()
    }

    async fn initiate<R: RoutePolicy>(&self, route: &Route<R>, params: &TransferParams) -> TransferRecord {
        let transfer = route.validate(params).unwrap();
        let quote = route.quote(&transfer).await.unwrap();
        route.initiate(&self.source, &quote).await.unwrap()
    }

    /// Makes the guardians' signature for `record` available.
    fn publish_attestation(&self, record: &TransferRecord) {
        let txid = &record.origin_txid().unwrap().txid;
        let vaa = self.source.attest(txid).unwrap();
        self.attestations.add_attestation(Chain::Sepolia, txid, vaa);
    }

    fn recipient_balance(&self) -> U256 {
        self.destination.balance_of(self.destination.signer_address())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn track_all<R: RoutePolicy>(
    route: &Route<R>,
    record: TransferRecord,
    timeout: Option<Duration>,
) -> Vec<Result<TransferRecord, NttError>> {
    route.track(record, timeout).collect().await
}

fn states(updates: &[Result<TransferRecord, NttError>]) -> Vec<TransferState> {
    updates
        .iter()
        .filter_map(|update| update.as_ref().ok())
        .map(|record| record.state)
        .collect()
}

fn last_record(updates: Vec<Result<TransferRecord, NttError>>) -> TransferRecord {
    updates
        .into_iter()
        .last()
        .expect("tracking yielded nothing")
        .expect("tracking failed")
}

// ============================================================================
// Manual route
// ============================================================================

#[tokio::test]
async fn test_manual_transfer_end_to_end() {
    init_tracing();
    let h = Harness::new(18, 6);
    let route = h.route::<Manual>();

    let transfer = route.validate(&h.params("1.5")).unwrap();
    assert_eq!(transfer.trimmed_amount, TrimmedAmount::new(1_500_000, 6));
    assert_eq!(transfer.destination_amount, U256::from(1_500_000u64));

    let quote = route.quote(&transfer).await.unwrap();
    assert_eq!(quote.delivery_price, U256::from(CORE_FEE));
    assert_eq!(quote.relay_fee, None);
    assert!(!quote.outbound_queued);
    assert!(!quote.inbound_queued);

    let record = route.initiate(&h.source, &quote).await.unwrap();
    assert_eq!(record.state, TransferState::SourceInitiated);
    // approval first, then the transfer itself
    assert_eq!(record.origin_txids.len(), 2);
    let executed = h.source.executed_transactions();
    assert!(matches!(executed[0], FakeTransaction::Approve { .. }));
    assert!(matches!(executed[1], FakeTransaction::Transfer(_)));
    assert_eq!(
        h.source.balance_of(h.source.signer_address()),
        parse_units("98.5", 18).unwrap()
    );

    h.publish_attestation(&record);
    let updates = track_all(&route, record, Some(Duration::from_secs(600))).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::SourceFinalized, TransferState::Attested]
    );
    let attested = last_record(updates);

    let txid = &attested.origin_txid().unwrap().txid;
    let message = h.source.published_message(txid).unwrap();
    assert_eq!(
        attested.attestation().unwrap().digest,
        message.digest(Chain::Sepolia.id()).unwrap()
    );

    let completion = route.complete(&h.destination, &attested).await.unwrap();
    assert_eq!(completion.len(), 1);
    assert_eq!(h.recipient_balance(), U256::from(1_500_000u64));

    let updates = track_all(&route, attested, None).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::Redeemed, TransferState::DestinationFinalized]
    );
    let finalized = last_record(updates);
    assert!(finalized.is_finalized());

    // a final record is yielded once more, unchanged
    let updates = track_all(&route, finalized.clone(), None).await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].as_ref().unwrap(), &finalized);

    assert!(matches!(
        route.complete(&h.destination, &finalized).await,
        Err(NttError::InvalidState(_))
    ));
    assert_eq!(h.clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_tracking_never_moves_backwards() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("2")).await;
    h.publish_attestation(&record);

    let mut trail = vec![record.state];
    let attested = last_record(track_all(&route, record, None).await);
    trail.push(attested.state);
    route.complete(&h.destination, &attested).await.unwrap();

    let updates = track_all(&route, attested, None).await;
    trail.extend(states(&updates));

    assert!(trail.windows(2).all(|pair| pair[0] < pair[1]), "{trail:?}");
    assert_eq!(trail.last(), Some(&TransferState::DestinationFinalized));
}

#[tokio::test]
async fn test_complete_requires_attestation() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;

    assert!(matches!(
        route.complete(&h.destination, &record).await,
        Err(NttError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_complete_rejects_signer_on_wrong_chain() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;
    h.publish_attestation(&record);
    let attested = last_record(track_all(&route, record, None).await);

    assert!(matches!(
        route.complete(&h.source, &attested).await,
        Err(NttError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_initiate_rejects_foreign_signer() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let transfer = route.validate(&h.params("1")).unwrap();
    let quote = route.quote(&transfer).await.unwrap();

    let wrong_chain = FakeSigner::<FakeTransaction>::new(Chain::BaseSepolia, h.source.signer_address());
    assert!(matches!(
        route.initiate(&wrong_chain, &quote).await,
        Err(NttError::InvalidConfig(_))
    ));

    let wrong_sender = FakeSigner::<FakeTransaction>::new(Chain::Sepolia, UniversalAddress::ZERO);
    assert!(matches!(
        route.initiate(&wrong_sender, &quote).await,
        Err(NttError::InvalidConfig(_))
    ));
    assert!(wrong_sender.sent().is_empty());
}

#[tokio::test]
async fn test_initiate_surfaces_broadcast_failure() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let transfer = route.validate(&h.params("1")).unwrap();
    let quote = route.quote(&transfer).await.unwrap();

    let signer = FakeSigner::<FakeTransaction>::new(Chain::Sepolia, h.source.signer_address());
    signer.set_fail(true);
    assert!(matches!(
        route.initiate(&signer, &quote).await,
        Err(NttError::Provider(_))
    ));
}

// ============================================================================
// Automatic route
// ============================================================================

#[tokio::test]
async fn test_automatic_transfer_is_relayed() {
    init_tracing();
    let h = Harness::new(18, 18);
    let route = h.route::<Automatic>();
    assert!(route.is_automatic());

    let params = TransferParams::builder()
        .source_chain(Chain::Sepolia)
        .destination_chain(Chain::BaseSepolia)
        .amount("3")
        .sender(h.source.signer_address())
        .recipient(h.destination.signer_address())
        .gas_drop_off("0.05")
        .build();
    let transfer = route.validate(&params).unwrap();
    let quote = route.quote(&transfer).await.unwrap();
    let drop_off = parse_units("0.05", 18).unwrap();
    assert_eq!(quote.destination_gas_drop_off, drop_off);
    assert_eq!(quote.delivery_price, U256::from(RELAY_FEE) + drop_off);
    assert_eq!(quote.relay_fee, Some(quote.delivery_price));

    let record = route.initiate(&h.source, &quote).await.unwrap();
    let submitted = h
        .source
        .executed_transactions()
        .into_iter()
        .find_map(|transaction| match transaction {
            FakeTransaction::Transfer(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(submitted.gas_drop_off, drop_off);
    assert_eq!(submitted.delivery_price, quote.delivery_price);
    h.publish_attestation(&record);

    let mut updates = Box::pin(route.track(record, Some(Duration::from_secs(3_600))));
    let finalized = updates.next().await.unwrap().unwrap();
    assert_eq!(finalized.state, TransferState::SourceFinalized);
    let attested = updates.next().await.unwrap().unwrap();
    assert_eq!(attested.state, TransferState::Attested);

    // the relayer delivers
    let vaa = attested.attestation().unwrap().vaa.clone();
    let redeem = h
        .destination
        .redeem(&[vaa], h.destination.signer_address())
        .await
        .unwrap();
    h.destination.sign_and_send(redeem).await.unwrap();

    let redeemed = updates.next().await.unwrap().unwrap();
    assert_eq!(redeemed.state, TransferState::Redeemed);
    let done = updates.next().await.unwrap().unwrap();
    assert_eq!(done.state, TransferState::DestinationFinalized);
    assert!(updates.next().await.is_none());

    assert_eq!(h.recipient_balance(), parse_units("3", 18).unwrap());
}

#[tokio::test]
async fn test_automatic_times_out_without_relay() {
    let h = Harness::new(18, 18);
    let route = h.route::<Automatic>();
    let record = h.initiate(&route, &h.params("1")).await;
    h.publish_attestation(&record);

    let updates = track_all(&route, record, Some(Duration::from_secs(300))).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::SourceFinalized, TransferState::Attested]
    );
    assert!(matches!(
        updates.last(),
        Some(Err(NttError::Timeout {
            waiting_for: "relayed redemption",
            ..
        }))
    ));
    assert_eq!(h.clock.total_sleep_time(), Duration::from_secs(300));
}

#[tokio::test]
async fn test_gas_drop_off_raises_delivery_price() {
    let h = Harness::new(18, 18);
    let route = h.route::<Automatic>();

    let plain = route.validate(&h.params("1")).unwrap();
    let with_drop_off = route
        .validate(
            &TransferParams::builder()
                .source_chain(Chain::Sepolia)
                .destination_chain(Chain::BaseSepolia)
                .amount("1")
                .sender(h.source.signer_address())
                .recipient(h.destination.signer_address())
                .gas_drop_off("0.02")
                .build(),
        )
        .unwrap();

    let plain = route.quote(&plain).await.unwrap();
    let with_drop_off = route.quote(&with_drop_off).await.unwrap();
    assert_eq!(plain.delivery_price, U256::from(RELAY_FEE));
    assert_eq!(
        with_drop_off.delivery_price - plain.delivery_price,
        parse_units("0.02", 18).unwrap()
    );

    // paying only the plain price no longer covers the drop-off
    let mut underpaid = with_drop_off.clone();
    underpaid.delivery_price = plain.delivery_price;
    assert!(matches!(
        route.initiate(&h.source, &underpaid).await,
        Err(NttError::ContractCall(_))
    ));
}

#[rstest]
#[case::manual_rejects_any_drop_off(false, "0.01")]
#[case::automatic_above_maximum(true, "0.5")]
#[tokio::test]
async fn test_gas_drop_off_limits(#[case] automatic: bool, #[case] drop_off: &str) {
    let h = Harness::new(18, 18);
    let params = TransferParams::builder()
        .source_chain(Chain::Sepolia)
        .destination_chain(Chain::BaseSepolia)
        .amount("1")
        .sender(h.source.signer_address())
        .recipient(h.destination.signer_address())
        .gas_drop_off(drop_off)
        .build();

    let result = if automatic {
        h.route::<Automatic>().validate(&params)
    } else {
        h.route::<Manual>().validate(&params)
    };
    assert!(matches!(
        result,
        Err(NttError::Validation(ValidationError::GasDropOffTooLarge { .. }))
    ));
}

// ============================================================================
// Waiting and timeouts
// ============================================================================

#[tokio::test]
async fn test_attestation_timeout_with_fake_clock() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;
    let txid = record.origin_txid().unwrap().txid.clone();

    let updates = track_all(&route, record, Some(Duration::from_secs(120))).await;
    assert_eq!(states(&updates), vec![TransferState::SourceFinalized]);
    assert!(matches!(
        updates.last(),
        Some(Err(NttError::Timeout {
            waiting_for: "attestation",
            ..
        }))
    ));

    // polled at 0, 30, 60, 90 and 120 seconds
    assert_eq!(h.attestations.get_call_count(Chain::Sepolia, &txid), 5);
    assert_eq!(h.clock.sleep_count(), 4);
    assert_eq!(h.clock.total_sleep_time(), Duration::from_secs(120));
}

#[tokio::test]
async fn test_attestation_rate_limit_backs_off() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;
    let txid = record.origin_txid().unwrap().txid.clone();

    h.attestations.add_rate_limited(Chain::Sepolia, &txid, 1, 90);
    h.publish_attestation(&record);

    let updates = track_all(&route, record, None).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::SourceFinalized, TransferState::Attested]
    );
    assert_eq!(h.clock.sleep_log(), vec![Duration::from_secs(90)]);
    assert_eq!(h.attestations.get_call_count(Chain::Sepolia, &txid), 2);
}

#[tokio::test]
async fn test_backoff_longer_than_timeout_fails_fast() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;
    let txid = record.origin_txid().unwrap().txid.clone();
    h.attestations.add_rate_limited(Chain::Sepolia, &txid, 1, 600);

    let updates = track_all(&route, record, Some(Duration::from_secs(120))).await;
    assert!(matches!(
        updates.last(),
        Some(Err(NttError::Timeout { .. }))
    ));
    assert_eq!(h.clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_attestation_failure_ends_tracking() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;
    let txid = record.origin_txid().unwrap().txid.clone();
    h.attestations.add_failed(Chain::Sepolia, &txid);

    let updates = track_all(&route, record, None).await;
    assert_eq!(updates.len(), 2);
    assert!(matches!(
        updates[1],
        Err(NttError::AttestationFailed { .. })
    ));
}

#[tokio::test]
async fn test_tracking_resumes_after_source_finality_timeout() {
    let h = Harness::new(18, 18);
    h.source.set_auto_finalize(false);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1")).await;

    let updates = track_all(&route, record.clone(), Some(Duration::from_secs(60))).await;
    assert_eq!(updates.len(), 1);
    assert!(matches!(
        updates[0],
        Err(NttError::Timeout {
            waiting_for: "source finality",
            ..
        })
    ));

    h.source
        .finalize_transaction(&record.origin_txid().unwrap().txid);
    h.publish_attestation(&record);

    let updates = track_all(&route, record, Some(Duration::from_secs(60))).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::SourceFinalized, TransferState::Attested]
    );
}

#[tokio::test]
async fn test_mismatched_attestation_is_rejected() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let first = h.initiate(&route, &h.params("1")).await;
    let second = h.initiate(&route, &h.params("2")).await;

    // the first transfer's lookup returns the second transfer's VAA
    let first_txid = &first.origin_txid().unwrap().txid;
    let second_vaa = h
        .source
        .attest(&second.origin_txid().unwrap().txid)
        .unwrap();
    h.attestations
        .add_attestation(Chain::Sepolia, first_txid, second_vaa);

    let updates = track_all(&route, first, None).await;
    assert!(matches!(
        updates.last(),
        Some(Err(NttError::AttestationFailed { .. }))
    ));
}

// ============================================================================
// Rate limits and queues
// ============================================================================

#[tokio::test]
async fn test_inbound_queue_lifecycle() {
    let h = Harness::new(18, 18);
    h.destination
        .set_inbound_limit(Chain::Sepolia, parse_units("1", 18).unwrap())
        .unwrap();
    let route = h.route::<Manual>();

    let transfer = route.validate(&h.params("1.5")).unwrap();
    let quote = route.quote(&transfer).await.unwrap();
    assert!(quote.inbound_queued);
    assert_eq!(
        quote.inbound_queue_delay,
        Some(FakeNttAdapter::RATE_LIMIT_DURATION)
    );

    let record = route.initiate(&h.source, &quote).await.unwrap();
    let message = h
        .source
        .published_message(&record.origin_txid().unwrap().txid)
        .unwrap();
    let limits = route.destination_rate_limits();
    assert_eq!(
        limits
            .get_inbound_queued_transfer(Chain::Sepolia, &message)
            .await
            .unwrap(),
        None
    );

    h.publish_attestation(&record);
    let attested = last_record(track_all(&route, record, None).await);
    route.complete(&h.destination, &attested).await.unwrap();
    assert_eq!(h.recipient_balance(), U256::ZERO);

    let updates = track_all(&route, attested, None).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::Redeemed, TransferState::Queued]
    );
    let queued_record = last_record(updates);
    let queued = queued_record.queued.clone().unwrap();
    assert_eq!(queued.tx_timestamp, FakeClock::START_UNIX_TIME);
    assert_eq!(
        queued.rate_limit_expiry_timestamp,
        queued.tx_timestamp + FakeNttAdapter::RATE_LIMIT_DURATION
    );
    assert_eq!(
        limits
            .get_inbound_queued_transfer(Chain::Sepolia, &message)
            .await
            .unwrap(),
        Some(queued.clone())
    );

    let digest = queued_record.attestation().unwrap().digest;
    assert!(!limits
        .is_queued_transfer_ready(digest, h.clock.unix_time())
        .await
        .unwrap());
    assert!(matches!(
        route.complete(&h.destination, &queued_record).await,
        Err(NttError::QueuedTransferNotReady { expiry, .. })
            if expiry == queued.rate_limit_expiry_timestamp
    ));

    h.clock
        .advance(Duration::from_secs(FakeNttAdapter::RATE_LIMIT_DURATION));
    assert!(limits
        .is_queued_transfer_ready(digest, h.clock.unix_time())
        .await
        .unwrap());
    route.complete(&h.destination, &queued_record).await.unwrap();
    assert_eq!(h.recipient_balance(), parse_units("1.5", 18).unwrap());

    let updates = track_all(&route, queued_record, None).await;
    assert_eq!(states(&updates), vec![TransferState::DestinationFinalized]);
    assert_eq!(last_record(updates).queued, None);
}

#[tokio::test]
async fn test_outbound_capacity_requires_queueing() {
    let h = Harness::new(18, 18);
    h.source
        .set_outbound_limit(parse_units("1", 18).unwrap())
        .unwrap();
    let route = h.route::<Manual>();

    let capacity = route
        .source_rate_limits()
        .get_current_outbound_capacity()
        .await
        .unwrap();
    assert_eq!(capacity, parse_units("1", 18).unwrap());

    let transfer = route.validate(&h.params("1.5")).unwrap();
    assert!(matches!(
        route.quote(&transfer).await,
        Err(NttError::Quote { .. })
    ));

    let params = TransferParams::builder()
        .source_chain(Chain::Sepolia)
        .destination_chain(Chain::BaseSepolia)
        .amount("1.5")
        .sender(h.source.signer_address())
        .recipient(h.destination.signer_address())
        .should_queue(true)
        .build();
    let transfer = route.validate(&params).unwrap();
    let quote = route.quote(&transfer).await.unwrap();
    assert!(quote.outbound_queued);
    assert_eq!(
        quote.outbound_queue_delay,
        Some(FakeNttAdapter::RATE_LIMIT_DURATION)
    );

    let record = route.initiate(&h.source, &quote).await.unwrap();
    assert_eq!(h.source.outbound_queue().len(), 1);
    assert!(h
        .source
        .published_message(&record.origin_txid().unwrap().txid)
        .is_none());
}

#[tokio::test]
async fn test_outbound_queue_lifecycle() {
    init_tracing();
    let h = Harness::new(18, 18);
    h.source
        .set_outbound_limit(parse_units("1", 18).unwrap())
        .unwrap();
    let route = h.route::<Manual>();

    let params = TransferParams::builder()
        .source_chain(Chain::Sepolia)
        .destination_chain(Chain::BaseSepolia)
        .amount("1.5")
        .sender(h.source.signer_address())
        .recipient(h.destination.signer_address())
        .should_queue(true)
        .build();
    let record = h.initiate(&route, &params).await;

    // nothing is published while the source holds the transfer
    let updates = track_all(&route, record, None).await;
    assert_eq!(states(&updates), vec![TransferState::SourceFinalized]);
    let finalized = last_record(updates);

    let pending = route
        .outbound_queued_transfer(&finalized)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.queue_sequence, 0);
    assert_eq!(pending.recipient, h.destination.signer_address());
    assert_eq!(pending.recipient_chain, Chain::BaseSepolia.id());
    assert_eq!(pending.amount, TrimmedAmount::new(150_000_000, 8));
    assert_eq!(pending.tx_timestamp, FakeClock::START_UNIX_TIME);
    assert_eq!(
        pending.rate_limit_expiry_timestamp,
        FakeClock::START_UNIX_TIME + FakeNttAdapter::RATE_LIMIT_DURATION
    );

    assert!(matches!(
        route.release_outbound(&h.source, &finalized).await,
        Err(NttError::QueuedTransferNotReady { expiry, .. })
            if expiry == pending.rate_limit_expiry_timestamp
    ));
    assert_eq!(h.source.outbound_queue(), vec![pending.clone()]);

    h.clock
        .advance(Duration::from_secs(FakeNttAdapter::RATE_LIMIT_DURATION));
    let released = route.release_outbound(&h.source, &finalized).await.unwrap();
    assert_eq!(released.state, TransferState::SourceFinalized);
    assert_eq!(
        released.origin_txids.len(),
        finalized.origin_txids.len() + 1
    );
    assert!(h.source.outbound_queue().is_empty());
    assert_eq!(route.outbound_queued_transfer(&released).await.unwrap(), None);
    assert!(matches!(
        h.source.executed_transactions().last(),
        Some(FakeTransaction::CompleteOutboundQueued { queue_sequence: 0, .. })
    ));

    h.publish_attestation(&released);
    let updates = track_all(&route, released, None).await;
    assert_eq!(states(&updates), vec![TransferState::Attested]);
    let attested = last_record(updates);

    route.complete(&h.destination, &attested).await.unwrap();
    assert_eq!(h.recipient_balance(), parse_units("1.5", 18).unwrap());
    let updates = track_all(&route, attested, None).await;
    assert_eq!(
        states(&updates),
        vec![TransferState::Redeemed, TransferState::DestinationFinalized]
    );
}

#[tokio::test]
async fn test_quote_wraps_read_failures() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let transfer = route.validate(&h.params("1")).unwrap();

    h.source.set_fail_reads(true);
    let err = route.quote(&transfer).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        NttError::Quote { reason } => assert!(reason.starts_with("delivery price"), "{reason}"),
        other => panic!("expected a quote error, got {other:?}"),
    }
}

// ============================================================================
// Validation and wire format
// ============================================================================

#[rstest]
#[case::zero("0", 18, 18)]
#[case::beyond_destination_precision("1.0000000001", 18, 6)]
#[case::beyond_wire_precision("1.23456789012345", 18, 18)]
#[case::not_a_number("1.2.3", 18, 18)]
fn test_validation_rejects(#[case] amount: &str, #[case] source: u8, #[case] destination: u8) {
    let h = Harness::new(source, destination);
    let result = h.route::<Manual>().validate(&h.params(amount));
    assert!(matches!(result, Err(NttError::Validation(_))), "{result:?}");
}

#[test]
fn test_validation_names_target_precision() {
    let h = Harness::new(18, 6);
    let result = h.route::<Manual>().validate(&h.params("1.0000000001"));
    assert!(matches!(
        result,
        Err(NttError::Validation(ValidationError::Precision { decimals: 6, .. }))
    ));
}

#[test]
fn test_validation_rejects_unrouted_chains() {
    let h = Harness::new(18, 18);
    let params = TransferParams::builder()
        .source_chain(Chain::Sepolia)
        .destination_chain(Chain::ArbitrumSepolia)
        .amount("1")
        .sender(h.source.signer_address())
        .recipient(h.destination.signer_address())
        .build();
    assert!(matches!(
        h.route::<Manual>().validate(&params),
        Err(NttError::InvalidConfig(_))
    ));
}

#[test]
fn test_wire_amount_is_truncated_to_eight_decimals() {
    assert_eq!(
        TrimmedAmount::parse("1.23456789012345", 18).unwrap(),
        TrimmedAmount::new(123_456_789, 8)
    );
}

#[rstest]
#[case::zero([0x00; 20])]
#[case::all_ones([0xff; 20])]
#[case::mixed([0x12, 0x34, 0x56, 0x78, 0x90, 0xab, 0xcd, 0xef, 0x12, 0x34, 0x56, 0x78, 0x90, 0xab, 0xcd, 0xef, 0x12, 0x34, 0x56, 0x78])]
fn test_evm_address_round_trip(#[case] native: [u8; 20]) {
    let universal = UniversalAddress::from_native(ChainFamily::Evm, &native).unwrap();
    assert_eq!(&universal.as_slice()[..12], &[0u8; 12]);
    assert_eq!(universal.to_native(ChainFamily::Evm).unwrap(), native.to_vec());

    let text = universal.to_native_string(ChainFamily::Evm).unwrap();
    assert_eq!(UniversalAddress::parse(ChainFamily::Evm, &text).unwrap(), universal);
}

#[tokio::test]
async fn test_published_transfer_wire_format() {
    let h = Harness::new(18, 18);
    let route = h.route::<Manual>();
    let record = h.initiate(&route, &h.params("1.5")).await;
    let message = h
        .source
        .published_message(&record.origin_txid().unwrap().txid)
        .unwrap();

    let bytes = message.payload.encode().unwrap();
    assert_eq!(bytes.len(), 79);
    assert_eq!(bytes[..4], NATIVE_TOKEN_TRANSFER_PREFIX);
    assert_eq!(bytes[4], 8);
    assert_eq!(bytes[5..13], 150_000_000u64.to_be_bytes());
    assert_eq!(bytes[77..], Chain::BaseSepolia.id().to_be_bytes());

    match NttMessage::decode(&bytes).unwrap() {
        NttMessage::NativeTokenTransfer(decoded) => assert_eq!(decoded, message.payload),
        other => panic!("decoded as {other:?}"),
    }
}
