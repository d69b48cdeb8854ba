//! Test utilities and fake implementations of the NTT traits
//!
//! These fakes let the whole transfer lifecycle run in memory: a
//! [`FakeNttAdapter`] behaves like one chain's manager deployment (with
//! sliding-window rate limits and an inbound queue) and also signs and
//! executes its own transactions, a [`FakeAttestationSource`] serves
//! attestations per source transaction, and a [`FakeClock`] fast-forwards
//! through waits.
//!
//! They are meant for integration tests of routes under conditions such as
//! slow finality, attestation rate limiting, exhausted capacity and
//! timeouts.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use async_trait::async_trait;

use crate::error::{NttError, Result};
use crate::layout::Schema;
use crate::protocol::{
    Chain, GuardianSignature, ManagerMessage, NativeTokenTransfer, QueuedInboundTransfer,
    QueuedOutboundTransfer, RateLimitState, TransceiverInstructions, TransceiverMessage, TrimmedAmount, UniversalAddress,
    Vaa, WormholeTransceiverInstruction, WormholeTransferMessage, TRIMMED_DECIMALS,
};
use crate::route::{ChainDeployment, TransceiverConfig, TransceiverKind};
use crate::traits::{
    AttestationSource, Clock, NttAdapter, Signer, TransactionId, TransferRequest,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deterministic 20-byte address for a role on a chain.
fn fake_address(tag: u8, chain: Chain) -> UniversalAddress {
    let mut bytes = [tag; 20];
    bytes[18..].copy_from_slice(&chain.id().to_be_bytes());
    Address::from(bytes).into()
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// Sleeping never waits; it advances both the monotonic and the wall clock
/// by the requested duration and logs it.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    unix_time: Arc<Mutex<u64>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            unix_time: Arc::new(Mutex::new(Self::START_UNIX_TIME)),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    /// Wall-clock time a new fake clock starts at.
    pub const START_UNIX_TIME: u64 = 1_700_000_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *lock(&self.current_time) += duration;
        *lock(&self.unix_time) += duration.as_secs();
    }

    pub fn set_unix_time(&self, secs: u64) {
        *lock(&self.unix_time) = secs;
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleep_log(&self) -> Vec<Duration> {
        lock(&self.sleep_log).clone()
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        lock(&self.sleep_log).iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        lock(&self.sleep_log).len()
    }

    pub fn clear_sleep_log(&self) {
        lock(&self.sleep_log).clear();
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        lock(&self.sleep_log).push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *lock(&self.current_time)
    }

    fn unix_time(&self) -> u64 {
        *lock(&self.unix_time)
    }
}

// ============================================================================
// Fake NTT Adapter
// ============================================================================

/// Unsigned transactions built by [`FakeNttAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeTransaction {
    Approve {
        spender: UniversalAddress,
        amount: U256,
    },
    Transfer(TransferRequest),
    Redeem {
        attestations: Vec<Bytes>,
        payer: UniversalAddress,
    },
    CompleteQueued {
        digest: B256,
        payer: UniversalAddress,
    },
    CompleteOutboundQueued {
        queue_sequence: u64,
        payer: UniversalAddress,
        delivery_price: U256,
    },
    SetPeer {
        chain: Chain,
        manager: UniversalAddress,
        decimals: u8,
        inbound_limit: U256,
    },
}

#[derive(Debug, Clone)]
struct FakePeer {
    manager: UniversalAddress,
    decimals: u8,
    inbound: RateLimitState,
}

/// A transfer message emitted by a source transaction.
#[derive(Debug, Clone)]
struct Published {
    message: ManagerMessage<NativeTokenTransfer>,
    recipient_manager: UniversalAddress,
    sequence: u64,
}

/// A transfer held back by the outbound window, keyed by the transaction
/// that queued it.
#[derive(Debug, Clone)]
struct OutboundEntry {
    txid: String,
    request: TransferRequest,
    queued: QueuedOutboundTransfer,
}

#[derive(Debug)]
struct FakeState {
    rate_limit_duration: u64,
    outbound: RateLimitState,
    peers: HashMap<Chain, FakePeer>,
    balances: HashMap<UniversalAddress, U256>,
    allowances: HashMap<UniversalAddress, U256>,
    core_fee: U256,
    relay_fee: U256,
    next_sequence: u64,
    next_queue_sequence: u64,
    next_tx: u64,
    auto_finalize: bool,
    fail_reads: bool,
    finalized: HashSet<String>,
    published: HashMap<String, Published>,
    approved: HashSet<B256>,
    executed: HashSet<B256>,
    inbound_queue: HashMap<B256, QueuedInboundTransfer>,
    outbound_queue: Vec<OutboundEntry>,
    executed_transactions: Vec<FakeTransaction>,
}

/// An in-memory NTT manager deployment on one chain.
///
/// The adapter is also a [`Signer`] for its own [`FakeTransaction`]s:
/// `sign_and_send` executes them against the in-memory state, in order,
/// stopping at the first one that would revert on chain.
///
/// Rate limits are kept at the token's trimmed precision, as on chain.
/// Sending a transfer publishes a message that [`FakeNttAdapter::attest`]
/// turns into a signed attestation for the destination adapter to redeem.
#[derive(Clone, Debug)]
pub struct FakeNttAdapter {
    chain: Chain,
    decimals: u8,
    manager: UniversalAddress,
    token: UniversalAddress,
    transceiver: UniversalAddress,
    signer: UniversalAddress,
    clock: FakeClock,
    state: Arc<Mutex<FakeState>>,
}

impl FakeNttAdapter {
    /// Default window length (one day).
    pub const RATE_LIMIT_DURATION: u64 = 86_400;

    /// A deployment with unlimited outbound capacity and no peers.
    pub fn new(chain: Chain, decimals: u8) -> Self {
        let clock = FakeClock::new();
        let now = clock.unix_time();
        Self {
            chain,
            decimals,
            manager: fake_address(0x11, chain),
            token: fake_address(0x22, chain),
            transceiver: fake_address(0x33, chain),
            signer: fake_address(0xaa, chain),
            clock,
            state: Arc::new(Mutex::new(FakeState {
                rate_limit_duration: Self::RATE_LIMIT_DURATION,
                outbound: RateLimitState::new(u64::MAX, now),
                peers: HashMap::new(),
                balances: HashMap::new(),
                allowances: HashMap::new(),
                core_fee: U256::ZERO,
                relay_fee: U256::ZERO,
                next_sequence: 0,
                next_queue_sequence: 0,
                next_tx: 1,
                auto_finalize: false,
                fail_reads: false,
                finalized: HashSet::new(),
                published: HashMap::new(),
                approved: HashSet::new(),
                executed: HashSet::new(),
                inbound_queue: HashMap::new(),
                outbound_queue: Vec::new(),
                executed_transactions: Vec::new(),
            })),
        }
    }

    /// Uses `clock` for on-chain timestamps, usually the route's clock.
    pub fn with_clock(mut self, clock: FakeClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn token_address(&self) -> UniversalAddress {
        self.token
    }

    pub fn transceiver_address(&self) -> UniversalAddress {
        self.transceiver
    }

    /// Account that signs this adapter's transactions.
    pub fn signer_address(&self) -> UniversalAddress {
        self.signer
    }

    /// Route configuration entry describing this deployment.
    pub fn deployment(&self) -> ChainDeployment {
        let family = self.chain.family();
        let native = |address: UniversalAddress| {
            address
                .to_native_string(family)
                .unwrap_or_else(|_| address.to_string())
        };
        ChainDeployment {
            manager: native(self.manager),
            token: native(self.token),
            decimals: self.decimals,
            transceivers: vec![TransceiverConfig {
                kind: TransceiverKind::Wormhole,
                address: native(self.transceiver),
            }],
            max_gas_drop_off: Some("0.1".to_string()),
        }
    }

    fn trimmed_decimals(&self) -> u8 {
        TRIMMED_DECIMALS.min(self.decimals)
    }

    fn to_window_units(&self, amount: U256) -> Result<u64> {
        Ok(TrimmedAmount::trim(amount, self.decimals, self.decimals)?.amount)
    }

    fn from_window_units(&self, units: u64) -> Result<U256> {
        TrimmedAmount::new(units, self.trimmed_decimals()).untrim(self.decimals)
    }

    /// Registers a peer directly, bypassing `set_peer`.
    pub fn add_peer(&self, peer: &FakeNttAdapter, inbound_limit: U256) -> Result<()> {
        let limit = self.to_window_units(inbound_limit)?;
        let now = self.clock.unix_time();
        lock(&self.state).peers.insert(
            peer.chain,
            FakePeer {
                manager: peer.manager,
                decimals: peer.decimals,
                inbound: RateLimitState::new(limit, now),
            },
        );
        Ok(())
    }

    /// Connects two adapters in both directions with unlimited inbound
    /// capacity.
    pub fn connect(&self, other: &FakeNttAdapter) -> Result<()> {
        let unlimited = self.from_window_units(u64::MAX)?;
        self.add_peer(other, unlimited)?;
        other.add_peer(self, other.from_window_units(u64::MAX)?)
    }

    pub fn set_outbound_limit(&self, limit: U256) -> Result<()> {
        let limit = self.to_window_units(limit)?;
        let now = self.clock.unix_time();
        let mut state = lock(&self.state);
        let duration = state.rate_limit_duration;
        state.outbound.set_limit(limit, now, duration);
        Ok(())
    }

    pub fn set_inbound_limit(&self, peer: Chain, limit: U256) -> Result<()> {
        let limit = self.to_window_units(limit)?;
        let now = self.clock.unix_time();
        let mut state = lock(&self.state);
        let duration = state.rate_limit_duration;
        let peer = state
            .peers
            .get_mut(&peer)
            .ok_or_else(|| NttError::ContractCall(format!("no peer registered for {peer}")))?;
        peer.inbound.set_limit(limit, now, duration);
        Ok(())
    }

    pub fn set_rate_limit_duration(&self, secs: u64) {
        lock(&self.state).rate_limit_duration = secs;
    }

    /// Delivery prices: `core_fee` without relaying, `relay_fee` with it.
    ///
    /// A relayed transfer's gas drop-off is added to `relay_fee` at par.
    pub fn set_delivery_prices(&self, core_fee: U256, relay_fee: U256) {
        let mut state = lock(&self.state);
        state.core_fee = core_fee;
        state.relay_fee = relay_fee;
    }

    /// Transactions finalize as soon as they execute.
    pub fn set_auto_finalize(&self, auto_finalize: bool) {
        lock(&self.state).auto_finalize = auto_finalize;
    }

    /// Makes every read fail with a provider error.
    pub fn set_fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    pub fn finalize_transaction(&self, txid: &str) {
        lock(&self.state).finalized.insert(txid.to_string());
    }

    pub fn mint(&self, owner: UniversalAddress, amount: U256) {
        *lock(&self.state).balances.entry(owner).or_default() += amount;
    }

    pub fn balance_of(&self, owner: UniversalAddress) -> U256 {
        lock(&self.state)
            .balances
            .get(&owner)
            .copied()
            .unwrap_or_default()
    }

    /// Every transaction executed so far, in order.
    pub fn executed_transactions(&self) -> Vec<FakeTransaction> {
        lock(&self.state).executed_transactions.clone()
    }

    /// Transfers held back by the outbound window, oldest first.
    pub fn outbound_queue(&self) -> Vec<QueuedOutboundTransfer> {
        lock(&self.state)
            .outbound_queue
            .iter()
            .map(|entry| entry.queued.clone())
            .collect()
    }

    /// The manager message emitted by `txid`, if any.
    pub fn published_message(&self, txid: &str) -> Option<ManagerMessage<NativeTokenTransfer>> {
        lock(&self.state)
            .published
            .get(txid)
            .map(|published| published.message.clone())
    }

    /// Signs the transfer message emitted by `txid` as the guardians would.
    pub fn attest(&self, txid: &str) -> Result<Bytes> {
        let published = lock(&self.state)
            .published
            .get(txid)
            .cloned()
            .ok_or_else(|| NttError::AttestationFailed {
                reason: format!("no transfer message emitted by {txid}"),
            })?;

        let vaa: Vaa<WormholeTransferMessage> = Vaa {
            guardian_set_index: 4,
            signatures: vec![GuardianSignature {
                guardian_index: 0,
                signature: FixedBytes::from([0x5a; 65]),
            }],
            timestamp: self.clock.unix_time() as u32,
            nonce: 0,
            emitter_chain: self.chain.id(),
            emitter_address: self.transceiver,
            sequence: published.sequence,
            consistency_level: 1,
            payload: TransceiverMessage {
                source_manager: self.manager,
                recipient_manager: published.recipient_manager,
                manager_payload: published.message,
                transceiver_payload: Bytes::new(),
            },
        };
        Ok(vaa.encode()?.into())
    }

    fn check_reads(&self) -> Result<()> {
        if lock(&self.state).fail_reads {
            return Err(NttError::Provider("simulated RPC error".to_string()));
        }
        Ok(())
    }

    fn execute(&self, transaction: &FakeTransaction) -> Result<()> {
        let now = self.clock.unix_time();
        let mut state = lock(&self.state);
        let duration = state.rate_limit_duration;

        match transaction {
            FakeTransaction::Approve { spender, amount } => {
                if *spender != self.manager {
                    return Err(NttError::ContractCall("unexpected spender".to_string()));
                }
                state.allowances.insert(self.signer, *amount);
            }
            FakeTransaction::Transfer(request) => {
                let peer = state.peers.get(&request.destination).cloned().ok_or_else(|| {
                    NttError::ContractCall(format!("no peer registered for {}", request.destination))
                })?;
                let allowance = state.allowances.get(&request.sender).copied().unwrap_or_default();
                if allowance < request.amount {
                    return Err(NttError::ContractCall("insufficient allowance".to_string()));
                }
                let balance = state.balances.get(&request.sender).copied().unwrap_or_default();
                if balance < request.amount {
                    return Err(NttError::ContractCall("insufficient balance".to_string()));
                }
                if TrimmedAmount::has_dust(request.amount, self.decimals, peer.decimals) {
                    return Err(NttError::ContractCall("transfer amount has dust".to_string()));
                }
                let expected_price =
                    delivery_price(&state, &request.instructions, request.gas_drop_off)?;
                if request.delivery_price < expected_price {
                    return Err(NttError::ContractCall("delivery payment too low".to_string()));
                }

                let units = TrimmedAmount::trim(request.amount, self.decimals, self.decimals)?.amount;
                if !state.outbound.try_consume(units, now, duration) {
                    if !request.should_queue {
                        return Err(NttError::ContractCall(
                            "not enough outbound capacity".to_string(),
                        ));
                    }
                    let queue_sequence = state.next_queue_sequence;
                    state.next_queue_sequence += 1;
                    let txid = format!("0x{:064x}", state.next_tx);
                    let queued = QueuedOutboundTransfer {
                        queue_sequence,
                        sender: request.sender,
                        recipient: request.recipient,
                        recipient_chain: request.destination.id(),
                        amount: TrimmedAmount::trim(request.amount, self.decimals, peer.decimals)?,
                        tx_timestamp: now,
                        rate_limit_expiry_timestamp: now.saturating_add(duration),
                    };
                    state.outbound_queue.push(OutboundEntry {
                        txid,
                        request: request.clone(),
                        queued,
                    });
                } else {
                    self.publish(&mut state, request, &peer, units, now, duration)?;
                }

                *state.allowances.entry(request.sender).or_default() -= request.amount;
                *state.balances.entry(request.sender).or_default() -= request.amount;
            }
            FakeTransaction::Redeem { attestations, .. } => {
                for raw in attestations {
                    let vaa = Vaa::<WormholeTransferMessage>::decode(raw)?;
                    let source = Chain::from_id(vaa.emitter_chain).ok_or_else(|| {
                        NttError::ContractCall(format!("unknown chain id {}", vaa.emitter_chain))
                    })?;
                    let message = &vaa.payload;
                    let peer = state.peers.get(&source).cloned().ok_or_else(|| {
                        NttError::ContractCall(format!("no peer registered for {source}"))
                    })?;
                    if message.source_manager != peer.manager
                        || message.recipient_manager != self.manager
                    {
                        return Err(NttError::ContractCall("invalid peer".to_string()));
                    }
                    let transfer = &message.manager_payload.payload;
                    if transfer.to_chain != self.chain.id() {
                        return Err(NttError::ContractCall("invalid target chain".to_string()));
                    }

                    let digest = message.manager_payload.digest(vaa.emitter_chain)?;
                    if state.executed.contains(&digest) {
                        return Err(NttError::ContractCall(format!(
                            "message {digest} already executed"
                        )));
                    }
                    state.approved.insert(digest);
                    state.executed.insert(digest);

                    let units = transfer.trimmed_amount.scale(self.decimals)?.amount;
                    let admitted = state
                        .peers
                        .get_mut(&source)
                        .is_some_and(|entry| entry.inbound.try_consume(units, now, duration));
                    if admitted {
                        state.outbound.refill(units, now, duration);
                        let amount = transfer.trimmed_amount.untrim(self.decimals)?;
                        *state.balances.entry(transfer.to).or_default() += amount;
                    } else {
                        state.inbound_queue.insert(
                            digest,
                            QueuedInboundTransfer::new(
                                transfer.to,
                                transfer.trimmed_amount,
                                now,
                                duration,
                            ),
                        );
                    }
                }
            }
            FakeTransaction::CompleteQueued { digest, .. } => {
                let queued = state.inbound_queue.get(digest).cloned().ok_or_else(|| {
                    NttError::ContractCall(format!("no queued transfer for {digest}"))
                })?;
                if !queued.is_ready(now) {
                    return Err(NttError::QueuedTransferNotReady {
                        expiry: queued.rate_limit_expiry_timestamp,
                        now,
                    });
                }
                state.inbound_queue.remove(digest);
                let amount = queued.amount.untrim(self.decimals)?;
                *state.balances.entry(queued.recipient).or_default() += amount;
            }
            FakeTransaction::CompleteOutboundQueued {
                queue_sequence,
                delivery_price: paid,
                ..
            } => {
                let position = state
                    .outbound_queue
                    .iter()
                    .position(|entry| entry.queued.queue_sequence == *queue_sequence)
                    .ok_or_else(|| {
                        NttError::ContractCall(format!(
                            "no queued outbound transfer {queue_sequence}"
                        ))
                    })?;
                let entry = state.outbound_queue[position].clone();
                if !entry.queued.is_ready(now) {
                    return Err(NttError::QueuedTransferNotReady {
                        expiry: entry.queued.rate_limit_expiry_timestamp,
                        now,
                    });
                }
                let request = &entry.request;
                let expected_price =
                    delivery_price(&state, &request.instructions, request.gas_drop_off)?;
                if *paid < expected_price {
                    return Err(NttError::ContractCall("delivery payment too low".to_string()));
                }
                let peer = state.peers.get(&request.destination).cloned().ok_or_else(|| {
                    NttError::ContractCall(format!("no peer registered for {}", request.destination))
                })?;

                state.outbound_queue.remove(position);
                let units = TrimmedAmount::trim(request.amount, self.decimals, self.decimals)?.amount;
                self.publish(&mut state, request, &peer, units, now, duration)?;
            }
            FakeTransaction::SetPeer {
                chain,
                manager,
                decimals,
                inbound_limit,
            } => {
                let limit = TrimmedAmount::trim(*inbound_limit, self.decimals, self.decimals)?.amount;
                state.peers.insert(
                    *chain,
                    FakePeer {
                        manager: *manager,
                        decimals: *decimals,
                        inbound: RateLimitState::new(limit, now),
                    },
                );
            }
        }

        state.executed_transactions.push(transaction.clone());
        Ok(())
    }

    /// Emits the transfer message under the transaction about to be assigned.
    fn publish(
        &self,
        state: &mut FakeState,
        request: &TransferRequest,
        peer: &FakePeer,
        units: u64,
        now: u64,
        duration: u64,
    ) -> Result<()> {
        if let Some(entry) = state.peers.get_mut(&request.destination) {
            entry.inbound.refill(units, now, duration);
        }
        let trimmed = TrimmedAmount::trim(request.amount, self.decimals, peer.decimals)?;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let message = ManagerMessage {
            id: B256::from(U256::from(sequence)),
            sender: request.sender,
            payload: NativeTokenTransfer::new(
                trimmed,
                self.token,
                request.recipient,
                request.destination,
            ),
        };
        let txid = format!("0x{:064x}", state.next_tx);
        state.published.insert(
            txid,
            Published {
                message,
                recipient_manager: peer.manager,
                sequence,
            },
        );
        Ok(())
    }
}

/// What the fake manager charges for `instructions` plus a destination drop-off.
fn delivery_price(
    state: &FakeState,
    instructions: &TransceiverInstructions,
    gas_drop_off: U256,
) -> Result<U256> {
    if !skips_relayer(instructions) {
        return Ok(state.relay_fee.saturating_add(gas_drop_off));
    }
    if !gas_drop_off.is_zero() {
        return Err(NttError::ContractCall(
            "gas drop-off requires a relayed transfer".to_string(),
        ));
    }
    Ok(state.core_fee)
}

fn skips_relayer(instructions: &TransceiverInstructions) -> bool {
    instructions.0.iter().all(|instruction| {
        WormholeTransceiverInstruction::decode(&instruction.payload)
            .map(|decoded| decoded.should_skip_relayer_send)
            .unwrap_or(true)
    })
}

#[async_trait]
impl NttAdapter for FakeNttAdapter {
    type Transaction = FakeTransaction;

    fn chain(&self) -> Chain {
        self.chain
    }

    fn manager_address(&self) -> UniversalAddress {
        self.manager
    }

    async fn token_decimals(&self) -> Result<u8> {
        self.check_reads()?;
        Ok(self.decimals)
    }

    async fn get_current_outbound_capacity(&self) -> Result<U256> {
        self.check_reads()?;
        let now = self.clock.unix_time();
        let state = lock(&self.state);
        let units = state.outbound.capacity_at(now, state.rate_limit_duration);
        self.from_window_units(units)
    }

    async fn get_current_inbound_capacity(&self, source_chain: Chain) -> Result<U256> {
        self.check_reads()?;
        let now = self.clock.unix_time();
        let state = lock(&self.state);
        let peer = state.peers.get(&source_chain).ok_or_else(|| {
            NttError::ContractCall(format!("no peer registered for {source_chain}"))
        })?;
        let units = peer.inbound.capacity_at(now, state.rate_limit_duration);
        self.from_window_units(units)
    }

    async fn get_rate_limit_duration(&self) -> Result<u64> {
        self.check_reads()?;
        Ok(lock(&self.state).rate_limit_duration)
    }

    async fn get_inbound_queued_transfer(
        &self,
        digest: B256,
    ) -> Result<Option<QueuedInboundTransfer>> {
        self.check_reads()?;
        Ok(lock(&self.state).inbound_queue.get(&digest).cloned())
    }

    async fn is_message_approved(&self, digest: B256) -> Result<bool> {
        self.check_reads()?;
        Ok(lock(&self.state).approved.contains(&digest))
    }

    async fn is_message_executed(&self, digest: B256) -> Result<bool> {
        self.check_reads()?;
        Ok(lock(&self.state).executed.contains(&digest))
    }

    async fn quote_delivery_price(
        &self,
        _destination: Chain,
        instructions: &TransceiverInstructions,
        gas_drop_off: U256,
    ) -> Result<U256> {
        self.check_reads()?;
        delivery_price(&lock(&self.state), instructions, gas_drop_off)
    }

    async fn is_transaction_finalized(&self, txid: &str) -> Result<bool> {
        self.check_reads()?;
        Ok(lock(&self.state).finalized.contains(txid))
    }

    async fn allowance(&self, owner: UniversalAddress) -> Result<U256> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .allowances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<Vec<FakeTransaction>> {
        let mut transactions = Vec::with_capacity(2);
        if self.allowance(request.sender).await? < request.amount {
            transactions.push(FakeTransaction::Approve {
                spender: self.manager,
                amount: request.amount,
            });
        }
        transactions.push(FakeTransaction::Transfer(request.clone()));
        Ok(transactions)
    }

    async fn redeem(
        &self,
        attestations: &[Bytes],
        payer: UniversalAddress,
    ) -> Result<Vec<FakeTransaction>> {
        Ok(vec![FakeTransaction::Redeem {
            attestations: attestations.to_vec(),
            payer,
        }])
    }

    async fn set_peer(
        &self,
        peer_chain: Chain,
        peer_manager: UniversalAddress,
        decimals: u8,
        inbound_limit: U256,
    ) -> Result<FakeTransaction> {
        Ok(FakeTransaction::SetPeer {
            chain: peer_chain,
            manager: peer_manager,
            decimals,
            inbound_limit,
        })
    }

    async fn complete_inbound_queued_transfer(
        &self,
        digest: B256,
        payer: UniversalAddress,
    ) -> Result<FakeTransaction> {
        Ok(FakeTransaction::CompleteQueued { digest, payer })
    }

    async fn get_outbound_queued_transfer(
        &self,
        txid: &str,
    ) -> Result<Option<QueuedOutboundTransfer>> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .outbound_queue
            .iter()
            .find(|entry| entry.txid == txid)
            .map(|entry| entry.queued.clone()))
    }

    async fn complete_outbound_queued_transfer(
        &self,
        queued: &QueuedOutboundTransfer,
        payer: UniversalAddress,
        delivery_price: U256,
    ) -> Result<FakeTransaction> {
        Ok(FakeTransaction::CompleteOutboundQueued {
            queue_sequence: queued.queue_sequence,
            payer,
            delivery_price,
        })
    }
}

#[async_trait]
impl Signer<FakeTransaction> for FakeNttAdapter {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> UniversalAddress {
        self.signer
    }

    async fn sign_and_send(&self, transactions: Vec<FakeTransaction>) -> Result<Vec<TransactionId>> {
        let mut txids = Vec::with_capacity(transactions.len());
        for transaction in &transactions {
            self.execute(transaction)?;
            let mut state = lock(&self.state);
            let txid = format!("0x{:064x}", state.next_tx);
            state.next_tx += 1;
            if state.auto_finalize {
                state.finalized.insert(txid.clone());
            }
            txids.push(TransactionId::new(self.chain, txid));
        }
        Ok(txids)
    }
}

// ============================================================================
// Fake Signer
// ============================================================================

/// A signer that records what it is asked to send without executing it.
#[derive(Clone, Debug)]
pub struct FakeSigner<T> {
    chain: Chain,
    address: UniversalAddress,
    sent: Arc<Mutex<Vec<T>>>,
    fail: Arc<Mutex<bool>>,
}

impl<T> FakeSigner<T> {
    pub fn new(chain: Chain, address: UniversalAddress) -> Self {
        Self {
            chain,
            address,
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Makes the next broadcasts fail.
    pub fn set_fail(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }
}

impl<T: Clone> FakeSigner<T> {
    pub fn sent(&self) -> Vec<T> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Signer<T> for FakeSigner<T> {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> UniversalAddress {
        self.address
    }

    async fn sign_and_send(&self, transactions: Vec<T>) -> Result<Vec<TransactionId>> {
        if *lock(&self.fail) {
            return Err(NttError::Provider("simulated broadcast failure".to_string()));
        }
        let mut sent = lock(&self.sent);
        let txids = (0..transactions.len())
            .map(|offset| TransactionId::new(self.chain, format!("fake-tx-{}", sent.len() + offset)))
            .collect();
        sent.extend(transactions);
        Ok(txids)
    }
}

// ============================================================================
// Fake Attestation Source
// ============================================================================

#[derive(Debug, Clone)]
enum FakeAttestationResponse {
    Pending,
    RateLimited { retry_after_seconds: u64 },
    Failed,
    Ready(Bytes),
}

/// An attestation source that serves scripted responses per transaction.
///
/// Each lookup consumes the next response of the transaction's sequence; the
/// last response repeats. Unknown transactions are pending.
#[derive(Clone, Debug, Default)]
pub struct FakeAttestationSource {
    responses: Arc<Mutex<HashMap<(Chain, String), Vec<FakeAttestationResponse>>>>,
    calls: Arc<Mutex<HashMap<(Chain, String), usize>>>,
}

impl FakeAttestationSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, chain: Chain, txid: &str, response: FakeAttestationResponse) {
        lock(&self.responses)
            .entry((chain, txid.to_string()))
            .or_default()
            .push(response);
    }

    /// The next `count` lookups find nothing.
    pub fn add_pending(&self, chain: Chain, txid: &str, count: usize) {
        for _ in 0..count {
            self.push(chain, txid, FakeAttestationResponse::Pending);
        }
    }

    /// The next `count` lookups are throttled.
    pub fn add_rate_limited(&self, chain: Chain, txid: &str, count: usize, retry_after_seconds: u64) {
        for _ in 0..count {
            self.push(
                chain,
                txid,
                FakeAttestationResponse::RateLimited {
                    retry_after_seconds,
                },
            );
        }
    }

    pub fn add_failed(&self, chain: Chain, txid: &str) {
        self.push(chain, txid, FakeAttestationResponse::Failed);
    }

    pub fn add_attestation(&self, chain: Chain, txid: &str, vaa: Bytes) {
        self.push(chain, txid, FakeAttestationResponse::Ready(vaa));
    }

    /// Get the number of lookups made for a transaction
    pub fn get_call_count(&self, chain: Chain, txid: &str) -> usize {
        lock(&self.calls)
            .get(&(chain, txid.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl AttestationSource for FakeAttestationSource {
    async fn fetch_attestation(&self, chain: Chain, txid: &str) -> Result<Option<Bytes>> {
        let key = (chain, txid.to_string());
        let index = {
            let mut calls = lock(&self.calls);
            let count = calls.entry(key.clone()).or_default();
            *count += 1;
            *count - 1
        };

        let response = lock(&self.responses).get(&key).and_then(|sequence| {
            sequence
                .get(index)
                .or_else(|| sequence.last())
                .cloned()
        });

        match response {
            None | Some(FakeAttestationResponse::Pending) => Ok(None),
            Some(FakeAttestationResponse::RateLimited {
                retry_after_seconds,
            }) => Err(NttError::RateLimitExceeded {
                retry_after_seconds,
            }),
            Some(FakeAttestationResponse::Failed) => Err(NttError::AttestationFailed {
                reason: "simulated attestation failure".to_string(),
            }),
            Some(FakeAttestationResponse::Ready(vaa)) => Ok(Some(vaa)),
        }
    }
}
