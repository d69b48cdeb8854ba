use std::future::Future;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use bon::Builder;
use futures::stream::{self, Stream};
use tracing::{debug, error, info, warn, Instrument};

use super::config::{NttRouteConfig, PollingConfig};
use super::params::{validate_transfer, TransferParams, ValidatedTransfer};
use super::quote::Quote;
use super::rate_limit::RateLimitQuery;
use super::state::{Attestation, TransferRecord, TransferState};
use crate::error::{NttError, Result};
use crate::protocol::{QueuedOutboundTransfer, TransceiverInstruction, TransceiverInstructions};
use crate::spans;
use crate::traits::{AttestationSource, Clock, NttAdapter, Signer, TransactionId, TransferRequest};

/// Index of the Wormhole transceiver in a manager's registry.
const WORMHOLE_TRANSCEIVER_INDEX: u8 = 0;

/// Who redeems on the destination chain.
pub trait RoutePolicy: Send + Sync + 'static {
    /// A relayer redeems; the caller only initiates and tracks.
    const AUTOMATIC: bool;
    const NAME: &'static str;
}

/// The caller redeems with [`NttRoute::complete`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Manual;

/// A relayer redeems, paid through the delivery price.
#[derive(Debug, Clone, Copy, Default)]
pub struct Automatic;

impl RoutePolicy for Manual {
    const AUTOMATIC: bool = false;
    const NAME: &'static str = "manual";
}

impl RoutePolicy for Automatic {
    const AUTOMATIC: bool = true;
    const NAME: &'static str = "automatic";
}

/// Drives NTT transfers between one source and one destination deployment.
///
/// The route never signs: source and destination adapters build unsigned
/// transactions which are handed to the [`Signer`] passed to
/// [`initiate`](NttRoute::initiate) or [`complete`](NttRoute::complete).
///
/// # Example
///
/// ```rust,no_run
/// # use ntt_rs::{NttError, NttRouteConfig, ManualNttRoute, TransferParams, Chain};
/// # use ntt_rs::testing::{FakeAttestationSource, FakeClock, FakeNttAdapter};
/// # use futures::StreamExt;
/// # async fn example(config: NttRouteConfig) -> Result<(), NttError> {
/// let source = FakeNttAdapter::new(Chain::Sepolia, 18);
/// let destination = FakeNttAdapter::new(Chain::BaseSepolia, 18);
/// let route = ManualNttRoute::builder()
///     .config(config)
///     .source(source.clone())
///     .destination(destination.clone())
///     .attestations(FakeAttestationSource::new())
///     .clock(FakeClock::new())
///     .build();
///
/// let params = TransferParams::builder()
///     .source_chain(Chain::Sepolia)
///     .destination_chain(Chain::BaseSepolia)
///     .amount("1.5")
///     .sender(source.signer_address())
///     .recipient(destination.signer_address())
///     .build();
///
/// let transfer = route.validate(&params)?;
/// let quote = route.quote(&transfer).await?;
/// let record = route.initiate(&source, &quote).await?;
///
/// let mut updates = Box::pin(route.track(record, None));
/// while let Some(record) = updates.next().await {
///     println!("{}", record?.state);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Debug, Clone)]
pub struct NttRoute<R, S, D, A, C> {
    config: NttRouteConfig,
    source: S,
    destination: D,
    attestations: A,
    clock: C,
    #[builder(default)]
    polling: PollingConfig,
    #[builder(skip)]
    _policy: PhantomData<R>,
}

pub type ManualNttRoute<S, D, A, C> = NttRoute<Manual, S, D, A, C>;
pub type AutomaticNttRoute<S, D, A, C> = NttRoute<Automatic, S, D, A, C>;

impl<R, S, D, A, C> NttRoute<R, S, D, A, C>
where
    R: RoutePolicy,
    S: NttAdapter,
    D: NttAdapter,
    A: AttestationSource,
    C: Clock,
{
    pub fn config(&self) -> &NttRouteConfig {
        &self.config
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn is_automatic(&self) -> bool {
        R::AUTOMATIC
    }

    pub fn source_rate_limits(&self) -> RateLimitQuery<'_, S> {
        RateLimitQuery::new(&self.source)
    }

    pub fn destination_rate_limits(&self) -> RateLimitQuery<'_, D> {
        RateLimitQuery::new(&self.destination)
    }

    /// Checks transfer parameters against the route. No network access.
    pub fn validate(&self, params: &TransferParams) -> Result<ValidatedTransfer> {
        let span = spans::validate(
            params.source_chain(),
            params.destination_chain(),
            params.amount(),
            R::NAME,
        );
        let _guard = span.enter();

        if params.source_chain() != self.source.chain()
            || params.destination_chain() != self.destination.chain()
        {
            let err = NttError::InvalidConfig(format!(
                "route connects {} to {}, parameters ask for {} to {}",
                self.source.chain(),
                self.destination.chain(),
                params.source_chain(),
                params.destination_chain()
            ));
            spans::record_error(&err);
            return Err(err);
        }

        validate_transfer(params, &self.config, R::AUTOMATIC).inspect_err(|e| {
            spans::record_error(e);
            debug!(error = %e, event = "transfer_validation_failed");
        })
    }

    fn instructions() -> Result<TransceiverInstructions> {
        // manual routes publish without requesting a relay
        let instruction = TransceiverInstruction::wormhole(WORMHOLE_TRANSCEIVER_INDEX, !R::AUTOMATIC)?;
        Ok(TransceiverInstructions(vec![instruction]))
    }

    /// Prices a validated transfer. Read-only.
    ///
    /// Adapter failures surface as [`NttError::Quote`], except a source that
    /// cannot deliver the requested gas drop-off, which fails with
    /// [`NttError::GasDropOffUnsupported`].
    pub async fn quote(&self, transfer: &ValidatedTransfer) -> Result<Quote> {
        let span = spans::quote(transfer.source_chain, transfer.destination_chain, R::NAME);
        async {
            let quote_error = |what: &str, e: NttError| {
                spans::record_error_with_context("QuoteFailed", &e.to_string(), Some(what));
                error!(error = %e, step = what, event = "quote_failed");
                NttError::Quote {
                    reason: format!("{what}: {e}"),
                }
            };

            let instructions = Self::instructions()?;
            let delivery_price = self
                .source
                .quote_delivery_price(
                    transfer.destination_chain,
                    &instructions,
                    transfer.options.gas_drop_off,
                )
                .await
                .map_err(|e| match e {
                    unsupported @ NttError::GasDropOffUnsupported { .. } => {
                        spans::record_error(&unsupported);
                        unsupported
                    }
                    e => quote_error("delivery price", e),
                })?;

            let outbound_capacity = self
                .source
                .get_current_outbound_capacity()
                .await
                .map_err(|e| quote_error("outbound capacity", e))?;
            let outbound_queued = transfer.source_amount > outbound_capacity;
            if outbound_queued && !transfer.options.should_queue {
                let err = NttError::Quote {
                    reason: format!(
                        "outbound capacity {outbound_capacity} is below {} and queueing was not requested",
                        transfer.source_amount
                    ),
                };
                spans::record_error(&err);
                return Err(err);
            }
            let outbound_queue_delay = if outbound_queued {
                Some(
                    self.source
                        .get_rate_limit_duration()
                        .await
                        .map_err(|e| quote_error("rate limit duration", e))?,
                )
            } else {
                None
            };

            let inbound_capacity = self
                .destination
                .get_current_inbound_capacity(transfer.source_chain)
                .await
                .map_err(|e| quote_error("inbound capacity", e))?;
            let inbound_queued = transfer.destination_amount > inbound_capacity;
            let inbound_queue_delay = if inbound_queued {
                Some(
                    self.destination
                        .get_rate_limit_duration()
                        .await
                        .map_err(|e| quote_error("rate limit duration", e))?,
                )
            } else {
                None
            };

            let quote = Quote {
                transfer: transfer.clone(),
                instructions,
                delivery_price,
                relay_fee: R::AUTOMATIC.then_some(delivery_price),
                destination_gas_drop_off: transfer.options.gas_drop_off,
                outbound_queued,
                outbound_queue_delay,
                inbound_queued,
                inbound_queue_delay,
            };

            info!(
                delivery_price = %delivery_price,
                outbound_queued = outbound_queued,
                inbound_queued = inbound_queued,
                event = "transfer_quoted"
            );
            Ok(quote)
        }
        .instrument(span)
        .await
    }

    /// Builds the source transactions for `quote` and submits them through
    /// `signer`, returning a record in [`TransferState::SourceInitiated`].
    pub async fn initiate<G>(&self, signer: &G, quote: &Quote) -> Result<TransferRecord>
    where
        G: Signer<S::Transaction>,
    {
        let transfer = &quote.transfer;
        let span = spans::initiate(
            transfer.source_chain,
            transfer.destination_chain,
            R::NAME,
            &transfer.amount,
        );
        async {
            if signer.chain() != self.source.chain() {
                let err = NttError::InvalidConfig(format!(
                    "signer is for {}, transfer starts on {}",
                    signer.chain(),
                    self.source.chain()
                ));
                spans::record_error(&err);
                return Err(err);
            }
            if signer.address() != transfer.sender {
                let err = NttError::InvalidConfig(format!(
                    "signer {} is not the transfer sender {}",
                    signer.address(),
                    transfer.sender
                ));
                spans::record_error(&err);
                return Err(err);
            }

            let request = TransferRequest::builder()
                .sender(transfer.sender)
                .amount(transfer.source_amount)
                .destination(transfer.destination_chain)
                .recipient(transfer.recipient)
                .instructions(quote.instructions.clone())
                .should_queue(transfer.options.should_queue)
                .delivery_price(quote.delivery_price)
                .gas_drop_off(quote.destination_gas_drop_off)
                .build();

            let transactions = self.source.transfer(&request).await?;
            tracing::Span::current().record("tx_count", transactions.len());

            let txids = signer.sign_and_send(transactions).await.inspect_err(|e| {
                spans::record_error(e);
                error!(error = %e, event = "transfer_submission_failed");
            })?;

            let record = TransferRecord::new(transfer.clone(), txids);
            info!(
                origin_txid = %record.origin_txid()?,
                event = "transfer_initiated"
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Tracks `record` until it can advance no further.
    ///
    /// Each item is the record after one state advance. The stream ends when
    /// the destination finalized, when the source manager holds the transfer
    /// in its outbound queue (see [`release_outbound`](NttRoute::release_outbound)),
    /// or on a manual route when the next step is the caller's
    /// [`complete`](NttRoute::complete). A record that is already
    /// final is yielded once more. `timeout` bounds every wait for external
    /// state from the moment tracking starts; `None` waits indefinitely. On a
    /// timeout the stream yields [`NttError::Timeout`] and ends; tracking can
    /// be restarted with the last record.
    pub fn track(
        &self,
        record: TransferRecord,
        timeout: Option<Duration>,
    ) -> impl Stream<Item = Result<TransferRecord>> + Send + '_ {
        let deadline = timeout.map(|timeout| (self.clock.now(), timeout));

        stream::unfold(Some(record), move |current| async move {
            let record = current?;
            if record.is_finalized() {
                return Some((Ok(record), None));
            }

            let origin = record
                .origin_txids
                .last()
                .map(|txid| txid.txid.clone())
                .unwrap_or_default();
            let span = spans::track_step(&origin, record.state.as_str());

            match self.step(record, deadline).instrument(span).await {
                Ok(Some(next)) => {
                    let resume = (!next.is_finalized()).then(|| next.clone());
                    Some((Ok(next), resume))
                }
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// One advance. `Ok(None)` means nothing will change without the caller.
    async fn step(
        &self,
        mut record: TransferRecord,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<Option<TransferRecord>> {
        let result = match record.state {
            TransferState::SourceInitiated => {
                let origin = record.origin_txid()?.txid.clone();
                let source = &self.source;
                let origin = origin.as_str();
                self.poll(deadline, "source finality", move || async move {
                    let finalized = source.is_transaction_finalized(origin).await?;
                    Ok::<_, NttError>(finalized.then_some(()))
                })
                .await?;
                record.advance(TransferState::SourceFinalized)?;
                Some(record)
            }
            TransferState::SourceFinalized => {
                let origin = record.origin_txid()?.clone();
                if record.transfer.options.should_queue {
                    if let Some(queued) =
                        self.source.get_outbound_queued_transfer(&origin.txid).await?
                    {
                        warn!(
                            queue_sequence = queued.queue_sequence,
                            expiry = queued.rate_limit_expiry_timestamp,
                            event = "transfer_queued_outbound"
                        );
                        return Ok(None);
                    }
                }
                let attestations = &self.attestations;
                let raw = self
                    .poll(deadline, "attestation", || {
                        attestations.fetch_attestation(origin.chain, &origin.txid)
                    })
                    .await?;

                let attestation = Attestation::from_vaa(raw)?;
                check_attestation(&record.transfer, &attestation)?;
                info!(
                    digest = %attestation.digest,
                    sequence = attestation.id.sequence,
                    event = "transfer_attested"
                );
                record.attestation = Some(attestation);
                record.advance(TransferState::Attested)?;
                Some(record)
            }
            TransferState::Attested => {
                let digest = record.attestation()?.digest;
                let destination = &self.destination;
                let redeemed = move || async move {
                    let done = destination.is_message_approved(digest).await?
                        || destination.is_message_executed(digest).await?;
                    Ok::<_, NttError>(done.then_some(()))
                };

                let advanced = if R::AUTOMATIC {
                    self.poll(deadline, "relayed redemption", redeemed).await?;
                    true
                } else {
                    redeemed().await?.is_some()
                };

                if advanced {
                    record.advance(TransferState::Redeemed)?;
                    Some(record)
                } else {
                    debug!(digest = %digest, event = "awaiting_manual_completion");
                    None
                }
            }
            TransferState::Redeemed => {
                let digest = record.attestation()?.digest;
                match self.destination.get_inbound_queued_transfer(digest).await? {
                    Some(queued) => {
                        warn!(
                            digest = %digest,
                            expiry = queued.rate_limit_expiry_timestamp,
                            event = "transfer_queued_inbound"
                        );
                        record.queued = Some(queued);
                        record.advance(TransferState::Queued)?;
                    }
                    None => record.advance(TransferState::DestinationFinalized)?,
                }
                Some(record)
            }
            TransferState::Queued => {
                let digest = record.attestation()?.digest;
                let destination = &self.destination;
                let released = move || async move {
                    let pending = destination.get_inbound_queued_transfer(digest).await?;
                    Ok::<_, NttError>(pending.is_none().then_some(()))
                };

                let advanced = if R::AUTOMATIC {
                    self.poll(deadline, "queued transfer release", released).await?;
                    true
                } else {
                    released().await?.is_some()
                };

                if advanced {
                    record.queued = None;
                    record.advance(TransferState::DestinationFinalized)?;
                    Some(record)
                } else {
                    None
                }
            }
            TransferState::DestinationFinalized => Some(record),
        };

        if let Some(record) = &result {
            info!(state = %record.state, event = "transfer_state_advanced");
        }
        Ok(result)
    }

    /// The source outbound queue entry holding `record`, if any.
    pub async fn outbound_queued_transfer(
        &self,
        record: &TransferRecord,
    ) -> Result<Option<QueuedOutboundTransfer>> {
        let origin = record.origin_txid()?;
        self.source_rate_limits()
            .get_outbound_queued_transfer(&origin.txid)
            .await
    }

    /// Releases a transfer the source manager queued for lack of outbound
    /// capacity.
    ///
    /// # Arguments
    ///
    /// * `signer` - Signer on the source chain paying for the release
    /// * `record` - Record returned by [`initiate`](NttRoute::initiate) or
    ///   the last one yielded by [`track`](NttRoute::track)
    ///
    /// # Returns
    ///
    /// The record with the release transaction appended to its origin
    /// transactions; tracking it continues from the published message.
    /// Fails with [`NttError::QueuedTransferNotReady`] before the queue entry
    /// expired.
    pub async fn release_outbound<G>(
        &self,
        signer: &G,
        record: &TransferRecord,
    ) -> Result<TransferRecord>
    where
        G: Signer<S::Transaction>,
    {
        if record.state >= TransferState::Attested {
            let err = NttError::InvalidState(format!(
                "cannot release a transfer in state {}",
                record.state
            ));
            error!(error = %err, event = "release_outbound_rejected");
            return Err(err);
        }
        let origin = record.origin_txid()?.txid.clone();

        let span = spans::release_outbound(self.source.chain(), &origin);
        async {
            if signer.chain() != self.source.chain() {
                let err = NttError::InvalidConfig(format!(
                    "signer is for {}, transfer starts on {}",
                    signer.chain(),
                    self.source.chain()
                ));
                spans::record_error(&err);
                return Err(err);
            }

            let instructions = Self::instructions()?;
            let delivery_price = self
                .source
                .quote_delivery_price(
                    record.destination_chain(),
                    &instructions,
                    record.transfer.options.gas_drop_off,
                )
                .await?;

            let now = self.clock.unix_time();
            let (queued, release) = self
                .source_rate_limits()
                .complete_outbound_queued_transfer(&origin, signer.address(), delivery_price, now)
                .await
                .inspect_err(|e| spans::record_error(e))?;
            tracing::Span::current().record("queue_sequence", queued.queue_sequence);

            let txids = signer.sign_and_send(vec![release]).await.inspect_err(|e| {
                spans::record_error(e);
                error!(error = %e, event = "release_submission_failed");
            })?;

            let mut released = record.clone();
            released.origin_txids.extend(txids);
            info!(
                queue_sequence = queued.queue_sequence,
                origin_txid = %released.origin_txid()?,
                event = "outbound_transfer_released"
            );
            Ok(released)
        }
        .instrument(span)
        .await
    }

    /// Re-runs `check` at the polling interval until it yields a value.
    ///
    /// A [`NttError::RateLimitExceeded`] from `check` stretches the next
    /// wait to the requested backoff.
    async fn poll<T, F, Fut>(
        &self,
        deadline: Option<(Instant, Duration)>,
        waiting_for: &'static str,
        mut check: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        loop {
            let delay = match check().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => self.polling.poll_interval(),
                Err(NttError::RateLimitExceeded {
                    retry_after_seconds,
                }) => {
                    debug!(
                        retry_after_secs = retry_after_seconds,
                        waiting_for = waiting_for,
                        event = "rate_limit_exceeded"
                    );
                    Duration::from_secs(retry_after_seconds)
                }
                Err(e) => return Err(e),
            };

            let delay = match deadline {
                None => delay,
                Some((started, timeout)) => {
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    let remaining = timeout.saturating_sub(elapsed);
                    let backoff_too_long =
                        delay > remaining && delay > self.polling.poll_interval();
                    if remaining.is_zero() || backoff_too_long {
                        spans::record_error_with_context(
                            "Timeout",
                            &format!("gave up waiting for {waiting_for}"),
                            Some(&format!("timeout {}s", timeout.as_secs())),
                        );
                        error!(
                            waiting_for = waiting_for,
                            timeout_secs = timeout.as_secs(),
                            event = "tracking_timeout"
                        );
                        return Err(NttError::Timeout {
                            waited: elapsed,
                            waiting_for,
                        });
                    }
                    delay.min(remaining)
                }
            };

            debug!(
                waiting_for = waiting_for,
                sleep_secs = delay.as_secs(),
                event = "tracking_wait"
            );
            self.clock.sleep(delay).await;
        }
    }
}

/// The attested message must describe the transfer the record was made for.
fn check_attestation(transfer: &ValidatedTransfer, attestation: &Attestation) -> Result<()> {
    let message = &attestation.message;
    let payload = &message.manager_payload.payload;

    let mismatch = if message.source_manager != transfer.source_manager {
        Some("source manager")
    } else if message.recipient_manager != transfer.destination_manager {
        Some("recipient manager")
    } else if payload.to != transfer.recipient {
        Some("recipient")
    } else if payload.to_chain != transfer.destination_chain.id() {
        Some("recipient chain")
    } else if payload.trimmed_amount != transfer.trimmed_amount {
        Some("amount")
    } else {
        None
    };

    match mismatch {
        None => Ok(()),
        Some(field) => {
            error!(field = field, digest = %attestation.digest, event = "attestation_mismatch");
            Err(NttError::AttestationFailed {
                reason: format!("attested {field} does not match the transfer"),
            })
        }
    }
}

impl<S, D, A, C> NttRoute<Manual, S, D, A, C>
where
    S: NttAdapter,
    D: NttAdapter,
    A: AttestationSource,
    C: Clock,
{
    /// Completes an attested transfer on the destination chain.
    ///
    /// Redeems the attestation, or, once the transfer sits in the inbound
    /// queue and its expiry passed, releases it. Returns the destination
    /// transaction ids.
    pub async fn complete<G>(
        &self,
        signer: &G,
        record: &TransferRecord,
    ) -> Result<Vec<TransactionId>>
    where
        G: Signer<D::Transaction>,
    {
        if record.state < TransferState::Attested {
            let err = NttError::InvalidState(format!(
                "cannot complete a transfer in state {}",
                record.state
            ));
            error!(error = %err, event = "complete_rejected");
            return Err(err);
        }
        let attestation = record.attestation()?;
        let digest = attestation.digest;

        let span = spans::complete(self.destination.chain(), &digest, record.state.as_str());
        async {
            if signer.chain() != self.destination.chain() {
                let err = NttError::InvalidConfig(format!(
                    "signer is for {}, transfer ends on {}",
                    signer.chain(),
                    self.destination.chain()
                ));
                spans::record_error(&err);
                return Err(err);
            }

            let queued = self.destination.get_inbound_queued_transfer(digest).await?;
            let transactions = if queued.is_some() {
                let now = self.clock.unix_time();
                let release = self
                    .destination_rate_limits()
                    .complete_inbound_queued_transfer(digest, signer.address(), now)
                    .await
                    .inspect_err(|e| spans::record_error(e))?;
                vec![release]
            } else if self.destination.is_message_executed(digest).await? {
                let err = NttError::InvalidState(format!("transfer {digest} was already completed"));
                spans::record_error(&err);
                return Err(err);
            } else {
                self.destination
                    .redeem(std::slice::from_ref(&attestation.vaa), signer.address())
                    .await?
            };

            let txids = signer.sign_and_send(transactions).await.inspect_err(|e| {
                spans::record_error(e);
                error!(error = %e, event = "completion_submission_failed");
            })?;
            info!(
                digest = %digest,
                tx_count = txids.len(),
                released_queue = queued.is_some(),
                event = "transfer_completed"
            );
            Ok(txids)
        }
        .instrument(span)
        .await
    }
}
