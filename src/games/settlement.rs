//! Spin settlement
//!
//! A spin moves `Received → Validated → Debited → Resolved → Committed`, or
//! ends `Rejected` before anything is written. Spins for one player are
//! serialized by a per-player async mutex; every ledger write is additionally
//! a compare-and-set so writers outside the engine (deposits) are detected and
//! retried rather than overwritten.
//!
//! Once the player lock is held the rest of the spin runs on its own tokio
//! task. Dropping the `resolve_spin` future after that point detaches the
//! task instead of cancelling it, so a debit is always followed by either the
//! credit or the compensating refund.

use crate::config::SettlementConfig;
use crate::errors::{LedgerError, SettlementError};
use crate::games::classifier::classify;
use crate::games::payout::evaluate;
use crate::games::types::{Classification, PlayerId, Pocket, RawWager, SettlementResult, WagerOutcome};
use crate::games::wager::{parse_wagers, total_stake, ParsedWager};
use crate::games::wheel::Wheel;
use crate::ledger::BalanceLedger;
use crate::metrics::SettlementMetrics;
use crate::notifications::{NoopSink, SettlementEvent, SettlementSink};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Where a spin is in its lifecycle, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPhase {
    Received,
    Validated,
    Debited,
    Resolved,
    Committed,
    Rejected,
    RolledBack,
}

impl SpinPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinPhase::Received => "received",
            SpinPhase::Validated => "validated",
            SpinPhase::Debited => "debited",
            SpinPhase::Resolved => "resolved",
            SpinPhase::Committed => "committed",
            SpinPhase::Rejected => "rejected",
            SpinPhase::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for SpinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates validate, debit, spin, evaluate and credit for one player at a time
#[derive(Clone)]
pub struct SettlementEngine {
    ledger: Arc<dyn BalanceLedger>,
    wheel: Arc<dyn Wheel>,
    sink: Arc<dyn SettlementSink>,
    metrics: Arc<SettlementMetrics>,
    config: SettlementConfig,
    player_locks: Arc<DashMap<PlayerId, Arc<Mutex<()>>>>,
}

impl SettlementEngine {
    pub fn new(ledger: Arc<dyn BalanceLedger>, wheel: Arc<dyn Wheel>, config: SettlementConfig) -> Self {
        Self {
            ledger,
            wheel,
            sink: Arc::new(NoopSink),
            metrics: Arc::new(SettlementMetrics::new()),
            config,
            player_locks: Arc::new(DashMap::new()),
        }
    }

    /// Publish committed spins to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn SettlementSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share counters with another component (e.g. the HTTP layer)
    pub fn with_metrics(mut self, metrics: Arc<SettlementMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<SettlementMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Players with a spin in flight or waiting
    pub fn active_players(&self) -> usize {
        self.player_locks.len()
    }

    /// Settle one spin for `player`.
    ///
    /// Returns `InsufficientBalance` without touching the ledger when the
    /// valid stakes exceed the balance. Malformed wagers are reported in the
    /// breakdown with zero stake.
    pub async fn resolve_spin(
        &self,
        player: &PlayerId,
        wagers: Vec<RawWager>,
    ) -> Result<SettlementResult, SettlementError> {
        if wagers.len() > self.config.max_wagers_per_spin {
            self.metrics.record_rejected();
            warn!(
                player = %player,
                phase = %SpinPhase::Rejected,
                count = wagers.len(),
                max = self.config.max_wagers_per_spin,
                "Too many wagers in one spin"
            );
            return Err(SettlementError::TooManyWagers {
                count: wagers.len(),
                max: self.config.max_wagers_per_spin,
            });
        }

        let parsed = parse_wagers(&wagers);
        debug!(player = %player, phase = %SpinPhase::Received, wagers = parsed.len(), "Spin received");

        // Cancellable up to here: nothing has been written yet
        let guard = self.lock_for(player).lock_owned().await;

        let engine = self.clone();
        let owner = player.clone();
        let task = tokio::spawn(async move {
            let outcome = engine.settle(&owner, parsed).await;
            engine.record_outcome(&outcome);
            drop(guard);
            engine.release_lock(&owner);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(player = %player, error = %e, "Settlement task did not complete");
                self.release_lock(player);
                Err(SettlementError::Aborted(e.to_string()))
            }
        }
    }

    async fn settle(
        &self,
        player: &PlayerId,
        parsed: Vec<ParsedWager>,
    ) -> Result<SettlementResult, SettlementError> {
        let spin_id = Uuid::new_v4();

        let mut malformed = 0u64;
        for entry in parsed.iter() {
            if let Err(reason) = &entry.wager {
                malformed += 1;
                warn!(
                    %spin_id,
                    player = %player,
                    index = entry.index,
                    kind = %entry.raw_kind,
                    %reason,
                    "Skipping malformed wager"
                );
            }
        }
        if malformed > 0 {
            self.metrics.record_malformed(malformed);
        }

        let stake = total_stake(&parsed).ok_or_else(|| {
            warn!(%spin_id, player = %player, phase = %SpinPhase::Rejected, "Total stake out of range");
            SettlementError::AmountOverflow("total stake".to_string())
        })?;
        let balance = self.read_balance(player).await?;
        if stake > balance {
            warn!(
                %spin_id,
                player = %player,
                phase = %SpinPhase::Rejected,
                required = %stake,
                available = %balance,
                "Insufficient balance"
            );
            return Err(SettlementError::InsufficientBalance {
                required: stake,
                available: balance,
            });
        }
        debug!(%spin_id, player = %player, phase = %SpinPhase::Validated, total_stake = %stake);

        let (previous_balance, debited_balance) = if stake.is_zero() {
            (balance, balance)
        } else {
            self.apply_with_retry(player, -stake, balance).await?
        };
        debug!(%spin_id, player = %player, phase = %SpinPhase::Debited, balance = %debited_balance);

        let pocket = self.wheel.spin();
        let classification = classify(pocket);
        let settled = evaluate_wagers(&parsed, pocket, &classification).and_then(|outcomes| {
            let total_win = outcomes
                .iter()
                .try_fold(Decimal::ZERO, |total, o| total.checked_add(o.payout))
                .ok_or_else(|| SettlementError::AmountOverflow("total winnings".to_string()))?;
            Ok((outcomes, total_win))
        });
        let (outcomes, total_win) = match settled {
            Ok(settled) => settled,
            Err(cause) => {
                return Err(self.roll_back(spin_id, player, stake, debited_balance, cause).await)
            }
        };
        debug!(%spin_id, player = %player, phase = %SpinPhase::Resolved, result = %pocket, total_win = %total_win);

        let new_balance = if total_win.is_zero() {
            debited_balance
        } else {
            match self.apply_with_retry(player, total_win, debited_balance).await {
                Ok((_, credited)) => credited,
                Err(cause) => {
                    return Err(self.roll_back(spin_id, player, stake, debited_balance, cause).await)
                }
            }
        };

        let result = SettlementResult {
            spin_id,
            player_id: player.clone(),
            result: pocket,
            classification,
            wagers: outcomes,
            total_stake: stake,
            total_win,
            previous_balance,
            new_balance,
            settled_at: Utc::now(),
        };

        self.metrics.record_settled(result.wagers.len() as u64);
        info!(
            %spin_id,
            player = %player,
            phase = %SpinPhase::Committed,
            result = %pocket,
            total_stake = %stake,
            total_win = %total_win,
            new_balance = %new_balance,
            "Spin settled"
        );
        self.sink.publish(SettlementEvent::from(&result));

        Ok(result)
    }

    async fn read_balance(&self, player: &PlayerId) -> Result<Decimal, SettlementError> {
        self.ledger
            .get_balance(player)
            .await
            .map_err(ledger_failure)
    }

    /// Compare-and-set write with bounded retry.
    ///
    /// On conflict the expectation is refreshed from the ledger's actual
    /// balance. Returns `(balance before, balance after)`.
    async fn apply_with_retry(
        &self,
        player: &PlayerId,
        delta: Decimal,
        mut expected: Decimal,
    ) -> Result<(Decimal, Decimal), SettlementError> {
        let attempts = self.config.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            match self.ledger.apply_delta(player, delta, expected).await {
                Ok(new_balance) => return Ok((expected, new_balance)),
                Err(LedgerError::ConcurrentModification { actual, .. }) => {
                    self.metrics.record_conflict();
                    warn!(
                        player = %player,
                        attempt,
                        %expected,
                        %actual,
                        "Balance changed underneath the spin"
                    );
                    if actual.checked_add(delta).map_or(false, |b| b < Decimal::ZERO) {
                        return Err(SettlementError::InsufficientBalance {
                            required: -delta,
                            available: actual,
                        });
                    }
                    expected = actual;
                    if attempt < attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
                Err(LedgerError::NegativeBalance { balance, delta }) => {
                    return Err(SettlementError::InsufficientBalance {
                        required: -delta,
                        available: balance,
                    });
                }
                Err(LedgerError::Overflow { balance, delta }) => {
                    return Err(SettlementError::AmountOverflow(format!(
                        "balance {} with delta {}",
                        balance, delta
                    )));
                }
                Err(other) => return Err(ledger_failure(other)),
            }
        }

        Err(SettlementError::RetriesExhausted { attempts })
    }

    /// Return the stake after a failed credit. Yields the error to report.
    async fn roll_back(
        &self,
        spin_id: Uuid,
        player: &PlayerId,
        stake: Decimal,
        debited_balance: Decimal,
        cause: SettlementError,
    ) -> SettlementError {
        if stake.is_zero() {
            return cause;
        }

        warn!(%spin_id, player = %player, %stake, error = %cause, "Credit failed, returning stake");
        match self.apply_with_retry(player, stake, debited_balance).await {
            Ok((_, restored)) => {
                self.metrics.record_rollback();
                info!(
                    %spin_id,
                    player = %player,
                    phase = %SpinPhase::RolledBack,
                    balance = %restored,
                    "Stake returned"
                );
                cause
            }
            Err(rollback_error) => {
                self.metrics.record_rollback_failure();
                error!(
                    %spin_id,
                    player = %player,
                    %stake,
                    error = %rollback_error,
                    cause = %cause,
                    "Rollback failed, stake not returned"
                );
                SettlementError::RollbackFailed {
                    player: player.clone(),
                    stake,
                    reason: format!("{} (credit failed: {})", rollback_error, cause),
                }
            }
        }
    }

    fn record_outcome(&self, outcome: &Result<SettlementResult, SettlementError>) {
        match outcome {
            Ok(_) => {}
            Err(SettlementError::RollbackFailed { .. }) => {}
            Err(e) if e.is_retryable() => self.metrics.record_failed(),
            Err(_) => self.metrics.record_rejected(),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(attempt as u64))
    }

    fn lock_for(&self, player: &PlayerId) -> Arc<Mutex<()>> {
        self.player_locks
            .entry(player.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Drop the lock entry once nobody else holds or waits on it
    fn release_lock(&self, player: &PlayerId) {
        self.player_locks
            .remove_if(player, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn ledger_failure(error: LedgerError) -> SettlementError {
    match error {
        LedgerError::AccountNotFound(player) => SettlementError::UnknownPlayer(player),
        LedgerError::Unavailable(reason) => SettlementError::LedgerUnavailable(reason),
        other => SettlementError::LedgerUnavailable(other.to_string()),
    }
}

/// Per-wager breakdown in request order
pub fn evaluate_wagers(
    parsed: &[ParsedWager],
    pocket: Pocket,
    classification: &Classification,
) -> Result<Vec<WagerOutcome>, SettlementError> {
    parsed
        .iter()
        .map(|entry| match &entry.wager {
            Ok(wager) => {
                let (won, payout) = evaluate(wager, pocket, classification).ok_or_else(|| {
                    SettlementError::AmountOverflow(format!("payout for wager {}", entry.index))
                })?;
                Ok(WagerOutcome {
                    index: entry.index,
                    kind: wager.kind.as_str().to_string(),
                    selector: wager.selector,
                    stake: wager.stake,
                    won,
                    payout,
                    malformed: false,
                    reason: None,
                })
            }
            Err(reason) => Ok(WagerOutcome {
                index: entry.index,
                kind: entry.raw_kind.clone(),
                selector: None,
                stake: Decimal::ZERO,
                won: false,
                payout: Decimal::ZERO,
                malformed: true,
                reason: Some(reason.to_string()),
            }),
        })
        .collect()
}
