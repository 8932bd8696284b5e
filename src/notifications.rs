//! Settlement notification fan-out
//!
//! Committed spins are published to a `SettlementSink` once the ledger holds
//! the final balance. Downstream consumers (win tickers, audit trails) subscribe
//! here; a slow or absent consumer never holds up settlement.

use crate::games::types::{PlayerId, Pocket, SettlementResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Event emitted after a spin is committed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub spin_id: Uuid,
    pub player_id: PlayerId,
    pub result: Pocket,
    pub total_stake: Decimal,
    pub total_win: Decimal,
    pub new_balance: Decimal,
    pub settled_at: DateTime<Utc>,
}

impl SettlementEvent {
    /// Spins that paid out more than they took
    pub fn is_net_win(&self) -> bool {
        self.total_win > self.total_stake
    }
}

impl From<&SettlementResult> for SettlementEvent {
    fn from(result: &SettlementResult) -> Self {
        Self {
            spin_id: result.spin_id,
            player_id: result.player_id.clone(),
            result: result.result,
            total_stake: result.total_stake,
            total_win: result.total_win,
            new_balance: result.new_balance,
            settled_at: result.settled_at,
        }
    }
}

/// Receiver of committed settlements. Must not block.
pub trait SettlementSink: Send + Sync {
    fn publish(&self, event: SettlementEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl SettlementSink for NoopSink {
    fn publish(&self, _event: SettlementEvent) {}
}

/// Fans events out over a tokio broadcast channel.
///
/// Receivers that fall behind see `RecvError::Lagged` and skip ahead.
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<SettlementEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettlementEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl SettlementSink for BroadcastSink {
    fn publish(&self, event: SettlementEvent) {
        let spin_id = event.spin_id;
        if self.sender.send(event).is_err() {
            tracing::trace!(%spin_id, "No settlement subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(total_win: Decimal) -> SettlementEvent {
        SettlementEvent {
            spin_id: Uuid::new_v4(),
            player_id: PlayerId::from("alice"),
            result: Pocket::Number(17),
            total_stake: dec!(10),
            total_win,
            new_balance: dec!(450),
            settled_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastSink::new(16);
        let mut rx_a = sink.subscribe();
        let mut rx_b = sink.subscribe();
        assert_eq!(sink.receiver_count(), 2);

        let sent = event(dec!(360));
        sink.publish(sent.clone());

        assert_eq!(rx_a.recv().await.unwrap(), sent);
        assert_eq!(rx_b.recv().await.unwrap(), sent);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let sink = BroadcastSink::new(4);
        sink.publish(event(dec!(0)));
        NoopSink.publish(event(dec!(0)));
    }

    #[tokio::test]
    async fn test_lagging_receiver_skips_ahead() {
        let sink = BroadcastSink::new(2);
        let mut rx = sink.subscribe();
        for _ in 0..5 {
            sink.publish(event(dec!(0)));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_net_win() {
        assert!(event(dec!(360)).is_net_win());
        assert!(!event(dec!(10)).is_net_win());
    }
}
