//! Balance ledger boundary
//!
//! The settlement engine never owns balances. It reads them through
//! `BalanceLedger` and proposes compare-and-set deltas; the ledger decides
//! whether the write lands.

use crate::errors::LedgerError;
use crate::games::types::PlayerId;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authoritative per-player balance store
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Current balance of a player
    async fn get_balance(&self, player: &PlayerId) -> Result<Decimal, LedgerError>;

    /// Apply `delta` only if the balance still equals `expected_prior_balance`.
    ///
    /// Returns the new balance, or `ConcurrentModification` when the balance
    /// moved since it was read. Must never leave a negative balance.
    async fn apply_delta(
        &self,
        player: &PlayerId,
        delta: Decimal,
        expected_prior_balance: Decimal,
    ) -> Result<Decimal, LedgerError>;
}

/// One player account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Decimal,
    /// Incremented on every successful write
    pub version: u64,
}

/// In-process ledger backed by a sharded concurrent map.
///
/// Each `apply_delta` runs under the shard lock of its entry, so the
/// compare and the write are one step. Different players on different
/// shards never block each other.
pub struct InMemoryLedger {
    accounts: DashMap<PlayerId, Account>,
    initial_balance: Decimal,
}

impl InMemoryLedger {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            accounts: DashMap::new(),
            initial_balance,
        }
    }

    /// Balance granted to newly opened accounts
    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    /// Open an account with the configured initial balance
    pub fn open_account(&self, player: &PlayerId) -> Result<Decimal, LedgerError> {
        self.open_account_with(player, self.initial_balance)
    }

    /// Open an account with an explicit starting balance
    pub fn open_account_with(&self, player: &PlayerId, balance: Decimal) -> Result<Decimal, LedgerError> {
        if balance.is_sign_negative() && !balance.is_zero() {
            return Err(LedgerError::InvalidAmount(balance));
        }

        match self.accounts.entry(player.clone()) {
            Entry::Occupied(_) => Err(LedgerError::AccountExists(player.clone())),
            Entry::Vacant(slot) => {
                slot.insert(Account { balance, version: 0 });
                tracing::debug!(player = %player, %balance, "Opened account");
                Ok(balance)
            }
        }
    }

    /// Add funds to an existing account
    pub fn deposit(&self, player: &PlayerId, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut account = self
            .accounts
            .get_mut(player)
            .ok_or_else(|| LedgerError::AccountNotFound(player.clone()))?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        account.version += 1;
        Ok(account.balance)
    }

    /// Snapshot of an account
    pub fn account(&self, player: &PlayerId) -> Option<Account> {
        self.accounts.get(player).map(|a| a.clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn compare_and_apply(
        &self,
        player: &PlayerId,
        delta: Decimal,
        expected: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let mut account = self
            .accounts
            .get_mut(player)
            .ok_or_else(|| LedgerError::AccountNotFound(player.clone()))?;

        if account.balance != expected {
            return Err(LedgerError::ConcurrentModification {
                expected,
                actual: account.balance,
            });
        }

        let new_balance = account.balance.checked_add(delta).ok_or(LedgerError::Overflow {
            balance: account.balance,
            delta,
        })?;
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance {
                balance: account.balance,
                delta,
            });
        }

        account.balance = new_balance;
        account.version += 1;
        Ok(new_balance)
    }
}

#[async_trait]
impl BalanceLedger for InMemoryLedger {
    async fn get_balance(&self, player: &PlayerId) -> Result<Decimal, LedgerError> {
        self.accounts
            .get(player)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::AccountNotFound(player.clone()))
    }

    async fn apply_delta(
        &self,
        player: &PlayerId,
        delta: Decimal,
        expected_prior_balance: Decimal,
    ) -> Result<Decimal, LedgerError> {
        self.compare_and_apply(player, delta, expected_prior_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn player(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    #[tokio::test]
    async fn test_open_account_uses_initial_balance() {
        let ledger = InMemoryLedger::new(dec!(1000));
        assert_eq!(ledger.open_account(&player("alice")).unwrap(), dec!(1000));
        assert_eq!(ledger.get_balance(&player("alice")).await.unwrap(), dec!(1000));
        assert_eq!(
            ledger.open_account(&player("alice")),
            Err(LedgerError::AccountExists(player("alice")))
        );
    }

    #[tokio::test]
    async fn test_apply_delta_compare_and_set() {
        let ledger = InMemoryLedger::new(dec!(100));
        ledger.open_account(&player("bob")).unwrap();

        let balance = ledger.apply_delta(&player("bob"), dec!(-30), dec!(100)).await.unwrap();
        assert_eq!(balance, dec!(70));
        assert_eq!(ledger.account(&player("bob")).unwrap().version, 1);

        // Stale expectation is refused and nothing changes
        let stale = ledger.apply_delta(&player("bob"), dec!(-30), dec!(100)).await;
        assert_eq!(
            stale,
            Err(LedgerError::ConcurrentModification {
                expected: dec!(100),
                actual: dec!(70)
            })
        );
        assert_eq!(ledger.get_balance(&player("bob")).await.unwrap(), dec!(70));
    }

    #[tokio::test]
    async fn test_apply_delta_never_goes_negative() {
        let ledger = InMemoryLedger::new(dec!(10));
        ledger.open_account(&player("carol")).unwrap();

        let result = ledger.apply_delta(&player("carol"), dec!(-15), dec!(10)).await;
        assert!(matches!(result, Err(LedgerError::NegativeBalance { .. })));
        assert_eq!(ledger.get_balance(&player("carol")).await.unwrap(), dec!(10));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let ledger = InMemoryLedger::new(dec!(10));
        assert_eq!(
            ledger.get_balance(&player("nobody")).await,
            Err(LedgerError::AccountNotFound(player("nobody")))
        );
    }

    #[test]
    fn test_deposit() {
        let ledger = InMemoryLedger::new(dec!(0));
        ledger.open_account(&player("dave")).unwrap();
        assert_eq!(ledger.deposit(&player("dave"), dec!(25.50)).unwrap(), dec!(25.50));
        assert_eq!(
            ledger.deposit(&player("dave"), dec!(0)),
            Err(LedgerError::InvalidAmount(dec!(0)))
        );
        assert!(ledger.deposit(&player("erin"), dec!(5)).is_err());
    }

    #[tokio::test]
    async fn test_overflowing_writes_are_refused() {
        let ledger = InMemoryLedger::new(Decimal::MAX - dec!(5));
        ledger.open_account(&player("frank")).unwrap();

        assert_eq!(
            ledger.deposit(&player("frank"), dec!(10)),
            Err(LedgerError::InvalidAmount(dec!(10)))
        );
        let credit = ledger
            .apply_delta(&player("frank"), dec!(10), Decimal::MAX - dec!(5))
            .await;
        assert!(matches!(credit, Err(LedgerError::Overflow { .. })));

        let account = ledger.account(&player("frank")).unwrap();
        assert_eq!(account.balance, Decimal::MAX - dec!(5));
        assert_eq!(account.version, 0);
    }
}
