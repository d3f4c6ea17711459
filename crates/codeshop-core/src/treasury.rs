//! Shared funds pool, the append-only ledger, and upgrade purchases.
//!
//! Every movement of money is recorded as a [`LedgerEntry`] carrying the
//! balance after the movement, so the ledger alone reconstructs the funds
//! history.

use codeshop_types::{Change, LedgerEntry, LedgerEntryKind, Severity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::EntityStore;

/// Errors from treasury operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    /// The pool cannot cover the amount.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Amount requested.
        needed: Decimal,
        /// Amount available.
        available: Decimal,
    },

    /// The balance computation overflowed.
    #[error("treasury arithmetic overflow")]
    Overflow,
}

/// The company's funds and their history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    funds: Decimal,
    ledger: Vec<LedgerEntry>,
}

impl Treasury {
    /// Create a treasury holding `amount`, recorded as a seed entry.
    pub fn seeded(amount: Decimal, tick: u64) -> Self {
        Self {
            funds: amount,
            ledger: vec![LedgerEntry {
                tick,
                kind: LedgerEntryKind::Seed,
                amount,
                memo: "Starting funds".to_owned(),
                balance_after: amount,
            }],
        }
    }

    /// Funds available.
    pub const fn funds(&self) -> Decimal {
        self.funds
    }

    /// Every recorded movement, oldest first.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Deduct `amount` and record it. State is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InsufficientFunds`] if the pool holds less
    /// than `amount`.
    pub fn spend(
        &mut self,
        amount: Decimal,
        kind: LedgerEntryKind,
        memo: String,
        tick: u64,
    ) -> Result<Decimal, TreasuryError> {
        if self.funds < amount {
            return Err(TreasuryError::InsufficientFunds {
                needed: amount,
                available: self.funds,
            });
        }
        let balance_after = self
            .funds
            .checked_sub(amount)
            .ok_or(TreasuryError::Overflow)?;
        self.funds = balance_after;
        self.ledger.push(LedgerEntry {
            tick,
            kind,
            amount,
            memo,
            balance_after,
        });
        Ok(balance_after)
    }
}

impl EntityStore {
    /// Purchase an upgrade from the catalog.
    ///
    /// Unknown ids are a no-op. A second purchase of the same upgrade only
    /// raises an info notification; insufficient funds raise an error
    /// notification. Returns whether the purchase happened.
    pub fn purchase_upgrade(&mut self, upgrade_id: &str) -> bool {
        let Some(upgrade) = self.upgrades.iter().find(|u| u.id == upgrade_id) else {
            warn!(upgrade_id, "Unknown upgrade");
            return false;
        };
        if upgrade.purchased {
            let message = format!("{} is already purchased", upgrade.name);
            self.notify(message, Severity::Info);
            return false;
        }
        let (cost, name) = (upgrade.cost, upgrade.name.clone());

        let tick = self.clock.tick();
        match self
            .treasury
            .spend(cost, LedgerEntryKind::Upgrade, format!("Upgrade: {name}"), tick)
        {
            Ok(balance) => {
                if let Some(upgrade) = self.upgrades.iter_mut().find(|u| u.id == upgrade_id) {
                    upgrade.purchased = true;
                }
                info!(upgrade_id, cost = %cost, balance = %balance, "Upgrade purchased");
                self.emit(Change::UpgradePurchased {
                    upgrade_id: upgrade_id.to_owned(),
                });
                self.notify(format!("Purchased {name}"), Severity::Success);
                true
            }
            Err(err) => {
                warn!(upgrade_id, error = %err, "Upgrade purchase rejected");
                self.notify(
                    format!("Cannot afford {name}: costs {cost}, have {}", self.treasury.funds()),
                    Severity::Error,
                );
                false
            }
        }
    }
}
