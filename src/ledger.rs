use dashmap::DashMap;

use crate::error::AppError;

/// Account balances plus the escrow held for each open ride. Escrowed funds
/// enter when a ride is created and leave exactly once: refunded in full on
/// cancel, or split between driver and platform on completion. Any failure
/// mid-release reinstates the escrow entry so the operation as a whole is
/// all-or-nothing.
pub struct Ledger {
    balances: DashMap<String, u64>,
    escrows: DashMap<u64, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            escrows: DashMap::new(),
        }
    }

    /// Holds `amount` against `ride_id`. The caller has already validated the
    /// amount is positive.
    pub fn escrow(&self, ride_id: u64, amount: u64) {
        self.escrows.insert(ride_id, amount);
    }

    /// Total funds currently held in escrow.
    pub fn escrow_held(&self) -> u64 {
        self.escrows.iter().map(|entry| *entry.value()).sum()
    }

    pub fn balance(&self, account: &str) -> u64 {
        self.balances
            .get(account)
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }

    /// Releases the full escrow for `ride_id` back to `to`.
    pub fn refund(&self, ride_id: u64, to: &str) -> Result<u64, AppError> {
        let (_, amount) = self.escrows.remove(&ride_id).ok_or_else(|| {
            AppError::TransferFailure(format!("no escrow held for ride {ride_id}"))
        })?;

        if let Err(err) = self.credit(to, amount) {
            self.escrows.insert(ride_id, amount);
            return Err(err);
        }

        Ok(amount)
    }

    /// Releases the escrow for `ride_id` as a two-way split. The split must
    /// account for the escrowed amount exactly.
    pub fn settle(
        &self,
        ride_id: u64,
        driver_account: &str,
        driver_payment: u64,
        platform_account: &str,
        platform_fee: u64,
    ) -> Result<(), AppError> {
        let (_, amount) = self.escrows.remove(&ride_id).ok_or_else(|| {
            AppError::TransferFailure(format!("no escrow held for ride {ride_id}"))
        })?;

        if driver_payment.checked_add(platform_fee) != Some(amount) {
            self.escrows.insert(ride_id, amount);
            return Err(AppError::TransferFailure(format!(
                "split {driver_payment}+{platform_fee} does not cover escrow {amount} for ride {ride_id}"
            )));
        }

        if let Err(err) = self.credit(driver_account, driver_payment) {
            self.escrows.insert(ride_id, amount);
            return Err(err);
        }

        if let Err(err) = self.credit(platform_account, platform_fee) {
            self.debit(driver_account, driver_payment);
            self.escrows.insert(ride_id, amount);
            return Err(err);
        }

        Ok(())
    }

    fn credit(&self, account: &str, amount: u64) -> Result<(), AppError> {
        let mut balance = self.balances.entry(account.to_string()).or_insert(0);
        match balance.checked_add(amount) {
            Some(next) => {
                *balance = next;
                Ok(())
            }
            None => Err(AppError::TransferFailure(format!(
                "balance overflow crediting {amount} to {account}"
            ))),
        }
    }

    fn debit(&self, account: &str, amount: u64) {
        if let Some(mut balance) = self.balances.get_mut(account) {
            *balance = balance.saturating_sub(amount);
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
