//! In-memory token ledger.
//!
//! [`MemoryLedger`] implements [`TokenLedger`] over hash maps. It backs the
//! test suites and any embedding that keeps balances in process. Every
//! mutation checks all preconditions before writing, so a failed call leaves
//! balances and allowances untouched.

use std::collections::HashMap;

use sluice_core::error::LedgerError;
use sluice_core::traits::TokenLedger;
use sluice_core::types::Address;

/// Balances and allowances for any number of tokens.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    /// (token, owner) -> balance.
    balances: HashMap<(Address, Address), u128>,
    /// (token, owner, spender) -> allowance.
    allowances: HashMap<(Address, Address, Address), u128>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `owner` out of thin air.
    pub fn mint(&mut self, token: &Address, owner: &Address, amount: u128) -> Result<(), LedgerError> {
        let entry = self.balances.entry((*token, *owner)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s `token` balance to `amount`.
    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(*token, *owner, *spender));
        } else {
            self.allowances.insert((*token, *owner, *spender), amount);
        }
    }

    /// Move `amount` of `token` between two owners without touching allowances.
    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let have = self.balance_of(token, from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let to_balance = self.balance_of(token, to);
        let credited = to_balance.checked_add(amount).ok_or(LedgerError::BalanceOverflow)?;

        self.set_balance(token, from, have - amount);
        self.set_balance(token, to, credited);
        Ok(())
    }

    /// Sum of all balances held in `token`.
    pub fn total_supply(&self, token: &Address) -> u128 {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(0u128, |acc, (_, v)| acc.saturating_add(*v))
    }

    fn set_balance(&mut self, token: &Address, owner: &Address, amount: u128) {
        if amount == 0 {
            self.balances.remove(&(*token, *owner));
        } else {
            self.balances.insert((*token, *owner), amount);
        }
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, token: &Address, owner: &Address) -> u128 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_into(
        &mut self,
        token: &Address,
        custody: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(token, from, custody);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance { have: allowed, need: amount });
        }
        self.transfer(token, from, custody, amount)?;
        self.approve(token, from, custody, allowed - amount);
        Ok(())
    }

    fn transfer_out(
        &mut self,
        token: &Address,
        custody: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.transfer(token, custody, to, amount)
    }

    fn settle(
        &mut self,
        token: &Address,
        custody: &Address,
        payouts: &[(Address, u128)],
    ) -> Result<(), LedgerError> {
        // Stage every touched balance; custody sits in slot 0.
        let mut staged = vec![(*custody, self.balance_of(token, custody))];
        for &(to, amount) in payouts {
            let have = staged[0].1;
            if have < amount {
                return Err(LedgerError::InsufficientBalance { have, need: amount });
            }
            staged[0].1 = have - amount;

            let slot = match staged.iter().position(|(owner, _)| *owner == to) {
                Some(slot) => slot,
                None => {
                    staged.push((to, self.balance_of(token, &to)));
                    staged.len() - 1
                }
            };
            staged[slot].1 = staged[slot]
                .1
                .checked_add(amount)
                .ok_or(LedgerError::BalanceOverflow)?;
        }

        for (owner, amount) in staged {
            self.set_balance(token, &owner, amount);
        }
        Ok(())
    }
}
