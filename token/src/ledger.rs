//! Balance and allowance bookkeeping.

use crate::error::TokenError;
use crate::permit::Permit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tcr_crypto::{domain_separator, verify_address_signature};
use tcr_types::{Address, Signature, Timestamp, TokenAmount};

/// The payment token. `caller` arguments are the authenticated sender of
/// the request, as established by whoever submits it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenLedger {
    domain: [u8; 32],
    balances: HashMap<Address, TokenAmount>,
    /// (holder, spender) → allowance. `TokenAmount::MAX` never decreases.
    allowances: HashMap<(Address, Address), TokenAmount>,
    permit_nonces: HashMap<Address, u64>,
    /// Escrow account → the only address that may credit or debit it.
    escrows: HashMap<Address, Address>,
    total_supply: TokenAmount,
}

impl TokenLedger {
    pub fn new(label: &str) -> Self {
        Self {
            domain: domain_separator(label),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            permit_nonces: HashMap::new(),
            escrows: HashMap::new(),
            total_supply: TokenAmount::ZERO,
        }
    }

    pub fn domain(&self) -> &[u8; 32] {
        &self.domain
    }

    pub fn balance_of(&self, holder: &Address) -> TokenAmount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    pub fn allowance(&self, holder: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(&(holder.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn permit_nonce(&self, holder: &Address) -> u64 {
        self.permit_nonces.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    pub fn escrow_custodian(&self, account: &Address) -> Option<&Address> {
        self.escrows.get(account)
    }

    /// Lock the empty `account` as escrow held by `custodian`. From then on
    /// its holder can neither spend nor approve, and only `custodian` can
    /// move tokens in or out.
    pub fn open_escrow(&mut self, account: &Address, custodian: &Address) -> Result<(), TokenError> {
        if self.escrows.contains_key(account) {
            return Err(TokenError::EscrowLocked(account.clone()));
        }
        let balance = self.balance_of(account);
        if !balance.is_zero() {
            return Err(TokenError::EscrowNotEmpty { balance });
        }
        self.escrows.insert(account.clone(), custodian.clone());
        tracing::debug!(account = %account, custodian = %custodian, "escrow opened");
        Ok(())
    }

    /// Hand custody of an escrow account to `successor`.
    pub fn pass_escrow(&mut self, caller: &Address, account: &Address, successor: &Address) -> Result<(), TokenError> {
        self.require_custodian(caller, account)?;
        self.escrows.insert(account.clone(), successor.clone());
        Ok(())
    }

    /// Pay `amount` out of an escrow account. Only its custodian may.
    pub fn release_escrow(
        &mut self,
        caller: &Address,
        account: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        self.require_custodian(caller, account)?;
        self.check_credit(caller, to)?;
        self.check_balance(account, amount)?;
        self.move_funds(account, to, amount);
        Ok(())
    }

    /// Create new tokens (genesis allocation).
    pub fn mint(&mut self, to: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        self.check_unlocked(to)?;
        let supply = self.total_supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        let balance = self.balance_of(to).checked_add(amount).ok_or(TokenError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        self.check_unlocked(caller)?;
        self.allowances.insert((caller.clone(), spender.clone()), amount);
        Ok(())
    }

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        self.check_unlocked(caller)?;
        self.check_credit(caller, to)?;
        self.check_balance(caller, amount)?;
        self.move_funds(caller, to, amount);
        Ok(())
    }

    /// Check a permit's nonce, expiry and signature without applying it.
    pub fn check_permit(&self, permit: &Permit, signature: &Signature, now: Timestamp) -> Result<(), TokenError> {
        self.check_unlocked(&permit.holder)?;
        let expected = self.permit_nonce(&permit.holder);
        if permit.nonce != expected {
            return Err(TokenError::InvalidPermitNonce { expected, got: permit.nonce });
        }
        if permit.is_expired(now) {
            return Err(TokenError::PermitExpired);
        }
        if !verify_address_signature(&permit.digest(&self.domain), signature, &permit.holder) {
            return Err(TokenError::BadPermitSignature);
        }
        Ok(())
    }

    /// Apply a signed permit: unlimited allowance if `allowed`, zero otherwise.
    pub fn permit(&mut self, permit: &Permit, signature: &Signature, now: Timestamp) -> Result<(), TokenError> {
        self.check_permit(permit, signature, now)?;
        *self.permit_nonces.entry(permit.holder.clone()).or_insert(0) += 1;
        let allowance = if permit.allowed { TokenAmount::MAX } else { TokenAmount::ZERO };
        self.allowances
            .insert((permit.holder.clone(), permit.spender.clone()), allowance);
        tracing::debug!(holder = %permit.holder, spender = %permit.spender, allowed = permit.allowed, "permit applied");
        Ok(())
    }

    /// Whether `spender` could pull `amount` from `holder`, given the
    /// allowance `holder` would have after `pending` (if any) is applied.
    pub fn check_transfer_from(
        &self,
        spender: &Address,
        holder: &Address,
        amount: TokenAmount,
        pending: Option<&Permit>,
    ) -> Result<(), TokenError> {
        self.check_unlocked(holder)?;
        let allowance = match pending {
            Some(p) if &p.holder == holder && &p.spender == spender => {
                if p.allowed { TokenAmount::MAX } else { TokenAmount::ZERO }
            }
            _ => self.allowance(holder, spender),
        };
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance { needed: amount, available: allowance });
        }
        self.check_balance(holder, amount)
    }

    /// Move `amount` from `holder` to `to` on behalf of `spender`.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        holder: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        self.check_transfer_from(spender, holder, amount, None)?;
        self.check_credit(spender, to)?;
        let key = (holder.clone(), spender.clone());
        let allowance = self.allowance(holder, spender);
        if allowance != TokenAmount::MAX {
            self.allowances.insert(key, allowance - amount);
        }
        self.move_funds(holder, to, amount);
        Ok(())
    }

    fn check_unlocked(&self, holder: &Address) -> Result<(), TokenError> {
        if self.escrows.contains_key(holder) {
            return Err(TokenError::EscrowLocked(holder.clone()));
        }
        Ok(())
    }

    /// `actor` may credit `to` unless `to` is escrow held by someone else.
    fn check_credit(&self, actor: &Address, to: &Address) -> Result<(), TokenError> {
        match self.escrows.get(to) {
            Some(custodian) if custodian != actor => Err(TokenError::EscrowLocked(to.clone())),
            _ => Ok(()),
        }
    }

    fn require_custodian(&self, caller: &Address, account: &Address) -> Result<(), TokenError> {
        match self.escrows.get(account) {
            Some(custodian) if custodian == caller => Ok(()),
            _ => Err(TokenError::NotCustodian {
                caller: caller.clone(),
                account: account.clone(),
            }),
        }
    }

    fn check_balance(&self, holder: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(TokenError::InsufficientBalance { needed: amount, available });
        }
        Ok(())
    }

    /// Callers have already checked the sender's balance. The receiver cannot
    /// overflow because every balance is bounded by the total supply.
    fn move_funds(&mut self, from: &Address, to: &Address, amount: TokenAmount) {
        let from_balance = self.balance_of(from) - amount;
        self.balances.insert(from.clone(), from_balance);
        let to_balance = self.balance_of(to) + amount;
        self.balances.insert(to.clone(), to_balance);
    }
}
