//! Stake vault trait.

use crate::StoreError;
use tcr_types::{Address, TokenAmount};

/// Escrow for application fees and challenge deposits.
///
/// The tokens themselves sit in the payment token ledger under
/// [`StakeVault::address`]; the vault tracks the pooled balance and who may
/// move it. The operator keeps the two in step: every `deposit` follows a
/// ledger transfer into the vault address and every `withdraw` precedes one
/// out of it.
pub trait StakeVault: Send {
    /// Ledger address holding the escrowed tokens.
    fn address(&self) -> &Address;

    fn balance(&self) -> TokenAmount;

    fn owner(&self) -> &Address;

    fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> Result<(), StoreError>;

    fn deposit(&mut self, caller: &Address, amount: TokenAmount) -> Result<(), StoreError>;

    /// Fails with `InsufficientBalance` rather than going negative.
    fn withdraw(&mut self, caller: &Address, amount: TokenAmount) -> Result<(), StoreError>;
}
