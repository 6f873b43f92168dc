//! Fungible payment token used for admission fees and challenge deposits.
//!
//! Holders grant spending rights either directly (`approve`) or with an
//! off-line signed [`Permit`], which lets a third party submit the grant on
//! the holder's behalf.

pub mod error;
pub mod ledger;
pub mod permit;

pub use error::TokenError;
pub use ledger::TokenLedger;
pub use permit::Permit;
