//! Error types

use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Escrow is not active")]
    EscrowNotActive,

    #[error("Vault already initialized")]
    VaultAlreadyInitialized,

    #[error("Vault authority mismatch")]
    AuthorityMismatch,

    #[error("Amount mismatch")]
    AmountMismatch,

    #[error("Invalid instruction data")]
    InvalidInstructionData,
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
