//! Token Escrow Program (Native Solana)
//!
//! Atomic two-party token exchange: the initializer locks an amount of token X
//! in a program-owned vault and names the amount of token Y it wants back. Any
//! taker can settle the offer by paying exactly that amount of token Y, taking
//! the vaulted token X in the same instruction, or the initializer can cancel
//! and reclaim the deposit. The vault is owned by a derived authority with no
//! private key; only the program can sign for it.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use solana_program;

// Re-export for tests
pub use error::EscrowError;
pub use instruction::EscrowInstruction;
pub use state::{EscrowRecord, EscrowStatus};
