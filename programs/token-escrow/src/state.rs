//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

/// Lifecycle of an escrow record. Terminal states are written in the same
/// instruction that reclaims the record account, so only `Active` is ever
/// observed across transactions.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowStatus {
    Active,
    Completed,
    Cancelled,
}

/// One escrow offer: who deposited what, and what unlocks it.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct EscrowRecord {
    /// Discriminator for account type
    pub discriminator: [u8; 8],
    /// Lifecycle tag
    pub status: EscrowStatus,
    /// Party that created the offer and funded the vault
    pub initializer: Pubkey,
    /// Token account the deposit was drawn from (and refunded to on cancel)
    pub initializer_deposit_account: Pubkey,
    /// Token account the taker must pay the counter-asset into
    pub initializer_receive_account: Pubkey,
    /// Mint of the deposited asset (X)
    pub deposit_mint: Pubkey,
    /// Mint of the expected counter-asset (Y)
    pub receive_mint: Pubkey,
    /// Amount of X locked in the vault
    pub deposit_amount: u64,
    /// Amount of Y that unlocks the vault
    pub receive_amount: u64,
    /// Vault token account, owned by the derived vault authority
    pub vault: Pubkey,
    /// Bump seed proving the vault authority derivation
    pub authority_bump: u8,
}

impl EscrowRecord {
    pub const DISCRIMINATOR: [u8; 8] = [0x54, 0x4f, 0x4b, 0x45, 0x53, 0x43, 0x52, 0x57]; // "TOKESCRW"
    pub const LEN: usize = 8 + 1 + 32 * 6 + 8 + 8 + 1; // 218 bytes

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initializer: Pubkey,
        initializer_deposit_account: Pubkey,
        initializer_receive_account: Pubkey,
        deposit_mint: Pubkey,
        receive_mint: Pubkey,
        deposit_amount: u64,
        receive_amount: u64,
        vault: Pubkey,
        authority_bump: u8,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            status: EscrowStatus::Active,
            initializer,
            initializer_deposit_account,
            initializer_receive_account,
            deposit_mint,
            receive_mint,
            deposit_amount,
            receive_amount,
            vault,
            authority_bump,
        }
    }
}

/// Seeds for PDA derivation. Both PDAs hang off the escrow record's own
/// address, so anyone holding the record can re-derive them.
pub mod seeds {
    pub const VAULT_SEED: &[u8] = b"vault";
    pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault-authority";
}
