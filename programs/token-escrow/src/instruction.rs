//! Instruction definitions

use borsh::{BorshDeserialize, BorshSerialize};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum EscrowInstruction {
    /// Create a new escrow record and lock the deposit in the vault
    ///
    /// Accounts expected:
    /// 0. `[writable, signer]` Initializer
    /// 1. `[writable, signer]` Escrow record account (fresh keypair)
    /// 2. `[writable]` Initializer deposit token account (asset X)
    /// 3. `[]` Initializer receive token account (asset Y)
    /// 4. `[]` Deposit mint (asset X)
    /// 5. `[]` Receive mint (asset Y)
    /// 6. `[writable]` Vault token account (PDA)
    /// 7. `[]` Vault authority (PDA)
    /// 8. `[]` Token program
    /// 9. `[]` System program
    /// 10. `[]` Rent sysvar
    Initialize {
        deposit_amount: u64,
        receive_amount: u64,
    },

    /// Settle the offer: taker pays the counter-asset, takes the deposit,
    /// vault and record are closed
    ///
    /// Accounts expected:
    /// 0. `[writable]` Escrow record account
    /// 1. `[writable]` Initializer (rent refund destination)
    /// 2. `[writable, signer]` Taker
    /// 3. `[writable]` Taker payment token account (asset Y)
    /// 4. `[writable]` Taker receive token account (asset X)
    /// 5. `[writable]` Initializer receive token account (asset Y)
    /// 6. `[writable]` Vault token account (PDA)
    /// 7. `[]` Vault authority (PDA)
    /// 8. `[]` Token program
    Exchange,

    /// Cancel the offer and return the deposit to the initializer
    ///
    /// Accounts expected:
    /// 0. `[writable]` Escrow record account
    /// 1. `[writable, signer]` Initializer
    /// 2. `[writable]` Initializer deposit token account (asset X)
    /// 3. `[writable]` Vault token account (PDA)
    /// 4. `[]` Vault authority (PDA)
    /// 5. `[]` Token program
    Cancel,
}
