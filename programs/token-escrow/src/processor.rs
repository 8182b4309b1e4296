//! Instruction processing

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_token::state::Account as TokenAccount;

use crate::{
    error::EscrowError,
    instruction::EscrowInstruction,
    state::{seeds, EscrowRecord, EscrowStatus},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EscrowInstruction::try_from_slice(instruction_data)
            .map_err(|_| EscrowError::InvalidInstructionData)?;

        match instruction {
            EscrowInstruction::Initialize {
                deposit_amount,
                receive_amount,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, deposit_amount, receive_amount)
            }
            EscrowInstruction::Exchange => {
                msg!("Instruction: Exchange");
                Self::process_exchange(program_id, accounts)
            }
            EscrowInstruction::Cancel => {
                msg!("Instruction: Cancel");
                Self::process_cancel(program_id, accounts)
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        deposit_amount: u64,
        receive_amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let initializer = next_account_info(account_info_iter)?;
        let record_account = next_account_info(account_info_iter)?;
        let deposit_token_account = next_account_info(account_info_iter)?;
        let receive_token_account = next_account_info(account_info_iter)?;
        let deposit_mint = next_account_info(account_info_iter)?;
        let receive_mint = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let vault_authority = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;
        let _rent_sysvar = next_account_info(account_info_iter)?;

        // Validate inputs
        if deposit_amount == 0 || receive_amount == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }
        if !initializer.is_signer || !record_account.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Derive vault and vault authority from the record's own address
        let (vault_pda, vault_bump) = Pubkey::find_program_address(
            &[seeds::VAULT_SEED, record_account.key.as_ref()],
            program_id,
        );
        if vault_pda != *vault.key {
            return Err(EscrowError::AuthorityMismatch.into());
        }
        let (authority_pda, authority_bump) = Pubkey::find_program_address(
            &[seeds::VAULT_AUTHORITY_SEED, record_account.key.as_ref()],
            program_id,
        );
        if authority_pda != *vault_authority.key {
            return Err(EscrowError::AuthorityMismatch.into());
        }

        // Deposit source must belong to the initializer, hold the deposit
        // asset, and cover the deposit
        let deposit_state = TokenAccount::unpack(&deposit_token_account.data.borrow())?;
        if deposit_state.owner != *initializer.key || deposit_state.mint != *deposit_mint.key {
            return Err(ProgramError::InvalidAccountData);
        }
        if deposit_state.amount < deposit_amount {
            return Err(EscrowError::InsufficientFunds.into());
        }

        // Receive destination must belong to the initializer and hold the
        // counter-asset
        let receive_state = TokenAccount::unpack(&receive_token_account.data.borrow())?;
        if receive_state.owner != *initializer.key || receive_state.mint != *receive_mint.key {
            return Err(ProgramError::InvalidAccountData);
        }

        let rent = Rent::get()?;

        if vault.data_len() == 0 {
            // Create and initialize the vault, owned by the derived authority
            let vault_space = TokenAccount::LEN;
            let vault_lamports = rent.minimum_balance(vault_space);

            invoke_signed(
                &system_instruction::create_account(
                    initializer.key,
                    vault.key,
                    vault_lamports,
                    vault_space as u64,
                    &spl_token::id(),
                ),
                &[initializer.clone(), vault.clone(), system_program.clone()],
                &[&[seeds::VAULT_SEED, record_account.key.as_ref(), &[vault_bump]]],
            )?;

            invoke_signed(
                &spl_token::instruction::initialize_account3(
                    &spl_token::id(),
                    vault.key,
                    deposit_mint.key,
                    &authority_pda,
                )?,
                &[vault.clone(), deposit_mint.clone()],
                &[&[seeds::VAULT_SEED, record_account.key.as_ref(), &[vault_bump]]],
            )?;
        } else {
            // A pre-existing vault is only acceptable if it is already an
            // empty token account owned by the derived authority
            if vault.owner != &spl_token::id() {
                return Err(EscrowError::VaultAlreadyInitialized.into());
            }
            let vault_state = TokenAccount::unpack(&vault.data.borrow())
                .map_err(|_| EscrowError::VaultAlreadyInitialized)?;
            if vault_state.owner != authority_pda
                || vault_state.mint != *deposit_mint.key
                || vault_state.amount != 0
            {
                return Err(EscrowError::VaultAlreadyInitialized.into());
            }
        }

        // Create the record account (the client supplies a fresh signer)
        let record_lamports = rent.minimum_balance(EscrowRecord::LEN);
        invoke(
            &system_instruction::create_account(
                initializer.key,
                record_account.key,
                record_lamports,
                EscrowRecord::LEN as u64,
                program_id,
            ),
            &[
                initializer.clone(),
                record_account.clone(),
                system_program.clone(),
            ],
        )?;

        // Lock the deposit in the vault
        invoke(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                deposit_token_account.key,
                vault.key,
                initializer.key,
                &[],
                deposit_amount,
            )?,
            &[
                deposit_token_account.clone(),
                vault.clone(),
                initializer.clone(),
                token_program.clone(),
            ],
        )?;

        // Persist the record
        let record = EscrowRecord::new(
            *initializer.key,
            *deposit_token_account.key,
            *receive_token_account.key,
            *deposit_mint.key,
            *receive_mint.key,
            deposit_amount,
            receive_amount,
            *vault.key,
            authority_bump,
        );
        record.serialize(&mut &mut record_account.data.borrow_mut()[..])?;

        msg!(
            "Escrow created: record={}, deposit={}, receive={}",
            record_account.key,
            deposit_amount,
            receive_amount
        );
        Ok(())
    }

    fn process_exchange(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let record_account = next_account_info(account_info_iter)?;
        let initializer = next_account_info(account_info_iter)?;
        let taker = next_account_info(account_info_iter)?;
        let taker_payment_account = next_account_info(account_info_iter)?;
        let taker_receive_account = next_account_info(account_info_iter)?;
        let initializer_receive_account = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let vault_authority = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        let mut record = Self::load_active_record(program_id, record_account)?;

        if !taker.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Supplied accounts must be the ones the record was created with
        if *initializer.key != record.initializer
            || *initializer_receive_account.key != record.initializer_receive_account
            || *vault.key != record.vault
        {
            return Err(ProgramError::InvalidAccountData);
        }

        let authority_pda =
            Self::rederive_authority(program_id, record_account, record.authority_bump)?;
        if authority_pda != *vault_authority.key {
            return Err(EscrowError::AuthorityMismatch.into());
        }

        // The vault must hold exactly the recorded deposit; anything else is
        // a partial-fill shape and fails closed
        let vault_state = TokenAccount::unpack(&vault.data.borrow())?;
        if vault_state.owner != authority_pda {
            return Err(EscrowError::AuthorityMismatch.into());
        }
        if vault_state.amount != record.deposit_amount {
            return Err(EscrowError::AmountMismatch.into());
        }

        // Taker must pay with the counter-asset and cover the asked amount
        let payment_state = TokenAccount::unpack(&taker_payment_account.data.borrow())?;
        if payment_state.mint != record.receive_mint {
            return Err(ProgramError::InvalidAccountData);
        }
        if payment_state.amount < record.receive_amount {
            return Err(EscrowError::InsufficientFunds.into());
        }

        // Leg 1: counter-asset from taker to initializer
        invoke(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                taker_payment_account.key,
                initializer_receive_account.key,
                taker.key,
                &[],
                record.receive_amount,
            )?,
            &[
                taker_payment_account.clone(),
                initializer_receive_account.clone(),
                taker.clone(),
                token_program.clone(),
            ],
        )?;

        // Leg 2: deposit from vault to taker, signed by the derived authority
        let authority_seeds = &[
            seeds::VAULT_AUTHORITY_SEED,
            record_account.key.as_ref(),
            &[record.authority_bump],
        ];

        invoke_signed(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                vault.key,
                taker_receive_account.key,
                &authority_pda,
                &[],
                vault_state.amount,
            )?,
            &[
                vault.clone(),
                taker_receive_account.clone(),
                vault_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        // Reclaim the vault, rent back to the initializer
        invoke_signed(
            &spl_token::instruction::close_account(
                &spl_token::id(),
                vault.key,
                initializer.key,
                &authority_pda,
                &[],
            )?,
            &[
                vault.clone(),
                initializer.clone(),
                vault_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        // Resolve and reclaim the record
        record.status = EscrowStatus::Completed;
        record.serialize(&mut &mut record_account.data.borrow_mut()[..])?;
        Self::close_record(record_account, initializer)?;

        msg!(
            "Escrow completed: record={}, taker={}, deposit={}, receive={}",
            record_account.key,
            taker.key,
            record.deposit_amount,
            record.receive_amount
        );
        Ok(())
    }

    fn process_cancel(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let record_account = next_account_info(account_info_iter)?;
        let initializer = next_account_info(account_info_iter)?;
        let deposit_token_account = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let vault_authority = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        let mut record = Self::load_active_record(program_id, record_account)?;

        // Only the original initializer may cancel
        if !initializer.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *initializer.key != record.initializer {
            return Err(EscrowError::Unauthorized.into());
        }
        if *deposit_token_account.key != record.initializer_deposit_account
            || *vault.key != record.vault
        {
            return Err(ProgramError::InvalidAccountData);
        }

        let authority_pda =
            Self::rederive_authority(program_id, record_account, record.authority_bump)?;
        if authority_pda != *vault_authority.key {
            return Err(EscrowError::AuthorityMismatch.into());
        }

        let vault_state = TokenAccount::unpack(&vault.data.borrow())?;
        if vault_state.owner != authority_pda {
            return Err(EscrowError::AuthorityMismatch.into());
        }

        // Return the deposit, then reclaim vault and record
        let authority_seeds = &[
            seeds::VAULT_AUTHORITY_SEED,
            record_account.key.as_ref(),
            &[record.authority_bump],
        ];

        invoke_signed(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                vault.key,
                deposit_token_account.key,
                &authority_pda,
                &[],
                vault_state.amount,
            )?,
            &[
                vault.clone(),
                deposit_token_account.clone(),
                vault_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        invoke_signed(
            &spl_token::instruction::close_account(
                &spl_token::id(),
                vault.key,
                initializer.key,
                &authority_pda,
                &[],
            )?,
            &[
                vault.clone(),
                initializer.clone(),
                vault_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        record.status = EscrowStatus::Cancelled;
        record.serialize(&mut &mut record_account.data.borrow_mut()[..])?;
        Self::close_record(record_account, initializer)?;

        msg!(
            "Escrow cancelled: record={}, refunded={}",
            record_account.key,
            vault_state.amount
        );
        Ok(())
    }

    /// Load an escrow record that is still open for settlement. Closed records
    /// no longer exist (or are zeroed within the closing transaction), which
    /// reads as `EscrowNotActive`; a live account with a foreign discriminator
    /// is a different schema and is rejected outright.
    fn load_active_record(
        program_id: &Pubkey,
        record_account: &AccountInfo,
    ) -> Result<EscrowRecord, ProgramError> {
        if record_account.owner != program_id || record_account.data_len() < EscrowRecord::LEN {
            return Err(EscrowError::EscrowNotActive.into());
        }
        let data = record_account.data.borrow();
        if data[..8] != EscrowRecord::DISCRIMINATOR {
            if data.iter().all(|b| *b == 0) {
                return Err(EscrowError::EscrowNotActive.into());
            }
            return Err(ProgramError::InvalidAccountData);
        }
        let record = EscrowRecord::try_from_slice(&data)?;
        if record.status != EscrowStatus::Active {
            return Err(EscrowError::EscrowNotActive.into());
        }
        Ok(record)
    }

    /// Re-derive the vault authority from the stored bump. A failed or
    /// divergent derivation means the record was tampered with.
    fn rederive_authority(
        program_id: &Pubkey,
        record_account: &AccountInfo,
        bump: u8,
    ) -> Result<Pubkey, ProgramError> {
        Pubkey::create_program_address(
            &[
                seeds::VAULT_AUTHORITY_SEED,
                record_account.key.as_ref(),
                &[bump],
            ],
            program_id,
        )
        .map_err(|_| EscrowError::AuthorityMismatch.into())
    }

    /// Reclaim a record account: move its lamports to the destination and
    /// wipe the data so the runtime deletes it at the end of the transaction.
    fn close_record(record_account: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
        let reclaimed = record_account.lamports();
        let destination_lamports = destination.lamports();
        **destination.try_borrow_mut_lamports()? = destination_lamports
            .checked_add(reclaimed)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        **record_account.try_borrow_mut_lamports()? = 0;
        record_account.data.borrow_mut().fill(0);
        Ok(())
    }
}
