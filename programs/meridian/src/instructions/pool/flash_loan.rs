use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::{BASE_VAULT_SEED, BPS_DENOMINATOR};
use crate::errors::LendingError;
use crate::events::FlashLoanEvent;
use crate::state::Market;

/// Accounts for a flash loan
///
/// Remaining accounts: forwarded verbatim to the receiver program's
/// callback instruction.
#[derive(Accounts)]
pub struct FlashLoan<'info> {
    /// Flash loan initiator
    pub initiator: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// Pool base vault (loan source, repayment destination)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Token account the loan is paid into before the callback runs
    #[account(
        mut,
        constraint = receiver_token_account.mint == market.base_mint @ LendingError::AccountMismatch
    )]
    pub receiver_token_account: Account<'info, TokenAccount>,

    /// Program invoked for the repayment callback
    /// CHECK: Only required to be executable; the balance check after the
    /// callback is what secures the loan
    #[account(
        constraint = receiver_program.executable @ LendingError::FlashLoanFailed
    )]
    pub receiver_program: UncheckedAccount<'info>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Lend base assets for the duration of one transaction.
///
/// The amount is paid out, the receiver program is invoked synchronously
/// with the forwarded accounts and params, and the vault balance is then
/// re-read. Anything short of principal plus fee reverts the whole
/// transaction; the runtime's ban on reentrant CPI means the loan cannot
/// recurse back into the pool.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, FlashLoan<'info>>,
    amount: u64,
    params: Vec<u8>,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let clock = Clock::get()?;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(
        amount <= market.tracked_base_balance && amount <= ctx.accounts.base_vault.amount,
        LendingError::InsufficientPoolLiquidity
    );

    let fee = ((amount as u128)
        .checked_mul(market.config.flash_loan_fee_bps as u128)
        .ok_or(LendingError::MathOverflow)?
        / BPS_DENOMINATOR as u128) as u64;
    let balance_before = ctx.accounts.base_vault.amount;

    // Pay the loan out, market PDA signing
    let seeds = &[
        Market::SEED_PREFIX,
        market.authority.as_ref(),
        &[market.bump],
    ];
    let signer_seeds = &[&seeds[..]];
    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.base_vault.to_account_info(),
            to: ctx.accounts.receiver_token_account.to_account_info(),
            authority: market.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)?;

    // Invoke the receiver's callback with the forwarded accounts. The
    // market PDA never signs here.
    let metas: Vec<AccountMeta> = ctx
        .remaining_accounts
        .iter()
        .map(|account| AccountMeta {
            pubkey: account.key(),
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        })
        .collect();
    let callback = Instruction {
        program_id: ctx.accounts.receiver_program.key(),
        accounts: metas,
        data: params,
    };
    let mut callback_accounts = ctx.remaining_accounts.to_vec();
    callback_accounts.push(ctx.accounts.receiver_program.to_account_info());
    invoke(&callback, &callback_accounts)?;

    // The vault must hold principal plus fee again
    ctx.accounts.base_vault.reload()?;
    let required = balance_before
        .checked_add(fee)
        .ok_or(LendingError::MathOverflow)?;
    require!(
        ctx.accounts.base_vault.amount >= required,
        LendingError::FlashLoanFailed
    );

    // Absorb the full repayment surplus; the fee itself is supplier
    // profit and raises the share exchange rate
    let surplus = ctx.accounts.base_vault.amount - balance_before;
    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_add(surplus)
        .ok_or(LendingError::MathOverflow)?;
    market.total_supplied_liquidity = market
        .total_supplied_liquidity
        .checked_add(fee)
        .ok_or(LendingError::MathOverflow)?;
    market.flash_loan_fees_collected = market
        .flash_loan_fees_collected
        .checked_add(fee)
        .ok_or(LendingError::MathOverflow)?;

    emit!(FlashLoanEvent {
        market: market.key(),
        initiator: ctx.accounts.initiator.key(),
        receiver_program: ctx.accounts.receiver_program.key(),
        amount,
        fee,
        timestamp: clock.unix_timestamp,
    });

    msg!("Flash loan of {} repaid with fee {}", amount, fee);

    Ok(())
}
