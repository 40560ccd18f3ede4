use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::BASE_VAULT_SEED;
use crate::errors::LendingError;
use crate::events::RepayEvent;
use crate::state::{Market, Position};

/// Accounts for repaying a position's debt
#[derive(Accounts)]
pub struct Repay<'info> {
    /// Anyone may repay on behalf of a position
    pub payer: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// The position being repaid
    #[account(
        mut,
        constraint = position.market == market.key() @ LendingError::InvalidPosition,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            position.owner.as_ref(),
            &position.index.to_le_bytes(),
        ],
        bump = position.bump
    )]
    pub position: Account<'info, Position>,

    /// Pool base vault (destination)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Payer's base token account (source)
    #[account(
        mut,
        constraint = payer_base_account.mint == market.base_mint @ LendingError::AccountMismatch,
        constraint = payer_base_account.owner == payer.key() @ LendingError::AccountMismatch
    )]
    pub payer_base_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Repay debt on a position.
///
/// Interest accrues first; an overpayment is silently capped at the
/// accrued debt, so passing u64::MAX clears the position exactly. Only
/// the capped amount is pulled from the payer.
pub fn handler(ctx: Context<Repay>, amount: u64) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(position.is_active(), LendingError::InactivePosition);

    let rate = market.borrow_rate_bps(position.highest_tier());
    let interest = position.accrue(rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;

    // Cap at the live debt
    let repay_amount = amount.min(position.debt_amount);

    if repay_amount > 0 {
        let transfer_ctx = CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.payer_base_account.to_account_info(),
                to: ctx.accounts.base_vault.to_account_info(),
                authority: ctx.accounts.payer.to_account_info(),
            },
        );
        token::transfer(transfer_ctx, repay_amount)?;

        position.debt_amount = position
            .debt_amount
            .checked_sub(repay_amount)
            .ok_or(LendingError::MathOverflow)?;
        market.total_borrow = market
            .total_borrow
            .checked_sub(repay_amount)
            .ok_or(LendingError::MathOverflow)?;
        market.tracked_base_balance = market
            .tracked_base_balance
            .checked_add(repay_amount)
            .ok_or(LendingError::MathOverflow)?;
    }

    let utilization = market.utilization_bps();

    emit!(RepayEvent {
        market: market.key(),
        position: position.key(),
        payer: ctx.accounts.payer.key(),
        amount: repay_amount,
        remaining_debt: position.debt_amount,
        new_utilization_bps: utilization,
        timestamp: now,
    });

    msg!("Repaid {} on position {}", repay_amount, position.index);
    msg!("Remaining debt: {}", position.debt_amount);

    Ok(())
}
