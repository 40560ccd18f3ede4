use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::BASE_VAULT_SEED;
use crate::errors::LendingError;
use crate::events::YieldBoosted;
use crate::state::Market;

/// Accounts for injecting yield into the pool
#[derive(Accounts)]
pub struct BoostYield<'info> {
    /// The rewarder role
    pub rewarder: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused,
        has_one = rewarder @ LendingError::Unauthorized
    )]
    pub market: Account<'info, Market>,

    /// Pool base vault (destination)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Rewarder's base token account (source)
    #[account(
        mut,
        constraint = rewarder_base_account.mint == market.base_mint @ LendingError::AccountMismatch,
        constraint = rewarder_base_account.owner == rewarder.key() @ LendingError::AccountMismatch
    )]
    pub rewarder_base_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Inject base assets into the pool without minting shares.
///
/// Raises the share exchange rate for every holder at once; this is how
/// realized protocol profit is distributed back to suppliers.
pub fn handler(ctx: Context<BoostYield>, amount: u64) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let clock = Clock::get()?;

    require!(amount > 0, LendingError::ZeroAmount);

    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.rewarder_base_account.to_account_info(),
            to: ctx.accounts.base_vault.to_account_info(),
            authority: ctx.accounts.rewarder.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;
    market.total_supplied_liquidity = market
        .total_supplied_liquidity
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;

    emit!(YieldBoosted {
        market: market.key(),
        rewarder: ctx.accounts.rewarder.key(),
        amount,
        total_supplied_liquidity: market.total_supplied_liquidity,
        timestamp: clock.unix_timestamp,
    });

    msg!("Yield boosted by {} base units", amount);

    Ok(())
}
