use anchor_lang::prelude::*;

use crate::errors::LendingError;
use crate::events::InterestAccrued;
use crate::state::{Market, Position};

/// Accounts for accruing interest on a position
#[derive(Accounts)]
pub struct AccrueInterest<'info> {
    /// Anyone may crank accrual
    pub cranker: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// The position to accrue
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
}

/// Fold pending interest into a position's debt.
///
/// Permissionless: every position-touching instruction accrues on its own,
/// this crank just keeps long-idle positions from drifting. Calling it
/// twice in the same slot is a strict no-op.
pub fn handler(ctx: Context<AccrueInterest>) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(position.is_active(), LendingError::InactivePosition);

    let tier = position.highest_tier();
    let rate = market.borrow_rate_bps(tier);
    let interest = position.accrue(rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;

    emit!(InterestAccrued {
        market: market.key(),
        position: position.key(),
        interest,
        new_debt_amount: position.debt_amount,
        tier,
        borrow_rate_bps: rate,
        timestamp: now,
    });

    msg!("Accrued {} interest on position {}", interest, position.index);

    Ok(())
}
