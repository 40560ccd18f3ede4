use anchor_lang::prelude::*;

use crate::errors::LendingError;
use crate::events::PauseChanged;
use crate::state::Market;

/// Accounts for toggling the pause flag
#[derive(Accounts)]
pub struct SetPause<'info> {
    /// The pauser role
    pub pauser: Signer<'info>,

    /// The market to pause or unpause
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        has_one = pauser @ LendingError::Unauthorized
    )]
    pub market: Account<'info, Market>,
}

/// Set the pause flag.
///
/// While paused, every state-changing instruction is rejected. Reads stay
/// available so off-chain consumers can keep valuing positions.
pub fn handler(ctx: Context<SetPause>, paused: bool) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let clock = Clock::get()?;

    market.paused = paused;

    emit!(PauseChanged {
        market: market.key(),
        paused,
        timestamp: clock.unix_timestamp,
    });

    if paused {
        msg!("Protocol PAUSED");
    } else {
        msg!("Protocol unpaused");
    }

    Ok(())
}
