use anchor_lang::prelude::*;

use crate::errors::LendingError;
use crate::events::PositionCreated;
use crate::state::{AssetConfig, CollateralTier, Market, Position, PositionStatus, UserAccount};

/// Accounts for creating a borrowing position
#[derive(Accounts)]
pub struct CreatePosition<'info> {
    /// Position owner
    #[account(mut)]
    pub owner: Signer<'info>,

    /// The market
    #[account(
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// Listing of the asset the position intends to use. Creation against
    /// an unlisted asset must fail eagerly, not at first deposit.
    #[account(
        constraint = asset_config.market == market.key() @ LendingError::AssetNotListed
    )]
    pub asset_config: Account<'info, AssetConfig>,

    /// Per-owner bookkeeping; allocates the position index
    /// PDA: ["user", market, owner]
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + UserAccount::INIT_SPACE,
        seeds = [UserAccount::SEED_PREFIX, market.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub user_account: Account<'info, UserAccount>,

    /// The position to create
    /// PDA: ["position", market, owner, index]
    #[account(
        init,
        payer = owner,
        space = 8 + Position::INIT_SPACE,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            owner.key().as_ref(),
            &user_account.position_count.to_le_bytes(),
        ],
        bump
    )]
    pub position: Account<'info, Position>,

    /// System program for account creation
    pub system_program: Program<'info, System>,
}

/// Create a new position for the caller.
///
/// The isolation mode is fixed at creation: an isolated position may only
/// ever hold one isolated-tier asset, a cross position may hold up to the
/// asset cap of non-isolated assets. Indexes are per-owner, sequential and
/// never reused, so a closed position's index stays burned.
pub fn handler(ctx: Context<CreatePosition>, is_isolated: bool) -> Result<()> {
    let user_account = &mut ctx.accounts.user_account;
    let position = &mut ctx.accounts.position;
    let asset_config = &ctx.accounts.asset_config;
    let clock = Clock::get()?;

    // The declared asset must match the declared mode
    if is_isolated {
        require!(
            asset_config.tier == CollateralTier::Isolated,
            LendingError::IsolatedAssetViolation
        );
    } else {
        require!(
            asset_config.tier != CollateralTier::Isolated,
            LendingError::IsolatedAssetViolation
        );
    }

    if user_account.position_count == 0 {
        user_account.bump = ctx.bumps.user_account;
        user_account.market = ctx.accounts.market.key();
        user_account.owner = ctx.accounts.owner.key();
    }

    let index = user_account.position_count;
    user_account.position_count = index
        .checked_add(1)
        .ok_or(LendingError::MathOverflow)?;

    position.version = 1;
    position.bump = ctx.bumps.position;
    position.market = ctx.accounts.market.key();
    position.owner = ctx.accounts.owner.key();
    position.index = index;
    position.is_isolated = is_isolated;
    position.status = PositionStatus::Active;
    position.debt_amount = 0;
    position.last_interest_accrual = clock.unix_timestamp;
    position.collateral = Vec::new();
    position._padding = [0u8; 64];

    emit!(PositionCreated {
        market: position.market,
        position: position.key(),
        owner: position.owner,
        index,
        is_isolated,
    });

    msg!("Position {} created for {}", index, position.owner);

    Ok(())
}
