use anchor_lang::prelude::*;

use crate::errors::LendingError;
use crate::events::CollateralTransferred;
use crate::state::{AssetConfig, CollateralEntry, Market, Position};
use crate::valuation::{self, value_entry};

/// Accounts for moving collateral between two positions of the same owner
///
/// Remaining accounts: the valuation set of the source position, in
/// collateral order (AssetConfig then feed(s) per entry). No tokens move;
/// the collateral stays in the same vault under a different position.
#[derive(Accounts)]
pub struct TransferCollateral<'info> {
    /// Owner of both positions
    pub owner: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// Source position
    #[account(
        mut,
        constraint = from_position.market == market.key() @ LendingError::InvalidPosition,
        constraint = from_position.owner == owner.key() @ LendingError::InvalidPosition,
        constraint = from_position.key() != to_position.key() @ LendingError::InvalidPosition,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            owner.key().as_ref(),
            &from_position.index.to_le_bytes(),
        ],
        bump = from_position.bump
    )]
    pub from_position: Account<'info, Position>,

    /// Destination position
    #[account(
        mut,
        constraint = to_position.market == market.key() @ LendingError::InvalidPosition,
        constraint = to_position.owner == owner.key() @ LendingError::InvalidPosition,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            owner.key().as_ref(),
            &to_position.index.to_le_bytes(),
        ],
        bump = to_position.bump
    )]
    pub to_position: Account<'info, Position>,

    /// Listing of the transferred asset
    #[account(
        seeds = [AssetConfig::SEED_PREFIX, market.key().as_ref(), asset_config.mint.as_ref()],
        bump = asset_config.bump
    )]
    pub asset_config: Account<'info, AssetConfig>,
}

/// Move collateral between two positions of the caller.
///
/// Both positions accrue before the set changes. The destination is bound
/// by the same admission rules as a fresh supply; the source must remain
/// within its credit limit, priced fresh.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, TransferCollateral<'info>>,
    amount: u64,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let from_position = &mut ctx.accounts.from_position;
    let to_position = &mut ctx.accounts.to_position;
    let asset_config = &ctx.accounts.asset_config;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(from_position.is_active(), LendingError::InactivePosition);
    require!(to_position.is_active(), LendingError::InactivePosition);

    let entry_index = from_position
        .find_collateral(&asset_config.mint)
        .ok_or(LendingError::CollateralNotFound)?;
    let held = from_position.collateral[entry_index].amount;
    let remaining = held
        .checked_sub(amount)
        .ok_or(LendingError::MathOverflow)?;

    // The destination is held to the same rules as a direct supply
    to_position.check_collateral_admission(&asset_config.mint, asset_config.tier)?;

    // Accrue both sides at their pre-transfer tier mixes
    let from_rate = market.borrow_rate_bps(from_position.highest_tier());
    let from_interest = from_position.accrue(from_rate, now)?;
    let to_rate = market.borrow_rate_bps(to_position.highest_tier());
    let to_interest = to_position.accrue(to_rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(from_interest)
        .and_then(|t| t.checked_add(to_interest))
        .ok_or(LendingError::MathOverflow)?;

    // The source must still cover its debt without the moved slice
    if from_position.debt_amount > 0 {
        let snapshot = valuation::evaluate_position(
            &market.key(),
            from_position,
            ctx.remaining_accounts,
            now,
        )?;
        let entry_valuation = &snapshot.entries[entry_index];
        let (_, moved_credit, _) = value_entry(
            amount,
            entry_valuation.price,
            entry_valuation.decimals,
            asset_config.borrow_threshold,
            asset_config.liquidation_threshold,
        )?;
        let new_credit_limit = snapshot
            .credit_limit
            .checked_sub(moved_credit)
            .ok_or(LendingError::MathOverflow)?;
        require!(
            from_position.debt_amount as u128 <= new_credit_limit,
            LendingError::CreditLimitExceeded
        );
    }

    if remaining == 0 {
        from_position.collateral.remove(entry_index);
    } else {
        from_position.collateral[entry_index].amount = remaining;
        from_position.collateral[entry_index].tier = asset_config.tier;
    }

    match to_position.find_collateral(&asset_config.mint) {
        Some(index) => {
            let entry = &mut to_position.collateral[index];
            entry.amount = entry
                .amount
                .checked_add(amount)
                .ok_or(LendingError::MathOverflow)?;
            entry.tier = asset_config.tier;
        }
        None => {
            to_position.collateral.push(CollateralEntry {
                mint: asset_config.mint,
                amount,
                tier: asset_config.tier,
            });
        }
    }

    emit!(CollateralTransferred {
        market: market.key(),
        from_position: from_position.key(),
        to_position: to_position.key(),
        mint: asset_config.mint,
        amount,
        timestamp: now,
    });

    msg!(
        "Transferred {} of {} from position {} to position {}",
        amount,
        asset_config.mint,
        from_position.index,
        to_position.index
    );

    Ok(())
}
