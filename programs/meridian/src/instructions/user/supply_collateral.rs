use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::VAULT_SEED;
use crate::errors::LendingError;
use crate::events::CollateralSupplied;
use crate::state::{AssetConfig, CollateralEntry, Market, Position};

/// Accounts for supplying collateral to a position
#[derive(Accounts)]
pub struct SupplyCollateral<'info> {
    /// Position owner
    pub owner: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// The position being collateralized
    #[account(
        mut,
        constraint = position.market == market.key() @ LendingError::InvalidPosition,
        constraint = position.owner == owner.key() @ LendingError::InvalidPosition,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            owner.key().as_ref(),
            &position.index.to_le_bytes(),
        ],
        bump = position.bump
    )]
    pub position: Account<'info, Position>,

    /// Listing of the supplied asset
    #[account(
        mut,
        seeds = [AssetConfig::SEED_PREFIX, market.key().as_ref(), asset_config.mint.as_ref()],
        bump = asset_config.bump
    )]
    pub asset_config: Account<'info, AssetConfig>,

    /// Collateral vault (destination)
    #[account(
        mut,
        seeds = [VAULT_SEED, asset_config.key().as_ref()],
        bump,
        constraint = vault.key() == asset_config.vault @ LendingError::AccountMismatch
    )]
    pub vault: Account<'info, TokenAccount>,

    /// Owner's token account (source)
    #[account(
        mut,
        constraint = owner_token_account.mint == asset_config.mint @ LendingError::AccountMismatch,
        constraint = owner_token_account.owner == owner.key() @ LendingError::AccountMismatch
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Supply collateral to a position.
///
/// Interest is accrued before the collateral set changes so the pre-supply
/// tier mix pays for the elapsed window. Supplying never requires a price:
/// adding collateral can only improve the position.
pub fn handler(ctx: Context<SupplyCollateral>, amount: u64) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let asset_config = &mut ctx.accounts.asset_config;
    let clock = Clock::get()?;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(position.is_active(), LendingError::InactivePosition);
    require!(asset_config.active, LendingError::AssetNotActive);
    require!(
        asset_config.has_capacity(amount),
        LendingError::AssetCapacityReached
    );

    // Isolation rules and the per-position asset cap
    position.check_collateral_admission(&asset_config.mint, asset_config.tier)?;

    // Accrue at the pre-supply tier mix
    let rate = market.borrow_rate_bps(position.highest_tier());
    let interest = position.accrue(rate, clock.unix_timestamp)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;

    // Pull the collateral into the vault
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.owner_token_account.to_account_info(),
            to: ctx.accounts.vault.to_account_info(),
            authority: ctx.accounts.owner.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    asset_config.total_supplied = asset_config
        .total_supplied
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;

    // Upsert the entry; the tier snapshot follows the live listing
    let new_amount = match position.find_collateral(&asset_config.mint) {
        Some(index) => {
            let entry = &mut position.collateral[index];
            entry.amount = entry
                .amount
                .checked_add(amount)
                .ok_or(LendingError::MathOverflow)?;
            entry.tier = asset_config.tier;
            entry.amount
        }
        None => {
            position.collateral.push(CollateralEntry {
                mint: asset_config.mint,
                amount,
                tier: asset_config.tier,
            });
            amount
        }
    };

    emit!(CollateralSupplied {
        market: market.key(),
        position: position.key(),
        mint: asset_config.mint,
        amount,
        new_collateral_amount: new_amount,
        timestamp: clock.unix_timestamp,
    });

    msg!("Supplied {} of {} to position {}", amount, asset_config.mint, position.index);

    Ok(())
}
