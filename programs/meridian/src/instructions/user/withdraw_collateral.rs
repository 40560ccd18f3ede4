use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::VAULT_SEED;
use crate::errors::LendingError;
use crate::events::CollateralWithdrawn;
use crate::state::{AssetConfig, Market, Position};
use crate::valuation::{self, value_entry};

/// Accounts for withdrawing collateral from a position
///
/// Remaining accounts: for each collateral entry in order, the AssetConfig
/// PDA followed by its bound price feed(s).
#[derive(Accounts)]
pub struct WithdrawCollateral<'info> {
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

    /// The position to withdraw from
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

    /// Listing of the withdrawn asset
    #[account(
        mut,
        seeds = [AssetConfig::SEED_PREFIX, market.key().as_ref(), asset_config.mint.as_ref()],
        bump = asset_config.bump
    )]
    pub asset_config: Account<'info, AssetConfig>,

    /// Collateral vault (source)
    #[account(
        mut,
        seeds = [VAULT_SEED, asset_config.key().as_ref()],
        bump,
        constraint = vault.key() == asset_config.vault @ LendingError::AccountMismatch
    )]
    pub vault: Account<'info, TokenAccount>,

    /// Owner's token account (destination)
    #[account(
        mut,
        constraint = owner_token_account.mint == asset_config.mint @ LendingError::AccountMismatch,
        constraint = owner_token_account.owner == owner.key() @ LendingError::AccountMismatch
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Withdraw collateral from a position.
///
/// The amount is explicit and must be nonzero; there is no withdraw-all
/// shorthand. After removing the amount the remaining credit limit must
/// still cover the accrued debt, priced fresh from the walked feeds.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, WithdrawCollateral<'info>>,
    amount: u64,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let asset_config = &mut ctx.accounts.asset_config;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(position.is_active(), LendingError::InactivePosition);

    let entry_index = position
        .find_collateral(&asset_config.mint)
        .ok_or(LendingError::CollateralNotFound)?;
    let held = position.collateral[entry_index].amount;
    let remaining = held
        .checked_sub(amount)
        .ok_or(LendingError::MathOverflow)?;

    // Accrue before anything moves
    let rate = market.borrow_rate_bps(position.highest_tier());
    let interest = position.accrue(rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;

    // Price the full set, then subtract the withdrawn slice from the
    // credit limit. Debt-free positions skip the pricing entirely.
    if position.debt_amount > 0 {
        let snapshot = valuation::evaluate_position(
            &market.key(),
            position,
            ctx.remaining_accounts,
            now,
        )?;
        let entry_valuation = &snapshot.entries[entry_index];
        let (_, withdrawn_credit, _) = value_entry(
            amount,
            entry_valuation.price,
            entry_valuation.decimals,
            asset_config.borrow_threshold,
            asset_config.liquidation_threshold,
        )?;
        let new_credit_limit = snapshot
            .credit_limit
            .checked_sub(withdrawn_credit)
            .ok_or(LendingError::MathOverflow)?;
        require!(
            position.debt_amount as u128 <= new_credit_limit,
            LendingError::CreditLimitExceeded
        );
    }

    // Release the collateral from the vault
    let market_key = market.key();
    let seeds = &[
        AssetConfig::SEED_PREFIX,
        market_key.as_ref(),
        asset_config.mint.as_ref(),
        &[asset_config.bump],
    ];
    let signer_seeds = &[&seeds[..]];
    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.owner_token_account.to_account_info(),
            authority: asset_config.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)?;

    asset_config.total_supplied = asset_config
        .total_supplied
        .checked_sub(amount)
        .ok_or(LendingError::MathOverflow)?;

    if remaining == 0 {
        position.collateral.remove(entry_index);
    } else {
        position.collateral[entry_index].amount = remaining;
        position.collateral[entry_index].tier = asset_config.tier;
    }

    emit!(CollateralWithdrawn {
        market: market.key(),
        position: position.key(),
        mint: asset_config.mint,
        amount,
        remaining_collateral: remaining,
        timestamp: now,
    });

    msg!("Withdrew {} of {} from position {}", amount, asset_config.mint, position.index);

    Ok(())
}
