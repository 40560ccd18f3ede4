use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::{BASE_VAULT_SEED, BPS_DENOMINATOR};
use crate::errors::LendingError;
use crate::events::LiquidationEvent;
use crate::state::{
    health_factor, is_liquidatable, AssetConfig, Market, Position, PositionStatus,
};
use crate::valuation;

/// Accounts for liquidating an unhealthy position
///
/// Remaining accounts: the valuation set first (AssetConfig then feed(s)
/// per collateral entry, in order), followed by one pair per entry of the
/// entry's vault and the liquidator's token account for that mint.
#[derive(Accounts)]
pub struct Liquidate<'info> {
    /// The liquidator; must hold the governance token threshold
    pub liquidator: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Box<Account<'info, Market>>,

    /// The position to liquidate
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
    pub position: Box<Account<'info, Position>>,

    /// Liquidator's governance token account, checked against the threshold
    #[account(
        constraint = governance_token_account.mint == market.governance_mint
            @ LendingError::AccountMismatch,
        constraint = governance_token_account.owner == liquidator.key()
            @ LendingError::AccountMismatch
    )]
    pub governance_token_account: Box<Account<'info, TokenAccount>>,

    /// Pool base vault; receives the debt repayment plus fee
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Box<Account<'info, TokenAccount>>,

    /// Liquidator's base token account (repayment source)
    #[account(
        mut,
        constraint = liquidator_base_account.mint == market.base_mint
            @ LendingError::AccountMismatch,
        constraint = liquidator_base_account.owner == liquidator.key()
            @ LendingError::AccountMismatch
    )]
    pub liquidator_base_account: Box<Account<'info, TokenAccount>>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Liquidate a position whose health factor has fallen below 1.0.
///
/// Full liquidation only: the liquidator repays the entire accrued debt
/// plus the tier's liquidation fee and receives the entire collateral set.
/// The spread between collateral value and debt is the liquidator's
/// incentive; no partial close factor applies.
pub fn handler<'info>(ctx: Context<'_, '_, 'info, 'info, Liquidate<'info>>) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(position.is_active(), LendingError::InactivePosition);
    require!(
        ctx.accounts.governance_token_account.amount
            >= market.config.liquidator_governance_threshold,
        LendingError::NotEnoughGovernanceTokens
    );

    // Fresh prices for the whole collateral set
    let snapshot = valuation::evaluate_position(
        &market.key(),
        position,
        ctx.remaining_accounts,
        now,
    )?;

    // Health is judged against the debt inclusive of pending interest
    let tier = snapshot.highest_tier;
    let rate = market.borrow_rate_bps(tier);
    let debt_with_interest = position.debt_with_interest(rate, now)?;
    require!(
        is_liquidatable(snapshot.liquidation_value, debt_with_interest)?,
        LendingError::NotLiquidatable
    );
    let hf = health_factor(snapshot.liquidation_value, debt_with_interest)?;

    let fee = ((debt_with_interest as u128)
        .checked_mul(tier.liquidation_fee_bps() as u128)
        .ok_or(LendingError::MathOverflow)?
        / BPS_DENOMINATOR as u128) as u64;
    let total_cost = debt_with_interest
        .checked_add(fee)
        .ok_or(LendingError::MathOverflow)?;

    // Pull repayment plus fee from the liquidator
    let repay_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.liquidator_base_account.to_account_info(),
            to: ctx.accounts.base_vault.to_account_info(),
            authority: ctx.accounts.liquidator.to_account_info(),
        },
    );
    token::transfer(repay_ctx, total_cost)?;

    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_add(total_cost)
        .ok_or(LendingError::MathOverflow)?;
    // Pending interest was never folded into the pool total, so only the
    // stored debt comes back out
    market.total_borrow = market
        .total_borrow
        .checked_sub(position.debt_amount)
        .ok_or(LendingError::MathOverflow)?;

    // Seize every collateral holding
    let market_key = market.key();
    let accounts = ctx.remaining_accounts;
    let mut cursor = snapshot.accounts_consumed;

    for entry in snapshot.entries.iter() {
        let vault_info = accounts
            .get(cursor)
            .ok_or(LendingError::AccountMismatch)?;
        require_keys_eq!(vault_info.key(), entry.vault, LendingError::AccountMismatch);

        let destination_info = accounts
            .get(cursor + 1)
            .ok_or(LendingError::AccountMismatch)?;
        let destination = Account::<TokenAccount>::try_from(destination_info)?;
        require!(
            destination.mint == entry.mint
                && destination.owner == ctx.accounts.liquidator.key(),
            LendingError::AccountMismatch
        );
        cursor += 2;

        let seeds = &[
            AssetConfig::SEED_PREFIX,
            market_key.as_ref(),
            entry.mint.as_ref(),
            &[entry.config_bump],
        ];
        let signer_seeds = &[&seeds[..]];
        let config_info = &accounts[entry.account_index];
        let seize_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: vault_info.clone(),
                to: destination_info.clone(),
                authority: config_info.clone(),
            },
            signer_seeds,
        );
        token::transfer(seize_ctx, entry.amount)?;

        // Keep the listing's supply accounting in step
        let mut asset_config = Account::<AssetConfig>::try_from(config_info)?;
        asset_config.total_supplied = asset_config
            .total_supplied
            .checked_sub(entry.amount)
            .ok_or(LendingError::MathOverflow)?;
        asset_config.exit(&crate::ID)?;
    }

    let owner = position.owner;
    position.collateral.clear();
    position.debt_amount = 0;
    position.last_interest_accrual = now;
    position.status = PositionStatus::Liquidated;

    emit!(LiquidationEvent {
        market: market_key,
        position: position.key(),
        liquidator: ctx.accounts.liquidator.key(),
        owner,
        debt_repaid: debt_with_interest,
        liquidation_fee: fee,
        health_factor: hf,
        tier,
        timestamp: now,
    });

    msg!("Position {} liquidated", position.index);
    msg!("Debt repaid {} plus fee {}", debt_with_interest, fee);

    Ok(())
}
