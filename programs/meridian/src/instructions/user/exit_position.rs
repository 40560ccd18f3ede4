use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::errors::LendingError;
use crate::events::PositionExited;
use crate::state::{AssetConfig, Market, Position, PositionStatus};

/// Accounts for closing a debt-free position
///
/// Remaining accounts: for each collateral entry in order, a triple of the
/// AssetConfig PDA, its vault, and the owner's token account for that mint.
#[derive(Accounts)]
pub struct ExitPosition<'info> {
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

    /// The position to close
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

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Close a position, returning every remaining collateral holding.
///
/// The position must be debt-free after a final accrual; anything owed,
/// even dust interest, blocks the exit. Closed is terminal: the index is
/// burned and the account stays behind as a tombstone.
pub fn handler<'info>(ctx: Context<'_, '_, 'info, 'info, ExitPosition<'info>>) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(position.is_active(), LendingError::InactivePosition);

    // Final accrual; dust interest still blocks the exit
    let rate = market.borrow_rate_bps(position.highest_tier());
    let interest = position.accrue(rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;
    require!(position.debt_amount == 0, LendingError::DebtOutstanding);

    let market_key = market.key();
    let accounts = ctx.remaining_accounts;
    let mut cursor: usize = 0;

    for entry in position.collateral.iter() {
        let config_info = accounts
            .get(cursor)
            .ok_or(LendingError::AccountMismatch)?;
        let mut asset_config = Account::<AssetConfig>::try_from(config_info)?;
        require!(
            asset_config.market == market_key && asset_config.mint == entry.mint,
            LendingError::AccountMismatch
        );

        let vault_info = accounts
            .get(cursor + 1)
            .ok_or(LendingError::AccountMismatch)?;
        require_keys_eq!(
            vault_info.key(),
            asset_config.vault,
            LendingError::AccountMismatch
        );

        let destination_info = accounts
            .get(cursor + 2)
            .ok_or(LendingError::AccountMismatch)?;
        let destination = Account::<TokenAccount>::try_from(destination_info)?;
        require!(
            destination.mint == entry.mint && destination.owner == position.owner,
            LendingError::AccountMismatch
        );
        cursor += 3;

        // Return the holding, the listing PDA signing for its vault
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
                from: vault_info.clone(),
                to: destination_info.clone(),
                authority: config_info.clone(),
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, entry.amount)?;

        asset_config.total_supplied = asset_config
            .total_supplied
            .checked_sub(entry.amount)
            .ok_or(LendingError::MathOverflow)?;
        asset_config.exit(&crate::ID)?;
    }

    position.collateral.clear();
    position.status = PositionStatus::Closed;

    emit!(PositionExited {
        market: market_key,
        position: position.key(),
        owner: position.owner,
        timestamp: now,
    });

    msg!("Position {} closed", position.index);

    Ok(())
}
