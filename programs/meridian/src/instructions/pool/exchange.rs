use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::constants::{BASE_VAULT_SEED, BPS_DENOMINATOR, SHARE_MINT_SEED};
use crate::errors::LendingError;
use crate::events::SharesExchanged;
use crate::state::Market;

/// Accounts for redeeming pool shares
#[derive(Accounts)]
pub struct Exchange<'info> {
    /// Share holder redeeming
    pub redeemer: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// Pool base vault (source)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Redeemer's base token account (destination)
    #[account(
        mut,
        constraint = redeemer_base_account.mint == market.base_mint @ LendingError::AccountMismatch,
        constraint = redeemer_base_account.owner == redeemer.key() @ LendingError::AccountMismatch
    )]
    pub redeemer_base_account: Account<'info, TokenAccount>,

    /// Pool share mint
    #[account(
        mut,
        seeds = [SHARE_MINT_SEED, market.key().as_ref()],
        bump,
        constraint = share_mint.key() == market.share_mint @ LendingError::AccountMismatch
    )]
    pub share_mint: Account<'info, Mint>,

    /// Redeemer's share token account (burn source)
    #[account(
        mut,
        constraint = redeemer_share_account.mint == market.share_mint @ LendingError::AccountMismatch,
        constraint = redeemer_share_account.owner == redeemer.key() @ LendingError::AccountMismatch
    )]
    pub redeemer_share_account: Account<'info, TokenAccount>,

    /// Treasury's share token account; receives the protocol fee when the
    /// pool runs above its profit target
    #[account(
        mut,
        constraint = treasury_share_account.mint == market.share_mint @ LendingError::AccountMismatch,
        constraint = treasury_share_account.owner == market.treasury @ LendingError::AccountMismatch
    )]
    pub treasury_share_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Redeem shares for base assets at the current exchange rate.
///
/// The payout is computed before anything moves, so redeeming the entire
/// share supply drains exactly the supplied liquidity. When the pool holds
/// profit above its target, a fee in newly minted shares goes to the
/// treasury; the redeemer's payout is never reduced by it.
pub fn handler(ctx: Context<Exchange>, share_amount: u64) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(share_amount > 0, LendingError::ZeroAmount);
    require!(
        ctx.accounts.redeemer_share_account.amount >= share_amount,
        LendingError::InsufficientShares
    );

    // Value and fee at the pre-redemption rate
    let amount_out = market.redemption_value(share_amount)?;
    let fee_shares = if market.profit_above_target() > 0 {
        ((share_amount as u128)
            .checked_mul(market.config.profit_target_rate_bps as u128)
            .ok_or(LendingError::MathOverflow)?
            / BPS_DENOMINATOR as u128) as u64
    } else {
        0
    };

    require!(
        amount_out <= market.tracked_base_balance,
        LendingError::InsufficientPoolLiquidity
    );

    // Burn the redeemed shares
    let burn_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Burn {
            mint: ctx.accounts.share_mint.to_account_info(),
            from: ctx.accounts.redeemer_share_account.to_account_info(),
            authority: ctx.accounts.redeemer.to_account_info(),
        },
    );
    token::burn(burn_ctx, share_amount)?;

    let seeds = &[
        Market::SEED_PREFIX,
        market.authority.as_ref(),
        &[market.bump],
    ];
    let signer_seeds = &[&seeds[..]];

    if fee_shares > 0 {
        let mint_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.share_mint.to_account_info(),
                to: ctx.accounts.treasury_share_account.to_account_info(),
                authority: market.to_account_info(),
            },
            signer_seeds,
        );
        token::mint_to(mint_ctx, fee_shares)?;
    }

    // Pay out the base assets
    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.base_vault.to_account_info(),
            to: ctx.accounts.redeemer_base_account.to_account_info(),
            authority: market.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount_out)?;

    market.share_total_supply = market
        .share_total_supply
        .checked_sub(share_amount)
        .and_then(|s| s.checked_add(fee_shares))
        .ok_or(LendingError::MathOverflow)?;
    market.total_supplied_liquidity = market
        .total_supplied_liquidity
        .checked_sub(amount_out)
        .ok_or(LendingError::MathOverflow)?;
    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_sub(amount_out)
        .ok_or(LendingError::MathOverflow)?;

    emit!(SharesExchanged {
        market: market.key(),
        redeemer: ctx.accounts.redeemer.key(),
        shares_burned: share_amount,
        amount_out,
        fee_shares,
        timestamp: now,
    });

    msg!("Redeemed {} shares for {} base units", share_amount, amount_out);
    if fee_shares > 0 {
        msg!("Treasury fee: {} shares", fee_shares);
    }

    Ok(())
}
