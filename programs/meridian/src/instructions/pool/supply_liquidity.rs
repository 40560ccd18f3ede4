use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::constants::{BASE_VAULT_SEED, SHARE_MINT_SEED};
use crate::errors::LendingError;
use crate::events::LiquiditySupplied;
use crate::state::{Market, UserAccount};

/// Accounts for supplying base liquidity to the pool
#[derive(Accounts)]
pub struct SupplyLiquidity<'info> {
    /// Liquidity supplier
    #[account(mut)]
    pub supplier: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// Per-user bookkeeping; tracks the reward-eligibility timer
    /// PDA: ["user", market, supplier]
    #[account(
        init_if_needed,
        payer = supplier,
        space = 8 + UserAccount::INIT_SPACE,
        seeds = [UserAccount::SEED_PREFIX, market.key().as_ref(), supplier.key().as_ref()],
        bump
    )]
    pub user_account: Account<'info, UserAccount>,

    /// Pool base vault (destination)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Supplier's base token account (source)
    #[account(
        mut,
        constraint = supplier_base_account.mint == market.base_mint @ LendingError::AccountMismatch,
        constraint = supplier_base_account.owner == supplier.key() @ LendingError::AccountMismatch
    )]
    pub supplier_base_account: Account<'info, TokenAccount>,

    /// Pool share mint
    #[account(
        mut,
        seeds = [SHARE_MINT_SEED, market.key().as_ref()],
        bump,
        constraint = share_mint.key() == market.share_mint @ LendingError::AccountMismatch
    )]
    pub share_mint: Account<'info, Mint>,

    /// Supplier's share token account (destination for minted shares)
    #[account(
        mut,
        constraint = supplier_share_account.mint == market.share_mint @ LendingError::AccountMismatch,
        constraint = supplier_share_account.owner == supplier.key() @ LendingError::AccountMismatch
    )]
    pub supplier_share_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program for account creation
    pub system_program: Program<'info, System>,
}

/// Supply base assets to the pool, minting shares at the current exchange
/// rate (1:1 on an empty pool).
///
/// Every supply resets the reward-eligibility timer: a supplier qualifies
/// only after holding for a full interval since their most recent supply.
pub fn handler(ctx: Context<SupplyLiquidity>, amount: u64) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let user_account = &mut ctx.accounts.user_account;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(amount > 0, LendingError::ZeroAmount);

    // Exchange rate before this deposit moves anything
    let shares = market.shares_for_deposit(amount)?;

    // Pull the base assets in
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.supplier_base_account.to_account_info(),
            to: ctx.accounts.base_vault.to_account_info(),
            authority: ctx.accounts.supplier.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    // Mint shares, market PDA signing as mint authority
    let seeds = &[
        Market::SEED_PREFIX,
        market.authority.as_ref(),
        &[market.bump],
    ];
    let signer_seeds = &[&seeds[..]];
    let mint_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        MintTo {
            mint: ctx.accounts.share_mint.to_account_info(),
            to: ctx.accounts.supplier_share_account.to_account_info(),
            authority: market.to_account_info(),
        },
        signer_seeds,
    );
    token::mint_to(mint_ctx, shares)?;

    market.share_total_supply = market
        .share_total_supply
        .checked_add(shares)
        .ok_or(LendingError::MathOverflow)?;
    market.total_supplied_liquidity = market
        .total_supplied_liquidity
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;
    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;

    if user_account.position_count == 0 && user_account.last_liquidity_supply == 0 {
        user_account.bump = ctx.bumps.user_account;
        user_account.market = market.key();
        user_account.owner = ctx.accounts.supplier.key();
    }
    user_account.last_liquidity_supply = now;

    emit!(LiquiditySupplied {
        market: market.key(),
        supplier: ctx.accounts.supplier.key(),
        amount,
        shares_minted: shares,
        total_supplied_liquidity: market.total_supplied_liquidity,
        timestamp: now,
    });

    msg!("Supplied {} base units for {} shares", amount, shares);

    Ok(())
}
