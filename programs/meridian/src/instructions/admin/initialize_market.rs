use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{
    BASE_VAULT_SEED, DEFAULT_BASE_BORROW_RATE_BPS, DEFAULT_FLASH_LOAN_FEE_BPS,
    DEFAULT_PROFIT_TARGET_BPS, SHARE_MINT_SEED,
};
use crate::events::MarketInitialized;
use crate::state::{Market, ProtocolConfig};

/// Accounts for initializing a new market
#[derive(Accounts)]
pub struct InitializeMarket<'info> {
    /// Authority who will manage the market
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The market account to initialize
    /// PDA: ["market", authority]
    #[account(
        init,
        payer = authority,
        space = 8 + Market::INIT_SPACE,
        seeds = [Market::SEED_PREFIX, authority.key().as_ref()],
        bump
    )]
    pub market: Account<'info, Market>,

    /// The base asset mint (the token that is supplied and borrowed)
    pub base_mint: Account<'info, Mint>,

    /// Governance token mint checked for liquidator eligibility
    pub governance_mint: Account<'info, Mint>,

    /// Treasury that will receive protocol fees (in share tokens)
    /// CHECK: This can be any account, validated by authority
    pub treasury: UncheckedAccount<'info>,

    /// Vault holding the pool's base assets
    /// PDA: ["base_vault", market]
    #[account(
        init,
        payer = authority,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        token::mint = base_mint,
        token::authority = market
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Pool share token mint; the market PDA is the mint authority
    /// PDA: ["share_mint", market]
    #[account(
        init,
        payer = authority,
        seeds = [SHARE_MINT_SEED, market.key().as_ref()],
        bump,
        mint::decimals = base_mint.decimals,
        mint::authority = market
    )]
    pub share_mint: Account<'info, Mint>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program for account creation
    pub system_program: Program<'info, System>,

    /// Rent sysvar
    pub rent: Sysvar<'info, Rent>,
}

/// Parameters for initializing a market
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitializeMarketParams {
    /// Role allowed to toggle the pause flag
    pub pauser: Pubkey,
    /// Role allowed to inject yield into the pool
    pub rewarder: Pubkey,
    /// Pool profit target in annual BPS (optional, defaults to 1%)
    pub profit_target_rate_bps: Option<u16>,
    /// Borrow rate at zero utilization in annual BPS (optional, defaults to 6%)
    pub base_borrow_rate_bps: Option<u16>,
    /// Flash loan fee in BPS (optional, defaults to 9)
    pub flash_loan_fee_bps: Option<u16>,
    /// Reward emitted per interval to qualifying suppliers (base units)
    pub reward_amount: u64,
    /// Seconds a supplier must remain supplied to qualify
    pub reward_interval: i64,
    /// Minimum supplied balance that qualifies for rewards (base units)
    pub rewardable_supply: u64,
    /// Governance balance a liquidator must hold
    pub liquidator_governance_threshold: u64,
}

/// Initialize a new market
///
/// Creates the global configuration, the base asset vault and the pool
/// share mint. Only one market can exist per authority.
pub fn handler(ctx: Context<InitializeMarket>, params: InitializeMarketParams) -> Result<()> {
    let market = &mut ctx.accounts.market;

    // Build the full config and validate it as a unit
    let config = ProtocolConfig {
        profit_target_rate_bps: params
            .profit_target_rate_bps
            .unwrap_or(DEFAULT_PROFIT_TARGET_BPS),
        base_borrow_rate_bps: params
            .base_borrow_rate_bps
            .unwrap_or(DEFAULT_BASE_BORROW_RATE_BPS),
        reward_amount: params.reward_amount,
        reward_interval: params.reward_interval,
        rewardable_supply: params.rewardable_supply,
        liquidator_governance_threshold: params.liquidator_governance_threshold,
        flash_loan_fee_bps: params
            .flash_loan_fee_bps
            .unwrap_or(DEFAULT_FLASH_LOAN_FEE_BPS),
    };
    config.validate()?;

    market.version = 1;
    market.bump = ctx.bumps.market;

    market.authority = ctx.accounts.authority.key();
    market.pauser = params.pauser;
    market.rewarder = params.rewarder;
    market.treasury = ctx.accounts.treasury.key();
    market.paused = false;

    market.base_mint = ctx.accounts.base_mint.key();
    market.base_decimals = ctx.accounts.base_mint.decimals;
    market.base_vault = ctx.accounts.base_vault.key();
    market.share_mint = ctx.accounts.share_mint.key();
    market.share_total_supply = 0;
    market.governance_mint = ctx.accounts.governance_mint.key();

    market.config = config;
    market.total_supplied_liquidity = 0;
    market.total_borrow = 0;
    market.tracked_base_balance = 0;
    market.listed_asset_count = 0;
    market.flash_loan_fees_collected = 0;
    market._padding = [0u8; 128];

    emit!(MarketInitialized {
        market: market.key(),
        authority: market.authority,
        treasury: market.treasury,
        base_mint: market.base_mint,
        share_mint: market.share_mint,
        governance_mint: market.governance_mint,
    });

    msg!("Market initialized");
    msg!("Authority: {}", market.authority);
    msg!("Base mint: {}", market.base_mint);
    msg!("Profit target: {} bps", market.config.profit_target_rate_bps);
    msg!("Base borrow rate: {} bps", market.config.base_borrow_rate_bps);

    Ok(())
}
