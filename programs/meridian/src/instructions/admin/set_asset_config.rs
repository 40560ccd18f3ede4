use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::VAULT_SEED;
use crate::errors::LendingError;
use crate::events::{AssetConfigUpdated, AssetListed};
use crate::state::{AssetConfig, CollateralTier, Market};

/// Accounts for listing or updating a collateral asset
#[derive(Accounts)]
pub struct SetAssetConfig<'info> {
    /// Market authority
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The market the asset belongs to
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        has_one = authority @ LendingError::Unauthorized
    )]
    pub market: Account<'info, Market>,

    /// The listing to create or update
    /// PDA: ["asset", market, mint]
    #[account(
        init_if_needed,
        payer = authority,
        space = 8 + AssetConfig::INIT_SPACE,
        seeds = [AssetConfig::SEED_PREFIX, market.key().as_ref(), mint.key().as_ref()],
        bump
    )]
    pub asset_config: Account<'info, AssetConfig>,

    /// The collateral token mint
    pub mint: Account<'info, Mint>,

    /// Vault holding deposited collateral for this asset
    /// PDA: ["vault", asset_config]
    #[account(
        init_if_needed,
        payer = authority,
        seeds = [VAULT_SEED, asset_config.key().as_ref()],
        bump,
        token::mint = mint,
        token::authority = asset_config
    )]
    pub vault: Account<'info, TokenAccount>,

    /// Primary price feed for the asset
    /// CHECK: Feed layout is validated at read time, the binding by authority
    pub oracle: UncheckedAccount<'info>,

    /// Optional secondary price feed
    /// CHECK: Feed layout is validated at read time, the binding by authority
    pub secondary_oracle: Option<UncheckedAccount<'info>>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program for account creation
    pub system_program: Program<'info, System>,

    /// Rent sysvar
    pub rent: Sysvar<'info, Rent>,
}

/// Parameters for an asset listing
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct SetAssetConfigParams {
    /// Whether new deposits are accepted
    pub active: bool,
    /// Risk tier
    pub tier: CollateralTier,
    /// Max debt as a fraction of collateral value, parts-per-1000
    pub borrow_threshold: u16,
    /// Liquidation boundary, parts-per-1000
    pub liquidation_threshold: u16,
    /// Cap on total deposited amount (0 = uncapped)
    pub max_supply_threshold: u64,
    /// Debt cap for isolated positions; nonzero exactly when tier is Isolated
    pub isolation_debt_cap: u64,
    /// Decimals of the bound feeds
    pub oracle_decimals: u8,
    /// Minimum healthy feeds required to quote a price
    pub min_oracles: u8,
}

/// List a collateral asset or update an existing listing.
///
/// Listings are permanent: an asset is never removed from the registry,
/// deactivation only blocks new deposits. Updating never touches the live
/// supply accounting.
pub fn handler(ctx: Context<SetAssetConfig>, params: SetAssetConfigParams) -> Result<()> {
    let asset_config = &mut ctx.accounts.asset_config;
    let market = &mut ctx.accounts.market;

    let secondary_oracle = ctx
        .accounts
        .secondary_oracle
        .as_ref()
        .map(|o| o.key())
        .unwrap_or_default();
    let oracle_count = if secondary_oracle == Pubkey::default() { 1 } else { 2 };

    // Atomic bounds check before any field is written
    require!(
        AssetConfig::validate_params(
            ctx.accounts.mint.decimals,
            params.tier,
            params.borrow_threshold,
            params.liquidation_threshold,
            params.isolation_debt_cap,
            params.min_oracles,
            oracle_count,
        ),
        LendingError::InvalidConfigValue
    );

    let first_listing = asset_config.version == 0;
    if first_listing {
        asset_config.version = 1;
        asset_config.bump = ctx.bumps.asset_config;
        asset_config.market = market.key();
        asset_config.mint = ctx.accounts.mint.key();
        asset_config.decimals = ctx.accounts.mint.decimals;
        asset_config.vault = ctx.accounts.vault.key();
        asset_config.total_supplied = 0;
        asset_config._padding = [0u8; 64];

        market.listed_asset_count = market
            .listed_asset_count
            .checked_add(1)
            .ok_or(LendingError::MathOverflow)?;

        emit!(AssetListed {
            market: market.key(),
            mint: asset_config.mint,
            tier: params.tier,
            borrow_threshold: params.borrow_threshold,
            liquidation_threshold: params.liquidation_threshold,
        });
        msg!("Asset listed: {}", asset_config.mint);
    }

    asset_config.active = params.active;
    asset_config.tier = params.tier;
    asset_config.borrow_threshold = params.borrow_threshold;
    asset_config.liquidation_threshold = params.liquidation_threshold;
    asset_config.max_supply_threshold = params.max_supply_threshold;
    asset_config.isolation_debt_cap = params.isolation_debt_cap;
    asset_config.oracle = ctx.accounts.oracle.key();
    asset_config.secondary_oracle = secondary_oracle;
    asset_config.oracle_decimals = params.oracle_decimals;
    asset_config.min_oracles = params.min_oracles;

    emit!(AssetConfigUpdated {
        market: market.key(),
        mint: asset_config.mint,
        active: asset_config.active,
        tier: asset_config.tier,
        borrow_threshold: asset_config.borrow_threshold,
        liquidation_threshold: asset_config.liquidation_threshold,
        max_supply_threshold: asset_config.max_supply_threshold,
        isolation_debt_cap: asset_config.isolation_debt_cap,
    });

    msg!("Asset config set for {}", asset_config.mint);
    msg!("Tier: {:?}, active: {}", asset_config.tier, asset_config.active);
    msg!(
        "Thresholds: borrow {} / liquidation {} (per 1000)",
        asset_config.borrow_threshold,
        asset_config.liquidation_threshold
    );

    Ok(())
}
