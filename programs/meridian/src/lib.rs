use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod oracle;
pub mod state;
pub mod valuation;

use instructions::*;
use state::ProtocolConfig;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod meridian {
    use super::*;

    // ============================================================================
    // ADMIN INSTRUCTIONS
    // ============================================================================

    /// Initialize a new market
    pub fn initialize_market(
        ctx: Context<InitializeMarket>,
        params: InitializeMarketParams,
    ) -> Result<()> {
        instructions::admin::initialize_market::handler(ctx, params)
    }

    /// Replace the tunable protocol parameters
    pub fn update_protocol_config(
        ctx: Context<UpdateProtocolConfig>,
        config: ProtocolConfig,
    ) -> Result<()> {
        instructions::admin::update_protocol_config::handler(ctx, config)
    }

    /// List a collateral asset or update an existing listing
    pub fn set_asset_config(
        ctx: Context<SetAssetConfig>,
        params: SetAssetConfigParams,
    ) -> Result<()> {
        instructions::admin::set_asset_config::handler(ctx, params)
    }

    /// Set the pause flag on or off
    pub fn set_pause(ctx: Context<SetPause>, paused: bool) -> Result<()> {
        instructions::admin::set_pause::handler(ctx, paused)
    }

    // ============================================================================
    // USER INSTRUCTIONS
    // ============================================================================

    /// Create a borrowing position
    pub fn create_position(ctx: Context<CreatePosition>, is_isolated: bool) -> Result<()> {
        instructions::user::create_position::handler(ctx, is_isolated)
    }

    /// Supply collateral to a position
    pub fn supply_collateral(ctx: Context<SupplyCollateral>, amount: u64) -> Result<()> {
        instructions::user::supply_collateral::handler(ctx, amount)
    }

    /// Withdraw collateral from a position
    pub fn withdraw_collateral<'info>(
        ctx: Context<'_, '_, 'info, 'info, WithdrawCollateral<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::user::withdraw_collateral::handler(ctx, amount)
    }

    /// Move collateral between two positions of the same owner
    pub fn transfer_collateral<'info>(
        ctx: Context<'_, '_, 'info, 'info, TransferCollateral<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::user::transfer_collateral::handler(ctx, amount)
    }

    /// Borrow base assets against a position's collateral
    pub fn borrow<'info>(
        ctx: Context<'_, '_, 'info, 'info, Borrow<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::user::borrow::handler(ctx, amount)
    }

    /// Repay debt on a position
    pub fn repay(ctx: Context<Repay>, amount: u64) -> Result<()> {
        instructions::user::repay::handler(ctx, amount)
    }

    /// Close a debt-free position and reclaim its collateral
    pub fn exit_position<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExitPosition<'info>>,
    ) -> Result<()> {
        instructions::user::exit_position::handler(ctx)
    }

    // ============================================================================
    // LIQUIDITY POOL INSTRUCTIONS
    // ============================================================================

    /// Supply base liquidity to the pool for shares
    pub fn supply_liquidity(ctx: Context<SupplyLiquidity>, amount: u64) -> Result<()> {
        instructions::pool::supply_liquidity::handler(ctx, amount)
    }

    /// Redeem pool shares for base assets
    pub fn exchange(ctx: Context<Exchange>, share_amount: u64) -> Result<()> {
        instructions::pool::exchange::handler(ctx, share_amount)
    }

    /// Inject yield into the pool without minting shares
    pub fn boost_yield(ctx: Context<BoostYield>, amount: u64) -> Result<()> {
        instructions::pool::boost_yield::handler(ctx, amount)
    }

    /// Take a single-transaction flash loan of base assets
    pub fn flash_loan<'info>(
        ctx: Context<'_, '_, 'info, 'info, FlashLoan<'info>>,
        amount: u64,
        params: Vec<u8>,
    ) -> Result<()> {
        instructions::pool::flash_loan::handler(ctx, amount, params)
    }

    // ============================================================================
    // PERMISSIONLESS INSTRUCTIONS
    // ============================================================================

    /// Fold pending interest into a position's debt
    pub fn accrue_interest(ctx: Context<AccrueInterest>) -> Result<()> {
        instructions::permissionless::accrue_interest::handler(ctx)
    }

    /// Liquidate an unhealthy position
    pub fn liquidate<'info>(ctx: Context<'_, '_, 'info, 'info, Liquidate<'info>>) -> Result<()> {
        instructions::permissionless::liquidate::handler(ctx)
    }
}
