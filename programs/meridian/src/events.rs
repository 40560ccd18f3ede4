use anchor_lang::prelude::*;

use crate::state::CollateralTier;

// ============================================================================
// MARKET EVENTS
// ============================================================================

/// Emitted when the market is initialized
#[event]
pub struct MarketInitialized {
    pub market: Pubkey,
    pub authority: Pubkey,
    pub treasury: Pubkey,
    pub base_mint: Pubkey,
    pub share_mint: Pubkey,
    pub governance_mint: Pubkey,
}

/// Emitted when the protocol config is replaced
#[event]
pub struct ProtocolConfigUpdated {
    pub market: Pubkey,
    pub profit_target_rate_bps: u16,
    pub base_borrow_rate_bps: u16,
    pub reward_amount: u64,
    pub reward_interval: i64,
    pub rewardable_supply: u64,
    pub liquidator_governance_threshold: u64,
    pub flash_loan_fee_bps: u16,
}

/// Emitted when the pause flag is toggled
#[event]
pub struct PauseChanged {
    pub market: Pubkey,
    pub paused: bool,
    pub timestamp: i64,
}

// ============================================================================
// ASSET REGISTRY EVENTS
// ============================================================================

/// Emitted when a collateral asset is listed for the first time
#[event]
pub struct AssetListed {
    pub market: Pubkey,
    pub mint: Pubkey,
    pub tier: CollateralTier,
    pub borrow_threshold: u16,
    pub liquidation_threshold: u16,
}

/// Emitted when an existing asset listing is updated
#[event]
pub struct AssetConfigUpdated {
    pub market: Pubkey,
    pub mint: Pubkey,
    pub active: bool,
    pub tier: CollateralTier,
    pub borrow_threshold: u16,
    pub liquidation_threshold: u16,
    pub max_supply_threshold: u64,
    pub isolation_debt_cap: u64,
}

// ============================================================================
// POSITION EVENTS
// ============================================================================

/// Emitted when a position is created
#[event]
pub struct PositionCreated {
    pub market: Pubkey,
    pub position: Pubkey,
    pub owner: Pubkey,
    pub index: u64,
    pub is_isolated: bool,
}

/// Emitted when collateral is supplied to a position
#[event]
pub struct CollateralSupplied {
    pub market: Pubkey,
    pub position: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub new_collateral_amount: u64,
    pub timestamp: i64,
}

/// Emitted when collateral is withdrawn from a position
#[event]
pub struct CollateralWithdrawn {
    pub market: Pubkey,
    pub position: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub remaining_collateral: u64,
    pub timestamp: i64,
}

/// Emitted when collateral moves between two positions of the same owner
#[event]
pub struct CollateralTransferred {
    pub market: Pubkey,
    pub from_position: Pubkey,
    pub to_position: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Emitted when a position borrows from the pool
#[event]
pub struct BorrowEvent {
    pub market: Pubkey,
    pub position: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub new_debt_amount: u64,
    pub new_utilization_bps: u64,
    pub borrow_rate_bps: u64,
    pub timestamp: i64,
}

/// Emitted when debt is repaid
#[event]
pub struct RepayEvent {
    pub market: Pubkey,
    pub position: Pubkey,
    pub payer: Pubkey,
    pub amount: u64,
    pub remaining_debt: u64,
    pub new_utilization_bps: u64,
    pub timestamp: i64,
}

/// Emitted when interest is accrued on a position
#[event]
pub struct InterestAccrued {
    pub market: Pubkey,
    pub position: Pubkey,
    pub interest: u64,
    pub new_debt_amount: u64,
    pub tier: CollateralTier,
    pub borrow_rate_bps: u64,
    pub timestamp: i64,
}

/// Emitted when a position is closed by its owner
#[event]
pub struct PositionExited {
    pub market: Pubkey,
    pub position: Pubkey,
    pub owner: Pubkey,
    pub timestamp: i64,
}

// ============================================================================
// LIQUIDATION EVENTS
// ============================================================================

/// Emitted when a position is liquidated
#[event]
pub struct LiquidationEvent {
    pub market: Pubkey,
    pub position: Pubkey,
    pub liquidator: Pubkey,
    pub owner: Pubkey,
    pub debt_repaid: u64,
    pub liquidation_fee: u64,
    pub health_factor: u128,
    pub tier: CollateralTier,
    pub timestamp: i64,
}

// ============================================================================
// LIQUIDITY POOL EVENTS
// ============================================================================

/// Emitted when base liquidity is supplied to the pool
#[event]
pub struct LiquiditySupplied {
    pub market: Pubkey,
    pub supplier: Pubkey,
    pub amount: u64,
    pub shares_minted: u64,
    pub total_supplied_liquidity: u64,
    pub timestamp: i64,
}

/// Emitted when pool shares are redeemed for base assets
#[event]
pub struct SharesExchanged {
    pub market: Pubkey,
    pub redeemer: Pubkey,
    pub shares_burned: u64,
    pub amount_out: u64,
    pub fee_shares: u64,
    pub timestamp: i64,
}

/// Emitted when profit is injected without minting shares
#[event]
pub struct YieldBoosted {
    pub market: Pubkey,
    pub rewarder: Pubkey,
    pub amount: u64,
    pub total_supplied_liquidity: u64,
    pub timestamp: i64,
}

/// Emitted when a flash loan completes
#[event]
pub struct FlashLoanEvent {
    pub market: Pubkey,
    pub initiator: Pubkey,
    pub receiver_program: Pubkey,
    pub amount: u64,
    pub fee: u64,
    pub timestamp: i64,
}
