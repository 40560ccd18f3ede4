/// Meridian Protocol Constants

// ============================================================================
// SCALING CONSTANTS
// ============================================================================

/// Basis points denominator (100% = 10000 BPS)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Collateral threshold denominator (100% = 1000)
/// Borrow/liquidation thresholds are expressed in parts-per-1000,
/// e.g. 800 = 80%
pub const THRESHOLD_SCALE: u64 = 1_000;

/// Oracle price scale (1e6) - all prices are normalized to this precision
pub const PRICE_PRECISION: u128 = 1_000_000;

/// Health factor scale (1.0 = 1e6)
/// A position is liquidatable when health factor < PRECISION
pub const PRECISION: u128 = 1_000_000;

/// Seconds per year (for interest rate calculations)
pub const SECONDS_PER_YEAR: u64 = 31_536_000; // 365 * 24 * 60 * 60

// ============================================================================
// PDA SEEDS
// ============================================================================

/// Seed prefix for the Market PDA
pub const MARKET_SEED: &[u8] = b"market";

/// Seed prefix for AssetConfig PDAs
pub const ASSET_SEED: &[u8] = b"asset";

/// Seed prefix for Position PDAs
pub const POSITION_SEED: &[u8] = b"position";

/// Seed prefix for UserAccount PDAs
pub const USER_SEED: &[u8] = b"user";

/// Seed prefix for collateral vault PDAs
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed prefix for the base asset vault PDA
pub const BASE_VAULT_SEED: &[u8] = b"base_vault";

/// Seed prefix for the pool share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"share_mint";

// ============================================================================
// ORACLE VALIDATION
// ============================================================================

/// Maximum age of a feed answer before it is rejected (8 hours)
pub const ORACLE_TIMEOUT_SECS: i64 = 28_800;

/// Inner window for the volatility check: an answer younger than this with a
/// large move against the previous round is treated as suspicious (1 hour)
pub const ORACLE_VOLATILITY_WINDOW_SECS: i64 = 3_600;

/// Maximum allowed deviation from the previous round inside the volatility
/// window (20% = 2000 BPS)
pub const MAX_PRICE_DEVIATION_BPS: u64 = 2_000;

/// Maximum number of feeds bound to one asset (primary + secondary)
pub const MAX_ORACLES_PER_ASSET: u8 = 2;

// ============================================================================
// RATE MODEL
// ============================================================================

/// Utilization kink: the jump slope kicks in above this point (80% = 8000 BPS)
pub const KINK_UTILIZATION_BPS: u64 = 8_000;

/// Utilization-scaled premium per tier, annual BPS at 100% utilization.
/// Ordered Stable < CrossA < CrossB < Isolated.
pub const TIER_PREMIUM_BPS: [u64; 4] = [200, 400, 800, 1_600];

/// Additional jump slope per tier applied above the kink, annual BPS
pub const TIER_JUMP_BPS: [u64; 4] = [800, 1_200, 2_000, 3_000];

/// Liquidation fee per tier in BPS of the repaid debt (1% - 4%)
pub const TIER_LIQUIDATION_FEE_BPS: [u64; 4] = [100, 200, 300, 400];

// ============================================================================
// PROTOCOL CONFIG BOUNDS
// ============================================================================

/// Profit target rate bounds (0.25% - 20%)
pub const MIN_PROFIT_TARGET_BPS: u16 = 25;
pub const MAX_PROFIT_TARGET_BPS: u16 = 2_000;

/// Base borrow rate bounds (0.25% - 25%)
pub const MIN_BASE_BORROW_RATE_BPS: u16 = 25;
pub const MAX_BASE_BORROW_RATE_BPS: u16 = 2_500;

/// Maximum reward emitted per interval (in base units)
pub const MAX_REWARD_AMOUNT: u64 = 10_000_000_000;

/// Reward interval bounds (1 day - 1 year, seconds)
pub const MIN_REWARD_INTERVAL: i64 = 86_400;
pub const MAX_REWARD_INTERVAL: i64 = 31_536_000;

/// Minimum supplied balance that qualifies for rewards (in base units)
pub const MIN_REWARDABLE_SUPPLY: u64 = 20_000_000_000;

/// Minimum governance balance an admin may require from liquidators
pub const MIN_LIQUIDATOR_GOVERNANCE_THRESHOLD: u64 = 1_000_000_000;

/// Flash loan fee cap (1% = 100 BPS)
pub const MAX_FLASH_LOAN_FEE_BPS: u16 = 100;

// ============================================================================
// DEFAULT VALUES
// ============================================================================

/// Default profit target (1% = 100 BPS)
pub const DEFAULT_PROFIT_TARGET_BPS: u16 = 100;

/// Default base borrow rate (6% = 600 BPS)
pub const DEFAULT_BASE_BORROW_RATE_BPS: u16 = 600;

/// Default flash loan fee (0.09% = 9 BPS)
pub const DEFAULT_FLASH_LOAN_FEE_BPS: u16 = 9;

// ============================================================================
// LIMITS
// ============================================================================

/// Maximum number of distinct collateral assets on one position
pub const MAX_POSITION_ASSETS: usize = 20;
