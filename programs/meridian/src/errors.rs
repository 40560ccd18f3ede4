use anchor_lang::prelude::*;

/// Protocol error codes, grouped by category.
///
/// Economic failures (credit limit, caps, liquidation eligibility) are
/// expected in normal operation and are distinct variants so callers can
/// tell them apart from programming errors. Oracle failures mean the caller
/// should retry after the feed recovers; the protocol never falls back to a
/// stale price.
#[error_code]
pub enum LendingError {
    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------
    #[msg("Amount cannot be zero")]
    ZeroAmount,

    #[msg("Asset is not listed")]
    AssetNotListed,

    #[msg("Asset is listed but deactivated")]
    AssetNotActive,

    #[msg("Invalid position")]
    InvalidPosition,

    #[msg("Position is not active")]
    InactivePosition,

    #[msg("Isolated-tier asset cannot be used by a non-isolated position")]
    IsolatedAssetViolation,

    #[msg("Isolated position is bound to a different asset")]
    InvalidAssetForIsolation,

    #[msg("Maximum number of collateral assets reached")]
    MaximumAssetsReached,

    #[msg("No collateral held for this asset")]
    CollateralNotFound,

    #[msg("Configuration value out of range")]
    InvalidConfigValue,

    #[msg("Invalid oracle binding")]
    InvalidOracleConfig,

    #[msg("Wrong account supplied for a collateral entry")]
    AccountMismatch,

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    #[msg("Signer is not authorized for this operation")]
    Unauthorized,

    #[msg("Liquidator does not hold enough governance tokens")]
    NotEnoughGovernanceTokens,

    #[msg("Protocol is paused")]
    ProtocolPaused,

    // ------------------------------------------------------------------
    // Economic
    // ------------------------------------------------------------------
    #[msg("Debt would exceed the credit limit")]
    CreditLimitExceeded,

    #[msg("Asset supply cap reached")]
    AssetCapacityReached,

    #[msg("Position is healthy, not liquidatable")]
    NotLiquidatable,

    #[msg("Isolation debt cap exceeded")]
    IsolationDebtCapExceeded,

    #[msg("Insufficient liquidity in the pool")]
    InsufficientPoolLiquidity,

    #[msg("Position still has outstanding debt")]
    DebtOutstanding,

    #[msg("Flash loan was not repaid with fee")]
    FlashLoanFailed,

    // ------------------------------------------------------------------
    // Oracle
    // ------------------------------------------------------------------
    #[msg("Oracle returned a non-positive price")]
    InvalidOraclePrice,

    #[msg("Oracle round is stale")]
    StaleOraclePrice,

    #[msg("Oracle answer is older than the allowed timeout")]
    OracleTimeout,

    #[msg("Oracle price moved too far against the previous round")]
    OracleVolatility,

    #[msg("Not enough healthy oracles to meet quorum")]
    InsufficientOracles,

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------
    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Insufficient share balance")]
    InsufficientShares,
}
