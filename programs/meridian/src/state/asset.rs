use anchor_lang::prelude::*;

use crate::constants::{
    MAX_ORACLES_PER_ASSET, THRESHOLD_SCALE, TIER_JUMP_BPS, TIER_LIQUIDATION_FEE_BPS,
    TIER_PREMIUM_BPS,
};

/// Risk classification of a collateral asset, ordered by economic risk.
///
/// The ordering matters: a position pays the borrow rate of the
/// highest-risk tier present in its collateral set, and Isolated-tier
/// assets are confined to single-asset isolated positions.
#[derive(
    AnchorSerialize,
    AnchorDeserialize,
    Clone,
    Copy,
    Debug,
    Default,
    InitSpace,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
pub enum CollateralTier {
    #[default]
    Stable,
    CrossA,
    CrossB,
    Isolated,
}

impl CollateralTier {
    /// Utilization-scaled rate premium at 100% utilization (annual BPS)
    pub fn premium_bps(&self) -> u64 {
        TIER_PREMIUM_BPS[*self as usize]
    }

    /// Extra slope applied above the utilization kink (annual BPS)
    pub fn jump_bps(&self) -> u64 {
        TIER_JUMP_BPS[*self as usize]
    }

    /// Liquidation fee charged on top of the repaid debt (BPS)
    pub fn liquidation_fee_bps(&self) -> u64 {
        TIER_LIQUIDATION_FEE_BPS[*self as usize]
    }
}

/// Per-asset listing: configuration and live supply accounting
/// PDA Seeds: ["asset", market, mint]
#[account]
#[derive(InitSpace)]
pub struct AssetConfig {
    /// Version for future upgrades
    pub version: u8,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// The market this listing belongs to
    pub market: Pubkey,

    /// Collateral token mint
    pub mint: Pubkey,

    /// Token decimals (cached for valuation)
    pub decimals: u8,

    /// Vault holding deposited collateral (PDA-owned token account)
    pub vault: Pubkey,

    /// Whether new deposits are accepted. Listings are never removed;
    /// deactivation only blocks new supply.
    pub active: bool,

    /// Risk tier
    pub tier: CollateralTier,

    /// Max debt as a fraction of collateral value, parts-per-1000
    /// e.g. 800 = 80%
    pub borrow_threshold: u16,

    /// Liquidation boundary, parts-per-1000; always >= borrow_threshold
    pub liquidation_threshold: u16,

    /// Cap on total deposited amount across all positions (0 = uncapped)
    pub max_supply_threshold: u64,

    /// Max aggregate debt a position isolated to this asset may carry.
    /// Nonzero exactly when tier == Isolated.
    pub isolation_debt_cap: u64,

    /// Total amount currently deposited across all positions
    pub total_supplied: u64,

    /// Primary price feed
    pub oracle: Pubkey,

    /// Optional secondary feed (Pubkey::default() = none)
    pub secondary_oracle: Pubkey,

    /// Decimals of the bound feeds
    pub oracle_decimals: u8,

    /// Minimum number of healthy feeds required to quote a price
    pub min_oracles: u8,

    /// Reserved space for future upgrades
    pub _padding: [u8; 64],
}

impl AssetConfig {
    pub const SEED_PREFIX: &'static [u8] = b"asset";

    /// Number of feeds bound to this asset
    pub fn oracle_count(&self) -> u8 {
        if self.secondary_oracle == Pubkey::default() {
            1
        } else {
            2
        }
    }

    /// Field-level bounds, checked as a whole before any write
    pub fn validate_params(
        decimals: u8,
        tier: CollateralTier,
        borrow_threshold: u16,
        liquidation_threshold: u16,
        isolation_debt_cap: u64,
        min_oracles: u8,
        oracle_count: u8,
    ) -> bool {
        decimals > 0
            && borrow_threshold as u64 <= THRESHOLD_SCALE
            && liquidation_threshold as u64 <= THRESHOLD_SCALE
            && liquidation_threshold >= borrow_threshold
            && (tier == CollateralTier::Isolated) == (isolation_debt_cap > 0)
            && min_oracles >= 1
            && min_oracles <= oracle_count
            && oracle_count <= MAX_ORACLES_PER_ASSET
    }

    /// Whether `amount` more units fit under the supply cap
    pub fn has_capacity(&self, amount: u64) -> bool {
        if self.max_supply_threshold == 0 {
            return true;
        }
        match self.total_supplied.checked_add(amount) {
            Some(total) => total <= self.max_supply_threshold,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_total_order() {
        assert!(CollateralTier::Stable < CollateralTier::CrossA);
        assert!(CollateralTier::CrossA < CollateralTier::CrossB);
        assert!(CollateralTier::CrossB < CollateralTier::Isolated);
    }

    #[test]
    fn test_tier_tables_follow_risk_order() {
        let tiers = [
            CollateralTier::Stable,
            CollateralTier::CrossA,
            CollateralTier::CrossB,
            CollateralTier::Isolated,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].premium_bps() < pair[1].premium_bps());
            assert!(pair[0].jump_bps() < pair[1].jump_bps());
            assert!(pair[0].liquidation_fee_bps() < pair[1].liquidation_fee_bps());
        }
    }

    #[test]
    fn test_validate_params_bounds() {
        // healthy non-isolated listing
        assert!(AssetConfig::validate_params(
            9,
            CollateralTier::CrossA,
            800,
            850,
            0,
            1,
            1
        ));

        // zero decimals
        assert!(!AssetConfig::validate_params(
            0,
            CollateralTier::CrossA,
            800,
            850,
            0,
            1,
            1
        ));

        // threshold above 100%
        assert!(!AssetConfig::validate_params(
            9,
            CollateralTier::CrossA,
            800,
            1_001,
            0,
            1,
            1
        ));

        // liquidation threshold below borrow threshold
        assert!(!AssetConfig::validate_params(
            9,
            CollateralTier::CrossA,
            850,
            800,
            0,
            1,
            1
        ));

        // isolated tier requires a nonzero debt cap
        assert!(!AssetConfig::validate_params(
            9,
            CollateralTier::Isolated,
            500,
            600,
            0,
            1,
            1
        ));
        assert!(AssetConfig::validate_params(
            9,
            CollateralTier::Isolated,
            500,
            600,
            1_000_000,
            1,
            1
        ));

        // a non-isolated asset may not carry a debt cap
        assert!(!AssetConfig::validate_params(
            9,
            CollateralTier::Stable,
            900,
            950,
            1,
            1,
            1
        ));

        // quorum cannot exceed the bound feeds
        assert!(!AssetConfig::validate_params(
            9,
            CollateralTier::CrossA,
            800,
            850,
            0,
            2,
            1
        ));
    }

    #[test]
    fn test_supply_capacity() {
        let mut config = AssetConfig {
            version: 1,
            bump: 0,
            market: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            decimals: 9,
            vault: Pubkey::new_unique(),
            active: true,
            tier: CollateralTier::CrossA,
            borrow_threshold: 800,
            liquidation_threshold: 850,
            max_supply_threshold: 1_000,
            isolation_debt_cap: 0,
            total_supplied: 990,
            oracle: Pubkey::new_unique(),
            secondary_oracle: Pubkey::default(),
            oracle_decimals: 8,
            min_oracles: 1,
            _padding: [0; 64],
        };

        assert!(config.has_capacity(10));
        assert!(!config.has_capacity(11));

        // zero cap means uncapped
        config.max_supply_threshold = 0;
        assert!(config.has_capacity(u64::MAX - config.total_supplied));
    }
}
