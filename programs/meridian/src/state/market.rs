use anchor_lang::prelude::*;

use crate::constants::{
    BPS_DENOMINATOR, KINK_UTILIZATION_BPS, MAX_BASE_BORROW_RATE_BPS, MAX_FLASH_LOAN_FEE_BPS,
    MAX_PROFIT_TARGET_BPS, MAX_REWARD_AMOUNT, MAX_REWARD_INTERVAL,
    MIN_BASE_BORROW_RATE_BPS, MIN_LIQUIDATOR_GOVERNANCE_THRESHOLD, MIN_PROFIT_TARGET_BPS,
    MIN_REWARDABLE_SUPPLY, MIN_REWARD_INTERVAL,
};
use crate::errors::LendingError;
use crate::state::CollateralTier;

/// Global protocol configuration and pool state
/// PDA Seeds: ["market", authority]
#[account]
#[derive(InitSpace)]
pub struct Market {
    /// Version for future upgrades
    pub version: u8,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Admin: config updates and asset listings
    pub authority: Pubkey,

    /// May toggle the pause flag
    pub pauser: Pubkey,

    /// May inject yield into the pool without minting shares
    pub rewarder: Pubkey,

    /// Receives protocol fees (share tokens)
    pub treasury: Pubkey,

    /// When set, every mutating instruction is rejected.
    /// Reads stay available off-chain.
    pub paused: bool,

    /// Base asset (the borrowed/supplied token)
    pub base_mint: Pubkey,
    pub base_decimals: u8,
    pub base_vault: Pubkey,

    /// Pool share token; mint authority is the market PDA
    pub share_mint: Pubkey,

    /// Mirror of the share mint supply, kept in lockstep with mint/burn
    pub share_total_supply: u64,

    /// Governance token checked for liquidator eligibility
    pub governance_mint: Pubkey,

    /// Tunable protocol parameters
    pub config: ProtocolConfig,

    /// Base-asset principal plus realized profit owned by suppliers
    pub total_supplied_liquidity: u64,

    /// Sum of live position debts, as of each position's last accrual
    pub total_borrow: u64,

    /// Internally tracked base vault balance; detects and absorbs
    /// direct profit injections
    pub tracked_base_balance: u64,

    /// Number of assets ever listed
    pub listed_asset_count: u16,

    /// Lifetime flash loan fees collected
    pub flash_loan_fees_collected: u64,

    /// Reserved space for future upgrades
    pub _padding: [u8; 128],
}

/// Tunable protocol parameters, validated as a unit: one out-of-range
/// field rejects the whole update.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, InitSpace, Default)]
pub struct ProtocolConfig {
    /// Pool profit target, annual BPS
    pub profit_target_rate_bps: u16,

    /// Borrow rate at zero utilization, annual BPS
    pub base_borrow_rate_bps: u16,

    /// Reward emitted per interval to qualifying suppliers (base units)
    pub reward_amount: u64,

    /// Seconds a supplier must remain supplied to qualify
    pub reward_interval: i64,

    /// Minimum supplied balance that qualifies for rewards (base units)
    pub rewardable_supply: u64,

    /// Governance balance a liquidator must hold
    pub liquidator_governance_threshold: u64,

    /// Flash loan fee, BPS of the borrowed amount
    pub flash_loan_fee_bps: u16,
}

impl ProtocolConfig {
    /// Atomic bounds check; called before any field is written
    pub fn validate(&self) -> Result<()> {
        let ok = self.profit_target_rate_bps >= MIN_PROFIT_TARGET_BPS
            && self.profit_target_rate_bps <= MAX_PROFIT_TARGET_BPS
            && self.base_borrow_rate_bps >= MIN_BASE_BORROW_RATE_BPS
            && self.base_borrow_rate_bps <= MAX_BASE_BORROW_RATE_BPS
            && self.reward_amount <= MAX_REWARD_AMOUNT
            && self.reward_interval >= MIN_REWARD_INTERVAL
            && self.reward_interval <= MAX_REWARD_INTERVAL
            && self.rewardable_supply >= MIN_REWARDABLE_SUPPLY
            && self.liquidator_governance_threshold >= MIN_LIQUIDATOR_GOVERNANCE_THRESHOLD
            && self.flash_loan_fee_bps <= MAX_FLASH_LOAN_FEE_BPS;

        require!(ok, LendingError::InvalidConfigValue);
        Ok(())
    }
}

impl Market {
    pub const SEED_PREFIX: &'static [u8] = b"market";

    /// Current utilization in BPS (0 on an empty pool)
    pub fn utilization_bps(&self) -> u64 {
        if self.total_supplied_liquidity == 0 {
            return 0;
        }
        ((self.total_borrow as u128 * BPS_DENOMINATOR as u128)
            / self.total_supplied_liquidity as u128) as u64
    }

    /// Annual borrow rate in BPS for a collateral tier at the current
    /// utilization. Kinked curve: a utilization-scaled tier premium on top
    /// of the base rate, plus a steeper tier jump above the kink.
    pub fn borrow_rate_bps(&self, tier: CollateralTier) -> u64 {
        let utilization = self.utilization_bps();
        let base = self.config.base_borrow_rate_bps as u64;

        let premium = (tier.premium_bps() as u128 * utilization as u128
            / BPS_DENOMINATOR as u128) as u64;

        let jump = if utilization > KINK_UTILIZATION_BPS {
            let excess = utilization - KINK_UTILIZATION_BPS;
            (tier.jump_bps() as u128 * excess as u128
                / (BPS_DENOMINATOR - KINK_UTILIZATION_BPS) as u128) as u64
        } else {
            0
        };

        base + premium + jump
    }

    /// Base assets attributable to the pool: vault cash plus loans out
    pub fn total_assets(&self) -> u128 {
        self.tracked_base_balance as u128 + self.total_borrow as u128
    }

    /// Profit held above the target, 0 when the pool is at or below it
    pub fn profit_above_target(&self) -> u128 {
        let supplied = self.total_supplied_liquidity as u128;
        let target = supplied * self.config.profit_target_rate_bps as u128
            / BPS_DENOMINATOR as u128;
        self.total_assets().saturating_sub(supplied + target)
    }

    /// Annual supply rate in BPS: the share of profit above target,
    /// pro-rata over supplied liquidity. 0 whenever there is no excess.
    pub fn supply_rate_bps(&self) -> u64 {
        if self.share_total_supply == 0 || self.total_supplied_liquidity == 0 {
            return 0;
        }
        let excess = self.profit_above_target();
        ((excess * BPS_DENOMINATOR as u128) / self.total_supplied_liquidity as u128) as u64
    }

    /// Shares minted for a base-asset deposit at the current exchange rate
    /// (1:1 on an empty pool). A deposit too small to mint a single share
    /// is rejected rather than silently donated to existing holders.
    pub fn shares_for_deposit(&self, amount: u64) -> Result<u64> {
        if self.share_total_supply == 0 || self.total_supplied_liquidity == 0 {
            return Ok(amount);
        }
        let shares = (amount as u128)
            .checked_mul(self.share_total_supply as u128)
            .ok_or(LendingError::MathOverflow)?
            / self.total_supplied_liquidity as u128;
        require!(shares > 0, LendingError::ZeroAmount);
        Ok(shares as u64)
    }

    /// Base assets returned for redeeming `shares`
    pub fn redemption_value(&self, shares: u64) -> Result<u64> {
        require!(shares <= self.share_total_supply, LendingError::InsufficientShares);
        if self.share_total_supply == 0 {
            return Ok(0);
        }
        let value = (shares as u128)
            .checked_mul(self.total_supplied_liquidity as u128)
            .ok_or(LendingError::MathOverflow)?
            / self.share_total_supply as u128;
        Ok(value as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProtocolConfig {
        ProtocolConfig {
            profit_target_rate_bps: 100,
            base_borrow_rate_bps: 600,
            reward_amount: 1_000_000,
            reward_interval: 15_552_000,
            rewardable_supply: 100_000_000_000,
            liquidator_governance_threshold: 10_000_000_000,
            flash_loan_fee_bps: 9,
        }
    }

    fn test_market() -> Market {
        Market {
            version: 1,
            bump: 0,
            authority: Pubkey::new_unique(),
            pauser: Pubkey::new_unique(),
            rewarder: Pubkey::new_unique(),
            treasury: Pubkey::new_unique(),
            paused: false,
            base_mint: Pubkey::new_unique(),
            base_decimals: 6,
            base_vault: Pubkey::new_unique(),
            share_mint: Pubkey::new_unique(),
            share_total_supply: 0,
            governance_mint: Pubkey::new_unique(),
            config: test_config(),
            total_supplied_liquidity: 0,
            total_borrow: 0,
            tracked_base_balance: 0,
            listed_asset_count: 0,
            flash_loan_fees_collected: 0,
            _padding: [0; 128],
        }
    }

    #[test]
    fn test_utilization_zero_on_empty_pool() {
        let market = test_market();
        assert_eq!(market.utilization_bps(), 0);
    }

    #[test]
    fn test_borrow_rate_strictly_increases_with_utilization() {
        let mut market = test_market();
        market.total_supplied_liquidity = 100_000;

        let tiers = [
            CollateralTier::Stable,
            CollateralTier::CrossA,
            CollateralTier::CrossB,
            CollateralTier::Isolated,
        ];

        for tier in tiers {
            let mut last = 0u64;
            for borrow in [0u64, 25_000, 50_000, 75_000] {
                market.total_borrow = borrow;
                let rate = market.borrow_rate_bps(tier);
                if borrow == 0 {
                    assert_eq!(rate, market.config.base_borrow_rate_bps as u64);
                } else {
                    assert!(rate > last, "rate must rise with utilization");
                }
                last = rate;
            }
        }
    }

    #[test]
    fn test_tier_ordering_holds_at_every_utilization() {
        let mut market = test_market();
        market.total_supplied_liquidity = 100_000;

        for borrow in [10_000u64, 25_000, 50_000, 75_000, 90_000, 100_000] {
            market.total_borrow = borrow;
            let stable = market.borrow_rate_bps(CollateralTier::Stable);
            let cross_a = market.borrow_rate_bps(CollateralTier::CrossA);
            let cross_b = market.borrow_rate_bps(CollateralTier::CrossB);
            let isolated = market.borrow_rate_bps(CollateralTier::Isolated);
            assert!(stable < cross_a);
            assert!(cross_a < cross_b);
            assert!(cross_b < isolated);
        }
    }

    #[test]
    fn test_jump_accelerates_above_kink() {
        let mut market = test_market();
        market.total_supplied_liquidity = 100_000;

        // slope below the kink
        market.total_borrow = 40_000;
        let r40 = market.borrow_rate_bps(CollateralTier::CrossB);
        market.total_borrow = 60_000;
        let r60 = market.borrow_rate_bps(CollateralTier::CrossB);

        // same-width step above the kink
        market.total_borrow = 80_000;
        let r80 = market.borrow_rate_bps(CollateralTier::CrossB);
        market.total_borrow = 100_000;
        let r100 = market.borrow_rate_bps(CollateralTier::CrossB);

        assert!(r100 - r80 > r60 - r40);
    }

    #[test]
    fn test_supply_rate_zero_without_profit() {
        let mut market = test_market();
        market.total_supplied_liquidity = 100_000;
        market.share_total_supply = 100_000;
        market.tracked_base_balance = 60_000;
        market.total_borrow = 40_000;

        // assets exactly equal principal: no profit
        assert_eq!(market.supply_rate_bps(), 0);

        // profit under the 1% target still pays nothing
        market.tracked_base_balance = 60_500;
        assert_eq!(market.supply_rate_bps(), 0);

        // 5% of assets above principal+target
        market.tracked_base_balance = 65_000;
        assert!(market.supply_rate_bps() > 0);
    }

    #[test]
    fn test_share_round_trip_on_fresh_pool() {
        let mut market = test_market();

        let amount = 10_000u64;
        let shares = market.shares_for_deposit(amount).unwrap();
        assert_eq!(shares, amount); // 1:1 on an empty pool

        market.total_supplied_liquidity = amount;
        market.share_total_supply = shares;
        market.tracked_base_balance = amount;

        // immediate full redemption returns the deposit exactly
        assert_eq!(market.redemption_value(shares).unwrap(), amount);
    }

    #[test]
    fn test_exchange_rate_rises_after_boost() {
        let mut market = test_market();
        market.total_supplied_liquidity = 10_000;
        market.share_total_supply = 10_000;
        market.tracked_base_balance = 10_000;

        // profit injection without new shares
        market.total_supplied_liquidity += 500;
        market.tracked_base_balance += 500;

        assert_eq!(market.redemption_value(10_000).unwrap(), 10_500);
        // a later depositor gets fewer shares per unit
        assert!(market.shares_for_deposit(10_000).unwrap() < 10_000);
    }

    #[test]
    fn test_dust_deposit_minting_zero_shares_rejected() {
        let mut market = test_market();
        // exchange rate of 1000 base units per share
        market.total_supplied_liquidity = 1_000_000;
        market.share_total_supply = 1_000;
        market.tracked_base_balance = 1_000_000;

        assert_eq!(
            market.shares_for_deposit(999).unwrap_err(),
            LendingError::ZeroAmount.into()
        );
        // the smallest deposit worth a whole share still mints
        assert_eq!(market.shares_for_deposit(1_000).unwrap(), 1);
    }

    #[test]
    fn test_redeeming_more_than_supply_fails() {
        let mut market = test_market();
        market.total_supplied_liquidity = 10_000;
        market.share_total_supply = 10_000;

        assert_eq!(
            market.redemption_value(10_001).unwrap_err(),
            LendingError::InsufficientShares.into()
        );
    }

    #[test]
    fn test_config_bounds_reject_as_a_whole() {
        let config = test_config();
        assert!(config.validate().is_ok());

        let mut bad = test_config();
        bad.flash_loan_fee_bps = 101;
        assert!(bad.validate().is_err());

        let mut bad = test_config();
        bad.base_borrow_rate_bps = 0;
        assert!(bad.validate().is_err());

        let mut bad = test_config();
        bad.profit_target_rate_bps = MAX_PROFIT_TARGET_BPS + 1;
        assert!(bad.validate().is_err());

        let mut bad = test_config();
        bad.reward_interval = MIN_REWARD_INTERVAL - 1;
        assert!(bad.validate().is_err());
    }
}
