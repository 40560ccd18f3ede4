use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, MAX_POSITION_ASSETS, PRECISION, SECONDS_PER_YEAR};
use crate::errors::LendingError;
use crate::state::CollateralTier;

/// Position lifecycle. Closed and Liquidated are terminal: a position in
/// either state accepts no further mutation.
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
)]
pub enum PositionStatus {
    #[default]
    Active,
    Closed,
    Liquidated,
}

/// One collateral holding of a position. The tier snapshot is refreshed
/// every time the entry is touched so tier selection always reflects the
/// live listing.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, InitSpace, Default)]
pub struct CollateralEntry {
    pub mint: Pubkey,
    pub amount: u64,
    pub tier: CollateralTier,
}

/// A borrower's collateral-backed position
/// PDA Seeds: ["position", market, owner, index]
#[account]
#[derive(InitSpace)]
pub struct Position {
    /// Version for future upgrades
    pub version: u8,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// The market this position belongs to
    pub market: Pubkey,

    /// Owner of the position
    pub owner: Pubkey,

    /// Per-owner sequential index; never reused
    pub index: u64,

    /// Fixed at creation. Isolated positions hold at most one asset and
    /// that asset must be Isolated tier.
    pub is_isolated: bool,

    /// Lifecycle status
    pub status: PositionStatus,

    /// Outstanding debt in base units, inclusive of interest accrued up to
    /// `last_interest_accrual`
    pub debt_amount: u64,

    /// Timestamp of the last interest accrual
    pub last_interest_accrual: i64,

    /// Ordered, deduplicated collateral set
    #[max_len(MAX_POSITION_ASSETS)]
    pub collateral: Vec<CollateralEntry>,

    /// Reserved space for future upgrades
    pub _padding: [u8; 64],
}

impl Position {
    pub const SEED_PREFIX: &'static [u8] = b"position";

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Find the entry index for a mint
    pub fn find_collateral(&self, mint: &Pubkey) -> Option<usize> {
        self.collateral.iter().position(|c| &c.mint == mint)
    }

    /// Highest-risk tier among the live collateral set. Scanned fresh on
    /// every call; the result is never cached across instructions.
    pub fn highest_tier(&self) -> CollateralTier {
        self.collateral
            .iter()
            .map(|c| c.tier)
            .max()
            .unwrap_or(CollateralTier::Stable)
    }

    /// Whether `mint`/`tier` may be added to this position, and under what
    /// error if not. Enforces the isolation rules and the asset-count cap.
    pub fn check_collateral_admission(
        &self,
        mint: &Pubkey,
        tier: CollateralTier,
    ) -> Result<()> {
        if self.is_isolated {
            require!(
                tier == CollateralTier::Isolated,
                LendingError::IsolatedAssetViolation
            );
            if let Some(bound) = self.collateral.first() {
                require!(&bound.mint == mint, LendingError::InvalidAssetForIsolation);
            }
        } else {
            require!(
                tier != CollateralTier::Isolated,
                LendingError::IsolatedAssetViolation
            );
        }

        if self.find_collateral(mint).is_none() {
            require!(
                self.collateral.len() < MAX_POSITION_ASSETS,
                LendingError::MaximumAssetsReached
            );
        }

        Ok(())
    }

    /// Debt inclusive of interest since the last accrual, without mutating
    /// anything. Linear per-second approximation:
    /// debt * rate * elapsed / seconds_per_year.
    pub fn debt_with_interest(&self, rate_bps: u64, now: i64) -> Result<u64> {
        let interest = self.pending_interest(rate_bps, now)?;
        self.debt_amount
            .checked_add(interest)
            .ok_or(LendingError::MathOverflow.into())
    }

    /// Interest accrued since `last_interest_accrual` at `rate_bps`
    pub fn pending_interest(&self, rate_bps: u64, now: i64) -> Result<u64> {
        if self.debt_amount == 0 || now <= self.last_interest_accrual {
            return Ok(0);
        }
        let elapsed = (now - self.last_interest_accrual) as u128;
        let interest = (self.debt_amount as u128)
            .checked_mul(rate_bps as u128)
            .ok_or(LendingError::MathOverflow)?
            .checked_mul(elapsed)
            .ok_or(LendingError::MathOverflow)?
            / (BPS_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128);
        Ok(interest as u64)
    }

    /// Fold pending interest into the stored debt and reset the accrual
    /// timestamp. Returns the interest added. A call with no elapsed time
    /// is a strict no-op.
    pub fn accrue(&mut self, rate_bps: u64, now: i64) -> Result<u64> {
        if now <= self.last_interest_accrual {
            return Ok(0);
        }
        let interest = self.pending_interest(rate_bps, now)?;
        self.debt_amount = self
            .debt_amount
            .checked_add(interest)
            .ok_or(LendingError::MathOverflow)?;
        self.last_interest_accrual = now;
        Ok(interest)
    }
}

/// Health factor scaled by PRECISION. A debt-free position reports the
/// sentinel maximum and can never be liquidated.
pub fn health_factor(liquidation_value: u128, debt: u64) -> Result<u128> {
    if debt == 0 {
        return Ok(u128::MAX);
    }
    liquidation_value
        .checked_mul(PRECISION)
        .ok_or(LendingError::MathOverflow)?
        .checked_div(debt as u128)
        .ok_or(LendingError::MathOverflow.into())
}

/// Liquidatable iff the health factor has fallen below 1.0 and there is debt
pub fn is_liquidatable(liquidation_value: u128, debt: u64) -> Result<bool> {
    Ok(debt > 0 && health_factor(liquidation_value, debt)? < PRECISION)
}

/// Per-user bookkeeping: position index allocation and the liquidity
/// reward-eligibility timer
/// PDA Seeds: ["user", market, owner]
#[account]
#[derive(InitSpace)]
pub struct UserAccount {
    pub bump: u8,
    pub market: Pubkey,
    pub owner: Pubkey,

    /// Next position index; monotonically increasing, never reused
    pub position_count: u64,

    /// Reset on every liquidity supply; rewards require a full interval
    pub last_liquidity_supply: i64,
}

impl UserAccount {
    pub const SEED_PREFIX: &'static [u8] = b"user";

    /// Whether the holder of `supplied_value` base units qualifies for the
    /// supplier reward at `now`
    pub fn is_rewardable(
        &self,
        supplied_value: u64,
        reward_interval: i64,
        rewardable_supply: u64,
        now: i64,
    ) -> bool {
        self.last_liquidity_supply > 0
            && now - self.last_liquidity_supply >= reward_interval
            && supplied_value >= rewardable_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_position() -> Position {
        Position {
            version: 1,
            bump: 0,
            market: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            index: 0,
            is_isolated: false,
            status: PositionStatus::Active,
            debt_amount: 0,
            last_interest_accrual: 1_700_000_000,
            collateral: vec![],
            _padding: [0; 64],
        }
    }

    fn entry(tier: CollateralTier) -> CollateralEntry {
        CollateralEntry {
            mint: Pubkey::new_unique(),
            amount: 1_000,
            tier,
        }
    }

    #[test]
    fn test_accrual_is_linear() {
        let mut position = test_position();
        position.debt_amount = 1_000_000_000; // 1,000 units at 6 decimals

        // 10% for half a year = 5%
        let now = position.last_interest_accrual + SECONDS_PER_YEAR as i64 / 2;
        let interest = position.accrue(1_000, now).unwrap();
        assert_eq!(interest, 50_000_000);
        assert_eq!(position.debt_amount, 1_050_000_000);
        assert_eq!(position.last_interest_accrual, now);
    }

    #[test]
    fn test_accrual_idempotent_within_same_instant() {
        let mut position = test_position();
        position.debt_amount = 1_000_000;
        let now = position.last_interest_accrual + 3_600;

        position.accrue(1_000, now).unwrap();
        let debt_after_first = position.debt_amount;

        // same instant again: no-op on debt and on the timestamp
        let interest = position.accrue(1_000, now).unwrap();
        assert_eq!(interest, 0);
        assert_eq!(position.debt_amount, debt_after_first);
        assert_eq!(position.last_interest_accrual, now);
    }

    #[test]
    fn test_accrual_no_debt_no_interest() {
        let mut position = test_position();
        let now = position.last_interest_accrual + 1_000_000;
        assert_eq!(position.accrue(5_000, now).unwrap(), 0);
        assert_eq!(position.debt_amount, 0);
    }

    #[test]
    fn test_highest_tier_tracks_the_live_set() {
        let mut position = test_position();
        assert_eq!(position.highest_tier(), CollateralTier::Stable);

        position.collateral.push(entry(CollateralTier::Stable));
        position.collateral.push(entry(CollateralTier::CrossB));
        assert_eq!(position.highest_tier(), CollateralTier::CrossB);

        // dropping the riskier asset immediately lowers the tier
        position.collateral.pop();
        assert_eq!(position.highest_tier(), CollateralTier::Stable);
    }

    #[test]
    fn test_isolated_position_single_asset_rule() {
        let mut position = test_position();
        position.is_isolated = true;

        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();

        // only isolated-tier assets are admissible
        assert_eq!(
            position
                .check_collateral_admission(&mint_a, CollateralTier::CrossA)
                .unwrap_err(),
            LendingError::IsolatedAssetViolation.into()
        );

        assert!(position
            .check_collateral_admission(&mint_a, CollateralTier::Isolated)
            .is_ok());
        position.collateral.push(CollateralEntry {
            mint: mint_a,
            amount: 100,
            tier: CollateralTier::Isolated,
        });

        // bound to mint_a now; a different asset is rejected
        assert_eq!(
            position
                .check_collateral_admission(&mint_b, CollateralTier::Isolated)
                .unwrap_err(),
            LendingError::InvalidAssetForIsolation.into()
        );
        // topping up the bound asset stays fine
        assert!(position
            .check_collateral_admission(&mint_a, CollateralTier::Isolated)
            .is_ok());
        assert!(position.collateral.len() <= 1);
    }

    #[test]
    fn test_cross_position_rejects_isolated_assets() {
        let position = test_position();
        assert_eq!(
            position
                .check_collateral_admission(&Pubkey::new_unique(), CollateralTier::Isolated)
                .unwrap_err(),
            LendingError::IsolatedAssetViolation.into()
        );
    }

    #[test]
    fn test_asset_count_cap() {
        let mut position = test_position();
        for _ in 0..MAX_POSITION_ASSETS {
            position.collateral.push(entry(CollateralTier::CrossA));
        }
        assert_eq!(
            position
                .check_collateral_admission(&Pubkey::new_unique(), CollateralTier::CrossA)
                .unwrap_err(),
            LendingError::MaximumAssetsReached.into()
        );
        // an existing entry can still be topped up
        let held = position.collateral[0].mint;
        assert!(position
            .check_collateral_admission(&held, CollateralTier::CrossA)
            .is_ok());
    }

    #[test]
    fn test_health_factor_sentinel_and_boundary() {
        // no debt: sentinel max, never liquidatable
        assert_eq!(health_factor(0, 0).unwrap(), u128::MAX);
        assert!(!is_liquidatable(0, 0).unwrap());

        // collateral value exactly at debt: hf == 1.0, not liquidatable
        let value = 15_000 * PRECISION / PRECISION;
        assert_eq!(health_factor(15_000, 15_000).unwrap(), PRECISION);
        assert!(!is_liquidatable(value, 15_000).unwrap());

        // one unit below: liquidatable
        assert!(is_liquidatable(14_999, 15_000).unwrap());
    }

    #[test]
    fn test_terminal_status_is_not_active() {
        let mut position = test_position();
        assert!(position.is_active());
        position.status = PositionStatus::Closed;
        assert!(!position.is_active());
        position.status = PositionStatus::Liquidated;
        assert!(!position.is_active());
    }

    #[test]
    fn test_reward_eligibility() {
        let user = UserAccount {
            bump: 0,
            market: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            position_count: 0,
            last_liquidity_supply: 1_700_000_000,
        };
        let interval = 15_552_000i64;
        let floor = 100_000_000_000u64;

        // not enough time
        assert!(!user.is_rewardable(floor, interval, floor, 1_700_000_000 + interval - 1));
        // enough time, balance below the floor
        assert!(!user.is_rewardable(floor - 1, interval, floor, 1_700_000_000 + interval));
        // both satisfied
        assert!(user.is_rewardable(floor, interval, floor, 1_700_000_000 + interval));
    }
}
