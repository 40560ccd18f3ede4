use anchor_lang::prelude::*;

use crate::constants::THRESHOLD_SCALE;
use crate::errors::LendingError;
use crate::oracle::{self, PriceFeed};
use crate::state::{AssetConfig, CollateralTier, Position};

/// Priced snapshot of one collateral entry, produced by the account walker.
///
/// Carries the listing's vault, bump and index into the walked slice so a
/// caller that seizes or returns collateral can reach back to the same
/// accounts without a second pass.
pub struct CollateralValuation {
    pub mint: Pubkey,
    pub amount: u64,
    /// Median feed price, normalized to PRICE_PRECISION
    pub price: u128,
    pub decimals: u8,
    pub tier: CollateralTier,
    /// Raw value in base units
    pub value: u128,
    /// Value discounted by the borrow threshold
    pub credit_value: u128,
    /// Value discounted by the liquidation threshold
    pub liquidation_value: u128,
    pub vault: Pubkey,
    pub config_bump: u8,
    /// Index of the AssetConfig account within the walked slice
    pub account_index: usize,
}

/// Full valuation of a position's collateral set
pub struct PositionValuation {
    pub entries: Vec<CollateralValuation>,
    /// Sum of raw collateral values
    pub collateral_value: u128,
    /// Maximum debt the collateral supports
    pub credit_limit: u128,
    /// Collateral value counted toward the health factor
    pub liquidation_value: u128,
    /// Highest-risk tier across the set (Stable when empty)
    pub highest_tier: CollateralTier,
    /// Debt cap when the set contains an isolated listing, 0 otherwise
    pub isolation_debt_cap: u64,
    /// Accounts consumed from the walked slice
    pub accounts_consumed: usize,
}

/// Walk the trailing accounts of an instruction and price every collateral
/// entry of `position`.
///
/// The caller appends, for each entry in collateral order:
///   1. the AssetConfig PDA for the entry's mint
///   2. the primary price feed
///   3. the secondary price feed, only when the listing binds one
///
/// Prices are read fresh on every call; nothing here is cached across
/// instructions. Any mismatch between the walked accounts and the listing
/// is rejected rather than skipped.
pub fn evaluate_position<'info>(
    market: &Pubkey,
    position: &Position,
    accounts: &'info [AccountInfo<'info>],
    now: i64,
) -> Result<PositionValuation> {
    let mut entries = Vec::with_capacity(position.collateral.len());
    let mut collateral_value: u128 = 0;
    let mut credit_limit: u128 = 0;
    let mut liquidation_value: u128 = 0;
    let mut highest_tier = CollateralTier::Stable;
    let mut isolation_debt_cap: u64 = 0;
    let mut cursor: usize = 0;

    for entry in position.collateral.iter() {
        let config_index = cursor;
        let config_info = accounts
            .get(cursor)
            .ok_or(LendingError::AccountMismatch)?;
        let config = Account::<AssetConfig>::try_from(config_info)?;
        require!(
            config.market == *market && config.mint == entry.mint,
            LendingError::AccountMismatch
        );
        cursor += 1;

        let primary_info = accounts
            .get(cursor)
            .ok_or(LendingError::AccountMismatch)?;
        require_keys_eq!(
            primary_info.key(),
            config.oracle,
            LendingError::AccountMismatch
        );
        let primary_feed = PriceFeed::load(primary_info)?;
        oracle::require_feed_decimals(&primary_feed, config.oracle_decimals)?;
        let mut feeds = vec![primary_feed];
        cursor += 1;

        if config.secondary_oracle != Pubkey::default() {
            let secondary_info = accounts
                .get(cursor)
                .ok_or(LendingError::AccountMismatch)?;
            require_keys_eq!(
                secondary_info.key(),
                config.secondary_oracle,
                LendingError::AccountMismatch
            );
            let secondary_feed = PriceFeed::load(secondary_info)?;
            oracle::require_feed_decimals(&secondary_feed, config.oracle_decimals)?;
            feeds.push(secondary_feed);
            cursor += 1;
        }

        let price = oracle::aggregate_prices(&feeds, config.min_oracles, now)?;
        let (value, credit_value, entry_liquidation_value) = value_entry(
            entry.amount,
            price,
            config.decimals,
            config.borrow_threshold,
            config.liquidation_threshold,
        )?;

        collateral_value = collateral_value
            .checked_add(value)
            .ok_or(LendingError::MathOverflow)?;
        credit_limit = credit_limit
            .checked_add(credit_value)
            .ok_or(LendingError::MathOverflow)?;
        liquidation_value = liquidation_value
            .checked_add(entry_liquidation_value)
            .ok_or(LendingError::MathOverflow)?;

        if config.tier > highest_tier {
            highest_tier = config.tier;
        }
        if config.tier == CollateralTier::Isolated {
            isolation_debt_cap = config.isolation_debt_cap;
        }

        entries.push(CollateralValuation {
            mint: entry.mint,
            amount: entry.amount,
            price,
            decimals: config.decimals,
            tier: config.tier,
            value,
            credit_value,
            liquidation_value: entry_liquidation_value,
            vault: config.vault,
            config_bump: config.bump,
            account_index: config_index,
        });
    }

    Ok(PositionValuation {
        entries,
        collateral_value,
        credit_limit,
        liquidation_value,
        highest_tier,
        isolation_debt_cap,
        accounts_consumed: cursor,
    })
}

/// Price one holding: raw value plus its threshold-discounted values.
///
/// value = amount * price / 10^decimals, in base units at PRICE_PRECISION;
/// the discounts apply the parts-per-1000 thresholds.
pub fn value_entry(
    amount: u64,
    price: u128,
    decimals: u8,
    borrow_threshold: u16,
    liquidation_threshold: u16,
) -> Result<(u128, u128, u128)> {
    let unit = 10u128
        .checked_pow(decimals as u32)
        .ok_or(LendingError::MathOverflow)?;
    let value = (amount as u128)
        .checked_mul(price)
        .ok_or(LendingError::MathOverflow)?
        / unit;

    let credit_value = apply_threshold(value, borrow_threshold)?;
    let liquidation_value = apply_threshold(value, liquidation_threshold)?;
    Ok((value, credit_value, liquidation_value))
}

fn apply_threshold(value: u128, threshold: u16) -> Result<u128> {
    value
        .checked_mul(threshold as u128)
        .ok_or(LendingError::MathOverflow)
        .map(|v| v / THRESHOLD_SCALE as u128)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PRECISION, PRICE_PRECISION};
    use crate::state::{health_factor, is_liquidatable};

    #[test]
    fn test_value_scales_with_token_decimals() {
        // 10 tokens at $2,500, 9 decimals
        let price = 2_500 * PRICE_PRECISION;
        let (value, _, _) = value_entry(10_000_000_000, price, 9, 800, 850).unwrap();
        assert_eq!(value, 25_000 * PRICE_PRECISION);

        // same holding expressed at 6 decimals prices identically
        let (value6, _, _) = value_entry(10_000_000, price, 6, 800, 850).unwrap();
        assert_eq!(value6, value);
    }

    #[test]
    fn test_thresholds_discount_in_parts_per_1000() {
        let price = 2_500 * PRICE_PRECISION;
        let (value, credit, liq) = value_entry(10_000_000_000, price, 9, 800, 850).unwrap();
        assert_eq!(credit, value * 800 / 1_000);
        assert_eq!(liq, value * 850 / 1_000);
        assert!(credit <= liq);
    }

    #[test]
    fn test_full_threshold_is_identity() {
        let (value, credit, liq) =
            value_entry(1_000_000, PRICE_PRECISION, 6, 1_000, 1_000).unwrap();
        assert_eq!(credit, value);
        assert_eq!(liq, value);
    }

    #[test]
    fn test_liquidation_breakeven_under_price_decline() {
        // 10 tokens, 850 liquidation threshold, 15,000 base units of debt.
        // Breakeven price: 15_000 / (10 * 0.85) ~ $1,764.7
        let debt: u64 = 15_000 * PRICE_PRECISION as u64;
        let amount: u64 = 10_000_000_000; // 9 decimals

        for pct in 70..=100u128 {
            let price = 2_500 * PRICE_PRECISION * pct / 100;
            let (_, _, liq) = value_entry(amount, price, 9, 800, 850).unwrap();
            let hf = health_factor(liq, debt).unwrap();
            let expected_liquidatable = price * 10 * 850 / 1_000 < debt as u128;
            assert_eq!(
                is_liquidatable(liq, debt).unwrap(),
                expected_liquidatable,
                "price {price}"
            );
            assert_eq!(hf < PRECISION, expected_liquidatable);
        }
    }

    #[test]
    fn test_liquidation_fee_scales_with_tier() {
        use crate::state::CollateralTier::*;
        let debt: u128 = 20_000 * PRICE_PRECISION;
        let fee = |tier: crate::state::CollateralTier| {
            debt * tier.liquidation_fee_bps() as u128 / 10_000
        };
        assert_eq!(fee(Stable), debt / 100); // 1%
        assert_eq!(fee(CrossA), debt * 2 / 100);
        assert_eq!(fee(CrossB), debt * 3 / 100);
        assert_eq!(fee(Isolated), debt * 4 / 100);
    }

    #[test]
    fn test_credit_limit_bounds_borrowing_below_liquidation() {
        // a debt right at the credit limit always leaves hf above 1.0
        // whenever liquidation_threshold > borrow_threshold
        let price = 1_800 * PRICE_PRECISION;
        let (_, credit, liq) = value_entry(5_000_000_000, price, 9, 800, 850).unwrap();
        let max_debt = credit as u64;
        assert!(!is_liquidatable(liq, max_debt).unwrap());
        assert!(health_factor(liq, max_debt).unwrap() > PRECISION);
    }
}
