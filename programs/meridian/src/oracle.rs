use anchor_lang::prelude::*;

use crate::constants::{
    BPS_DENOMINATOR, MAX_PRICE_DEVIATION_BPS, ORACLE_TIMEOUT_SECS,
    ORACLE_VOLATILITY_WINDOW_SECS, PRICE_PRECISION,
};
use crate::errors::LendingError;

/// On-chain layout of a price feed account (Chainlink-style round data).
///
/// Feed accounts are published by an external aggregator program and carry
/// the latest round alongside the immediately preceding one, which the
/// volatility check needs.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct PriceFeed {
    pub version: u8,
    pub decimals: u8,
    pub round_id: u64,
    pub answer: i64,
    pub timestamp: i64,
    pub answered_in_round: u64,
    pub previous_answer: i64,
    pub previous_timestamp: i64,
}

impl PriceFeed {
    /// Parse a feed from a raw account. Feed accounts are Borsh-encoded
    /// without an Anchor discriminator.
    pub fn load(account: &AccountInfo) -> Result<Self> {
        let data = account.try_borrow_data()?;
        Self::deserialize(&mut data.as_ref()).map_err(|_| LendingError::InvalidOraclePrice.into())
    }
}

/// Validate a single feed and return its answer normalized to
/// PRICE_PRECISION (1e6).
///
/// Checks, in order:
/// 1. answer must be positive
/// 2. the answered round must not lag the current round
/// 3. the answer must be younger than the 8h timeout
/// 4. a fresh answer (under 1h old) that moved more than 20% against the
///    previous round is rejected as volatile
pub fn validate_feed(feed: &PriceFeed, now: i64) -> Result<u128> {
    require!(feed.answer > 0, LendingError::InvalidOraclePrice);

    require!(
        feed.answered_in_round >= feed.round_id,
        LendingError::StaleOraclePrice
    );

    let age = now
        .checked_sub(feed.timestamp)
        .ok_or(LendingError::MathOverflow)?;
    require!(age <= ORACLE_TIMEOUT_SECS, LendingError::OracleTimeout);

    if age < ORACLE_VOLATILITY_WINDOW_SECS && feed.previous_answer > 0 {
        let deviation = deviation_bps(feed.answer as u128, feed.previous_answer as u128)?;
        require!(
            deviation <= MAX_PRICE_DEVIATION_BPS as u128,
            LendingError::OracleVolatility
        );
    }

    normalize_price(feed.answer as u128, feed.decimals)
}

/// A feed must carry the decimals its listing was configured with; a
/// disagreement means the wrong account (or a republished feed) was bound.
pub fn require_feed_decimals(feed: &PriceFeed, expected: u8) -> Result<()> {
    require!(feed.decimals == expected, LendingError::InvalidOracleConfig);
    Ok(())
}

/// Aggregate the configured feeds for an asset.
///
/// Every feed that passes validation contributes a price; the healthy count
/// must meet the quorum. One price is returned as-is, two are averaged
/// (the median of two). With a single bound feed its validation error
/// propagates as-is, so the caller sees why the quote failed; the quorum
/// error is reserved for a genuine multi-feed shortfall.
pub fn aggregate_prices(feeds: &[PriceFeed], min_oracles: u8, now: i64) -> Result<u128> {
    if feeds.len() == 1 {
        return validate_feed(&feeds[0], now);
    }

    let mut prices: Vec<u128> = Vec::with_capacity(feeds.len());
    for feed in feeds {
        if let Ok(price) = validate_feed(feed, now) {
            prices.push(price);
        }
    }

    require!(
        prices.len() >= min_oracles as usize && !prices.is_empty(),
        LendingError::InsufficientOracles
    );

    prices.sort_unstable();
    let mid = prices.len() / 2;
    let median = if prices.len() % 2 == 0 {
        prices[mid - 1]
            .checked_add(prices[mid])
            .ok_or(LendingError::MathOverflow)?
            / 2
    } else {
        prices[mid]
    };

    Ok(median)
}

/// Rescale a raw feed answer from its own decimals to PRICE_PRECISION (1e6)
fn normalize_price(raw: u128, feed_decimals: u8) -> Result<u128> {
    let target: i32 = 6;
    let shift = target - feed_decimals as i32;

    if shift >= 0 {
        raw.checked_mul(10u128.pow(shift as u32))
            .ok_or(LendingError::MathOverflow.into())
    } else {
        Ok(raw / 10u128.pow((-shift) as u32))
    }
}

/// Absolute deviation of `current` from `previous` in BPS
fn deviation_bps(current: u128, previous: u128) -> Result<u128> {
    let diff = current.abs_diff(previous);
    diff.checked_mul(BPS_DENOMINATOR as u128)
        .ok_or(LendingError::MathOverflow)?
        .checked_div(previous)
        .ok_or(LendingError::MathOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    // Helper: a healthy 8-decimal feed at $2,500
    fn healthy_feed() -> PriceFeed {
        PriceFeed {
            version: 1,
            decimals: 8,
            round_id: 100,
            answer: 2_500 * 100_000_000,
            timestamp: NOW - 600,
            answered_in_round: 100,
            previous_answer: 2_490 * 100_000_000,
            previous_timestamp: NOW - 4_200,
        }
    }

    #[test]
    fn test_valid_feed_normalizes_to_1e6() {
        let price = validate_feed(&healthy_feed(), NOW).unwrap();
        assert_eq!(price, 2_500 * PRICE_PRECISION);
    }

    #[test]
    fn test_zero_and_negative_price_rejected() {
        let mut feed = healthy_feed();
        feed.answer = 0;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap_err(),
            LendingError::InvalidOraclePrice.into()
        );

        feed.answer = -1;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap_err(),
            LendingError::InvalidOraclePrice.into()
        );
    }

    #[test]
    fn test_lagging_round_rejected() {
        let mut feed = healthy_feed();
        feed.answered_in_round = 99;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap_err(),
            LendingError::StaleOraclePrice.into()
        );
    }

    #[test]
    fn test_timeout_boundary() {
        let mut feed = healthy_feed();
        feed.timestamp = NOW - ORACLE_TIMEOUT_SECS;
        assert!(validate_feed(&feed, NOW).is_ok());

        feed.timestamp = NOW - ORACLE_TIMEOUT_SECS - 1;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap_err(),
            LendingError::OracleTimeout.into()
        );
    }

    #[test]
    fn test_volatile_move_inside_window_rejected() {
        let mut feed = healthy_feed();
        // 30% move, answer 10 minutes old
        feed.answer = 2_500 * 100_000_000;
        feed.previous_answer = 1_900 * 100_000_000;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap_err(),
            LendingError::OracleVolatility.into()
        );
    }

    #[test]
    fn test_volatile_move_outside_window_accepted() {
        let mut feed = healthy_feed();
        feed.answer = 2_500 * 100_000_000;
        feed.previous_answer = 1_900 * 100_000_000;
        // Same move, but the answer itself is 2 hours old
        feed.timestamp = NOW - 7_200;
        assert!(validate_feed(&feed, NOW).is_ok());
    }

    #[test]
    fn test_small_move_inside_window_accepted() {
        let mut feed = healthy_feed();
        // 4% move minutes after the previous round
        feed.previous_answer = 2_400 * 100_000_000;
        assert!(validate_feed(&feed, NOW).is_ok());
    }

    #[test]
    fn test_median_of_two_is_mean() {
        let a = healthy_feed();
        let mut b = healthy_feed();
        b.answer = 2_520 * 100_000_000;
        let price = aggregate_prices(&[a, b], 2, NOW).unwrap();
        assert_eq!(price, 2_510 * PRICE_PRECISION);
    }

    #[test]
    fn test_quorum_failure() {
        let a = healthy_feed();
        let mut b = healthy_feed();
        b.answer = 0; // unhealthy
        assert_eq!(
            aggregate_prices(&[a.clone(), b], 2, NOW).unwrap_err(),
            LendingError::InsufficientOracles.into()
        );
        // quorum of one is still met by the healthy feed
        let mut c = healthy_feed();
        c.answered_in_round = 1;
        assert_eq!(
            aggregate_prices(&[a, c], 1, NOW).unwrap(),
            2_500 * PRICE_PRECISION
        );
    }

    #[test]
    fn test_single_feed_failure_keeps_its_cause() {
        // one bound feed: the precise failure surfaces, not the quorum error
        let mut stale = healthy_feed();
        stale.answered_in_round = 99;
        assert_eq!(
            aggregate_prices(&[stale], 1, NOW).unwrap_err(),
            LendingError::StaleOraclePrice.into()
        );

        let mut old = healthy_feed();
        old.timestamp = NOW - ORACLE_TIMEOUT_SECS - 1;
        assert_eq!(
            aggregate_prices(&[old], 1, NOW).unwrap_err(),
            LendingError::OracleTimeout.into()
        );

        let mut volatile = healthy_feed();
        volatile.previous_answer = 1_900 * 100_000_000;
        assert_eq!(
            aggregate_prices(&[volatile], 1, NOW).unwrap_err(),
            LendingError::OracleVolatility.into()
        );
    }

    #[test]
    fn test_feed_decimals_must_match_listing() {
        let feed = healthy_feed();
        assert!(require_feed_decimals(&feed, 8).is_ok());
        assert_eq!(
            require_feed_decimals(&feed, 6).unwrap_err(),
            LendingError::InvalidOracleConfig.into()
        );
    }

    #[test]
    fn test_normalize_low_decimal_feed() {
        let mut feed = healthy_feed();
        feed.decimals = 2;
        feed.answer = 250_000; // $2,500.00
        feed.previous_answer = 249_000;
        assert_eq!(
            validate_feed(&feed, NOW).unwrap(),
            2_500 * PRICE_PRECISION
        );
    }
}
