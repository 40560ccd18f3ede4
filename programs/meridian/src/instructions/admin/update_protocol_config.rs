use anchor_lang::prelude::*;

use crate::errors::LendingError;
use crate::events::ProtocolConfigUpdated;
use crate::state::{Market, ProtocolConfig};

/// Accounts for updating the protocol configuration
#[derive(Accounts)]
pub struct UpdateProtocolConfig<'info> {
    /// Market authority
    pub authority: Signer<'info>,

    /// The market to update
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        has_one = authority @ LendingError::Unauthorized
    )]
    pub market: Account<'info, Market>,
}

/// Replace the tunable protocol parameters.
///
/// The update is atomic: every field is validated against its bounds
/// before any field is written, so one bad value rejects the whole call.
pub fn handler(ctx: Context<UpdateProtocolConfig>, config: ProtocolConfig) -> Result<()> {
    config.validate()?;

    let market = &mut ctx.accounts.market;
    market.config = config;

    emit!(ProtocolConfigUpdated {
        market: market.key(),
        profit_target_rate_bps: config.profit_target_rate_bps,
        base_borrow_rate_bps: config.base_borrow_rate_bps,
        reward_amount: config.reward_amount,
        reward_interval: config.reward_interval,
        rewardable_supply: config.rewardable_supply,
        liquidator_governance_threshold: config.liquidator_governance_threshold,
        flash_loan_fee_bps: config.flash_loan_fee_bps,
    });

    msg!("Protocol config updated");
    msg!("Profit target: {} bps", config.profit_target_rate_bps);
    msg!("Base borrow rate: {} bps", config.base_borrow_rate_bps);
    msg!("Flash loan fee: {} bps", config.flash_loan_fee_bps);

    Ok(())
}
