use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::BASE_VAULT_SEED;
use crate::errors::LendingError;
use crate::events::BorrowEvent;
use crate::state::{Market, Position};
use crate::valuation;

/// Accounts for borrowing base assets against a position
///
/// Remaining accounts: the valuation set, in collateral order (AssetConfig
/// then feed(s) per entry).
#[derive(Accounts)]
pub struct Borrow<'info> {
    /// Position owner
    pub owner: Signer<'info>,

    /// The market
    #[account(
        mut,
        seeds = [Market::SEED_PREFIX, market.authority.as_ref()],
        bump = market.bump,
        constraint = !market.paused @ LendingError::ProtocolPaused
    )]
    pub market: Account<'info, Market>,

    /// The position taking on debt
    #[account(
        mut,
        constraint = position.market == market.key() @ LendingError::InvalidPosition,
        constraint = position.owner == owner.key() @ LendingError::InvalidPosition,
        seeds = [
            Position::SEED_PREFIX,
            market.key().as_ref(),
            owner.key().as_ref(),
            &position.index.to_le_bytes(),
        ],
        bump = position.bump
    )]
    pub position: Account<'info, Position>,

    /// Pool base vault (source)
    #[account(
        mut,
        seeds = [BASE_VAULT_SEED, market.key().as_ref()],
        bump,
        constraint = base_vault.key() == market.base_vault @ LendingError::AccountMismatch
    )]
    pub base_vault: Account<'info, TokenAccount>,

    /// Owner's base token account (destination)
    #[account(
        mut,
        constraint = owner_base_account.mint == market.base_mint @ LendingError::AccountMismatch,
        constraint = owner_base_account.owner == owner.key() @ LendingError::AccountMismatch
    )]
    pub owner_base_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Borrow base assets against the position's collateral.
///
/// Interest accrues first, so the credit check runs against the real debt.
/// The new total must fit under the freshly priced credit limit, under the
/// isolation debt cap when the position is isolated, and under the pool's
/// available liquidity.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Borrow<'info>>,
    amount: u64,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    let position = &mut ctx.accounts.position;
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    require!(amount > 0, LendingError::ZeroAmount);
    require!(position.is_active(), LendingError::InactivePosition);

    // Accrue at the pre-borrow utilization
    let rate = market.borrow_rate_bps(position.highest_tier());
    let interest = position.accrue(rate, now)?;
    market.total_borrow = market
        .total_borrow
        .checked_add(interest)
        .ok_or(LendingError::MathOverflow)?;

    let new_debt = position
        .debt_amount
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;

    // Fresh prices for the whole set; an empty set prices to zero credit
    let snapshot = valuation::evaluate_position(
        &market.key(),
        position,
        ctx.remaining_accounts,
        now,
    )?;
    require!(
        new_debt as u128 <= snapshot.credit_limit,
        LendingError::CreditLimitExceeded
    );
    if position.is_isolated {
        require!(
            new_debt <= snapshot.isolation_debt_cap,
            LendingError::IsolationDebtCapExceeded
        );
    }

    require!(
        amount <= market.tracked_base_balance,
        LendingError::InsufficientPoolLiquidity
    );

    // Pay out from the pool vault, market PDA signing
    let seeds = &[
        Market::SEED_PREFIX,
        market.authority.as_ref(),
        &[market.bump],
    ];
    let signer_seeds = &[&seeds[..]];
    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.base_vault.to_account_info(),
            to: ctx.accounts.owner_base_account.to_account_info(),
            authority: market.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)?;

    position.debt_amount = new_debt;
    market.total_borrow = market
        .total_borrow
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;
    market.tracked_base_balance = market
        .tracked_base_balance
        .checked_sub(amount)
        .ok_or(LendingError::MathOverflow)?;

    let utilization = market.utilization_bps();
    let new_rate = market.borrow_rate_bps(snapshot.highest_tier);

    emit!(BorrowEvent {
        market: market.key(),
        position: position.key(),
        owner: position.owner,
        amount,
        new_debt_amount: new_debt,
        new_utilization_bps: utilization,
        borrow_rate_bps: new_rate,
        timestamp: now,
    });

    msg!("Borrowed {} against position {}", amount, position.index);
    msg!("Utilization now {} bps, rate {} bps", utilization, new_rate);

    Ok(())
}
