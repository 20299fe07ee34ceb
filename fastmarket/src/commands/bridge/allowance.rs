use alloy_primitives::{B256, U256};
use eyre::Result;
use tracing::info;

use crate::error::OrderError;
use crate::ledger::Ledger;

/// Fail unless the signer holds at least `amount_in` tokens
pub async fn ensure_balance<L: Ledger + ?Sized>(ledger: &L, amount_in: u64) -> Result<U256> {
    let balance = ledger.token_balance(ledger.signer_address()).await?;
    info!("Token balance: {}", balance);

    if balance < U256::from(amount_in) {
        return Err(OrderError::InsufficientBalance { balance, amount_in }.into());
    }
    Ok(balance)
}

/// Approve the router for exactly `amount_in` when the current allowance is
/// short. Returns the approval hash if one was sent.
pub async fn ensure_allowance<L: Ledger + ?Sized>(ledger: &L, amount_in: u64) -> Result<Option<B256>> {
    let owner = ledger.signer_address();
    let spender = ledger.router_address();
    let required = U256::from(amount_in);

    let allowance = ledger.token_allowance(owner, spender).await?;
    info!("Current allowance: {}", allowance);

    if allowance >= required {
        info!("Current allowance sufficient, proceeding with fast market order");
        return Ok(None);
    }

    info!("Current allowance insufficient, approving {} for {}", required, spender);
    let approve_hash = ledger.approve(spender, required).await?;
    info!("Approval confirmed: {}", approve_hash);

    Ok(Some(approve_hash))
}
