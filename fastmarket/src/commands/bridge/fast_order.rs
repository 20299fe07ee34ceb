use std::fmt;

use alloy_primitives::{B256, U256};
use eyre::Result;
use tracing::info;

use super::allowance::{ensure_allowance, ensure_balance};
use super::fees::FeeStrategy;
use super::params::OrderRequest;
use super::receipt::extract_sequences;
use crate::config::explorer_url;
use crate::ledger::Ledger;

/// Outcome of a confirmed fast market order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub tx_hash: B256,
    /// Hash of the approval sent beforehand, if the allowance was short
    pub approval_tx_hash: Option<B256>,
    pub sequence: u64,
    pub fast_sequence: u64,
    pub protocol_sequence: U256,
}

impl SubmissionResult {
    pub fn explorer_url(&self) -> String {
        explorer_url(self.tx_hash)
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SubmissionResult {{\n  tx_hash: {},\n  approval_tx_hash: {},\n  sequence: {},\n  fast_sequence: {},\n  protocol_sequence: {}\n}}",
            self.tx_hash,
            self.approval_tx_hash
                .map_or("None".to_string(), |hash| hash.to_string()),
            self.sequence,
            self.fast_sequence,
            self.protocol_sequence
        )
    }
}

/// Place one fast market order through the ledger's router.
///
/// Resolves the max fee, validates the order against it and the signer's
/// token balance, tops up the router allowance when short, then sends the
/// order and waits for it to confirm. Nothing is written on-chain unless
/// every check passes. No step is retried.
pub async fn place_fast_market_order<L: Ledger + ?Sized>(
    ledger: &L,
    request: OrderRequest,
    fee: FeeStrategy,
) -> Result<SubmissionResult> {
    info!(
        "Preparing fast market order of {} to chain {} for redeemer {}",
        request.amount_in, request.target_chain, request.redeemer
    );
    info!("Wallet address: {}", ledger.signer_address());
    info!("Using contract: {}", ledger.router_address());

    let max_fee = fee.resolve(ledger, request.amount_in).await?;
    let order = request.with_max_fee(max_fee)?;

    ensure_balance(ledger, order.amount_in).await?;
    let approval_tx_hash = ensure_allowance(ledger, order.amount_in).await?;

    info!(
        "Sending fast market order: amountIn={}, targetChain={}, redeemer={}, maxFee={}, deadline={}",
        order.amount_in, order.target_chain, order.redeemer, order.max_fee, order.deadline
    );
    let receipt = ledger.place_fast_market_order(&order).await?;
    info!("Fast market order confirmed: {}", receipt.tx_hash);

    let sequences = extract_sequences(ledger.router_address(), &receipt)?;
    info!("Sequence: {}", sequences.sequence);
    info!("Fast Sequence: {}", sequences.fast_sequence);
    info!("Protocol Sequence: {}", sequences.protocol_sequence);

    Ok(SubmissionResult {
        tx_hash: receipt.tx_hash,
        approval_tx_hash,
        sequence: sequences.sequence,
        fast_sequence: sequences.fast_sequence,
        protocol_sequence: sequences.protocol_sequence,
    })
}
