use alloy_primitives::{B256, U256};
use thiserror::Error;

/// Failures the order flow raises on its own, as opposed to transport or
/// contract errors bubbling up from the RPC layer.
///
/// Carried inside [`eyre::Report`]; callers that need to branch on the kind
/// use `report.downcast_ref::<OrderError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("{0} not found in environment variables")]
    MissingCredential(String),

    #[error("no endpoint configured for network '{0}'")]
    UnknownNetwork(String),

    #[error("invalid recipient '{0}': expected at most 32 bytes of hex")]
    InvalidRecipient(String),

    #[error("amountIn ({amount_in}) must be greater than maxFee ({max_fee})")]
    FeeExceedsAmount { amount_in: u64, max_fee: u64 },

    #[error("insufficient token balance: have {balance}, need {amount_in}")]
    InsufficientBalance { balance: U256, amount_in: u64 },

    #[error("fast transfers are disabled on the router")]
    FastTransfersDisabled,

    #[error("amountIn ({amount_in}) exceeds the fast transfer limit ({max_amount})")]
    AmountAboveFastLimit { amount_in: u64, max_amount: u64 },

    #[error("minimum fee overflows u64 (baseFee {base_fee}, initAuctionFee {init_auction_fee})")]
    FeeOverflow { base_fee: u64, init_auction_fee: u64 },

    #[error("transaction {0} reverted")]
    TransactionReverted(B256),

    #[error("transaction {tx_hash} emitted no {event} log")]
    MissingOrderLog { tx_hash: B256, event: &'static str },
}
