//! The remote capabilities the order flow consumes.
//!
//! [`Ledger`] is the only seam between the flow and the chain. The RPC-backed
//! implementation lives in [`crate::rpc`]; tests drive the flow with an
//! in-memory double.

use alloy_primitives::{Address, Log, B256, U256};
use async_trait::async_trait;
use eyre::Result;

use crate::commands::bridge::fees::FeeParameters;
use crate::commands::bridge::params::FastMarketOrder;

/// A confirmed order placement transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub tx_hash: B256,
    /// Logs emitted by the transaction, in receipt order
    pub logs: Vec<Log>,
}

/// Reads and writes against one origin chain, on behalf of one signer, for
/// one token and one router
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Address of the signing wallet
    fn signer_address(&self) -> Address;

    /// Address of the token router orders are placed with
    fn router_address(&self) -> Address;

    /// Token balance of `owner`
    async fn token_balance(&self, owner: Address) -> Result<U256>;

    /// Token amount `owner` has authorized `spender` to transfer
    async fn token_allowance(&self, owner: Address, spender: Address) -> Result<U256>;

    /// Router's current fast transfer fee parameters
    async fn fast_transfer_parameters(&self) -> Result<FeeParameters>;

    /// Approve `spender` for `amount` and wait for one confirmation
    async fn approve(&self, spender: Address, amount: U256) -> Result<B256>;

    /// Send `placeFastMarketOrder` and wait for one confirmation
    async fn place_fast_market_order(&self, order: &FastMarketOrder) -> Result<OrderReceipt>;
}
