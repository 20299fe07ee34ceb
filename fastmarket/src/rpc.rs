//! [`Ledger`] over a JSON-RPC endpoint, signing with a local private key.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::decode_revert_reason;
use alloy_chains::NamedChain;
use alloy_sol_types::sol;
use async_trait::async_trait;
use eyre::{Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::commands::bridge::fees::FeeParameters;
use crate::commands::bridge::params::{FastMarketOrder, PLACE_ORDER_GAS_LIMIT};
use crate::config::EndpointConfig;
use crate::error::OrderError;
use crate::ledger::{Ledger, OrderReceipt};

sol! {
    #[sol(abi, rpc)]
    contract IERC20 {
        #[derive(Debug)]
        function allowance(address owner, address spender) view returns (uint256);
        #[derive(Debug)]
        function approve(address spender, uint256 amount) external returns (bool);
        #[derive(Debug)]
        function balanceOf(address) external view returns (uint256);
    }
}

sol! {
    #[sol(abi, rpc)]
    contract ITokenRouter {
        #[derive(Debug)]
        struct FastTransferParameters {
            bool enabled;
            uint64 maxAmount;
            uint64 baseFee;
            uint64 initAuctionFee;
        }

        #[derive(Debug)]
        function placeFastMarketOrder(
            uint64 amountIn,
            uint16 targetChain,
            bytes32 redeemer,
            bytes redeemerMessage,
            uint64 maxFee,
            uint32 deadline
        ) external payable returns (uint64 sequence, uint64 fastSequence, uint256 protocolSequence);

        #[derive(Debug)]
        function getFastTransferParameters() external view returns (FastTransferParameters memory);
    }
}

/// Ledger backed by an HTTP provider with the signer's wallet attached
pub struct RpcLedger {
    provider: DynProvider,
    signer: Address,
    token: Address,
    router: Address,
}

impl RpcLedger {
    /// Connect to the endpoint's RPC URL. No request is made until the first
    /// read.
    pub fn connect(endpoint: &EndpointConfig, privkey: &str) -> Result<Self> {
        let signer = privkey
            .parse::<PrivateKeySigner>()
            .wrap_err("invalid private key")?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::new(signer);
        let rpc_url = Url::parse(&endpoint.rpc_url)
            .wrap_err_with(|| format!("invalid RPC URL for {}: {}", endpoint.network, endpoint.rpc_url))?;

        // Set up the provider
        let provider = match NamedChain::try_from(endpoint.chain_id) {
            Ok(chain) => ProviderBuilder::new()
                .with_chain(chain)
                .wallet(wallet)
                .connect_http(rpc_url)
                .erased(),
            Err(_) => {
                warn!("Unknown chain ID {}, using chain ID directly", endpoint.chain_id);
                ProviderBuilder::new()
                    .wallet(wallet)
                    .connect_http(rpc_url)
                    .erased()
            }
        };

        info!(
            "Connected to {} (chain_id: {}, rpc: {})",
            endpoint.network, endpoint.chain_id, endpoint.rpc_url
        );

        Ok(Self {
            provider,
            signer: signer_address,
            token: endpoint.usdc,
            router: endpoint.token_router,
        })
    }

    fn echo(&self, method: &str, to: Address, calldata: &Bytes) -> String {
        format!(
            "{method} failed (to: {to}, from: {}, data: {calldata})",
            self.signer
        )
    }
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<()> {
    if !receipt.status() {
        return Err(OrderError::TransactionReverted(receipt.transaction_hash).into());
    }
    Ok(())
}

#[async_trait]
impl Ledger for RpcLedger {
    fn signer_address(&self) -> Address {
        self.signer
    }

    fn router_address(&self) -> Address {
        self.router
    }

    async fn token_balance(&self, owner: Address) -> Result<U256> {
        let erc20 = IERC20::new(self.token, &self.provider);
        let balance = erc20
            .balanceOf(owner)
            .call()
            .await
            .wrap_err("balanceOf failed")?;
        Ok(balance)
    }

    async fn token_allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let erc20 = IERC20::new(self.token, &self.provider);
        let allowance = erc20
            .allowance(owner, spender)
            .call()
            .await
            .wrap_err("allowance failed")?;
        Ok(allowance)
    }

    async fn fast_transfer_parameters(&self) -> Result<FeeParameters> {
        let router = ITokenRouter::new(self.router, &self.provider);
        let params = router
            .getFastTransferParameters()
            .call()
            .await
            .wrap_err("getFastTransferParameters failed")?;

        Ok(FeeParameters {
            enabled: params.enabled,
            max_amount: params.maxAmount,
            base_fee: params.baseFee,
            init_auction_fee: params.initAuctionFee,
        })
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<B256> {
        let erc20 = IERC20::new(self.token, &self.provider);
        let call = erc20.approve(spender, amount);
        let calldata = call.calldata().clone();

        let pending = call
            .send()
            .await
            .wrap_err_with(|| self.echo("approve", self.token, &calldata))?;
        info!("Approval transaction hash: {}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await?;
        ensure_success(&receipt)?;

        Ok(receipt.transaction_hash)
    }

    async fn place_fast_market_order(&self, order: &FastMarketOrder) -> Result<OrderReceipt> {
        let router = ITokenRouter::new(self.router, &self.provider);
        let call = router
            .placeFastMarketOrder(
                order.amount_in,
                order.target_chain,
                order.redeemer,
                order.redeemer_message.clone(),
                order.max_fee,
                order.deadline,
            )
            .gas(PLACE_ORDER_GAS_LIMIT);
        let calldata = call.calldata().clone();

        let pending = call
            .send()
            .await
            .wrap_err_with(|| self.echo("placeFastMarketOrder", self.router, &calldata))?;
        info!("Transaction sent! Hash: {}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await?;
        ensure_success(&receipt)?;

        Ok(OrderReceipt {
            tx_hash: receipt.transaction_hash,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }
}

/// Whatever the error chain says about a failed remote call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureDiagnostics {
    pub message: String,
    /// JSON-RPC error code
    pub code: Option<i64>,
    /// Raw error data returned by the node
    pub data: Option<String>,
    /// Decoded `Error(string)` / `Panic(uint256)` revert reason
    pub reason: Option<String>,
}

/// Walk an error chain for JSON-RPC error payloads and revert data
pub fn diagnose(report: &eyre::Report) -> FailureDiagnostics {
    let mut diagnostics = FailureDiagnostics {
        message: format!("{report:#}"),
        ..Default::default()
    };

    for cause in report.chain() {
        let transport = if let Some(err) = cause.downcast_ref::<alloy::contract::Error>() {
            if let Some(revert) = err.as_revert_data() {
                diagnostics.reason = decode_revert_reason(&revert);
            }
            match err {
                alloy::contract::Error::TransportError(transport) => Some(transport),
                _ => None,
            }
        } else {
            cause.downcast_ref::<alloy::transports::TransportError>()
        };

        if let Some(payload) = transport.and_then(|t| t.as_error_resp()) {
            diagnostics.code = Some(payload.code);
            diagnostics.data = payload.data.as_ref().map(|data| data.get().to_string());
            if diagnostics.reason.is_none() {
                diagnostics.reason = payload
                    .as_revert_data()
                    .and_then(|revert| decode_revert_reason(&revert));
            }
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::{ErrorPayload, RpcError};
    use alloy::sol_types::{Revert, SolError};
    use serde_json::value::RawValue;

    fn reverted(reason: &str) -> alloy::contract::Error {
        let revert = Revert {
            reason: reason.to_string(),
        };
        let data = format!("\"0x{}\"", hex::encode(revert.abi_encode()));
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: Some(RawValue::from_string(data).unwrap()),
        };
        alloy::contract::Error::TransportError(RpcError::ErrorResp(payload))
    }

    #[test]
    fn test_diagnose_plain_error() {
        let report = eyre::eyre!("connection refused");
        let diagnostics = diagnose(&report);
        assert_eq!(diagnostics.message, "connection refused");
        assert_eq!(diagnostics.code, None);
        assert_eq!(diagnostics.reason, None);
    }

    #[test]
    fn test_diagnose_revert_reason() {
        let report = eyre::Report::new(reverted("ErrInsufficientFee"))
            .wrap_err("placeFastMarketOrder failed");
        let diagnostics = diagnose(&report);

        assert!(diagnostics.message.starts_with("placeFastMarketOrder failed"));
        assert_eq!(diagnostics.code, Some(3));
        assert!(diagnostics.data.unwrap().starts_with("\"0x08c379a0"));
        assert!(diagnostics.reason.unwrap().contains("ErrInsufficientFee"));
    }

    #[test]
    fn test_connect_rejects_bad_key() {
        let endpoint = crate::config::NetworkTable::builtin().networks[0].clone();
        assert!(RpcLedger::connect(&endpoint, "not-a-key").is_err());
    }

    #[test]
    fn test_connect_derives_signer_address() {
        let endpoint = crate::config::NetworkTable::builtin().networks[0].clone();
        let ledger = RpcLedger::connect(
            &endpoint,
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();

        assert_eq!(
            ledger.signer_address(),
            alloy::primitives::address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(ledger.router_address(), endpoint.token_router);
    }
}
