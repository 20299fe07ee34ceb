use alloy_primitives::{Bytes, B256};
use eyre::Result;

use crate::error::OrderError;

/// Gas limit sent with every order; estimation is unreliable on the router's
/// auction path
pub const PLACE_ORDER_GAS_LIMIT: u64 = 1_000_000;

/// What the caller wants to bridge. The fee is resolved separately, see
/// [`super::fees::FeeStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Token amount in the token's smallest unit
    pub amount_in: u64,
    /// Wormhole chain ID of the destination
    pub target_chain: u16,
    /// Recipient on the destination chain, widened to 32 bytes
    pub redeemer: B256,
    /// Opaque payload handed to the redeemer
    pub redeemer_message: Bytes,
    /// Absolute Unix timestamp after which the order is void
    pub deadline: u32,
}

impl OrderRequest {
    pub fn new(
        amount_in: u64,
        target_chain: u16,
        recipient: &str,
        redeemer_message: impl Into<Bytes>,
        deadline: u32,
    ) -> Result<Self> {
        Ok(Self {
            amount_in,
            target_chain,
            redeemer: address_to_bytes32(recipient)?,
            redeemer_message: redeemer_message.into(),
            deadline,
        })
    }

    /// Attach the resolved fee, checking the amount covers it
    pub fn with_max_fee(self, max_fee: u64) -> Result<FastMarketOrder> {
        if self.amount_in <= max_fee {
            return Err(OrderError::FeeExceedsAmount {
                amount_in: self.amount_in,
                max_fee,
            }
            .into());
        }

        Ok(FastMarketOrder {
            amount_in: self.amount_in,
            target_chain: self.target_chain,
            redeemer: self.redeemer,
            redeemer_message: self.redeemer_message,
            max_fee,
            deadline: self.deadline,
        })
    }
}

/// The exact six arguments of `placeFastMarketOrder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastMarketOrder {
    pub amount_in: u64,
    pub target_chain: u16,
    pub redeemer: B256,
    pub redeemer_message: Bytes,
    pub max_fee: u64,
    pub deadline: u32,
}

/// Widen an address string into a 32-byte slot: drop the `0x` prefix,
/// left-pad with zeros to 64 hex characters and decode.
pub fn address_to_bytes32(address: &str) -> Result<B256> {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    if digits.is_empty() || digits.len() > 64 {
        return Err(OrderError::InvalidRecipient(address.to_string()).into());
    }

    let padded = format!("{digits:0>64}");
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|_| OrderError::InvalidRecipient(address.to_string()))?;

    Ok(B256::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_address_to_bytes32() {
        let widened = address_to_bytes32("0x08Ab1Ce3686cb7E616af2D3E068356B160c4c038").unwrap();
        let original = address!("0x08Ab1Ce3686cb7E616af2D3E068356B160c4c038");

        assert_eq!(&widened[..12], &[0u8; 12]);
        assert_eq!(&widened[12..], original.as_slice());
    }

    #[test]
    fn test_address_to_bytes32_without_prefix() {
        let widened = address_to_bytes32("ff").unwrap();
        assert_eq!(widened[31], 0xff);
        assert_eq!(&widened[..31], &[0u8; 31]);
    }

    #[test]
    fn test_address_to_bytes32_rejects_bad_input() {
        assert!(address_to_bytes32("0xnothex").is_err());
        let too_long = format!("0x{}", "1".repeat(66));
        let err = address_to_bytes32(&too_long).unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::InvalidRecipient(too_long.clone()))
        );
    }

    #[test]
    fn test_address_to_bytes32_rejects_empty() {
        for empty in ["", "0x"] {
            let err = address_to_bytes32(empty).unwrap_err();
            assert_eq!(
                err.downcast_ref::<OrderError>(),
                Some(&OrderError::InvalidRecipient(empty.to_string()))
            );
        }
    }

    #[test]
    fn test_with_max_fee_requires_amount_above_fee() {
        let request = OrderRequest::new(
            100,
            10005,
            "0x08Ab1Ce3686cb7E616af2D3E068356B160c4c038",
            "Epoch Test".as_bytes().to_vec(),
            1_700_000_000,
        )
        .unwrap();

        for max_fee in [100, 101, u64::MAX] {
            let err = request.clone().with_max_fee(max_fee).unwrap_err();
            assert_eq!(
                err.downcast_ref::<OrderError>(),
                Some(&OrderError::FeeExceedsAmount {
                    amount_in: 100,
                    max_fee
                })
            );
        }

        let order = request.with_max_fee(99).unwrap();
        assert_eq!(order.max_fee, 99);
        assert_eq!(order.redeemer_message, Bytes::from_static(b"Epoch Test"));
    }
}
