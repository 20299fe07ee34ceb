use eyre::Result;
use tracing::info;

use crate::error::OrderError;
use crate::ledger::Ledger;

/// Fast transfer parameters as reported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub enabled: bool,
    /// Largest amount the fast path accepts
    pub max_amount: u64,
    pub base_fee: u64,
    /// Paid to whoever starts the auction on the destination side
    pub init_auction_fee: u64,
}

impl FeeParameters {
    /// Smallest max fee the router accepts. The router requires the fee to
    /// be strictly above `base_fee + init_auction_fee`.
    pub fn minimum_fee(&self) -> Result<u64> {
        self.base_fee
            .checked_add(self.init_auction_fee)
            .and_then(|fee| fee.checked_add(1))
            .ok_or_else(|| {
                OrderError::FeeOverflow {
                    base_fee: self.base_fee,
                    init_auction_fee: self.init_auction_fee,
                }
                .into()
            })
    }

    /// Reject amounts the router's fast path would refuse
    pub fn check_amount(&self, amount_in: u64) -> Result<()> {
        if !self.enabled {
            return Err(OrderError::FastTransfersDisabled.into());
        }
        if amount_in > self.max_amount {
            return Err(OrderError::AmountAboveFastLimit {
                amount_in,
                max_amount: self.max_amount,
            }
            .into());
        }
        Ok(())
    }
}

/// How the order's max fee is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStrategy {
    /// Use this max fee as-is
    Fixed(u64),
    /// Ask the router for its fee parameters and pay the minimum
    Query,
}

impl FeeStrategy {
    /// Resolve the max fee for an order of `amount_in`
    pub async fn resolve<L: Ledger + ?Sized>(&self, ledger: &L, amount_in: u64) -> Result<u64> {
        match self {
            FeeStrategy::Fixed(max_fee) => {
                info!("Using fixed max fee: {}", max_fee);
                Ok(*max_fee)
            }
            FeeStrategy::Query => {
                let params = ledger.fast_transfer_parameters().await?;
                info!(
                    "Fast transfer parameters: enabled={}, maxAmount={}, baseFee={}, initAuctionFee={}",
                    params.enabled, params.max_amount, params.base_fee, params.init_auction_fee
                );
                params.check_amount(amount_in)?;

                let minimum_fee = params.minimum_fee()?;
                info!("Using minimum max fee: {}", minimum_fee);
                Ok(minimum_fee)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(base_fee: u64, init_auction_fee: u64) -> FeeParameters {
        FeeParameters {
            enabled: true,
            max_amount: 1_000_000_000,
            base_fee,
            init_auction_fee,
        }
    }

    #[test]
    fn test_minimum_fee() {
        assert_eq!(params(5, 3).minimum_fee().unwrap(), 9);
        assert_eq!(params(0, 0).minimum_fee().unwrap(), 1);
    }

    #[test]
    fn test_minimum_fee_overflow() {
        let err = params(u64::MAX, 0).minimum_fee().unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::FeeOverflow {
                base_fee: u64::MAX,
                init_auction_fee: 0
            })
        );
        assert!(params(u64::MAX - 1, 1).minimum_fee().is_err());
    }

    #[test]
    fn test_check_amount() {
        let mut p = params(5, 3);
        assert!(p.check_amount(1_000_000_000).is_ok());

        let err = p.check_amount(1_000_000_001).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrderError>(),
            Some(OrderError::AmountAboveFastLimit { .. })
        ));

        p.enabled = false;
        let err = p.check_amount(1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::FastTransfersDisabled)
        );
    }
}
