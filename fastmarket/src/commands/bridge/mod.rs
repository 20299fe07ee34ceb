pub mod allowance;
pub mod fast_order;
pub mod fees;
pub mod params;
pub mod receipt;

pub use fast_order::{place_fast_market_order, SubmissionResult};
pub use fees::{FeeParameters, FeeStrategy};
pub use params::{address_to_bytes32, FastMarketOrder, OrderRequest};
