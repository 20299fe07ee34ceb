pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;

#[cfg(feature = "client")]
pub mod rpc;

// Re-export commonly used types
pub use client::{FastMarketClient, FastMarketClientBuilder};
pub use config::{EndpointConfig, NetworkTable};
pub use error::OrderError;
pub use ledger::{Ledger, OrderReceipt};
