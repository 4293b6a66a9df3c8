//! One-shot PancakeSwap sniper: wait for the `{token, WBNB}` pool to be created, buy once, exit.

pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod executor;
pub mod initializer;
pub mod logging;
pub mod monitor;

pub use config::Config;
pub use error::{Result, SniperError};
pub use executor::{BuyExecutor, BuyResult, Buyer, GasPricing};
pub use initializer::{initialize, TokenMetadata};
pub use monitor::{MonitorState, PairMonitor};
