pub mod registry;
pub mod traits;

// API provider implementations
pub mod coincap;
pub mod finnhub;
pub mod frankfurter;
mod http;
pub mod metals_dev;
pub mod savings;
#[cfg(not(target_arch = "wasm32"))]
pub mod yahoo_finance;
