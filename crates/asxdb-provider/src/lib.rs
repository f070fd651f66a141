pub mod client;
pub mod error;
pub mod parse;
pub mod types;

pub use client::AlphaVantageClient;
pub use error::ProviderError;
