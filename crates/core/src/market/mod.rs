use crate::domain::market::{CompanyProfile, NewsItem, Quote};
use std::fmt;

pub mod fmp;

pub use fmp::FmpClient;

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, MarketDataError>;

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError>;

    /// An empty list is a valid answer here, not `NotFound`.
    async fn fetch_news(&self, ticker: &str, limit: usize)
        -> Result<Vec<NewsItem>, MarketDataError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// Upstream answered with something other than 200.
    Http { status: u16 },
    /// Upstream answered 200 with an empty array.
    NotFound { ticker: String },
    Transport(String),
    Decode(String),
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status } => write!(f, "API Error: {status}"),
            Self::NotFound { ticker } => write!(f, "No data found for ticker {ticker}"),
            Self::Transport(detail) => write!(f, "market data request failed: {detail}"),
            Self::Decode(detail) => write!(f, "unexpected market data payload: {detail}"),
        }
    }
}

impl std::error::Error for MarketDataError {}

#[cfg(test)]
pub(crate) mod fake;
