use crate::domain::market::{CompanyProfile, NewsItem, Quote};
use crate::market::{MarketDataClient, MarketDataError};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory market data for unit tests. Unknown tickers answer `NotFound`.
#[derive(Debug, Default)]
pub struct FakeMarketData {
    pub quotes: HashMap<String, Quote>,
    pub profiles: HashMap<String, CompanyProfile>,
    pub news: HashMap<String, Vec<NewsItem>>,
    pub failing: HashMap<String, MarketDataError>,
    pub news_error: Option<MarketDataError>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMarketData {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        let mut out = Self::default();
        for (ticker, price) in prices {
            out.quotes.insert(ticker.to_string(), quote(ticker, *price));
        }
        out
    }

    pub fn fail(mut self, ticker: &str, err: MarketDataError) -> Self {
        self.failing.insert(ticker.to_string(), err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn quote(ticker: &str, price: f64) -> Quote {
    Quote {
        ticker: ticker.to_string(),
        name: Some(format!("{ticker} Inc.")),
        price,
        change: Some(1.5),
        change_percent: Some(0.75),
        day_low: Some(price - 1.0),
        day_high: Some(price + 1.0),
        year_low: Some(price - 10.0),
        year_high: Some(price + 10.0),
        market_cap: Some(1_000_000_000.0),
        pe: Some(20.0),
        eps: Some(5.0),
        volume: Some(1_000_000.0),
        avg_volume: Some(2_000_000.0),
    }
}

#[async_trait::async_trait]
impl MarketDataClient for FakeMarketData {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, MarketDataError> {
        self.record(format!("quote/{ticker}"));
        if let Some(err) = self.failing.get(ticker) {
            return Err(err.clone());
        }
        self.quotes
            .get(ticker)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        self.record(format!("profile/{ticker}"));
        self.profiles
            .get(ticker)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    async fn fetch_news(
        &self,
        ticker: &str,
        _limit: usize,
    ) -> Result<Vec<NewsItem>, MarketDataError> {
        self.record(format!("news/{ticker}"));
        if let Some(err) = &self.news_error {
            return Err(err.clone());
        }
        Ok(self.news.get(ticker).cloned().unwrap_or_default())
    }
}
