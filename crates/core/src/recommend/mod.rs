use crate::domain::profile::RiskTier;
use crate::domain::recommendation::{Prediction, PredictionFailure, RecommendationRun};
use crate::market::{MarketDataClient, MarketDataError};
use std::sync::Arc;

pub mod sampler;

pub use sampler::{GrowthSampler, ThreadRngSampler};

pub const LOW_RISK_TICKERS: [&str; 5] = ["MSFT", "JNJ", "PG", "KO", "VZ"];
pub const MEDIUM_RISK_TICKERS: [&str; 5] = ["AAPL", "GOOGL", "AMZN", "V", "MA"];
pub const HIGH_RISK_TICKERS: [&str; 5] = ["TSLA", "NVDA", "AMD", "SQ", "SHOP"];

pub const MAX_PICKS: usize = 5;
const AGE_TILT_COUNT: usize = 2;
const YOUNG_INVESTOR_MAX_AGE: u32 = 30;
const SENIOR_INVESTOR_MIN_AGE: u32 = 60;

pub fn universe(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::Low => &LOW_RISK_TICKERS,
        RiskTier::Medium => &MEDIUM_RISK_TICKERS,
        RiskTier::High => &HIGH_RISK_TICKERS,
    }
}

/// Tier universe plus the age tilt, before truncation.
pub fn candidate_tickers(age: u32, tier: RiskTier) -> Vec<&'static str> {
    let mut out = universe(tier).to_vec();
    if age < YOUNG_INVESTOR_MAX_AGE && tier != RiskTier::High {
        out.extend_from_slice(&HIGH_RISK_TICKERS[..AGE_TILT_COUNT]);
    } else if age > SENIOR_INVESTOR_MIN_AGE && tier != RiskTier::Low {
        out.extend_from_slice(&LOW_RISK_TICKERS[..AGE_TILT_COUNT]);
    }
    out
}

pub fn select_tickers(age: u32, tier: RiskTier) -> Vec<&'static str> {
    let mut out = candidate_tickers(age, tier);
    out.truncate(MAX_PICKS);
    out
}

pub struct RecommendationEngine {
    market: Arc<dyn MarketDataClient>,
    sampler: Arc<dyn GrowthSampler>,
}

impl RecommendationEngine {
    pub fn new(market: Arc<dyn MarketDataClient>, sampler: Arc<dyn GrowthSampler>) -> Self {
        Self { market, sampler }
    }

    pub async fn recommend(&self, age: u32, tier: RiskTier) -> RecommendationRun {
        let mut run = RecommendationRun::default();

        // Sequential on purpose: one upstream call in flight per request.
        for ticker in select_tickers(age, tier) {
            match self.predict_one(ticker, tier).await {
                Ok(prediction) => run.predictions.push(prediction),
                Err(err) => {
                    tracing::warn!(
                        ticker,
                        provider = self.market.provider_name(),
                        error = %err,
                        "prediction failed; dropping ticker"
                    );
                    run.failures.push(PredictionFailure {
                        ticker: ticker.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        rank_by_expected_return(&mut run.predictions);
        run
    }

    async fn predict_one(&self, ticker: &str, tier: RiskTier) -> Result<Prediction, MarketDataError> {
        let quote = self.market.fetch_quote(ticker).await?;
        if !quote.price.is_finite() || quote.price <= 0.0 {
            return Err(MarketDataError::Decode(format!(
                "{ticker}: unusable price {}",
                quote.price
            )));
        }

        let (low, high) = tier.growth_range();
        let growth_factor = self.sampler.sample(low, high);

        Ok(Prediction {
            ticker: ticker.to_string(),
            name: quote.display_name().to_string(),
            current_price: quote.price,
            predicted_price: quote.price * growth_factor,
            expected_return: (growth_factor - 1.0) * 100.0,
            risk_tier: tier,
        })
    }
}

/// Highest expected return first. Tie order is whatever the stable sort leaves.
pub fn rank_by_expected_return(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| {
        b.expected_return
            .partial_cmp(&a.expected_return)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
