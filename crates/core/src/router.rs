use crate::domain::profile::UserProfile;
use crate::format::stock::MAX_NEWS_ITEMS;
use crate::format::{format_recommendations, format_stock_info};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{GenerateInput, LlmClient};
use crate::market::{MarketDataClient, MarketDataError};
use crate::recommend::{GrowthSampler, RecommendationEngine};
use std::sync::Arc;

const STOCK_PREFIX: &str = "stock:";
const PREDICTION_TRIGGERS: [&str; 2] = ["predict", "recommend stocks"];
const INVESTMENT_TERMS: [&str; 6] = ["invest", "portfolio", "stock", "fund", "mutual", "bond"];

pub const SET_PROFILE_MESSAGE: &str = "To provide stock predictions, I need your profile information. Please make sure your age and risk tolerance are set in the User Profile section.";

pub const PORTFOLIO_ADVICE_MESSAGE: &str = "Based on your profile, I recommend a diversified portfolio with a mix of stocks, bonds, and other assets. For specific investment advice, please consult with a financial advisor.";

pub const NO_CREDENTIAL_MESSAGE: &str = "I'm a financial assistant that can help with investment advice, stock information, and general financial questions. Try asking about stocks, investment strategies, or financial concepts.";

pub const LLM_UNAVAILABLE_MESSAGE: &str =
    "I'm sorry, I couldn't process your request at this time. Please try again later.";

pub const MISSING_TICKER_MESSAGE: &str =
    "Please include a ticker symbol after the prefix, for example `stock: AAPL`.";

pub const FINANCIAL_ASSISTANT_PREAMBLE: &str = "You are a helpful financial assistant. Your goal is to provide accurate, \
helpful information about investments, financial planning, and market analysis. \
Always be professional, clear, and concise in your responses.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    StockLookup { ticker: String },
    Prediction,
    InvestmentAdvice,
    OpenEnded,
}

/// First match wins; all checks are case-insensitive.
pub fn classify(query: &str) -> QueryKind {
    let has_stock_prefix = query
        .get(..STOCK_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(STOCK_PREFIX));
    if has_stock_prefix {
        let ticker = query[STOCK_PREFIX.len()..].trim().to_uppercase();
        return QueryKind::StockLookup { ticker };
    }

    let lower = query.to_lowercase();
    if PREDICTION_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return QueryKind::Prediction;
    }
    if INVESTMENT_TERMS.iter().any(|t| lower.contains(t)) {
        return QueryKind::InvestmentAdvice;
    }
    QueryKind::OpenEnded
}

pub struct QueryRouter {
    market: Arc<dyn MarketDataClient>,
    engine: RecommendationEngine,
    llm: Arc<dyn LlmClient>,
}

impl QueryRouter {
    pub fn new(
        market: Arc<dyn MarketDataClient>,
        llm: Arc<dyn LlmClient>,
        sampler: Arc<dyn GrowthSampler>,
    ) -> Self {
        Self {
            engine: RecommendationEngine::new(market.clone(), sampler),
            market,
            llm,
        }
    }

    /// Answers one chat message. Upstream failures come back as user-facing text.
    pub async fn respond(
        &self,
        query: &str,
        profile: Option<&UserProfile>,
        api_key: Option<&str>,
    ) -> String {
        // An empty profile object counts as no profile at all.
        let profile = profile.filter(|p| !p.is_empty());
        let kind = classify(query);
        tracing::debug!(?kind, has_profile = profile.is_some(), "classified query");

        match kind {
            QueryKind::StockLookup { ticker } => self.lookup_stock(&ticker).await,
            QueryKind::Prediction => match profile {
                Some(p) => self.recommend(p).await,
                None => SET_PROFILE_MESSAGE.to_string(),
            },
            QueryKind::InvestmentAdvice => {
                let prefix = profile.map(UserProfile::context_prefix).unwrap_or_default();
                format!("{prefix}{PORTFOLIO_ADVICE_MESSAGE}")
            }
            QueryKind::OpenEnded => self.ask_llm(query, api_key).await,
        }
    }

    pub async fn lookup_stock(&self, ticker: &str) -> String {
        if ticker.is_empty() {
            return MISSING_TICKER_MESSAGE.to_string();
        }

        let quote = match self.market.fetch_quote(ticker).await {
            Ok(q) => q,
            Err(err @ MarketDataError::NotFound { .. }) => return err.to_string(),
            Err(err) => {
                tracing::warn!(ticker, error = %err, "quote fetch failed");
                return format!("Error retrieving stock data: {err}");
            }
        };

        let profile = match self.market.fetch_profile(ticker).await {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(ticker, error = %err, "profile fetch failed; using ticker as name");
                None
            }
        };

        let news = match self.market.fetch_news(ticker, MAX_NEWS_ITEMS).await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "news fetch failed; rendering without news");
                Vec::new()
            }
        };

        format_stock_info(&quote, profile.as_ref(), &news)
    }

    pub async fn recommend(&self, profile: &UserProfile) -> String {
        let age = profile.age_or_default();
        let tier = profile.risk_tier();
        let run = self.engine.recommend(age, tier).await;
        if !run.failures.is_empty() {
            tracing::info!(
                dropped = run.failures.len(),
                kept = run.predictions.len(),
                "recommendation run dropped tickers"
            );
        }
        format_recommendations(&run.predictions, age, tier, profile.horizon_or_default())
    }

    async fn ask_llm(&self, query: &str, api_key: Option<&str>) -> String {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return NO_CREDENTIAL_MESSAGE.to_string();
        };

        let input = GenerateInput::new(api_key, FINANCIAL_ASSISTANT_PREAMBLE, query);
        match self.llm.generate(input).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(provider = ?self.llm.provider(), error = %err, "LLM fallback failed");
                let diag = err.downcast_ref::<LlmDiagnosticsError>();
                if let Some(raw) = diag.and_then(|d| d.raw_output.as_deref()) {
                    tracing::debug!(raw_output = raw, "LLM upstream body");
                }
                match diag {
                    Some(diag) if diag.is_http() => LLM_UNAVAILABLE_MESSAGE.to_string(),
                    _ => format!("I'm sorry, I encountered an error: {err}"),
                }
            }
        }
    }
}
