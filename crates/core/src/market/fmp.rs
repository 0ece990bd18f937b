use crate::config::Settings;
use crate::domain::market::{CompanyProfile, NewsItem, Quote};
use crate::market::{MarketDataClient, MarketDataError};
use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Financial Modeling Prep style REST client: every endpoint answers with a JSON array and takes
/// the key as an `apikey` query parameter.
#[derive(Debug, Clone)]
pub struct FmpClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl FmpClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_market_data_api_key()?;
        Self::with_timeout(
            &settings.market_data_base_url,
            api_key,
            Duration::from_secs(settings.market_data_timeout_secs),
        )
    }

    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build market data http client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid market data base url {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("market data base url {base_url} cannot take path segments");
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded, so a ticker such as
    /// `A/B` or `X?y=1` stays a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_array<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Vec<T>, MarketDataError> {
        let path = segments.join("/");
        let res = self
            .http
            .get(self.url(segments))
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            // The URL carries the API key; keep it out of anything user-facing.
            .map_err(|e| MarketDataError::Transport(e.without_url().to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            tracing::warn!(%status, %path, "market data request returned non-200");
            return Err(MarketDataError::Http {
                status: status.as_u16(),
            });
        }

        let text = res
            .text()
            .await
            .map_err(|e| MarketDataError::Transport(e.without_url().to_string()))?;
        serde_json::from_str::<Vec<T>>(&text)
            .map_err(|e| MarketDataError::Decode(format!("{path}: {e}")))
    }

    async fn get_first<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        ticker: &str,
    ) -> Result<T, MarketDataError> {
        self.get_array::<T>(&[endpoint, ticker], &[])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::NotFound {
                ticker: ticker.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl MarketDataClient for FmpClient {
    fn provider_name(&self) -> &'static str {
        "financial_modeling_prep"
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, MarketDataError> {
        self.get_first("quote", ticker).await
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        self.get_first("profile", ticker).await
    }

    async fn fetch_news(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>, MarketDataError> {
        self.get_array(
            &["stock_news"],
            &[("tickers", ticker.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::RiskTier;
    use crate::recommend::sampler::FixedPositionSampler;
    use crate::recommend::{RecommendationEngine, LOW_RISK_TICKERS};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-key";

    const AAPL_QUOTE: &str = r#"[
        {
            "symbol": "AAPL",
            "name": "Apple Inc.",
            "price": 189.84,
            "changesPercentage": 1.23,
            "change": 2.31,
            "dayLow": 187.1,
            "dayHigh": 190.05,
            "yearHigh": 199.62,
            "yearLow": 164.08,
            "marketCap": 2950000000000,
            "volume": 51234567,
            "avgVolume": 58000000,
            "eps": 6.43,
            "pe": 29.52
        }
    ]"#;

    async fn mock_get(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .and(query_param("apikey", API_KEY))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_quote_returns_first_element() {
        let server = MockServer::start().await;
        mock_get(&server, "/quote/AAPL", 200, AAPL_QUOTE).await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let quote = client.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.ticker, "AAPL");
        assert_eq!(quote.price, 189.84);
        assert_eq!(quote.pe, Some(29.52));
    }

    #[tokio::test]
    async fn fetch_quote_maps_empty_array_to_not_found() {
        let server = MockServer::start().await;
        mock_get(&server, "/quote/NOPE", 200, "[]").await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let err = client.fetch_quote("NOPE").await.unwrap_err();
        assert_eq!(
            err,
            MarketDataError::NotFound {
                ticker: "NOPE".to_string()
            }
        );
        assert_eq!(err.to_string(), "No data found for ticker NOPE");
    }

    #[tokio::test]
    async fn fetch_quote_surfaces_http_status() {
        let server = MockServer::start().await;
        mock_get(&server, "/quote/AAPL", 403, r#"{"Error Message":"Invalid API KEY."}"#).await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let err = client.fetch_quote("AAPL").await.unwrap_err();
        assert_eq!(err, MarketDataError::Http { status: 403 });
        assert_eq!(err.to_string(), "API Error: 403");
    }

    #[tokio::test]
    async fn fetch_quote_rejects_non_array_payload() {
        let server = MockServer::start().await;
        mock_get(&server, "/quote/AAPL", 200, r#"{"unexpected": true}"#).await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let err = client.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_profile_reads_company_name() {
        let server = MockServer::start().await;
        mock_get(
            &server,
            "/profile/AAPL",
            200,
            r#"[{"symbol":"AAPL","companyName":"Apple Inc.","sector":"Technology"}]"#,
        )
        .await;
        let client = FmpClient::new(&format!("{}/", server.uri()), API_KEY).unwrap();

        let profile = client.fetch_profile("AAPL").await.unwrap();
        assert_eq!(profile.company_name, "Apple Inc.");
    }

    #[tokio::test]
    async fn fetch_news_passes_ticker_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock_news"))
            .and(query_param("tickers", "AAPL"))
            .and(query_param("limit", "3"))
            .and(query_param("apikey", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"title":"A","publishedDate":"2026-01-27 10:00:00","text":"body"}]"#,
            ))
            .mount(&server)
            .await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let news = client.fetch_news("AAPL", 3).await.unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].title, "A");
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        mock_get(&server, "/api/v3/quote/AAPL", 200, AAPL_QUOTE).await;
        let client = FmpClient::new(&format!("{}/api/v3", server.uri()), API_KEY).unwrap();

        let quote = client.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.ticker, "AAPL");
    }

    #[tokio::test]
    async fn ticker_is_encoded_as_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();

        let err = client.fetch_quote("A/B").await.unwrap_err();
        assert_eq!(
            err,
            MarketDataError::NotFound {
                ticker: "A/B".to_string()
            }
        );
        client.fetch_quote("X?foo=1").await.unwrap_err();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/quote/A%2FB");
        assert_eq!(requests[1].url.path(), "/quote/X%3Ffoo=1");
        let keys: Vec<String> = requests[1]
            .url
            .query_pairs()
            .map(|(k, _)| k.into_owned())
            .collect();
        assert_eq!(keys, vec!["apikey".to_string()]);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(FmpClient::new("not a url", API_KEY).is_err());
    }

    #[tokio::test]
    async fn null_display_fields_do_not_drop_recommendations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/quote/[A-Z]+$"))
            .and(query_param("apikey", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"symbol":"MSFT","name":"Microsoft Corporation","price":410.5,
                    "changesPercentage":null,"change":null,"dayLow":null,"dayHigh":null,
                    "yearLow":null,"yearHigh":null,"marketCap":null,"volume":null,
                    "avgVolume":null,"pe":null,"eps":null}]"#,
            ))
            .mount(&server)
            .await;
        let client = FmpClient::new(&server.uri(), API_KEY).unwrap();
        let engine = RecommendationEngine::new(Arc::new(client), Arc::new(FixedPositionSampler(0.5)));

        let run = engine.recommend(40, RiskTier::Low).await;
        assert!(run.failures.is_empty(), "unexpected failures: {:?}", run.failures);
        assert_eq!(run.predictions.len(), LOW_RISK_TICKERS.len());
        assert!(run.predictions.iter().all(|p| p.current_price == 410.5));
    }
}
