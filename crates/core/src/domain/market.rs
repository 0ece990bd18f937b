use serde::{Deserialize, Serialize};

/// One element of the upstream `quote/{ticker}` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(rename = "symbol")]
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    // Everything below is display-only; upstream sends `null` for thinly traded tickers.
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default, rename = "changesPercentage")]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub year_low: Option<f64>,
    #[serde(default)]
    pub year_high: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub avg_volume: Option<f64>,
}

impl Quote {
    /// Display name, falling back to the ticker when upstream omits it.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.ticker)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(rename = "symbol")]
    pub ticker: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub published_date: String,
    #[serde(default)]
    pub text: String,
}
