pub mod domain;
pub mod format;
pub mod llm;
pub mod market;
pub mod recommend;
pub mod router;
pub mod storage;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";
    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
    pub const DEFAULT_CONVERSATION_LOG_DIR: &str = "conversation_logs";

    const DEFAULT_MARKET_DATA_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub market_data_api_key: Option<String>,
        pub market_data_base_url: String,
        pub market_data_timeout_secs: u64,
        pub gemini_base_url: String,
        pub gemini_model: String,
        pub gemini_timeout_secs: u64,
        pub conversation_log_dir: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                market_data_api_key: non_empty_var("MARKET_DATA_API_KEY"),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_MARKET_DATA_BASE_URL.to_string()),
                market_data_timeout_secs: parse_var("MARKET_DATA_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_MARKET_DATA_TIMEOUT_SECS),
                gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                gemini_model: non_empty_var("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                gemini_timeout_secs: parse_var("GEMINI_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
                conversation_log_dir: non_empty_var("CONVERSATION_LOG_DIR")
                    .unwrap_or_else(|| DEFAULT_CONVERSATION_LOG_DIR.to_string()),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_market_data_api_key(&self) -> anyhow::Result<&str> {
            self.market_data_api_key
                .as_deref()
                .context("MARKET_DATA_API_KEY is required")
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                market_data_api_key: None,
                market_data_base_url: DEFAULT_MARKET_DATA_BASE_URL.to_string(),
                market_data_timeout_secs: DEFAULT_MARKET_DATA_TIMEOUT_SECS,
                gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
                gemini_timeout_secs: DEFAULT_GEMINI_TIMEOUT_SECS,
                conversation_log_dir: DEFAULT_CONVERSATION_LOG_DIR.to_string(),
                sentry_dsn: None,
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_var(key: &str) -> anyhow::Result<Option<u64>> {
        match non_empty_var(key) {
            Some(s) => s
                .parse::<u64>()
                .map(Some)
                .with_context(|| format!("{key} must be an unsigned integer (got {s:?})")),
            None => Ok(None),
        }
    }

}
