use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_AGE: u32 = 30;
pub const DEFAULT_RISK: &str = "Moderate";
pub const DEFAULT_HORIZON: &str = "3-5 years";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskTier {
    /// Case-insensitive; anything that is not "low" or "high" is medium.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Inclusive uniform range the growth factor is drawn from.
    pub fn growth_range(self) -> (f64, f64) {
        match self {
            Self::Low => (0.95, 1.15),
            Self::Medium => (0.90, 1.25),
            Self::High => (0.90, 1.35),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-supplied investor profile. Lives for one request only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub horizon: Option<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.risk.is_none() && self.horizon.is_none()
    }

    pub fn age_or_default(&self) -> u32 {
        self.age.unwrap_or(DEFAULT_AGE)
    }

    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::parse_lenient(self.risk.as_deref().unwrap_or(DEFAULT_RISK))
    }

    pub fn horizon_or_default(&self) -> &str {
        self.horizon.as_deref().unwrap_or(DEFAULT_HORIZON)
    }

    /// Sentence prefix echoing the profile back; missing fields read "unknown".
    pub fn context_prefix(&self) -> String {
        let age = self
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "Based on your profile (Age: {age}, Risk Tolerance: {}, Investment Horizon: {}), ",
            self.risk.as_deref().unwrap_or("unknown"),
            self.horizon.as_deref().unwrap_or("unknown"),
        )
    }
}
