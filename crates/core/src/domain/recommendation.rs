use crate::domain::profile::RiskTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub ticker: String,
    pub name: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub expected_return: f64,
    pub risk_tier: RiskTier,
}

/// A ticker that was dropped from a run because its quote could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRun {
    /// Sorted by expected return, highest first.
    pub predictions: Vec<Prediction>,
    pub failures: Vec<PredictionFailure>,
}
