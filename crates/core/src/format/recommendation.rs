use crate::domain::profile::RiskTier;
use crate::domain::recommendation::Prediction;

pub const NO_PREDICTIONS_MESSAGE: &str =
    "I couldn't generate stock predictions at this time. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    Under35,
    From35To54,
    From55,
}

impl AgeBracket {
    pub fn of(age: u32) -> Self {
        match age {
            0..=34 => Self::Under35,
            35..=54 => Self::From35To54,
            _ => Self::From55,
        }
    }
}

pub fn allocation_advice(age: u32, risk_tier: RiskTier) -> &'static str {
    let high = risk_tier == RiskTier::High;
    match (AgeBracket::of(age), high) {
        (AgeBracket::Under35, true) => {
            "As a younger investor with high risk tolerance, you can allocate 80-90% of your portfolio to these growth-oriented stocks. Consider dollar-cost averaging to manage volatility."
        }
        (AgeBracket::Under35, false) => {
            "At your age, you have time to recover from market downturns. Consider allocating 70-80% of your portfolio to these stocks, with the remainder in bonds or stable investments."
        }
        (AgeBracket::From35To54, true) => {
            "With your moderate age and high risk tolerance, consider allocating 70-75% to these stocks. Begin building some stability with 25-30% in bonds or dividend stocks."
        }
        (AgeBracket::From35To54, false) => {
            "At this stage in life, balance growth and stability with a 60-65% allocation to these stocks and 35-40% in more conservative investments."
        }
        (AgeBracket::From55, true) => {
            "Despite your high risk tolerance, at your age, consider limiting these stock picks to 50-60% of your portfolio, with the remainder in income-generating investments."
        }
        (AgeBracket::From55, false) => {
            "As you approach retirement, focus on capital preservation. Limit these stocks to 40-50% of your portfolio, with the remainder in bonds, dividend stocks, and cash equivalents."
        }
    }
}

pub fn format_recommendations(
    predictions: &[Prediction],
    age: u32,
    risk_tier: RiskTier,
    horizon: &str,
) -> String {
    if predictions.is_empty() {
        return NO_PREDICTIONS_MESSAGE.to_string();
    }

    let mut out = String::from("## Stock Recommendations\n\n");
    out.push_str(&format!(
        "Based on your profile (Age: {age}, Risk Tolerance: {risk_tier}, Horizon: {horizon}), here are my stock recommendations:\n\n"
    ));

    out.push_str("| Ticker | Name | Current Price | Predicted Price | Expected Return | Risk |\n");
    out.push_str("|--------|------|---------------|-----------------|-----------------|------|\n");
    for p in predictions {
        out.push_str(&format!(
            "| {} | {} | ${:.2} | ${:.2} | {:.2}% | {} |\n",
            p.ticker, p.name, p.current_price, p.predicted_price, p.expected_return, p.risk_tier
        ));
    }

    out.push_str("\n### Investment Strategy\n\n");
    out.push_str(allocation_advice(age, risk_tier));
    out
}
