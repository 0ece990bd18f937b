use crate::domain::market::{CompanyProfile, NewsItem, Quote};
use crate::format::{group_thousands, truncate_chars};

pub const MAX_NEWS_ITEMS: usize = 3;
const NEWS_SNIPPET_CHARS: usize = 150;
const NOT_AVAILABLE: &str = "N/A";

pub fn format_stock_info(
    quote: &Quote,
    profile: Option<&CompanyProfile>,
    news: &[NewsItem],
) -> String {
    let ticker = quote.ticker.as_str();
    let company_name = profile
        .map(|p| p.company_name.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(ticker);

    let mut out = format!("## {company_name} ({ticker}) Stock Information\n\n");
    out.push_str(&format!("**Current Price**: ${:.2}\n", quote.price));
    out.push_str(&format!(
        "**Change**: {} ({})\n",
        dollars(quote.change),
        percent(quote.change_percent)
    ));
    out.push_str(&format!(
        "**Day Range**: {} - {}\n",
        dollars(quote.day_low),
        dollars(quote.day_high)
    ));
    out.push_str(&format!(
        "**Year Range**: {} - {}\n",
        dollars(quote.year_low),
        dollars(quote.year_high)
    ));
    out.push_str(&format!(
        "**Market Cap**: {}\n",
        quote
            .market_cap
            .map(|v| format!("${}", group_thousands(v)))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    ));

    if let Some(pe) = quote.pe.filter(|v| *v != 0.0) {
        out.push_str(&format!("**P/E Ratio**: {pe:.2}\n"));
    }
    if let Some(eps) = quote.eps.filter(|v| *v != 0.0) {
        out.push_str(&format!("**EPS**: ${eps:.2}\n"));
    }

    out.push_str(&format!(
        "**Volume**: {} (Avg: {})\n",
        count(quote.volume),
        count(quote.avg_volume)
    ));

    if !news.is_empty() {
        out.push_str("\n## Recent News\n\n");
        for item in news.iter().take(MAX_NEWS_ITEMS) {
            out.push_str(&format!("**{}**\n", item.title));
            out.push_str(&format!("*{}*\n", item.published_date));
            out.push_str(&format!(
                "{}...\n\n",
                truncate_chars(&item.text, NEWS_SNIPPET_CHARS)
            ));
        }
    }

    out
}

fn dollars(value: Option<f64>) -> String {
    value
        .map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}%"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn count(value: Option<f64>) -> String {
    value
        .map(group_thousands)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote() -> Quote {
        Quote {
            ticker: "AAPL".to_string(),
            name: Some("Apple Inc.".to_string()),
            price: 189.844,
            change: Some(-2.3),
            change_percent: Some(-1.2),
            day_low: Some(187.1),
            day_high: Some(190.05),
            year_low: Some(164.08),
            year_high: Some(199.62),
            market_cap: Some(2_950_000_000_000.0),
            pe: Some(29.523),
            eps: Some(0.0),
            volume: Some(51_234_567.0),
            avg_volume: Some(58_000_000.0),
        }
    }

    #[test]
    fn renders_header_price_and_volume_lines() {
        let profile = CompanyProfile {
            ticker: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
        };
        let out = format_stock_info(&quote(), Some(&profile), &[]);

        assert!(out.starts_with("## Apple Inc. (AAPL) Stock Information\n\n"));
        assert!(out.contains("**Current Price**: $189.84\n"));
        assert!(out.contains("**Change**: $-2.30 (-1.20%)\n"));
        assert!(out.contains("**Day Range**: $187.10 - $190.05\n"));
        assert!(out.contains("**Market Cap**: $2,950,000,000,000\n"));
        assert!(out.contains("**P/E Ratio**: 29.52\n"));
        assert!(out.contains("**Volume**: 51,234,567 (Avg: 58,000,000)\n"));
        assert!(!out.contains("Recent News"));
    }

    #[test]
    fn omits_zero_and_missing_ratios() {
        let mut q = quote();
        q.pe = None;
        let out = format_stock_info(&q, None, &[]);
        assert!(!out.contains("P/E Ratio"));
        // eps is Some(0.0)
        assert!(!out.contains("EPS"));
        assert!(out.starts_with("## AAPL (AAPL) Stock Information"));
    }

    #[test]
    fn missing_display_fields_render_as_not_available() {
        let mut q = quote();
        q.change_percent = None;
        q.day_high = None;
        q.market_cap = None;
        q.avg_volume = None;
        let out = format_stock_info(&q, None, &[]);

        assert!(out.contains("**Current Price**: $189.84\n"));
        assert!(out.contains("**Change**: $-2.30 (N/A)\n"));
        assert!(out.contains("**Day Range**: $187.10 - N/A\n"));
        assert!(out.contains("**Market Cap**: N/A\n"));
        assert!(out.contains("**Volume**: 51,234,567 (Avg: N/A)\n"));
    }

    #[test]
    fn renders_at_most_three_truncated_news_items() {
        let long_text = "x".repeat(400);
        let news: Vec<NewsItem> = (0..4)
            .map(|i| NewsItem {
                title: format!("Headline {i}"),
                published_date: "2026-01-27 10:00:00".to_string(),
                text: long_text.clone(),
            })
            .collect();

        let out = format_stock_info(&quote(), None, &news);
        assert!(out.contains("\n## Recent News\n\n**Headline 0**\n*2026-01-27 10:00:00*\n"));
        assert!(out.contains(&format!("{}...\n\n", "x".repeat(150))));
        assert!(!out.contains(&"x".repeat(151)));
        assert!(out.contains("Headline 2"));
        assert!(!out.contains("Headline 3"));
    }
}
