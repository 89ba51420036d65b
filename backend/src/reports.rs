//! Recent protest coverage for a city from a news search API, with keyword
//! filtering and a lexicon sentiment summary.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SEARCH_TERMS: [&str; 3] = ["protest", "demonstration", "rally"];
const LOOKBACK_DAYS: i64 = 30;
const MAX_PAGE_SIZE: usize = 20;
pub const DEFAULT_REPORT_LIMIT: usize = 50;
const MAX_TEXT_CHARS: usize = 500;
const POLARITY_THRESHOLD: f64 = 0.1;
const INSIGHT_THRESHOLD: f64 = 0.3;
const TOP_THEMES: usize = 10;
const TOP_SOURCES: usize = 5;

const POSITIVE_WORDS: &[&str] = &[
    "peaceful", "calm", "support", "supported", "hope", "celebrate", "celebrated", "unity",
    "safe", "success", "successful", "win", "wins", "joy", "solidarity", "praise", "praised",
    "agree", "agreement", "good", "great", "orderly",
];
const NEGATIVE_WORDS: &[&str] = &[
    "violence", "violent", "clash", "clashes", "clashed", "riot", "riots", "arrest", "arrests",
    "arrested", "injured", "injuries", "tear", "killed", "dead", "death", "chaos", "anger",
    "angry", "attack", "attacked", "fear", "conflict", "destroyed", "unrest", "looting", "bad",
];
const GENERIC_TERMS: &[&str] = &[
    "protest", "protests", "protesters", "march", "marches", "rally", "rallies",
    "demonstration", "demonstrations",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportsError {
    #[error("city is empty")]
    EmptyCity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsReport {
    pub title: String,
    pub text: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub url: String,
    /// Polarity in -1.0..=1.0.
    pub sentiment: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysis {
    pub total: usize,
    pub sentiment: SentimentBreakdown,
    pub top_themes: Vec<(String, usize)>,
    pub top_sources: Vec<(String, usize)>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityReports {
    pub city: String,
    pub filtered_by: Vec<String>,
    pub reports: Vec<NewsReport>,
    pub analysis: ReportAnalysis,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    source: ArticleSource,
    author: Option<String>,
    #[serde(default)]
    title: String,
    description: Option<String>,
    #[serde(default)]
    url: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Lexicon polarity: `(positive - negative) / (positive + negative)`, 0 when
/// no sentiment word occurs. Rounded to 3 decimals.
pub fn sentiment(text: &str) -> f64 {
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in words(text) {
        if POSITIVE_WORDS.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            negative += 1;
        }
    }
    let hits = positive + negative;
    if hits == 0 {
        return 0.0;
    }
    let polarity = (positive as f64 - negative as f64) / hits as f64;
    (polarity * 1000.0).round() / 1000.0
}

/// Comma-separated keywords, trimmed and lower-cased; blanks dropped.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Keeps reports whose title or text mentions any keyword. No keywords keeps all.
pub fn filter_by_keywords(reports: Vec<NewsReport>, keywords: &[String]) -> Vec<NewsReport> {
    if keywords.is_empty() {
        return reports;
    }
    reports
        .into_iter()
        .filter(|report| {
            let haystack = format!("{} {}", report.title, report.text).to_lowercase();
            keywords.iter().any(|k| haystack.contains(k.as_str()))
        })
        .collect()
}

fn top_counts(counts: HashMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

pub fn analyze(reports: &[NewsReport]) -> ReportAnalysis {
    if reports.is_empty() {
        return ReportAnalysis::default();
    }

    let positive = reports.iter().filter(|r| r.sentiment > POLARITY_THRESHOLD).count();
    let negative = reports.iter().filter(|r| r.sentiment < -POLARITY_THRESHOLD).count();
    let average = reports.iter().map(|r| r.sentiment).sum::<f64>() / reports.len() as f64;
    let average = (average * 1000.0).round() / 1000.0;

    let mut themes = HashMap::new();
    for word in reports.iter().flat_map(|r| words(&r.title)) {
        if word.chars().count() > 4 && !GENERIC_TERMS.contains(&word.as_str()) {
            *themes.entry(word).or_insert(0) += 1;
        }
    }
    let mut sources = HashMap::new();
    for report in reports {
        *sources.entry(report.source.clone()).or_insert(0) += 1;
    }

    let mut insights = Vec::new();
    if average < -INSIGHT_THRESHOLD {
        insights.push("High negative sentiment detected - potential for escalation".to_string());
    } else if average > INSIGHT_THRESHOLD {
        insights.push("Positive sentiment suggests peaceful demonstrations".to_string());
    }
    if sources.len() >= 3 {
        insights.push("Covered by several outlets - likely a major event".to_string());
    }

    ReportAnalysis {
        total: reports.len(),
        sentiment: SentimentBreakdown {
            positive,
            negative,
            neutral: reports.len() - positive - negative,
            average,
        },
        top_themes: top_counts(themes, TOP_THEMES),
        top_sources: top_counts(sources, TOP_SOURCES),
        insights,
    }
}

fn truncate_text(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_TEXT_CHARS).collect();
    format!("{cut}...")
}

pub struct ReportsClient {
    client: Client,
    news_url: String,
    api_key: Option<String>,
}

impl ReportsClient {
    pub fn new(client: Client, news_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            news_url: news_url.into(),
            api_key,
        }
    }

    /// Searches, filters and summarises coverage of `city`.
    pub async fn city_reports(
        &self,
        city: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<CityReports, ReportsError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ReportsError::EmptyCity);
        }
        let reports = filter_by_keywords(self.search(city, limit).await, keywords);
        Ok(CityReports {
            city: city.to_string(),
            filtered_by: keywords.to_vec(),
            analysis: analyze(&reports),
            reports,
            searched_at: Utc::now(),
        })
    }

    /// Articles from the last 30 days mentioning `city`, newest first and
    /// deduplicated by URL. Failures yield fewer (or no) reports.
    pub async fn search(&self, city: &str, limit: usize) -> Vec<NewsReport> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!("news search disabled, no NEWS_API_KEY");
            return Vec::new();
        };
        let url = format!("{}/v2/everything", self.news_url.trim_end_matches('/'));
        let from = (Utc::now() - Duration::days(LOOKBACK_DAYS))
            .format("%Y-%m-%d")
            .to_string();
        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let city_lower = city.to_lowercase();

        let mut seen = HashSet::new();
        let mut reports = Vec::new();
        for term in SEARCH_TERMS {
            let query = format!("{city} {term}");
            let result: Result<EverythingResponse, reqwest::Error> = async {
                self.client
                    .get(&url)
                    .query(&[
                        ("q", query.as_str()),
                        ("language", "en"),
                        ("sortBy", "publishedAt"),
                        ("from", from.as_str()),
                        ("pageSize", page_size.as_str()),
                        ("apiKey", key),
                    ])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await
            }
            .await;

            let articles = match result {
                Ok(body) => body.articles,
                Err(err) => {
                    tracing::warn!("news search for {query:?} failed: {err}");
                    continue;
                }
            };
            for article in articles {
                let description = article.description.unwrap_or_default();
                let mentions_city = article.title.to_lowercase().contains(&city_lower)
                    || description.to_lowercase().contains(&city_lower);
                if !mentions_city || article.url.is_empty() || !seen.insert(article.url.clone()) {
                    continue;
                }
                reports.push(NewsReport {
                    sentiment: sentiment(&format!("{} {description}", article.title)),
                    text: truncate_text(&description),
                    title: article.title,
                    author: article.author.unwrap_or_else(|| "unknown".to_string()),
                    published_at: article.published_at,
                    source: article.source.name.unwrap_or_else(|| "unknown".to_string()),
                    url: article.url,
                });
            }
        }

        reports.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        reports.truncate(limit);
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(title: &str, text: &str, source: &str) -> NewsReport {
        NewsReport {
            title: title.to_string(),
            text: text.to_string(),
            author: "unknown".to_string(),
            published_at: Utc::now(),
            source: source.to_string(),
            url: format!("https://news.test/{}", title.len()),
            sentiment: sentiment(&format!("{title} {text}")),
        }
    }

    #[test]
    fn sentiment_polarity() {
        assert_eq!(sentiment("A peaceful and calm march"), 1.0);
        assert_eq!(sentiment("Riot police clash, dozens arrested"), -1.0);
        assert_eq!(sentiment("Peaceful start, violent end, arrests made"), -0.333);
        assert_eq!(sentiment("Crowd gathers at the square"), 0.0);
    }

    #[test]
    fn keywords_are_trimmed_and_lowercased() {
        assert_eq!(parse_keywords(" Police, ARREST ,,"), vec!["police", "arrest"]);
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn keyword_filter_matches_title_or_text() {
        let reports = vec![
            report("Police line at city hall", "", "A"),
            report("Students gather", "several arrests reported", "B"),
            report("Teachers strike", "schools closed", "C"),
        ];
        let kept = filter_by_keywords(reports.clone(), &parse_keywords("police,arrest"));
        assert_eq!(kept.len(), 2);
        assert_eq!(filter_by_keywords(reports, &[]).len(), 3);
    }

    #[test]
    fn analysis_counts_and_insights() {
        let reports = vec![
            report("Violent clashes downtown", "riot police", "Wire"),
            report("Clashes continue downtown", "injured and arrested", "Wire"),
            report("Downtown vigil", "", "Daily"),
        ];
        let analysis = analyze(&reports);
        assert_eq!(analysis.total, 3);
        assert_eq!(analysis.sentiment.negative, 2);
        assert_eq!(analysis.sentiment.neutral, 1);
        assert_eq!(analysis.sentiment.average, -0.667);
        assert_eq!(analysis.top_themes[0], ("downtown".to_string(), 3));
        assert_eq!(analysis.top_sources[0], ("Wire".to_string(), 2));
        assert_eq!(
            analysis.insights,
            vec!["High negative sentiment detected - potential for escalation"]
        );
    }

    #[test]
    fn empty_analysis_is_zeroed() {
        assert_eq!(analyze(&[]), ReportAnalysis::default());
    }

    #[test]
    fn long_text_is_truncated() {
        let text = "x".repeat(600);
        assert_eq!(truncate_text(&text).chars().count(), 503);
        assert_eq!(truncate_text("short"), "short");
    }

    #[tokio::test]
    async fn search_without_key_is_empty() {
        let client = ReportsClient::new(Client::new(), "http://127.0.0.1:9", None);
        assert!(client.search("Jakarta", 10).await.is_empty());
        assert!(matches!(
            client.city_reports("  ", &[], 10).await,
            Err(ReportsError::EmptyCity)
        ));
    }
}
