//! Daily Rune Goldberg producer
//!
//! Fetches the community goldberg tracker page and extracts the day's
//! correct rune combination: one first rune and three alternatives for the
//! second slot. Screenshot rendering of the combination table is not done
//! here; the message goes out as plain text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

use super::{Notification, Producer, ProducerError, Production};

const DEFAULT_BASE_URL: &str = "https://warbandtracker.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Producer for the daily Rune Goldberg rune combination report
pub struct RuneGoldbergProducer {
    client: Client,
    base_url: String,
}

impl RuneGoldbergProducer {
    /// Create a producer with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Http` if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, ProducerError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the tracker base URL, for testing with mock servers
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_page(&self) -> Result<String, ProducerError> {
        let url = format!("{}/goldberg", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProducerError::ServerError(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Extract the four daily runes from the tracker page
    ///
    /// The first entry is the first rune; the remaining three are the
    /// alternatives for the second slot. The tracker marks each rune with an
    /// `<img>` whose `title` names it.
    fn extract_runes(html: &str) -> Result<Vec<String>, ProducerError> {
        let Ok(selector) = Selector::parse("img[title]") else {
            return Err(ProducerError::Extraction {
                what: "rune image selector",
            });
        };

        let document = Html::parse_document(html);
        let mut runes = Vec::with_capacity(4);
        for element in document.select(&selector) {
            if runes.len() >= 4 {
                break;
            }
            if let Some(title) = element.value().attr("title") {
                if title.contains("Rune") {
                    runes.push(html_escape::decode_html_entities(title).into_owned());
                }
            }
        }

        if runes.len() < 4 {
            return Err(ProducerError::Extraction {
                what: "daily rune combinations",
            });
        }
        Ok(runes)
    }

    fn render_message(runes: &[String]) -> String {
        let base = "========== Rune Goldberg Report ==========";
        let first = format!("First Rune: {}", runes[0]);
        let second = format!("Second Runes: {}", runes[1..].join(", "));
        let end = "==========================================";
        format!("{base}\n\n{first}\n{second}\n\n\n{end}")
    }
}

#[async_trait]
impl Producer for RuneGoldbergProducer {
    fn name(&self) -> &str {
        "Rune Goldberg"
    }

    async fn produce(&self, _now: DateTime<Utc>) -> Result<Production, ProducerError> {
        let html = self.fetch_page().await?;
        let runes = Self::extract_runes(&html)?;

        tracing::debug!(first = %runes[0], "Fetched daily rune combinations");
        Ok(Production::Ready(Notification::text(Self::render_message(
            &runes,
        ))))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
        <h2>Correct Rune Combinations</h2>
        <div>
          <img src="runes/soul.gif" title="Soul Rune">
          <img src="runes/blood.gif" title="Blood Rune">
          <img src="runes/law.gif" title="Law Rune">
          <img src="runes/astral.gif" title="Astral Rune">
          <img src="decor/border.gif" title="decoration">
        </div>
        </body></html>"#;

    #[test]
    fn test_extract_runes_takes_first_four() {
        let runes = RuneGoldbergProducer::extract_runes(SAMPLE_PAGE).unwrap();
        assert_eq!(runes, vec!["Soul Rune", "Blood Rune", "Law Rune", "Astral Rune"]);
    }

    #[test]
    fn test_extract_runes_skips_non_rune_images() {
        let html = r#"
            <img title="background">
            <img title="Soul Rune">
            <img title="Blood Rune">
            <img title="Law Rune">
            <img title="Astral Rune">"#;
        let runes = RuneGoldbergProducer::extract_runes(html).unwrap();
        assert_eq!(runes[0], "Soul Rune");
        assert_eq!(runes.len(), 4);
    }

    #[test]
    fn test_extract_runes_decodes_entities() {
        let html = r#"
            <img title="Mind &amp; Body Rune">
            <img title="Soul Rune">
            <img title="Blood Rune">
            <img title="Law Rune">"#;
        let runes = RuneGoldbergProducer::extract_runes(html).unwrap();
        assert_eq!(runes[0], "Mind & Body Rune");
    }

    #[test]
    fn test_extract_runes_shortfall_is_error() {
        let html = r#"<img title="Soul Rune"><img title="Blood Rune">"#;
        let err = RuneGoldbergProducer::extract_runes(html).unwrap_err();
        assert!(matches!(err, ProducerError::Extraction { .. }));
    }

    #[test]
    fn test_render_message_format() {
        let runes: Vec<String> = ["Soul Rune", "Blood Rune", "Law Rune", "Astral Rune"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let message = RuneGoldbergProducer::render_message(&runes);

        assert!(message.starts_with("========== Rune Goldberg Report =========="));
        assert!(message.contains("First Rune: Soul Rune"));
        assert!(message.contains("Second Runes: Blood Rune, Law Rune, Astral Rune"));
        assert!(message.ends_with("=========================================="));
    }
}
