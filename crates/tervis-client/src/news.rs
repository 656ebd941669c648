use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tervis_core::config::{HttpConfig, NewsConfig};
use tervis_core::error::AppError;
use tervis_core::models::{Language, NewsArticle};
use tervis_core::news::{extract_article, extract_article_links, finalize, or_fallback, ArticleDraft};
use tervis_core::traits::NewsSource;
use tracing::{info, warn};
use url::Url;

const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Scrapes health news teasers and translates them for the active language.
///
/// [`latest`](Self::latest) never fails: every upstream problem degrades to
/// fewer articles, and no articles at all degrades to the fallback cards.
#[derive(Clone)]
pub struct HealthNewsClient {
    client: Client,
    source: Url,
    translate_url: String,
    max_articles: usize,
    concurrency: usize,
    translate: bool,
}

impl HealthNewsClient {
    /// Creates a client for the news source configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` for a malformed source URL and
    /// `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(config: &NewsConfig, http: &HttpConfig) -> Result<Self, AppError> {
        Self::with_translate_url(config, http, DEFAULT_TRANSLATE_URL)
    }

    /// Same as [`new`](Self::new) with a different translation endpoint.
    pub fn with_translate_url(
        config: &NewsConfig,
        http: &HttpConfig,
        translate_url: &str,
    ) -> Result<Self, AppError> {
        let source = Url::parse(&config.source_url)
            .map_err(|e| AppError::InvalidUrl(format!("{}: {}", config.source_url, e)))?;

        let client = Client::builder()
            .user_agent("Tervis/0.1 (health-news)")
            .timeout(http.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            source,
            translate_url: translate_url.to_string(),
            max_articles: config.max_articles,
            concurrency: config.concurrency.max(1),
            translate: config.translate,
        })
    }

    /// Returns up to `max_articles` cards in `language`, or the fallback cards.
    pub async fn latest(&self, language: Language) -> Vec<NewsArticle> {
        let articles = match self.scrape(language).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Error fetching health news: {}", e);
                Vec::new()
            }
        };
        info!("Health news: {} scraped articles", articles.len());
        or_fallback(articles)
    }

    async fn scrape(&self, language: Language) -> Result<Vec<NewsArticle>, AppError> {
        let front_page = self.get_text(self.source.as_str()).await?;
        let links: Vec<String> = extract_article_links(&front_page, &self.source)
            .into_iter()
            .take(self.max_articles)
            .collect();

        let published = Utc::now();
        let articles: Vec<NewsArticle> = stream::iter(links)
            .map(|link| async move {
                match self.get_text(&link).await {
                    Ok(html) => {
                        let draft = extract_article(&html, &link, &self.source);
                        Some(finalize(self.localize(draft, language).await, published))
                    }
                    Err(e) => {
                        warn!("Error fetching article {}: {}", link, e);
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .filter_map(|article| async move { article })
            .collect()
            .await;

        Ok(articles)
    }

    async fn localize(&self, draft: ArticleDraft, language: Language) -> ArticleDraft {
        if !self.translate || language == Language::En {
            return draft;
        }
        let title = self.translate_text(&draft.title, language).await;
        let description = self.translate_text(&draft.description, language).await;
        ArticleDraft {
            title,
            description,
            ..draft
        }
    }

    /// Translates English `text` into `language`; returns `text` unchanged on any failure.
    pub async fn translate_text(&self, text: &str, language: Language) -> String {
        match self.try_translate(text, language).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation error: {}", e);
                text.to_string()
            }
        }
    }

    async fn try_translate(&self, text: &str, language: Language) -> Result<String, AppError> {
        let response = self
            .client
            .get(&self.translate_url)
            .query(&[
                ("client", "gtx"),
                ("sl", "en"),
                ("tl", language.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from translate endpoint",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::ClientError(format!("Failed to parse translation: {}", e)))?;

        translated_segments(&body).ok_or(AppError::EmptyResponse)
    }

    async fn get_text(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {}", e))
            } else {
                AppError::ClientError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from {}",
                response.status().as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))
    }
}

#[async_trait]
impl NewsSource for HealthNewsClient {
    async fn latest(&self, language: Language) -> Vec<NewsArticle> {
        HealthNewsClient::latest(self, language).await
    }
}

/// Joins the translated sentence segments of a `translate_a/single` reply.
///
/// The reply looks like `[[["Olá mundo","Hello world",...], ...], ...]`.
fn translated_segments(body: &Value) -> Option<String> {
    let joined: String = body
        .get(0)?
        .as_array()?
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(server: &MockServer, translate: bool) -> NewsConfig {
        NewsConfig {
            source_url: server.url("/"),
            max_articles: 10,
            concurrency: 2,
            translate,
        }
    }

    #[test]
    fn test_translated_segments() {
        let body = json!([[["Olá ", "Hello ", null], ["mundo", "world", null]], null, "en"]);
        assert_eq!(translated_segments(&body).as_deref(), Some("Olá mundo"));
        assert_eq!(translated_segments(&json!({})), None);
    }

    #[test]
    fn test_invalid_source_url() {
        let cfg = NewsConfig {
            source_url: "not a url".to_string(),
            ..NewsConfig::default()
        };
        assert!(matches!(
            HealthNewsClient::new(&cfg, &HttpConfig::default()),
            Err(AppError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_scrapes_and_translates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .body(r#"<a href="/news/sleep-study">Sleep</a><a href="/news/sleep-study">dup</a>"#);
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/sleep-study");
            then.status(200).body(
                r#"<h1>Sleep Study</h1><meta property="og:description" content="Better sleep helps.">"#,
            );
        });
        let translate = server.mock(|when, then| {
            when.method(GET).path("/translate").query_param("tl", "pt");
            then.status(200).json_body(json!([[["Traduzido", "x", null]]]));
        });

        let client =
            HealthNewsClient::with_translate_url(&config(&server, true), &HttpConfig::default(), &server.url("/translate"))
                .unwrap();
        let items = client.latest(Language::Pt).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Traduzido");
        assert_eq!(items[0].description, "Traduzido");
        assert_eq!(items[0].link, server.url("/news/sleep-study"));
        translate.assert_hits(2);
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_english() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(r#"<a href="/news/a">A</a>"#);
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/a");
            then.status(200).body("<h1>Heart Health</h1>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/translate");
            then.status(500);
        });

        let client =
            HealthNewsClient::with_translate_url(&config(&server, true), &HttpConfig::default(), &server.url("/translate"))
                .unwrap();
        let items = client.latest(Language::It).await;
        assert_eq!(items[0].title, "Heart Health");
    }

    #[tokio::test]
    async fn test_unreachable_source_serves_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(502);
        });

        let client = HealthNewsClient::new(&config(&server, false), &HttpConfig::default()).unwrap();
        let items = client.latest(Language::Pt).await;
        assert_eq!(items.len(), 10);
        assert!(items[0].title.starts_with("Hawaii"));
    }
}
