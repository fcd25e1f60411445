use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::Deserialize;
use url::Url;

use super::models::Article;
use super::translate::Translator;
use crate::config::NewsConfig;
use crate::{Error, Result};

const REMOVED_PLACEHOLDER: &str = "[Removed]";

/// Source of article data for a dispatch.
///
/// Implementations never fail: rate limits, network errors and empty
/// searches all come back as an empty list.
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    async fn fetch(&self, query: &str) -> Vec<Article>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Parse a NewsAPI `/v2/everything` response body
pub fn parse_everything_response(body: &str) -> Result<Vec<Article>> {
    let response: EverythingResponse = serde_json::from_str(body)?;

    if response.status != "ok" {
        return Err(Error::NewsApi(format!(
            "{}: {}",
            response.code.as_deref().unwrap_or("unknown"),
            response.message.as_deref().unwrap_or("no message")
        )));
    }

    let articles = response
        .articles
        .into_iter()
        .filter_map(|raw| {
            let title = raw.title.filter(|t| !t.trim().is_empty() && t != REMOVED_PLACEHOLDER)?;
            let url = raw.url.filter(|u| !u.trim().is_empty())?;
            Some(Article {
                title,
                description: raw
                    .description
                    .filter(|d| !d.trim().is_empty() && d != REMOVED_PLACEHOLDER),
                url,
                source_name: raw.source.and_then(|s| s.name),
            })
        })
        .collect();

    Ok(articles)
}

/// Content provider backed by NewsAPI
pub struct NewsApiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
    sort_by: String,
    page_size: u32,
    translator: Option<Arc<dyn Translator>>,
}

impl NewsApiProvider {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            sort_by: config.sort_by.clone(),
            page_size: config.page_size,
            translator: None,
        })
    }

    /// Translate titles and descriptions after fetching
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .user_agent(concat!("bulletin/", env!("CARGO_PKG_VERSION")));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for news fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build the `everything` endpoint URL for a query
    pub fn endpoint(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/everything", self.base_url.trim_end_matches('/')))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("language", &self.language)
            .append_pair("sortBy", &self.sort_by)
            .append_pair("pageSize", &self.page_size.to_string());
        Ok(url)
    }

    async fn try_fetch(&self, query: &str) -> Result<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("NEWS_API_KEY is not configured".to_string()))?;

        let url = self.endpoint(query)?;
        tracing::debug!(%url, "Fetching articles");

        // NewsAPI reports errors (rate limits, bad keys) in a JSON body, so the
        // body is parsed regardless of the HTTP status.
        let body = self
            .client
            .get(url)
            .header("X-Api-Key", api_key)
            .send()
            .await?
            .text()
            .await?;

        let mut articles = parse_everything_response(&body)?;
        articles.truncate(self.page_size as usize);
        Ok(articles)
    }

    async fn translate_articles(&self, articles: Vec<Article>) -> Vec<Article> {
        let Some(translator) = self.translator.as_ref() else {
            return articles;
        };

        let mut translated = Vec::with_capacity(articles.len());
        for mut article in articles {
            article.title = translate_or_keep(translator.as_ref(), article.title).await;
            if let Some(description) = article.description.take() {
                article.description = Some(translate_or_keep(translator.as_ref(), description).await);
            }
            translated.push(article);
        }
        translated
    }
}

async fn translate_or_keep(translator: &dyn Translator, text: String) -> String {
    match translator.translate(&text).await {
        Ok(translated) => translated,
        Err(e) => {
            tracing::warn!("Translation failed, keeping original text: {}", e);
            text
        }
    }
}

#[async_trait::async_trait]
impl ContentProvider for NewsApiProvider {
    async fn fetch(&self, query: &str) -> Vec<Article> {
        match self.try_fetch(query).await {
            Ok(articles) if articles.is_empty() => {
                tracing::info!("No articles found for query: {}", query);
                articles
            }
            Ok(articles) => {
                tracing::info!("Fetched {} articles", articles.len());
                self.translate_articles(articles).await
            }
            Err(e) => {
                tracing::warn!("Failed to fetch articles: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "TechCrunch"},
                "author": "Jane",
                "title": "Oakland opens a new tech hub",
                "description": "Hundreds of new jobs.",
                "url": "https://example.com/oakland",
                "urlToImage": null,
                "publishedAt": "2024-04-17T08:00:00Z",
                "content": "..."
            },
            {
                "source": {"id": null, "name": "[Removed]"},
                "title": "[Removed]",
                "description": "[Removed]",
                "url": "https://removed.com"
            },
            {
                "source": {"id": "wired", "name": "Wired"},
                "title": "Startup raises $50M",
                "description": null,
                "url": "https://example.com/startup"
            }
        ]
    }"#;

    struct UpperTranslator;

    #[async_trait::async_trait]
    impl Translator for UpperTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct FailingTranslator;

    #[async_trait::async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _text: &str) -> Result<String> {
            Err(Error::Translation("quota exceeded".to_string()))
        }
    }

    fn provider(api_key: Option<&str>) -> NewsApiProvider {
        let config = NewsConfig {
            api_key: api_key.map(str::to_string),
            ..NewsConfig::default()
        };
        NewsApiProvider::new(&config).unwrap()
    }

    #[test]
    fn test_parse_ok_response_skips_removed() {
        let articles = parse_everything_response(OK_BODY).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Oakland opens a new tech hub");
        assert_eq!(articles[0].source_name.as_deref(), Some("TechCrunch"));
        assert_eq!(articles[1].description, None);
        assert_eq!(articles[1].url, "https://example.com/startup");
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#;
        match parse_everything_response(body) {
            Err(Error::NewsApi(msg)) => assert_eq!(msg, "rateLimited: Too many requests"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage_is_json_error() {
        assert!(matches!(parse_everything_response("<html>"), Err(Error::Json(_))));
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let url = provider(Some("key")).endpoint(r#""Bay Area" AND tech"#).unwrap();
        assert_eq!(url.path(), "/v2/everything");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), r#""Bay Area" AND tech"#.to_string())));
        assert!(pairs.contains(&("pageSize".to_string(), "5".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "relevancy".to_string())));
    }

    #[tokio::test]
    async fn test_missing_api_key_yields_empty_list() {
        let articles = provider(None).fetch("tech").await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_translation_applies_to_title_and_description() {
        let provider = provider(Some("key")).with_translator(Arc::new(UpperTranslator));
        let articles = parse_everything_response(OK_BODY).unwrap();

        let translated = provider.translate_articles(articles).await;
        assert_eq!(translated[0].title, "OAKLAND OPENS A NEW TECH HUB");
        assert_eq!(translated[0].description.as_deref(), Some("HUNDREDS OF NEW JOBS."));
        assert_eq!(translated[1].description, None);
        assert_eq!(translated[0].url, "https://example.com/oakland");
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_original() {
        let provider = provider(Some("key")).with_translator(Arc::new(FailingTranslator));
        let articles = parse_everything_response(OK_BODY).unwrap();

        let translated = provider.translate_articles(articles.clone()).await;
        assert_eq!(translated, articles);
    }
}
