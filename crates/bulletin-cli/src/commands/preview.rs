use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;

use bulletin_core::{
    news::{ContentProvider, NewsApiProvider, OpenAiTranslator},
    render::{sample_articles, HtmlRenderer, Renderer},
    AppConfig,
};

/// Render the newsletter to a local file without sending it
pub async fn run(config: &AppConfig, output: &Path, live: bool) -> Result<()> {
    let articles = if live {
        println!("Fetching articles for '{}'...", config.news.query);
        let mut provider = NewsApiProvider::new(&config.news)?;
        if config.translation.enabled {
            provider = provider.with_translator(Arc::new(OpenAiTranslator::new(&config.translation)?));
        }
        provider.fetch(&config.news.query).await
    } else {
        sample_articles()
    };

    if articles.is_empty() {
        bail!("no articles found to preview");
    }

    let renderer = HtmlRenderer::new(config.newsletter.clone());
    let today = Local::now().date_naive();
    let document = renderer.render(&articles, today)?;

    std::fs::write(output, document.as_str())?;

    println!("Subject: {}", renderer.subject(today));
    println!("Preview written to {} ({} articles)", output.display(), articles.len());

    Ok(())
}
