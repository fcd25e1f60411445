use std::sync::Arc;

use chrono::{DateTime, Local};

use super::models::DispatchTrigger;
use super::sequence::{dispatch, DispatchOutcome};
use crate::config::AppConfig;
use crate::mail::{MailSender, SmtpMailSender};
use crate::news::{ContentProvider, NewsApiProvider, OpenAiTranslator};
use crate::recipient::Recipient;
use crate::render::{HtmlRenderer, Renderer};
use crate::Result;

/// The collaborators a dispatch needs, built once by the host process
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn ContentProvider>,
    renderer: Arc<dyn Renderer>,
    sender: Arc<dyn MailSender>,
    query: String,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        renderer: Arc<dyn Renderer>,
        sender: Arc<dyn MailSender>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            renderer,
            sender,
            query: query.into(),
        }
    }

    /// Build the NewsAPI provider, HTML renderer and SMTP sender from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut provider = NewsApiProvider::new(&config.news)?;

        if config.translation.enabled {
            let translator = OpenAiTranslator::new(&config.translation)?;
            tracing::info!(
                "Translation enabled ({} -> {})",
                config.translation.source_language,
                config.translation.target_language
            );
            provider = provider.with_translator(Arc::new(translator));
        }

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(HtmlRenderer::new(config.newsletter.clone())),
            Arc::new(SmtpMailSender::new(&config.smtp)?),
            config.news.query.clone(),
        ))
    }

    /// Run the dispatch sequence for these recipients
    pub async fn dispatch(
        &self,
        recipients: &[Recipient],
        trigger: DispatchTrigger,
        now: DateTime<Local>,
    ) -> DispatchOutcome {
        dispatch(
            recipients,
            self.provider.as_ref(),
            self.renderer.as_ref(),
            self.sender.as_ref(),
            &self.query,
            trigger,
            now,
        )
        .await
    }
}
