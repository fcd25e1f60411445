use askama::Template;
use chrono::NaiveDate;

use super::document::HtmlDocument;
use crate::config::NewsletterConfig;
use crate::news::Article;
use crate::{Error, Result};

const DATE_FORMAT: &str = "%d %B %Y";

/// Turns articles into the newsletter email.
///
/// Implementations must be pure: the same articles and date always produce
/// the same subject and document.
pub trait Renderer: Send + Sync {
    fn subject(&self, as_of: NaiveDate) -> String;

    fn render(&self, articles: &[Article], as_of: NaiveDate) -> Result<HtmlDocument>;
}

#[derive(Template)]
#[template(path = "newsletter.html")]
struct NewsletterTemplate<'a> {
    title: &'a str,
    heading: &'a str,
    date_label: &'a str,
    date: String,
    read_more_label: &'a str,
    original_note: Option<&'a str>,
    articles: &'a [Article],
}

/// Askama-backed HTML renderer
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    branding: NewsletterConfig,
}

impl HtmlRenderer {
    pub fn new(branding: NewsletterConfig) -> Self {
        Self { branding }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(NewsletterConfig::default())
    }
}

impl Renderer for HtmlRenderer {
    fn subject(&self, as_of: NaiveDate) -> String {
        format!("{} - {}", self.branding.subject_prefix, as_of.format(DATE_FORMAT))
    }

    fn render(&self, articles: &[Article], as_of: NaiveDate) -> Result<HtmlDocument> {
        let template = NewsletterTemplate {
            title: &self.branding.title,
            heading: &self.branding.heading,
            date_label: &self.branding.date_label,
            date: as_of.format(DATE_FORMAT).to_string(),
            read_more_label: &self.branding.read_more_label,
            original_note: self.branding.original_note.as_deref(),
            articles,
        };

        template
            .render()
            .map(HtmlDocument::new)
            .map_err(|e| Error::Render(e.to_string()))
    }
}
