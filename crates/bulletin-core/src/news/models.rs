use serde::{Deserialize, Serialize};

/// A news article as it appears in the newsletter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source_name: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            url: url.into(),
            source_name: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = Some(source.into());
        self
    }
}
