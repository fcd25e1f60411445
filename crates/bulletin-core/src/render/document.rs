use std::fmt;

/// A rendered newsletter body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument(String);

impl HtmlDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Plain-text rendition for the text/plain alternative part
    pub fn to_plain_text(&self) -> String {
        html2text::from_read(self.0.as_bytes(), 80).unwrap_or_else(|_| self.0.clone())
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_markup() {
        let doc = HtmlDocument::new("<html><body><h1>Weekly</h1><p>Hello <b>there</b></p></body></html>");
        let text = doc.to_plain_text();
        assert!(text.contains("Weekly"));
        assert!(text.contains("there"));
        assert!(!text.contains("<p>"));
    }
}
