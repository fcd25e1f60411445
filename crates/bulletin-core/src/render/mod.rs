mod document;
mod html;
mod samples;

pub use document::HtmlDocument;
pub use html::{HtmlRenderer, Renderer};
pub use samples::sample_articles;
