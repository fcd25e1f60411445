mod models;
mod provider;
mod translate;

pub use models::Article;
pub use provider::{parse_everything_response, ContentProvider, NewsApiProvider};
pub use translate::{OpenAiTranslator, Translator};
