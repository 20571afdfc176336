pub mod browser;
pub mod fetcher;
pub mod llm;
pub mod normalize;

pub use browser::BrowserFetcher;
pub use fetcher::HttpFetcher;
pub use llm::OpenAiExtractor;
pub use normalize::{MarkdownNormalizer, TextNormalizer};
