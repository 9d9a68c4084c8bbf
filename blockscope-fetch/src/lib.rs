pub mod collector;
pub mod documents;
pub mod error;
pub mod fetcher;

pub use collector::{ResourceNames, collect_resource_names};
pub use documents::{SsrDocument, SsrDocumentSet, normalize_url};
pub use error::FetchError;
pub use fetcher::DocumentFetcher;
