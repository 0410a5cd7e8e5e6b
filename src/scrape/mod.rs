//! Fetching the remote page and turning its headings into article links.

mod extractor;
mod fetcher;

pub use extractor::{Extractor, ScrapedLink};
pub use fetcher::{HttpFetcher, PageSource};

#[cfg(test)]
pub use fetcher::StaticPage;
