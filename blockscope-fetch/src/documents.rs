use scraper::Html;
use url::Url;

/// A parsed, read-only server-rendered document.
pub struct SsrDocument {
    pub url: String,
    pub html: Html,
}

/// Server-rendered documents for one analysis pass, keyed by normalized URL.
///
/// The primary URL is always recorded even when its document could not be
/// fetched, so detectors can tell "no SSR markup" apart from "wrong page".
/// Documents keep insertion order with the primary document first.
pub struct SsrDocumentSet {
    primary_url: String,
    documents: Vec<SsrDocument>,
}

impl SsrDocumentSet {
    pub fn new(primary_url: &str) -> Self {
        Self {
            primary_url: normalize_url(primary_url),
            documents: Vec::new(),
        }
    }

    /// Parse and insert a document. A second insert for the same URL replaces
    /// the first.
    pub fn insert_html(&mut self, url: &str, body: &str) {
        self.insert(url, Html::parse_document(body));
    }

    pub fn insert(&mut self, url: &str, html: Html) {
        let url = normalize_url(url);
        if let Some(existing) = self.documents.iter_mut().find(|d| d.url == url) {
            existing.html = html;
            return;
        }

        let document = SsrDocument { url, html };
        if document.url == self.primary_url {
            self.documents.insert(0, document);
        } else {
            self.documents.push(document);
        }
    }

    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    pub fn primary(&self) -> Option<&SsrDocument> {
        self.get(&self.primary_url)
    }

    pub fn get(&self, url: &str) -> Option<&SsrDocument> {
        let url = normalize_url(url);
        self.documents.iter().find(|d| d.url == url)
    }

    /// Every document other than the primary one, in insertion order.
    pub fn secondary(&self) -> impl Iterator<Item = &SsrDocument> {
        self.documents.iter().filter(|d| d.url != self.primary_url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SsrDocument> {
        self.documents.iter()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.url.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Strip query string and fragment. Strings that are not absolute URLs are
/// returned with the same suffixes cut by hand.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://example.com/page?x=1#top"),
            "https://example.com/page"
        );
        assert_eq!(normalize_url("/fragments/hero?v=2"), "/fragments/hero");
    }

    #[test]
    fn test_primary_document_is_first() {
        let mut set = SsrDocumentSet::new("https://example.com/page?utm=1");
        set.insert_html("https://example.com/fragments/a.plain.html", "<div></div>");
        set.insert_html("https://example.com/page", "<main></main>");

        assert_eq!(set.len(), 2);
        assert_eq!(set.urls()[0], "https://example.com/page");
        assert!(set.primary().is_some());
        assert_eq!(set.secondary().count(), 1);
    }

    #[test]
    fn test_missing_primary_is_not_an_error() {
        let set = SsrDocumentSet::new("https://example.com/");
        assert!(set.primary().is_none());
        assert!(set.is_empty());
        assert_eq!(set.primary_url(), "https://example.com/");
    }
}
