use crate::documents::{SsrDocumentSet, normalize_url};
use crate::error::{FetchError, Result};
use futures::future::join_all;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const PLAIN_SUFFIX: &str = ".plain.html";

pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Blockscope/0.1 (https://github.com/trapdoorsec/blockscope)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the server-rendered page plus the fragments, nav and footer it
    /// references. A failed fetch drops that one document from the set.
    pub async fn fetch_document_set(&self, page_url: &str) -> Result<SsrDocumentSet> {
        let parsed = Url::parse(page_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", page_url, e)))?;
        let primary_url = normalize_url(parsed.as_str());
        info!("Fetching server-rendered documents for {}", primary_url);

        let mut set = SsrDocumentSet::new(&primary_url);

        let primary_body = match self.fetch_text(&primary_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Primary document unavailable for {}: {}", primary_url, e);
                return Ok(set);
            }
        };

        let linked = {
            let primary = Html::parse_document(&primary_body);
            linked_document_urls(&primary, &parsed)
        };
        set.insert_html(&primary_url, &primary_body);

        for (url, body) in self.fetch_all(&linked).await {
            set.insert_html(&url, &body);
        }

        info!("Document set ready: {} document(s)", set.len());
        Ok(set)
    }

    /// Fetch every URL concurrently, keeping only successful bodies.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<(String, String)> {
        let fetches = urls.iter().map(|url| async move {
            let outcome = self.fetch_text(url).await;
            (url.clone(), outcome)
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(url, outcome)| match outcome {
                Ok(body) => Some((url, body)),
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    None
                }
            })
            .collect()
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Fetch an icon resource and return the serialized `<svg>` root.
    pub async fn fetch_svg(&self, url: &str) -> Result<String> {
        let body = self.fetch_text(url).await?;
        extract_svg(&body).ok_or_else(|| FetchError::ParseError(format!("no <svg> root in {}", url)))
    }
}

/// Plain-HTML variants of fragments, nav and footer referenced by a page.
fn linked_document_urls(document: &Html, page_url: &Url) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |candidate: Option<String>| {
        if let Some(url) = candidate
            && !urls.contains(&url)
        {
            urls.push(url);
        }
    };

    let link_selector = Selector::parse("main a[href]").unwrap();
    for anchor in document.select(&link_selector) {
        if let Some(href) = anchor.value().attr("href")
            && href.contains("/fragments/")
        {
            push(plain_variant(page_url, href));
        }
    }

    for (meta_name, default_path) in [("nav", "/nav"), ("footer", "/footer")] {
        let selector = Selector::parse(&format!("meta[name=\"{}\"]", meta_name)).unwrap();
        let path = document
            .select(&selector)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .unwrap_or(default_path);
        push(plain_variant(page_url, path));
    }

    urls
}

fn plain_variant(base: &Url, href: &str) -> Option<String> {
    let mut resolved = base.join(href).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }
    resolved.set_query(None);
    resolved.set_fragment(None);

    let path = resolved.path().trim_end_matches('/').to_string();
    if !path.ends_with(PLAIN_SUFFIX) {
        let path = path.strip_suffix(".html").unwrap_or(&path);
        resolved.set_path(&format!("{}{}", path, PLAIN_SUFFIX));
    }
    Some(resolved.to_string())
}

fn extract_svg(body: &str) -> Option<String> {
    let fragment = Html::parse_fragment(body);
    let svg_selector = Selector::parse("svg").unwrap();
    fragment.select(&svg_selector).next().map(|svg| svg.html())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_html(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body.to_string()),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_plain_variant() {
        let base = Url::parse("https://example.com/en/page").unwrap();
        assert_eq!(
            plain_variant(&base, "/fragments/hero").as_deref(),
            Some("https://example.com/fragments/hero.plain.html")
        );
        assert_eq!(
            plain_variant(&base, "/fragments/hero.html?x=1").as_deref(),
            Some("https://example.com/fragments/hero.plain.html")
        );
        assert_eq!(plain_variant(&base, "https://other.org/fragments/x"), None);
    }

    #[test]
    fn test_linked_document_urls_uses_meta_overrides() {
        let html = Html::parse_document(
            r#"<html><head><meta name="nav" content="/drafts/nav"></head>
            <body><main><a href="/fragments/promo">Promo</a></main></body></html>"#,
        );
        let base = Url::parse("https://example.com/").unwrap();
        let urls = linked_document_urls(&html, &base);

        assert_eq!(
            urls,
            vec![
                "https://example.com/fragments/promo.plain.html".to_string(),
                "https://example.com/drafts/nav.plain.html".to_string(),
                "https://example.com/footer.plain.html".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_document_set_includes_fragments() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<html><body><main><div><a href="{}/fragments/hero">x</a></div></main></body></html>"#,
            server.uri()
        );
        mount_html(&server, "/page", &page).await;
        mount_html(&server, "/fragments/hero.plain.html", r#"<div class="hero"></div>"#).await;
        mount_html(&server, "/nav.plain.html", "<div>nav</div>").await;

        let fetcher = DocumentFetcher::new().unwrap();
        let set = fetcher
            .fetch_document_set(&format!("{}/page?preview=1", server.uri()))
            .await
            .unwrap();

        // footer.plain.html is not mounted and is dropped
        assert_eq!(set.len(), 3);
        assert_eq!(set.primary_url(), format!("{}/page", server.uri()));
        assert!(
            set.get(&format!("{}/fragments/hero.plain.html", server.uri()))
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_fetch_document_set_degrades_when_primary_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = DocumentFetcher::new().unwrap();
        let set = fetcher
            .fetch_document_set(&format!("{}/missing", server.uri()))
            .await
            .unwrap();

        assert!(set.is_empty());
        assert!(set.primary().is_none());
    }

    #[tokio::test]
    async fn test_fetch_document_set_rejects_invalid_url() {
        let fetcher = DocumentFetcher::new().unwrap();
        let result = fetcher.fetch_document_set("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_svg() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/icons/search.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 20"><path d="M0 0"/></svg>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/icons/broken.svg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = DocumentFetcher::new().unwrap();
        let svg = fetcher
            .fetch_svg(&format!("{}/icons/search.svg", server.uri()))
            .await
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox"));

        let missing = fetcher
            .fetch_svg(&format!("{}/icons/broken.svg", server.uri()))
            .await;
        assert!(matches!(missing, Err(FetchError::Status { status: 404, .. })));
    }
}
