// Candidate block and icon names gathered from network activity and markup

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Names a page is known to use, fed to the detectors as plain input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNames {
    pub block_names: BTreeSet<String>,
    /// Icon name to the absolute URL of its SVG resource.
    pub icon_names: BTreeMap<String, String>,
}

impl ResourceNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, name: &str) -> Self {
        self.block_names.insert(name.to_string());
        self
    }

    pub fn with_icon(mut self, name: &str, url: &str) -> Self {
        self.icon_names.insert(name.to_string(), url.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.block_names.is_empty() && self.icon_names.is_empty()
    }
}

fn block_resource_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/blocks/([a-z0-9][a-z0-9-]*)/[^/]+\.(?:js|css)$").unwrap())
}

fn icon_resource_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/icons/([A-Za-z0-9_-]+)\.svg$").unwrap())
}

fn data_block_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap())
}

/// Build the candidate name sets from observed resource URLs (network timing
/// entries) and the live document's markup.
pub fn collect_resource_names(
    resource_urls: &[String],
    live_document: &Html,
    page_url: &str,
) -> ResourceNames {
    let mut names = ResourceNames::new();
    let page = Url::parse(page_url).ok();

    for raw in resource_urls {
        let resolved = match &page {
            Some(base) => base.join(raw).ok(),
            None => Url::parse(raw).ok(),
        };
        let Some(resource) = resolved else {
            debug!("Ignoring unparseable resource URL {}", raw);
            continue;
        };
        let path = resource.path();

        if let Some(captures) = block_resource_pattern().captures(path) {
            names.block_names.insert(captures[1].to_string());
        } else if let Some(captures) = icon_resource_pattern().captures(path) {
            let mut url = resource.clone();
            url.set_query(None);
            url.set_fragment(None);
            names
                .icon_names
                .entry(captures[1].to_string())
                .or_insert_with(|| url.to_string());
        }
    }

    let data_block_selector = Selector::parse("[data-block-name]").unwrap();
    for element in live_document.select(&data_block_selector) {
        let Some(name) = element.value().attr("data-block-name").map(str::trim) else {
            continue;
        };
        if data_block_name_pattern().is_match(name) {
            names.block_names.insert(name.to_string());
        } else if !name.is_empty() {
            debug!("Ignoring malformed data-block-name {:?}", name);
        }
    }

    for tag in ["header", "footer"] {
        let selector = Selector::parse(tag).unwrap();
        if live_document.select(&selector).next().is_some() {
            names.block_names.insert(tag.to_string());
        }
    }

    let icon_selector = Selector::parse("span.icon").unwrap();
    for element in live_document.select(&icon_selector) {
        for class in element.value().classes() {
            if let Some(name) = class.strip_prefix("icon-")
                && !name.is_empty()
                && !names.icon_names.contains_key(name)
                && let Some(base) = &page
                && let Ok(url) = base.join(&format!("/icons/{}.svg", name))
            {
                names.icon_names.insert(name.to_string(), url.to_string());
            }
        }
    }

    debug!(
        "Collected {} block name(s) and {} icon name(s)",
        names.block_names.len(),
        names.icon_names.len()
    );
    names
}
