// On-demand markup and asset lookup for one detected item

use crate::context::LivePage;
use crate::dom::{compile_selector, find_main, tag_name};
use crate::model::{DetectionResult, SsrRef};
use crate::path::{ElementPath, decode_path};
use blockscope_fetch::SsrDocumentSet;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDetail {
    pub id: String,
    pub name: String,
    pub live_markup: String,
    pub ssr_markup: Option<String>,
    pub source_document_url: Option<String>,
    pub assets: Vec<String>,
}

/// Markup for a section or block id. Reads the result, never changes it.
pub fn block_detail(
    result: &DetectionResult,
    live_document: &Html,
    documents: &SsrDocumentSet,
    id: &str,
) -> Option<BlockDetail> {
    let (name, element, ssr, source) = if let Some(block) = result.block(id) {
        (
            block.name.clone(),
            &block.element,
            block.ssr.as_ref(),
            block.source_document_url.clone(),
        )
    } else {
        let section = result.section(id)?;
        let name = section.label.clone().unwrap_or_else(|| section.id.clone());
        (
            name,
            &section.element,
            section.ssr.as_ref(),
            section.ssr.as_ref().map(|r| r.document_url.clone()),
        )
    };

    let live = decode_path(live_document.root_element(), element)?;

    let (ssr_markup, source_document_url) = match ssr.and_then(|r| resolve_ssr(documents, r)) {
        Some(ssr_element) => (Some(ssr_element.html()), source),
        None => match positional_search(live_document, documents, element, live) {
            Some(ssr_element) => (
                Some(ssr_element.html()),
                Some(documents.primary_url().to_string()),
            ),
            None => (None, source),
        },
    };

    Some(BlockDetail {
        id: id.to_string(),
        name,
        live_markup: live.html(),
        ssr_markup,
        source_document_url,
        assets: collect_assets(live, &result.page_url),
    })
}

fn resolve_ssr<'d>(documents: &'d SsrDocumentSet, ssr: &SsrRef) -> Option<ElementRef<'d>> {
    let document = documents.get(&ssr.document_url)?;
    decode_path(document.html.root_element(), &ssr.path)
}

/// Live path below live `<main>` decoded against the primary SSR `<main>`,
/// accepted only when the tag names agree.
fn positional_search<'d>(
    live_document: &Html,
    documents: &'d SsrDocumentSet,
    element: &ElementPath,
    live: ElementRef<'_>,
) -> Option<ElementRef<'d>> {
    let page = LivePage::new(live_document).ok()?;
    let relative = element.strip_prefix(&page.main_path)?;
    let ssr_main = find_main(&documents.primary()?.html)?;
    let candidate = decode_path(ssr_main, &relative)?;
    (tag_name(&candidate) == tag_name(&live)).then_some(candidate)
}

/// Absolute URLs of images and media referenced inside `element`.
pub fn collect_assets(element: ElementRef<'_>, page_url: &str) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let Ok(selector) = compile_selector("img[src], source[srcset], video[src], source[src]") else {
        return Vec::new();
    };

    let mut assets: Vec<String> = Vec::new();
    for asset in std::iter::once(element).chain(element.select(&selector)) {
        let value = asset.value();
        let raw = value.attr("src").or_else(|| {
            value
                .attr("srcset")
                .and_then(|srcset| srcset.split(',').next())
                .and_then(|candidate| candidate.split_whitespace().next())
        });
        let Some(raw) = raw else {
            continue;
        };

        let resolved = match &base {
            Some(base) => base.join(raw).map(|u| u.to_string()).unwrap_or_else(|_| raw.to_string()),
            None => raw.to_string(),
        };
        if !assets.contains(&resolved) {
            assets.push(resolved);
        }
    }
    assets
}
