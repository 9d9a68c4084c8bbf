// Default content (plain semantic tags) and call-to-action buttons

use crate::context::DetectionContext;
use crate::dom::{
    ancestors_until, class_list, compile_selector, find_main, is_button_paragraph, main_or_root,
    tag_name, text_prefix, trimmed_text,
};
use crate::model::{Block, BlockCategory};
use crate::path::{document_path, parent_element};
use blockscope_fetch::SsrDocument;
use scraper::ElementRef;
use tracing::{debug, info, warn};

/// Semantic tags scanned for default content, in scan order.
pub const DEFAULT_CONTENT_TAGS: [(&str, BlockCategory); 16] = [
    ("h1", BlockCategory::Heading),
    ("h2", BlockCategory::Heading),
    ("h3", BlockCategory::Heading),
    ("h4", BlockCategory::Heading),
    ("h5", BlockCategory::Heading),
    ("h6", BlockCategory::Heading),
    ("p", BlockCategory::Text),
    ("picture", BlockCategory::Image),
    ("img", BlockCategory::Image),
    ("ul", BlockCategory::List),
    ("ol", BlockCategory::List),
    ("pre", BlockCategory::Code),
    ("code", BlockCategory::Code),
    ("table", BlockCategory::Table),
    ("blockquote", BlockCategory::Quote),
    ("video", BlockCategory::Media),
];

/// Inside a `<p>` below `stop`, except a `<picture>` that is the paragraph's
/// direct child (a linked or captioned image).
pub fn is_nested_in_paragraph(element: ElementRef<'_>, stop: ElementRef<'_>) -> bool {
    let tag = tag_name(&element);
    if tag == "p" {
        return false;
    }
    if tag == "picture"
        && parent_element(element).is_some_and(|parent| tag_name(&parent) == "p")
    {
        return false;
    }
    ancestors_until(element, Some(stop)).any(|ancestor| tag_name(&ancestor) == "p")
}

/// Paragraphs that read as text: not a button, not an image holder.
fn is_text_paragraph(paragraph: ElementRef<'_>) -> bool {
    !is_button_paragraph(paragraph) && !trimmed_text(paragraph).is_empty()
}

/// Pass 3: default content found in each SSR document, mapped to live.
pub fn detect_default_content(ctx: &mut DetectionContext<'_>) {
    let documents = ctx.documents;
    let mut found = 0;

    for (tag, category) in DEFAULT_CONTENT_TAGS {
        let selector = match compile_selector(tag) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping default content <{}>: {}", tag, e);
                continue;
            }
        };
        let live_matches: Vec<ElementRef> = ctx.live.main.select(&selector).collect();

        for document in documents.iter() {
            let ssr_root = main_or_root(&document.html);
            let is_primary = document.url == documents.primary_url();

            for (index, ssr_element) in ssr_root.select(&selector).enumerate() {
                if ctx.is_ssr_claimed(document, ssr_element)
                    || ctx.is_ssr_inside_claimed_block(document, ssr_element)
                    || is_nested_in_paragraph(ssr_element, ssr_root)
                {
                    continue;
                }
                if tag == "p" && !is_text_paragraph(ssr_element) {
                    continue;
                }

                let Some(live) = resolve_live_counterpart(
                    ctx,
                    ssr_element,
                    ssr_root,
                    is_primary,
                    index,
                    &live_matches,
                ) else {
                    debug!("<{}> #{} in {} has no live counterpart", tag, index, document.url);
                    continue;
                };

                let path = document_path(live);
                if ctx.is_claimed(&path)
                    || ctx.is_inside_claimed_block(&path)
                    || is_nested_in_paragraph(live, ctx.live.main)
                {
                    continue;
                }

                let block = Block {
                    id: ctx.next_block_id(),
                    element: path,
                    ssr: Some(ctx.ssr_ref(document, ssr_element)),
                    source_document_url: Some(document.url.clone()),
                    name: tag.to_string(),
                    tag_name: tag_name(&live).to_string(),
                    classes: class_list(live),
                    category,
                };
                ctx.claim_block(block);
                found += 1;
            }
        }
    }

    info!("Default content pass: {} element(s)", found);
}

/// Path translation first (primary document only); otherwise the live match
/// at the same index, accepted only when the text prefixes agree.
fn resolve_live_counterpart<'a>(
    ctx: &DetectionContext<'a>,
    ssr_element: ElementRef<'_>,
    ssr_root: ElementRef<'_>,
    is_primary: bool,
    index: usize,
    live_matches: &[ElementRef<'a>],
) -> Option<ElementRef<'a>> {
    let tag = tag_name(&ssr_element);

    if is_primary
        && let Some(live) = ctx.translate_ssr_to_live(ssr_element, ssr_root)
        && tag_name(&live) == tag
    {
        return Some(live);
    }

    let live = *live_matches.get(index)?;
    let limit = ctx.config.text_match_chars;
    (text_prefix(live, limit) == text_prefix(ssr_element, limit)).then_some(live)
}

/// Pass 4: paragraphs in SSR `<main>` holding a single link.
pub fn detect_buttons(ctx: &mut DetectionContext<'_>) {
    let documents = ctx.documents;
    let Some(primary) = documents.primary() else {
        return;
    };
    let Some(ssr_main) = find_main(&primary.html) else {
        return;
    };
    let Ok(selector) = compile_selector("p") else {
        return;
    };

    let mut found = 0;
    for paragraph in ssr_main.select(&selector) {
        if !is_button_paragraph(paragraph) {
            continue;
        }
        if let Some(button) = resolve_button(ctx, primary, paragraph, ssr_main) {
            ctx.claim_block(button);
            found += 1;
        }
    }

    info!("Button pass: {} button(s)", found);
}

fn resolve_button(
    ctx: &DetectionContext<'_>,
    document: &SsrDocument,
    paragraph: ElementRef<'_>,
    ssr_main: ElementRef<'_>,
) -> Option<Block> {
    if ctx.is_ssr_claimed(document, paragraph)
        || ctx.is_ssr_inside_claimed_block(document, paragraph)
    {
        return None;
    }

    let live = ctx.translate_ssr_to_live(paragraph, ssr_main)?;
    if tag_name(&live) != "p" {
        return None;
    }
    let path = document_path(live);
    if ctx.is_claimed(&path) || ctx.is_inside_claimed_block(&path) {
        return None;
    }

    Some(Block {
        id: ctx.next_block_id(),
        element: path,
        ssr: Some(ctx.ssr_ref(document, paragraph)),
        source_document_url: Some(document.url.clone()),
        name: "button".to_string(),
        tag_name: "p".to_string(),
        classes: class_list(live),
        category: BlockCategory::Button,
    })
}
