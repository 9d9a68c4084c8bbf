// Section detection: top-level children of <main>, paired live against SSR

use crate::context::DetectionContext;
use crate::dom::{class_list, compile_selector, find_main, tag_name, trimmed_text};
use crate::model::Section;
use crate::path::{document_path, element_children, parent_element};
use scraper::ElementRef;
use std::collections::HashSet;
use tracing::{debug, info};

/// Live-only sections are limited to these container tags.
const SECTION_TAGS: [&str; 2] = ["div", "section"];

pub fn detect_sections(ctx: &mut DetectionContext<'_>) {
    let before = ctx.result().sections.len();

    let primary = ctx.documents.primary();
    match primary.and_then(|doc| find_main(&doc.html).map(|main| (doc, main))) {
        Some((document, ssr_main)) => {
            let live_children: Vec<ElementRef> = element_children(ctx.live.main).collect();
            let mut paired: HashSet<usize> = HashSet::new();
            let mut cursor = 0;

            for (index, ssr_child) in element_children(ssr_main).enumerate() {
                let Some(live_index) =
                    pair_live_child(ctx, &live_children, &paired, cursor, index, ssr_child, ssr_main)
                else {
                    debug!(
                        "No live counterpart for SSR section {} <{}>",
                        index,
                        tag_name(&ssr_child)
                    );
                    continue;
                };
                paired.insert(live_index);
                cursor = live_index + 1;

                let live_child = live_children[live_index];
                let element = document_path(live_child);
                if ctx.is_claimed(&element) {
                    continue;
                }

                let section = Section {
                    id: ctx.next_section_id(),
                    element,
                    label: section_metadata_label(ssr_child),
                    ssr: Some(ctx.ssr_ref(document, ssr_child)),
                };
                debug!("Section {} -> {}", section.id, section.element);
                ctx.claim_section(section);
            }

            detect_nested_sections(ctx, document, ssr_main);
        }
        None => detect_live_only_sections(ctx),
    }

    info!(
        "Detected {} section(s)",
        ctx.result().sections.len() - before
    );
}

/// Pair SSR child `index` with a live child. Raw index alignment is trusted
/// only when tag names agree; otherwise fall back to path translation, then
/// to the next unpaired live child with the same tag.
fn pair_live_child(
    ctx: &DetectionContext<'_>,
    live_children: &[ElementRef<'_>],
    paired: &HashSet<usize>,
    cursor: usize,
    index: usize,
    ssr_child: ElementRef<'_>,
    ssr_main: ElementRef<'_>,
) -> Option<usize> {
    let tag = tag_name(&ssr_child);

    if let Some(live) = live_children.get(index)
        && tag_name(live) == tag
        && !paired.contains(&index)
    {
        return Some(index);
    }

    if let Some(decoded) = ctx.translate_ssr_to_live(ssr_child, ssr_main)
        && tag_name(&decoded) == tag
        && let Some(position) = live_children.iter().position(|c| *c == decoded)
        && !paired.contains(&position)
    {
        return Some(position);
    }

    live_children
        .iter()
        .enumerate()
        .skip(cursor)
        .find(|(i, child)| !paired.contains(i) && tag_name(child) == tag)
        .map(|(i, _)| i)
}

/// `<section>` elements below the top level that no claimed section covers.
fn detect_nested_sections(
    ctx: &mut DetectionContext<'_>,
    document: &blockscope_fetch::SsrDocument,
    ssr_main: ElementRef<'_>,
) {
    let Ok(selector) = compile_selector("section") else {
        return;
    };
    let mut ordinal = 0;

    for ssr_section in ssr_main.select(&selector) {
        if parent_element(ssr_section) == Some(ssr_main) {
            continue;
        }
        ordinal += 1;

        let Some(live) = ctx.translate_ssr_to_live(ssr_section, ssr_main) else {
            continue;
        };
        if tag_name(&live) != "section" {
            continue;
        }

        let element = document_path(live);
        if ctx.is_claimed(&element) || ctx.is_inside_claimed_section(&element) {
            debug!("Nested section at {} already covered", element);
            continue;
        }

        let section = Section {
            id: ctx.next_section_id(),
            element,
            label: Some(nested_section_label(ssr_section, ordinal)),
            ssr: Some(ctx.ssr_ref(document, ssr_section)),
        };
        ctx.claim_section(section);
    }
}

/// Without SSR markup, every container child of live `<main>` is a section.
fn detect_live_only_sections(ctx: &mut DetectionContext<'_>) {
    let children: Vec<ElementRef> = element_children(ctx.live.main)
        .filter(|child| SECTION_TAGS.contains(&tag_name(child)))
        .collect();

    for child in children {
        let element = document_path(child);
        if ctx.is_claimed(&element) {
            continue;
        }
        let section = Section {
            id: ctx.next_section_id(),
            element,
            label: section_metadata_label(child),
            ssr: None,
        };
        ctx.claim_section(section);
    }
}

/// Text of the second cell of a `.section-metadata` table inside `section`.
pub fn section_metadata_label(section: ElementRef<'_>) -> Option<String> {
    let selector = compile_selector(".section-metadata").ok()?;
    let metadata = section.select(&selector).next()?;

    let cell = element_children(metadata)
        .flat_map(element_children)
        .nth(1)?;
    let label = trimmed_text(cell);
    (!label.is_empty()).then_some(label)
}

fn nested_section_label(section: ElementRef<'_>, ordinal: usize) -> String {
    let value = section.value();
    value
        .attr("data-section-name")
        .map(str::to_string)
        .or_else(|| class_list(section).into_iter().next())
        .or_else(|| value.id().map(str::to_string))
        .unwrap_or_else(|| format!("section {}", ordinal))
}
