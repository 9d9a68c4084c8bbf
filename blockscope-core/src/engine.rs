use crate::block::{detect_heuristic_blocks, detect_resource_blocks};
use crate::config::EngineConfig;
use crate::context::DetectionContext;
use crate::default_content::{detect_buttons, detect_default_content};
use crate::error::Result;
use crate::icon::detect_icons;
use crate::model::DetectionResult;
use crate::section::detect_sections;
use blockscope_fetch::{ResourceNames, SsrDocumentSet};
use scraper::Html;
use tracing::info;

/// Run every detector over one live snapshot.
///
/// Passes run in a fixed order because each one excludes what earlier passes
/// claimed: sections, resource-named blocks, heuristic blocks, default
/// content, buttons, then icons. Fails only when the live document has no
/// `<main>`; icons that need a network fetch are left with `svg: None`.
pub fn analyze(
    live_document: &Html,
    documents: &SsrDocumentSet,
    names: &ResourceNames,
    config: &EngineConfig,
) -> Result<DetectionResult> {
    let mut ctx = DetectionContext::new(live_document, documents, config)?;

    detect_sections(&mut ctx);
    detect_resource_blocks(&mut ctx, &names.block_names);
    detect_heuristic_blocks(&mut ctx, &names.block_names);
    detect_default_content(&mut ctx);
    detect_buttons(&mut ctx);
    detect_icons(&mut ctx, &names.icon_names);

    let result = ctx.into_result();
    info!(
        "Analysis complete: {} section(s), {} block(s), {} icon(s)",
        result.sections.len(),
        result.blocks.len(),
        result.icons.len()
    );
    Ok(result)
}

pub fn analyze_html(
    live_html: &str,
    documents: &SsrDocumentSet,
    names: &ResourceNames,
    config: &EngineConfig,
) -> Result<DetectionResult> {
    let live_document = Html::parse_document(live_html);
    analyze(&live_document, documents, names, config)
}
