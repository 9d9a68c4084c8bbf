// Named block detection: resource-driven and class-heuristic passes

use crate::context::DetectionContext;
use crate::dom::{
    ancestors_until, class_list, compile_selector, find_main, has_class, main_or_root, tag_name,
};
use crate::error::{EngineError, Result};
use crate::model::{Block, BlockCategory, SsrRef};
use crate::path::document_path;
use blockscope_fetch::SsrDocument;
use scraper::{ElementRef, Selector};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Block types identified by their tag rather than a class.
pub const TAG_BLOCKS: [&str; 2] = ["header", "footer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Class,
    Tag,
}

/// A candidate block name and how it shows up in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockName {
    pub name: String,
    pub kind: NameKind,
}

impl BlockName {
    /// Resource-supplied names; `header` and `footer` match by tag.
    pub fn for_name(name: &str) -> Self {
        let kind = if TAG_BLOCKS.contains(&name) {
            NameKind::Tag
        } else {
            NameKind::Class
        };
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NameKind::Class,
        }
    }

    pub fn selector_source(&self) -> String {
        match self.kind {
            NameKind::Class => format!(".{}", self.name),
            NameKind::Tag => self.name.clone(),
        }
    }

    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        match self.kind {
            NameKind::Class => has_class(element, &self.name),
            NameKind::Tag => tag_name(&element) == self.name,
        }
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector_source())
    }
}

/// No ancestor carries the same name, so `element` is not an inner wrapper
/// of an outer instance.
pub fn is_root_element(element: ElementRef<'_>, name: &BlockName) -> bool {
    !ancestors_until(element, None).any(|ancestor| name.matches(ancestor))
}

/// An ancestor below `stop` carries a different known block name.
pub fn is_claimed_by_other_block(
    element: ElementRef<'_>,
    known_names: &HashSet<String>,
    own_name: &str,
    stop: ElementRef<'_>,
) -> bool {
    ancestors_until(element, Some(stop)).any(|ancestor| {
        ancestor
            .value()
            .classes()
            .any(|c| c != own_name && known_names.contains(c))
    })
}

/// Pass 1: names observed over the network or in markup attributes.
pub fn detect_resource_blocks(ctx: &mut DetectionContext<'_>, names: &BTreeSet<String>) {
    let known: HashSet<String> = names.iter().cloned().collect();
    let names: Vec<BlockName> = names.iter().map(|n| BlockName::for_name(n)).collect();
    let found = detect_named_blocks(ctx, &names, known);
    info!("Resource pass: {} block(s) from {} name(s)", found, names.len());
}

/// Pass 2: block names inferred from class names in SSR `<main>` markup.
pub fn detect_heuristic_blocks(ctx: &mut DetectionContext<'_>, known: &BTreeSet<String>) {
    let inferred = infer_block_names(ctx, known);
    let candidates: HashSet<String> = known.iter().chain(inferred.iter()).cloned().collect();
    let names: Vec<BlockName> = inferred.iter().map(|n| BlockName::class(n)).collect();
    let found = detect_named_blocks(ctx, &names, candidates);
    info!(
        "Heuristic pass: {} block(s) from {} inferred name(s)",
        found,
        names.len()
    );
}

/// Class names under each SSR document's `<main>` that look like block names
/// and are not already known, in first-seen order.
pub fn infer_block_names(ctx: &DetectionContext<'_>, known: &BTreeSet<String>) -> Vec<String> {
    let heuristic = match ctx.config.heuristic.compile() {
        Ok(heuristic) => heuristic,
        Err(e) => {
            warn!("Heuristic pass disabled: {}", e);
            return Vec::new();
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut inferred = Vec::new();

    for document in ctx.documents.iter() {
        let root = main_or_root(&document.html);
        for element in root.descendants().filter_map(ElementRef::wrap) {
            for class in element.value().classes() {
                if known.contains(class) || seen.contains(class) || !heuristic.accepts(class) {
                    continue;
                }
                seen.insert(class.to_string());
                inferred.push(class.to_string());
            }
        }
    }

    debug!("Inferred block names: {:?}", inferred);
    inferred
}

/// `candidates` holds every name of the pass, so nesting is judged the same
/// whichever name is processed first.
fn detect_named_blocks(
    ctx: &mut DetectionContext<'_>,
    names: &[BlockName],
    candidates: HashSet<String>,
) -> usize {
    let mut known = candidates;
    known.extend(ctx.claimed_names().iter().cloned());

    let mut found = 0;
    for name in names {
        match detect_block_name(ctx, name, &known) {
            Ok(count) => found += count,
            Err(e) => warn!("Skipping block name {}: {}", name, e),
        }
    }
    found
}

/// Find every live root instance of `name` and pair it with SSR markup.
fn detect_block_name(
    ctx: &mut DetectionContext<'_>,
    name: &BlockName,
    known: &HashSet<String>,
) -> Result<usize> {
    if name.name.chars().any(char::is_whitespace) {
        return Err(EngineError::Selector {
            selector: name.selector_source(),
            message: "block name contains whitespace".to_string(),
        });
    }
    let selector = compile_selector(&name.selector_source())?;

    let mut live_matches: Vec<ElementRef> = ctx.live.main.select(&selector).collect();
    if live_matches.is_empty() {
        live_matches = ctx.live.document.select(&selector).collect();
    }

    let mut emitted = 0;
    for (live_index, element) in live_matches.iter().copied().enumerate() {
        if !is_root_element(element, name) {
            debug!("{} #{} is nested in another {}", name, live_index, name);
            continue;
        }

        let path = document_path(element);
        if ctx.is_claimed(&path) || ctx.is_inside_claimed_block(&path) {
            continue;
        }
        if is_claimed_by_other_block(element, known, &name.name, ctx.live.main) {
            debug!("{} #{} belongs to another block", name, live_index);
            continue;
        }

        let ssr = find_ssr_counterpart(ctx, element, live_index, name, &selector);
        let source_document_url = ssr
            .as_ref()
            .and_then(|r| ctx.resolve_ssr(r))
            .and_then(|el| ctx.owning_document(el))
            .map(|doc| doc.url.clone());

        if ssr.is_none() {
            debug!("{} #{} has no SSR counterpart", name, live_index);
        }

        let block = Block {
            id: ctx.next_block_id(),
            element: path,
            ssr,
            source_document_url,
            name: name.name.clone(),
            tag_name: tag_name(&element).to_string(),
            classes: class_list(element),
            category: BlockCategory::Block,
        };
        ctx.claim_block(block);
        emitted += 1;
    }

    Ok(emitted)
}

/// Locate the SSR element for a live block instance; first strategy to
/// succeed wins:
///
/// 1. same index among all matches of the selector, per document;
/// 2. live path below `<main>` decoded against the primary SSR `<main>`,
///    walking up to the nearest ancestor carrying the name;
/// 3. the same translation against every other document.
pub fn find_ssr_counterpart(
    ctx: &DetectionContext<'_>,
    live_element: ElementRef<'_>,
    live_index: usize,
    name: &BlockName,
    selector: &Selector,
) -> Option<SsrRef> {
    for document in ctx.documents.iter() {
        if let Some(ssr) = document.html.select(selector).nth(live_index) {
            debug!("{} #{} matched by index in {}", name, live_index, document.url);
            return Some(ctx.ssr_ref(document, ssr));
        }
    }

    if let Some(primary) = ctx.documents.primary()
        && let Some(ssr_main) = find_main(&primary.html)
        && let Some(ssr) = translate_and_climb(ctx, live_element, primary, ssr_main, name)
    {
        return Some(ssr);
    }

    ctx.documents.secondary().find_map(|document| {
        let root = main_or_root(&document.html);
        translate_and_climb(ctx, live_element, document, root, name)
    })
}

fn translate_and_climb<'d>(
    ctx: &DetectionContext<'_>,
    live_element: ElementRef<'_>,
    document: &'d SsrDocument,
    root: ElementRef<'d>,
    name: &BlockName,
) -> Option<SsrRef> {
    let decoded = ctx.translate_live_to(live_element, root)?;
    let found = std::iter::once(decoded)
        .chain(ancestors_until(decoded, Some(root)))
        .find(|candidate| name.matches(*candidate))?;
    debug!("{} matched by path translation in {}", name, document.url);
    Some(ctx.ssr_ref(document, found))
}
