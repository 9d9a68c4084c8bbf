// State threaded through every detection pass of one analysis run

use crate::config::EngineConfig;
use crate::dom::{ancestors_until, find_main, main_or_root};
use crate::error::{EngineError, Result};
use crate::model::{Block, BlockCategory, DetectionResult, Icon, Section, SsrRef};
use crate::path::{ElementPath, decode_path, document_path, encode_path};
use blockscope_fetch::{SsrDocument, SsrDocumentSet};
use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// The live snapshot with its `<main>` located.
pub struct LivePage<'a> {
    pub document: &'a Html,
    pub main: ElementRef<'a>,
    pub main_path: ElementPath,
}

impl<'a> LivePage<'a> {
    pub fn new(document: &'a Html) -> Result<Self> {
        let main = find_main(document).ok_or(EngineError::MissingMain)?;
        Ok(Self {
            document,
            main,
            main_path: document_path(main),
        })
    }

    /// Path relative to live `<main>`, if the element is inside it.
    pub fn main_relative(&self, element: ElementRef<'_>) -> Option<ElementPath> {
        document_path(element).strip_prefix(&self.main_path)
    }
}

/// Claimed-element bookkeeping plus the result being built. Passes read and
/// extend it in order; a pass only sees claims committed by earlier passes.
pub struct DetectionContext<'a> {
    pub live: LivePage<'a>,
    pub documents: &'a SsrDocumentSet,
    pub config: &'a EngineConfig,
    claimed_sections: HashSet<ElementPath>,
    claimed_blocks: HashSet<ElementPath>,
    claimed_names: HashSet<String>,
    claimed_ssr_sections: HashSet<SsrRef>,
    claimed_ssr_blocks: HashSet<SsrRef>,
    result: DetectionResult,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        live_document: &'a Html,
        documents: &'a SsrDocumentSet,
        config: &'a EngineConfig,
    ) -> Result<Self> {
        let live = LivePage::new(live_document)?;
        Ok(Self {
            live,
            documents,
            config,
            claimed_sections: HashSet::new(),
            claimed_blocks: HashSet::new(),
            claimed_names: HashSet::new(),
            claimed_ssr_sections: HashSet::new(),
            claimed_ssr_blocks: HashSet::new(),
            result: DetectionResult {
                page_url: documents.primary_url().to_string(),
                ..DetectionResult::default()
            },
        })
    }

    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn into_result(self) -> DetectionResult {
        self.result
    }

    // ------------------------------------------------------------------
    // Live-side claims
    // ------------------------------------------------------------------

    pub fn is_claimed(&self, path: &ElementPath) -> bool {
        self.claimed_sections.contains(path) || self.claimed_blocks.contains(path)
    }

    /// A strict ancestor is already a block.
    pub fn is_inside_claimed_block(&self, path: &ElementPath) -> bool {
        path.ancestors().any(|a| self.claimed_blocks.contains(&a))
    }

    /// A strict ancestor is already a section.
    pub fn is_inside_claimed_section(&self, path: &ElementPath) -> bool {
        path.ancestors().any(|a| self.claimed_sections.contains(&a))
    }

    pub fn claimed_names(&self) -> &HashSet<String> {
        &self.claimed_names
    }

    pub fn next_section_id(&self) -> String {
        format!("section-{}", self.result.sections.len())
    }

    pub fn next_block_id(&self) -> String {
        format!("block-{}", self.result.blocks.len())
    }

    pub fn next_icon_id(&self) -> String {
        format!("icon-{}", self.result.icons.len())
    }

    pub fn claim_section(&mut self, section: Section) {
        self.claimed_sections.insert(section.element.clone());
        if let Some(ssr) = &section.ssr {
            self.claimed_ssr_sections.insert(ssr.clone());
        }
        self.result.sections.push(section);
    }

    pub fn claim_block(&mut self, block: Block) {
        self.claimed_blocks.insert(block.element.clone());
        if block.category == BlockCategory::Block {
            self.claimed_names.insert(block.name.clone());
        }
        if let Some(ssr) = &block.ssr {
            self.claimed_ssr_blocks.insert(ssr.clone());
        }
        self.result.blocks.push(block);
    }

    pub fn push_icon(&mut self, icon: Icon) {
        self.result.icons.push(icon);
    }

    // ------------------------------------------------------------------
    // SSR side
    // ------------------------------------------------------------------

    pub fn ssr_ref(&self, document: &SsrDocument, element: ElementRef<'_>) -> SsrRef {
        SsrRef {
            document_url: document.url.clone(),
            path: document_path(element),
        }
    }

    pub fn resolve_ssr(&self, ssr: &SsrRef) -> Option<ElementRef<'a>> {
        let document = self.documents.get(&ssr.document_url)?;
        decode_path(document.html.root_element(), &ssr.path)
    }

    /// An SSR element already consumed as a section or block.
    pub fn is_ssr_claimed(&self, document: &SsrDocument, element: ElementRef<'_>) -> bool {
        let key = self.ssr_ref(document, element);
        self.claimed_ssr_sections.contains(&key) || self.claimed_ssr_blocks.contains(&key)
    }

    /// The SSR element sits inside a claimed block, judged on the SSR tree:
    /// an ancestor below the document's `<main>` was claimed as a block or
    /// carries a claimed block name as a class.
    pub fn is_ssr_inside_claimed_block(
        &self,
        document: &SsrDocument,
        element: ElementRef<'_>,
    ) -> bool {
        let root = main_or_root(&document.html);
        ancestors_until(element, Some(root)).any(|ancestor| {
            self.claimed_ssr_blocks
                .contains(&self.ssr_ref(document, ancestor))
                || ancestor
                    .value()
                    .classes()
                    .any(|c| self.claimed_names.contains(c))
        })
    }

    /// Translate a live element inside live `<main>` to the same position under
    /// `root` of another tree.
    pub fn translate_live_to<'r>(
        &self,
        live_element: ElementRef<'_>,
        root: ElementRef<'r>,
    ) -> Option<ElementRef<'r>> {
        let relative = self.live.main_relative(live_element)?;
        decode_path(root, &relative)
    }

    /// Translate an SSR element under `ssr_root` to the live tree under live
    /// `<main>`.
    pub fn translate_ssr_to_live(
        &self,
        ssr_element: ElementRef<'_>,
        ssr_root: ElementRef<'_>,
    ) -> Option<ElementRef<'a>> {
        let relative = encode_path(ssr_element, ssr_root);
        decode_path(self.live.main, &relative)
    }

    /// Which document owns `element`, found by containment.
    pub fn owning_document(&self, element: ElementRef<'_>) -> Option<&'a SsrDocument> {
        let mut top = element;
        while let Some(parent) = crate::path::parent_element(top) {
            top = parent;
        }
        self.documents
            .iter()
            .find(|document| document.html.root_element() == top)
    }
}
