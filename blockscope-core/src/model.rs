use crate::path::ElementPath;
use serde::{Deserialize, Serialize};

/// Lookup key for an element inside one SSR document: the document's
/// normalized URL plus the element's path from that document's root element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SsrRef {
    pub document_url: String,
    pub path: ElementPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Block,
    Heading,
    Text,
    Image,
    List,
    Code,
    Table,
    Quote,
    Media,
    Button,
    Icon,
}

impl BlockCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockCategory::Block => "block",
            BlockCategory::Heading => "heading",
            BlockCategory::Text => "text",
            BlockCategory::Image => "image",
            BlockCategory::List => "list",
            BlockCategory::Code => "code",
            BlockCategory::Table => "table",
            BlockCategory::Quote => "quote",
            BlockCategory::Media => "media",
            BlockCategory::Button => "button",
            BlockCategory::Icon => "icon",
        }
    }

    pub fn is_default_content(&self) -> bool {
        !matches!(
            self,
            BlockCategory::Block | BlockCategory::Button | BlockCategory::Icon
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    /// Path from the live document's root element.
    pub element: ElementPath,
    pub label: Option<String>,
    pub ssr: Option<SsrRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    /// Path from the live document's root element.
    pub element: ElementPath,
    pub ssr: Option<SsrRef>,
    pub source_document_url: Option<String>,
    pub name: String,
    pub tag_name: String,
    pub classes: Vec<String>,
    pub category: BlockCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub id: String,
    pub name: String,
    /// `None` when the icon resource is known but not rendered.
    pub element: Option<ElementPath>,
    pub url: Option<String>,
    /// Normalized SVG markup, once extracted or fetched.
    pub svg: Option<String>,
}

impl Icon {
    /// Icons that still need their SVG fetched from `url`.
    pub fn needs_fetch(&self) -> bool {
        self.svg.is_none() && self.url.is_some()
    }
}

/// Everything one analysis pass found. Replaced wholesale by the next pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub page_url: String,
    pub sections: Vec<Section>,
    pub blocks: Vec<Block>,
    pub icons: Vec<Icon>,
}

impl DetectionResult {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn blocks_in(&self, category: BlockCategory) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.blocks.is_empty() && self.icons.is_empty()
    }
}
