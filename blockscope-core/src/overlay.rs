// Overlay geometry: one floating marker per detected item

use crate::model::{BlockCategory, DetectionResult};
use crate::path::ElementPath;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Returns whether the host integration is still alive.
pub type LivenessProbe = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Geometry supplied by whatever renders the live page.
pub trait LayoutSource {
    /// Viewport-relative box of the element, like `getBoundingClientRect()`.
    fn bounding_client_rect(&self, element: &ElementPath) -> Option<Rect>;
    fn scroll_offset(&self) -> (f64, f64);
    fn document_extent(&self) -> (f64, f64);
}

/// Layout captured ahead of time, keyed by live element path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticLayout {
    #[serde(default)]
    pub scroll: (f64, f64),
    #[serde(default)]
    pub extent: (f64, f64),
    #[serde(default)]
    pub rects: Vec<(ElementPath, Rect)>,
}

impl StaticLayout {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

impl LayoutSource for StaticLayout {
    fn bounding_client_rect(&self, element: &ElementPath) -> Option<Rect> {
        self.rects
            .iter()
            .find(|(path, _)| path == element)
            .map(|(_, rect)| *rect)
    }

    fn scroll_offset(&self) -> (f64, f64) {
        self.scroll
    }

    fn document_extent(&self) -> (f64, f64) {
        self.extent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayCategory {
    Section,
    Block,
    DefaultContent,
    Button,
    Icon,
}

impl OverlayCategory {
    pub const ALL: [OverlayCategory; 5] = [
        OverlayCategory::Section,
        OverlayCategory::Block,
        OverlayCategory::DefaultContent,
        OverlayCategory::Button,
        OverlayCategory::Icon,
    ];

    pub fn for_block(category: BlockCategory) -> Self {
        match category {
            BlockCategory::Block => OverlayCategory::Block,
            BlockCategory::Button => OverlayCategory::Button,
            BlockCategory::Icon => OverlayCategory::Icon,
            _ => OverlayCategory::DefaultContent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleCommand {
    SetOverlaysVisible(bool),
    SetCategory(OverlayCategory, bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Scroll,
    Resize,
    /// The document root changed size.
    RootResized,
    Toggle(ToggleCommand),
    AnalysisComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMarker {
    pub item_id: String,
    pub label: String,
    pub category: OverlayCategory,
    /// Page coordinates (viewport rect shifted by scroll offset).
    pub rect: Rect,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub container: (f64, f64),
    pub host_reachable: bool,
    pub markers: Vec<OverlayMarker>,
}

impl OverlayFrame {
    pub fn visible_markers(&self) -> impl Iterator<Item = &OverlayMarker> {
        self.markers.iter().filter(|m| m.visible)
    }
}

/// Keeps markers positioned over the items of the current result. A marker
/// is shown only when overlays are on and its category is enabled.
pub struct OverlayRefresher {
    overlays_visible: bool,
    categories: HashMap<OverlayCategory, bool>,
    probe: Option<LivenessProbe>,
    probe_timeout: Duration,
    frame: OverlayFrame,
}

impl OverlayRefresher {
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            overlays_visible: true,
            categories: OverlayCategory::ALL.iter().map(|c| (*c, true)).collect(),
            probe: None,
            probe_timeout,
            frame: OverlayFrame::default(),
        }
    }

    pub fn with_probe(mut self, probe: LivenessProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn overlays_visible(&self) -> bool {
        self.overlays_visible
    }

    pub fn category_enabled(&self, category: OverlayCategory) -> bool {
        self.categories.get(&category).copied().unwrap_or(true)
    }

    pub fn frame(&self) -> &OverlayFrame {
        &self.frame
    }

    pub fn apply(&mut self, command: ToggleCommand) {
        match command {
            ToggleCommand::SetOverlaysVisible(visible) => self.overlays_visible = visible,
            ToggleCommand::SetCategory(category, enabled) => {
                self.categories.insert(category, enabled);
            }
        }
    }

    /// Apply a trigger and recompute the frame.
    pub async fn handle(
        &mut self,
        trigger: RefreshTrigger,
        result: &DetectionResult,
        layout: &dyn LayoutSource,
    ) -> &OverlayFrame {
        debug!("Overlay refresh: {:?}", trigger);
        if let RefreshTrigger::Toggle(command) = trigger {
            self.apply(command);
        }
        self.refresh(result, layout).await
    }

    pub async fn refresh(
        &mut self,
        result: &DetectionResult,
        layout: &dyn LayoutSource,
    ) -> &OverlayFrame {
        let reachable = self.host_reachable().await;
        if !reachable {
            warn!("Host unreachable, hiding all overlays");
            self.overlays_visible = false;
        }

        let (scroll_x, scroll_y) = layout.scroll_offset();
        let mut markers = Vec::new();

        let sections = result.sections.iter().map(|s| {
            let label = s.label.clone().unwrap_or_else(|| s.id.clone());
            (&s.id, label, OverlayCategory::Section, Some(&s.element))
        });
        let blocks = result.blocks.iter().map(|b| {
            (
                &b.id,
                b.name.clone(),
                OverlayCategory::for_block(b.category),
                Some(&b.element),
            )
        });
        let icons = result
            .icons
            .iter()
            .map(|i| (&i.id, i.name.clone(), OverlayCategory::Icon, i.element.as_ref()));

        for (id, label, category, element) in sections.chain(blocks).chain(icons) {
            let rect = element.and_then(|path| layout.bounding_client_rect(path));
            let visible = self.overlays_visible
                && self.category_enabled(category)
                && rect.is_some_and(|r| r.width > 0.0 && r.height > 0.0);
            let rect = rect
                .map(|r| Rect {
                    x: r.x + scroll_x,
                    y: r.y + scroll_y,
                    ..r
                })
                .unwrap_or_default();

            markers.push(OverlayMarker {
                item_id: id.clone(),
                label,
                category,
                rect,
                visible,
            });
        }

        self.frame = OverlayFrame {
            container: layout.document_extent(),
            host_reachable: reachable,
            markers,
        };
        &self.frame
    }

    async fn host_reachable(&self) -> bool {
        let Some(probe) = &self.probe else {
            return true;
        };
        match tokio::time::timeout(self.probe_timeout, probe()).await {
            Ok(alive) => alive,
            Err(_) => {
                debug!("Liveness probe timed out after {:?}", self.probe_timeout);
                false
            }
        }
    }
}
