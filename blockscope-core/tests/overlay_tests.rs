// Tests for overlay geometry and visibility

use blockscope_core::overlay::{
    LivenessProbe, OverlayCategory, OverlayRefresher, Rect, RefreshTrigger, StaticLayout,
    ToggleCommand,
};
use blockscope_core::path::ElementPath;
use blockscope_core::{Block, BlockCategory, DetectionResult, Icon, Section};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

fn block(id: &str, name: &str, path: Vec<usize>, category: BlockCategory) -> Block {
    Block {
        id: id.to_string(),
        element: ElementPath::new(path),
        ssr: None,
        source_document_url: None,
        name: name.to_string(),
        tag_name: "div".to_string(),
        classes: Vec::new(),
        category,
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect { x, y, width, height }
}

fn sample_result() -> DetectionResult {
    DetectionResult {
        page_url: "https://example.com/page".to_string(),
        sections: vec![Section {
            id: "section-0".to_string(),
            element: ElementPath::new(vec![1, 0, 0]),
            label: Some("Intro".to_string()),
            ssr: None,
        }],
        blocks: vec![
            block("block-0", "hero", vec![1, 0, 0, 0], BlockCategory::Block),
            block("block-1", "p", vec![1, 0, 0, 1], BlockCategory::Text),
            block("block-2", "button", vec![1, 0, 0, 2], BlockCategory::Button),
            block("block-3", "h2", vec![1, 0, 0, 3], BlockCategory::Heading),
        ],
        icons: vec![Icon {
            id: "icon-0".to_string(),
            name: "search".to_string(),
            element: None,
            url: Some("https://example.com/icons/search.svg".to_string()),
            svg: None,
        }],
    }
}

fn sample_layout() -> StaticLayout {
    StaticLayout {
        scroll: (0.0, 100.0),
        extent: (1280.0, 4000.0),
        rects: vec![
            (ElementPath::new(vec![1, 0, 0]), rect(0.0, 0.0, 1280.0, 800.0)),
            (ElementPath::new(vec![1, 0, 0, 0]), rect(10.0, 20.0, 600.0, 300.0)),
            (ElementPath::new(vec![1, 0, 0, 1]), rect(10.0, 340.0, 600.0, 40.0)),
            (ElementPath::new(vec![1, 0, 0, 2]), rect(10.0, 400.0, 120.0, 32.0)),
            // collapsed heading
            (ElementPath::new(vec![1, 0, 0, 3]), rect(10.0, 450.0, 0.0, 0.0)),
        ],
    }
}

fn visible_ids(refresher: &OverlayRefresher) -> Vec<String> {
    refresher
        .frame()
        .visible_markers()
        .map(|m| m.item_id.clone())
        .collect()
}

#[tokio::test]
async fn test_markers_follow_layout() {
    let result = sample_result();
    let layout = sample_layout();
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500));

    let frame = refresher
        .handle(RefreshTrigger::AnalysisComplete, &result, &layout)
        .await;

    assert!(frame.host_reachable);
    assert_eq!(frame.container, (1280.0, 4000.0));
    assert_eq!(frame.markers.len(), 6);

    let hero = frame.markers.iter().find(|m| m.item_id == "block-0").unwrap();
    assert_eq!(hero.rect, rect(10.0, 120.0, 600.0, 300.0));
    assert_eq!(hero.category, OverlayCategory::Block);

    let section = frame.markers.iter().find(|m| m.item_id == "section-0").unwrap();
    assert_eq!(section.label, "Intro");

    assert_eq!(
        visible_ids(&refresher),
        vec!["section-0", "block-0", "block-1", "block-2"]
    );
}

#[tokio::test]
async fn test_category_toggles() {
    let result = sample_result();
    let layout = sample_layout();
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500));

    refresher
        .handle(
            RefreshTrigger::Toggle(ToggleCommand::SetCategory(OverlayCategory::DefaultContent, false)),
            &result,
            &layout,
        )
        .await;
    assert!(!refresher.category_enabled(OverlayCategory::DefaultContent));
    assert_eq!(visible_ids(&refresher), vec!["section-0", "block-0", "block-2"]);

    refresher
        .handle(
            RefreshTrigger::Toggle(ToggleCommand::SetCategory(OverlayCategory::Section, false)),
            &result,
            &layout,
        )
        .await;
    assert_eq!(visible_ids(&refresher), vec!["block-0", "block-2"]);
}

#[tokio::test]
async fn test_master_toggle_hides_everything() {
    let result = sample_result();
    let layout = sample_layout();
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500));

    refresher
        .handle(
            RefreshTrigger::Toggle(ToggleCommand::SetOverlaysVisible(false)),
            &result,
            &layout,
        )
        .await;
    assert!(!refresher.overlays_visible());
    assert!(visible_ids(&refresher).is_empty());
    assert_eq!(refresher.frame().markers.len(), 6);

    refresher.apply(ToggleCommand::SetOverlaysVisible(true));
    refresher
        .handle(RefreshTrigger::Scroll, &result, &layout)
        .await;
    assert_eq!(visible_ids(&refresher).len(), 4);
}

#[tokio::test]
async fn test_scroll_shifts_markers() {
    let result = sample_result();
    let mut layout = sample_layout();
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500));

    layout.scroll = (5.0, 900.0);
    let frame = refresher
        .handle(RefreshTrigger::Scroll, &result, &layout)
        .await;
    let text = frame.markers.iter().find(|m| m.item_id == "block-1").unwrap();

    assert_eq!(text.rect, rect(15.0, 1240.0, 600.0, 40.0));
}

#[tokio::test]
async fn test_unreachable_host_hides_overlays() {
    let result = sample_result();
    let layout = sample_layout();
    let probe: LivenessProbe = Arc::new(|| async { false }.boxed());
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500)).with_probe(probe);

    let frame = refresher
        .handle(RefreshTrigger::Resize, &result, &layout)
        .await;

    assert!(!frame.host_reachable);
    assert!(!refresher.overlays_visible());
    assert!(visible_ids(&refresher).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_probe_counts_as_unreachable() {
    let result = sample_result();
    let layout = sample_layout();
    let probe: LivenessProbe = Arc::new(|| {
        async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            true
        }
        .boxed()
    });
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500)).with_probe(probe);

    let frame = refresher
        .handle(RefreshTrigger::RootResized, &result, &layout)
        .await;

    assert!(!frame.host_reachable);
}

#[tokio::test]
async fn test_live_probe_keeps_overlays() {
    let result = sample_result();
    let layout = sample_layout();
    let probe: LivenessProbe = Arc::new(|| async { true }.boxed());
    let mut refresher = OverlayRefresher::new(Duration::from_millis(500)).with_probe(probe);

    let frame = refresher
        .handle(RefreshTrigger::AnalysisComplete, &result, &layout)
        .await;

    assert!(frame.host_reachable);
    assert!(refresher.overlays_visible());
}

#[test]
fn test_static_layout_from_json() {
    let json = r#"{
        "scroll": [0.0, 50.0],
        "extent": [1024.0, 2048.0],
        "rects": [[[1, 0, 0], {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}]]
    }"#;
    let layout = StaticLayout::from_json(json).unwrap();

    assert_eq!(layout.scroll, (0.0, 50.0));
    assert_eq!(layout.rects.len(), 1);
    assert_eq!(layout.rects[0].0, ElementPath::new(vec![1, 0, 0]));
    assert_eq!(layout.rects[0].1, rect(1.0, 2.0, 3.0, 4.0));
}
