// Tests for element path addressing

use blockscope_core::path::{ElementPath, decode_path, document_path, encode_path};
use scraper::{ElementRef, Html, Selector};

fn select_one<'a>(html: &'a Html, selector: &str) -> ElementRef<'a> {
    html.select(&Selector::parse(selector).unwrap())
        .next()
        .unwrap()
}

const PAGE: &str = r#"<html><body><main>
    <div class="a"><p>one</p><p>two <span id="x">three</span></p></div>
    <!-- comment -->
    <div class="b"><ul><li>i</li><li id="y">ii</li></ul></div>
</main></body></html>"#;

// ============================================================================
// Encode / Decode
// ============================================================================

#[test]
fn test_encode_path_counts_elements_only() {
    let html = Html::parse_document(PAGE);
    let main = select_one(&html, "main");
    let x = select_one(&html, "#x");
    let y = select_one(&html, "#y");

    assert_eq!(encode_path(x, main), ElementPath::new(vec![0, 1, 0]));
    assert_eq!(encode_path(y, main), ElementPath::new(vec![1, 0, 1]));
}

#[test]
fn test_encode_root_is_empty() {
    let html = Html::parse_document(PAGE);
    let main = select_one(&html, "main");

    let path = encode_path(main, main);
    assert!(path.is_empty());
    assert_eq!(decode_path(main, &path), Some(main));
}

#[test]
fn test_round_trip_every_descendant() {
    let html = Html::parse_document(PAGE);
    let main = select_one(&html, "main");

    for element in main.descendants().filter_map(ElementRef::wrap) {
        let path = encode_path(element, main);
        assert_eq!(decode_path(main, &path), Some(element), "path {}", path);
    }
}

#[test]
fn test_decode_out_of_range_is_none() {
    let html = Html::parse_document(PAGE);
    let main = select_one(&html, "main");

    assert_eq!(decode_path(main, &ElementPath::new(vec![2])), None);
    assert_eq!(decode_path(main, &ElementPath::new(vec![0, 1, 5])), None);
}

#[test]
fn test_encode_with_unrelated_root_is_partial() {
    let html = Html::parse_document(PAGE);
    let x = select_one(&html, "#x");
    let unrelated = select_one(&html, "div.b");

    let path = encode_path(x, unrelated);
    assert_eq!(path, document_path(x));
    assert_ne!(decode_path(unrelated, &path), Some(x));
}

#[test]
fn test_translation_between_isomorphic_trees() {
    let live = Html::parse_document(PAGE);
    let ssr = Html::parse_document(PAGE);
    let live_main = select_one(&live, "main");
    let ssr_main = select_one(&ssr, "main");

    let path = encode_path(select_one(&live, "#y"), live_main);
    let translated = decode_path(ssr_main, &path).unwrap();
    assert_eq!(translated.value().id(), Some("y"));
}

// ============================================================================
// ElementPath helpers
// ============================================================================

#[test]
fn test_prefix_and_strip() {
    let main = ElementPath::new(vec![1, 0]);
    let inner = ElementPath::new(vec![1, 0, 3, 2]);

    assert!(main.is_prefix_of(&inner));
    assert!(!inner.is_prefix_of(&main));
    assert_eq!(inner.strip_prefix(&main), Some(ElementPath::new(vec![3, 2])));
    assert_eq!(main.join(&ElementPath::new(vec![3, 2])), inner);
    assert_eq!(main.strip_prefix(&inner), None);
}

#[test]
fn test_document_path_starts_at_html() {
    let html = Html::parse_document(PAGE);
    let main = select_one(&html, "main");

    // html > [head, body] > main
    assert_eq!(document_path(main), ElementPath::new(vec![1, 0]));
    assert_eq!(
        decode_path(html.root_element(), &document_path(main)),
        Some(main)
    );
}
