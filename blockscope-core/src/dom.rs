// Small read-only helpers over scraper trees

use crate::error::{EngineError, Result};
use crate::path::parent_element;
use scraper::{ElementRef, Html, Selector};

pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| EngineError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

pub fn class_list(element: ElementRef<'_>) -> Vec<String> {
    element.value().classes().map(str::to_string).collect()
}

/// `<main>` of a document, if any.
pub fn find_main(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("main").unwrap();
    document.select(&selector).next()
}

/// `<main>` of an SSR document, or its root element when it has none
/// (plain-HTML fragments usually do not).
pub fn main_or_root(document: &Html) -> ElementRef<'_> {
    find_main(document).unwrap_or_else(|| document.root_element())
}

/// Strict ancestors of `element`, nearest first, stopping before `stop` when
/// given (or at the top of the tree).
pub fn ancestors_until<'a>(
    element: ElementRef<'a>,
    stop: Option<ElementRef<'a>>,
) -> impl Iterator<Item = ElementRef<'a>> {
    let mut current = parent_element(element);
    std::iter::from_fn(move || {
        let next = current?;
        if Some(next) == stop {
            current = None;
            return None;
        }
        current = parent_element(next);
        Some(next)
    })
}

/// First `limit` characters of the trimmed text content.
pub fn text_prefix(element: ElementRef<'_>, limit: usize) -> String {
    let text: String = element.text().collect();
    text.trim().chars().take(limit).collect()
}

pub fn trimmed_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.trim().to_string()
}

/// A paragraph whose only child element is one link, the authoring form of a
/// call-to-action button. Surrounding text does not matter.
pub fn is_button_paragraph(paragraph: ElementRef<'_>) -> bool {
    if tag_name(&paragraph) != "p" {
        return false;
    }
    let mut children = paragraph.children().filter_map(ElementRef::wrap);
    match (children.next(), children.next()) {
        (Some(anchor), None) => tag_name(&anchor) == "a",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(html: &'a Html, selector: &str) -> ElementRef<'a> {
        html.select(&Selector::parse(selector).unwrap()).next().unwrap()
    }

    #[test]
    fn test_button_paragraph_shapes() {
        let html = Html::parse_document(
            r#"<main>
            <p id="a"><a href="/go">Go</a></p>
            <p id="b">Read <a href="/x">this</a> now</p>
            <p id="c"><a href="/1">1</a><a href="/2">2</a></p>
            <p id="d"> <a href="/go">Go</a> </p>
            <p id="e"><strong>Go</strong></p>
            </main>"#,
        );

        assert!(is_button_paragraph(first(&html, "#a")));
        assert!(is_button_paragraph(first(&html, "#b")));
        assert!(!is_button_paragraph(first(&html, "#c")));
        assert!(is_button_paragraph(first(&html, "#d")));
        assert!(!is_button_paragraph(first(&html, "#e")));
    }

    #[test]
    fn test_ancestors_until_stops_before_bound() {
        let html = Html::parse_document(
            r#"<main><div class="outer"><div class="inner"><span id="s"></span></div></div></main>"#,
        );
        let main = first(&html, "main");
        let span = first(&html, "#s");
        let classes: Vec<Vec<String>> = ancestors_until(span, Some(main)).map(class_list).collect();

        assert_eq!(
            classes,
            vec![vec!["inner".to_string()], vec!["outer".to_string()]]
        );
    }

    #[test]
    fn test_compile_selector_error() {
        assert!(matches!(
            compile_selector(".2col"),
            Err(EngineError::Selector { .. })
        ));
        assert!(compile_selector(".cards").is_ok());
    }

    #[test]
    fn test_text_prefix() {
        let html = Html::parse_document("<p id=\"t\">   Hello   world   </p>");
        assert_eq!(text_prefix(first(&html, "#t"), 5), "Hello");
    }
}
