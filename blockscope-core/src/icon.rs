// Icon detection: known icon resources first, then a DOM-only sweep

use crate::context::DetectionContext;
use crate::dom::compile_selector;
use crate::model::Icon;
use crate::path::{ElementPath, document_path};
use regex::Regex;
use scraper::ElementRef;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

fn svg_open_tag() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)^\s*<svg\b([^>]*?)(/?)>").unwrap())
}

fn size_attribute() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\s(?:width|height)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+)"#).unwrap()
    })
}

/// Force an SVG's root `width`/`height` to `size`. Markup without an `<svg>`
/// root is returned unchanged.
pub fn normalize_svg(markup: &str, size: u32) -> String {
    let Some(captures) = svg_open_tag().captures(markup) else {
        return markup.to_string();
    };
    let whole = captures.get(0).map_or(0..0, |m| m.range());
    let attributes = size_attribute().replace_all(&captures[1], "");
    let self_closing = &captures[2];

    format!(
        "<svg{} width=\"{}\" height=\"{}\"{}>{}",
        attributes.trim_end(),
        size,
        size,
        self_closing,
        &markup[whole.end..]
    )
}

/// Icon name from an `icon-<name>` class.
pub fn icon_name_from_classes(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .classes()
        .filter_map(|class| class.strip_prefix("icon-"))
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

fn inline_svg(element: ElementRef<'_>, size: u32) -> Option<String> {
    let selector = compile_selector("svg").ok()?;
    element
        .select(&selector)
        .next()
        .map(|svg| normalize_svg(&svg.html(), size))
}

/// Known icon resources (emitted even when not rendered) and any further
/// `span.icon` elements. One icon per name; first occurrence wins.
pub fn detect_icons(ctx: &mut DetectionContext<'_>, icon_names: &BTreeMap<String, String>) {
    let document = ctx.live.document;
    let size = ctx.config.icon_size;
    let mut captured: HashSet<ElementPath> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (name, url) in icon_names {
        let selector = match compile_selector(&format!(".icon-{}", name)) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping icon {}: {}", name, e);
                continue;
            }
        };

        let rendered = document.select(&selector).next();
        let element = rendered.map(document_path);
        let svg = rendered.and_then(|el| inline_svg(el, size));
        if element.is_none() {
            debug!("Icon {} is known but not rendered", name);
        }

        if let Some(path) = &element {
            captured.insert(path.clone());
        }
        seen.insert(name.clone());
        let icon = Icon {
            id: ctx.next_icon_id(),
            name: name.clone(),
            element,
            url: Some(url.clone()),
            svg,
        };
        ctx.push_icon(icon);
    }

    let Ok(sweep) = compile_selector(r#"span.icon, span[class*="icon-"]"#) else {
        return;
    };
    for element in document.select(&sweep) {
        let path = document_path(element);
        if captured.contains(&path) {
            continue;
        }
        let Some(name) = icon_name_from_classes(element) else {
            continue;
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        captured.insert(path.clone());

        let icon = Icon {
            id: ctx.next_icon_id(),
            name,
            element: Some(path),
            url: None,
            svg: inline_svg(element, size),
        };
        ctx.push_icon(icon);
    }

    info!("Detected {} icon(s)", ctx.result().icons.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_svg_replaces_size() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height='80' viewBox="0 0 20 20"><path d="M0 0"></path></svg>"#;
        assert_eq!(
            normalize_svg(svg, 24),
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 20" width="24" height="24"><path d="M0 0"></path></svg>"#
        );
    }

    #[test]
    fn test_normalize_svg_adds_missing_size() {
        assert_eq!(normalize_svg("<svg/>", 16), r#"<svg width="16" height="16"/>"#);
        assert_eq!(normalize_svg("<div></div>", 16), "<div></div>");
    }
}
