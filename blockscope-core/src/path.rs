// Root-relative element addressing shared by every detector

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Child indices from a root down to an element, counting element children
/// only (text and comment nodes are skipped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(Vec<usize>);

impl ElementPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` addresses `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &ElementPath) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Paths of every strict ancestor, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ElementPath> + '_ {
        (0..self.0.len()).rev().map(|len| ElementPath(self.0[..len].to_vec()))
    }

    pub fn join(&self, tail: &ElementPath) -> ElementPath {
        let mut indices = self.0.clone();
        indices.extend_from_slice(&tail.0);
        ElementPath(indices)
    }

    /// The remainder of `self` below `prefix`, if `prefix` is an ancestor path.
    pub fn strip_prefix(&self, prefix: &ElementPath) -> Option<ElementPath> {
        self.0.strip_prefix(prefix.0.as_slice()).map(|rest| ElementPath(rest.to_vec()))
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

pub fn element_children<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Index of `element` among its parent's element children.
pub fn element_index(element: ElementRef<'_>) -> Option<usize> {
    let parent = parent_element(element)?;
    element_children(parent).position(|child| child == element)
}

/// Encode `element`'s position below `root`.
///
/// Returns an empty path when `element` is `root`. If `root` is not an
/// ancestor the walk stops at the top of the tree and the partial path from
/// there is returned.
pub fn encode_path(element: ElementRef<'_>, root: ElementRef<'_>) -> ElementPath {
    let mut indices = Vec::new();
    let mut current = element;

    while current != root {
        let Some(index) = element_index(current) else {
            break;
        };
        indices.push(index);
        match parent_element(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    indices.reverse();
    ElementPath(indices)
}

/// Walk `path` down from `root`; `None` at the first out-of-range index.
pub fn decode_path<'a>(root: ElementRef<'a>, path: &ElementPath) -> Option<ElementRef<'a>> {
    let mut current = root;
    for &index in path.as_slice() {
        current = element_children(current).nth(index)?;
    }
    Some(current)
}

/// Path from the owning document's root element (`<html>`).
pub fn document_path(element: ElementRef<'_>) -> ElementPath {
    let mut top = element;
    while let Some(parent) = parent_element(top) {
        top = parent;
    }
    encode_path(element, top)
}
