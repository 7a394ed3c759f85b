//! Read-only tree primitives over a parsed HTML document.
//!
//! Parsing is delegated to `scraper` (html5ever). Everything in this module is
//! a pure view over the parsed tree; nothing here mutates the document.

use crate::expression::{is_valid_name, Axis, NodeTest, Predicate, Step};
use scraper::{ElementRef, Html};

/// An in-memory, immutable HTML document.
///
/// Elements handed out by this type (as [`ElementRef`]) are only meaningful for
/// the lifetime of the document they were taken from. Two elements are the
/// same only if they sit at the same tree position of the same instance.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses markup into a document.
    ///
    /// HTML parsing is error-recovering, so this never fails. Implied
    /// `html`, `head` and `body` elements are created by the parser.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The document element (`<html>`).
    pub fn root_element(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Every element of the document in pre-order (document order).
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap)
    }

    /// Elements that are direct children of the document node.
    pub(crate) fn top_level_elements(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.html.tree.root().children().filter_map(ElementRef::wrap)
    }

    /// Returns `true` when `element` is a node of this very document instance.
    pub fn contains(&self, element: &ElementRef<'_>) -> bool {
        self.html
            .tree
            .get(element.id())
            .is_some_and(|node| node == **element)
    }

    /// Canonical positional path from the root to `element`, e.g.
    /// `/html/body/div/span[2]`.
    pub fn full_path(&self, element: ElementRef<'_>) -> String {
        path_steps(element).iter().map(Step::to_string).collect()
    }
}

/// Lowercase local tag name of an element.
pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

/// Text of the first direct text-node child, if any.
///
/// This is what XPath's `text()` yields in a string context: nested elements
/// and later text nodes are not included.
pub fn direct_text<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    element
        .children()
        .find_map(|child| child.value().as_text())
        .map(|text| &**text)
}

/// Element children of `element`, looking through document fragments.
///
/// The parser stores the contents of `<template>` under a fragment node; those
/// elements are reported as children of the template element itself.
pub fn child_elements<'a>(element: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    let mut pending: Vec<_> = element.children().rev().collect();
    while let Some(node) = pending.pop() {
        if let Some(child) = ElementRef::wrap(node) {
            found.push(child);
        } else if node.value().is_fragment() {
            pending.extend(node.children().rev());
        }
    }
    found
}

/// Element siblings of `element`, itself included, in document order.
fn sibling_elements<'a>(element: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let Some(mut parent) = element.parent() else {
        return vec![*element];
    };
    while parent.value().is_fragment() {
        match parent.parent() {
            Some(next) => parent = next,
            None => break,
        }
    }

    match ElementRef::wrap(parent) {
        Some(parent) => child_elements(&parent),
        None => parent.children().filter_map(ElementRef::wrap).collect(),
    }
}

/// 1-based position of `element` among the siblings accepted by `same`.
///
/// Returns `None` when no other sibling is accepted, in which case a
/// positional step needs no index.
fn position_among(element: &ElementRef<'_>, same: impl Fn(&ElementRef<'_>) -> bool) -> Option<usize> {
    let mut position = None;
    let mut count = 0usize;
    for sibling in sibling_elements(element) {
        if !same(&sibling) {
            continue;
        }
        count += 1;
        if sibling == *element {
            position = Some(count);
        }
    }

    if count > 1 {
        position
    } else {
        None
    }
}

/// 1-based position of `element` among its siblings with the same tag.
///
/// Returns `None` when the element has no same-tag sibling.
pub fn sibling_position(element: &ElementRef<'_>) -> Option<usize> {
    let tag = tag_name(element);
    position_among(element, |sibling| tag_name(sibling) == tag)
}

/// Elements from the document root down to `element`, inclusive.
pub fn lineage(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut chain = vec![element];
    let mut current = element.parent();
    while let Some(node) = current {
        chain.extend(ElementRef::wrap(node));
        current = node.parent();
    }
    chain.reverse();
    chain
}

/// Positional step selecting `element` below its parent element.
///
/// Tags the locator grammar cannot spell are addressed as `*` with a position
/// among all sibling elements.
fn positional_step(element: &ElementRef<'_>) -> Step {
    let tag = tag_name(element);
    if is_valid_name(tag) {
        Step {
            axis: Axis::Child,
            test: NodeTest::Tag(tag.to_string()),
            predicates: sibling_position(element)
                .map(Predicate::Position)
                .into_iter()
                .collect(),
        }
    } else {
        Step {
            axis: Axis::Child,
            test: NodeTest::Any,
            predicates: position_among(element, |_| true)
                .map(Predicate::Position)
                .into_iter()
                .collect(),
        }
    }
}

/// Positional steps from the root to `element`, one per element of its
/// [`lineage`].
pub fn path_steps(element: ElementRef<'_>) -> Vec<Step> {
    lineage(element).iter().map(positional_step).collect()
}

/// Collapses runs of XML whitespace into a single space and trims both ends.
///
/// Only space, tab, carriage return and line feed count as whitespace, as in
/// XPath `normalize-space`. A non-breaking space is kept.
pub fn normalize_space(value: &str) -> String {
    value
        .split([' ', '\t', '\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
