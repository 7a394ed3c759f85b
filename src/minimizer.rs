//! Derives the shortest unique locator for an element.

use crate::config::LocatorConfig;
use crate::document::{lineage, path_steps, HtmlDocument};
use crate::error::LocatorError;
use crate::expression::{is_expressible_literal, is_valid_name, Locator};
use scraper::ElementRef;

/// Outcome of [`rewrite_checked`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten locator, or the input when nothing matched.
    pub locator: String,
    /// How many elements the input locator resolved to.
    pub resolved: usize,
}

impl Rewrite {
    /// `true` if the input matched several elements and only the first one was
    /// used.
    pub fn is_ambiguous(&self) -> bool {
        self.resolved > 1
    }
}

/// Tries to identify `element` by a single attribute.
///
/// Attributes are tried in `config.anchor_attributes` order. An attribute
/// qualifies only when its name can be spelled in a locator, its value is
/// present, non-empty and expressible as a literal, and `//*[@name='value']`
/// selects exactly this element.
pub fn try_attribute_anchor(
    document: &HtmlDocument,
    element: ElementRef<'_>,
    config: &LocatorConfig,
) -> Option<Locator> {
    for name in config
        .anchor_attributes
        .iter()
        .filter(|name| is_valid_name(name))
    {
        let Some(value) = element.value().attr(name) else {
            continue;
        };
        if value.is_empty() || !is_expressible_literal(value) {
            continue;
        }

        let anchor = Locator::attribute_anchor(name, value);
        let matches = anchor.evaluate(document);
        log::trace!("anchor {anchor} matches {} element(s)", matches.len());

        if matches.len() == 1 && matches[0] == element {
            return Some(anchor);
        }
    }

    None
}

/// Returns the shortest locator selecting exactly `element`, using the default
/// anchor attributes.
pub fn minimize(document: &HtmlDocument, element: ElementRef<'_>) -> Result<Locator, LocatorError> {
    minimize_with_config(document, element, &LocatorConfig::default())
}

/// Returns the shortest locator selecting exactly `element`.
///
/// The element itself is tried as an attribute anchor first. Failing that, its
/// ancestors are tried from the closest to the root, and the first anchored
/// ancestor is followed by the positional steps leading back down to the
/// element. When no ancestor can be anchored the full positional path is
/// returned.
///
/// # Errors
///
/// Returns [`LocatorError::DetachedNode`] if `element` does not belong to
/// `document`. This is a caller bug, not a recoverable condition.
pub fn minimize_with_config(
    document: &HtmlDocument,
    element: ElementRef<'_>,
    config: &LocatorConfig,
) -> Result<Locator, LocatorError> {
    if !document.contains(&element) {
        return Err(LocatorError::DetachedNode);
    }

    if let Some(anchor) = try_attribute_anchor(document, element, config) {
        log::debug!("element anchored directly on {anchor}");
        return Ok(anchor);
    }

    let chain = lineage(element);
    let steps = path_steps(element);

    for depth in (0..chain.len().saturating_sub(1)).rev() {
        if let Some(anchor) = try_attribute_anchor(document, chain[depth], config) {
            log::debug!(
                "anchored on ancestor {anchor}, {} step(s) below",
                steps.len() - depth - 1
            );
            return Ok(anchor.join(&steps[depth + 1..]));
        }
    }

    log::debug!("no unique anchor found, falling back to the full path");
    Ok(Locator::from_steps(steps))
}

/// Rewrites an existing locator into its minimal form.
///
/// See [`rewrite_checked`] for the details; this variant only returns the
/// locator string.
pub fn rewrite(document: &HtmlDocument, existing: &str) -> Result<String, LocatorError> {
    rewrite_checked(document, existing, &LocatorConfig::default()).map(|rewrite| rewrite.locator)
}

/// Rewrites an existing locator into its minimal form, reporting how many
/// elements the input matched.
///
/// A trailing `/text()` or `/@name` selector is set aside before resolution and
/// appended to the result. If the locator matches nothing, it is returned
/// unchanged. If it matches several elements, the first one in document order
/// is minimized and a warning is logged.
///
/// # Errors
///
/// Returns [`LocatorError::InvalidExpression`] if `existing` is not a supported
/// locator.
pub fn rewrite_checked(
    document: &HtmlDocument,
    existing: &str,
    config: &LocatorConfig,
) -> Result<Rewrite, LocatorError> {
    let (elements_locator, terminal) = existing.parse::<Locator>()?.split_terminal();
    let matches = elements_locator.evaluate(document);

    let Some(first) = matches.first().copied() else {
        log::debug!("locator {existing} matches nothing, leaving it unchanged");
        return Ok(Rewrite {
            locator: existing.to_string(),
            resolved: 0,
        });
    };

    if matches.len() > 1 {
        log::warn!(
            "Warning: Locator {existing} matched {} elements. Rewriting the first match only.",
            matches.len()
        );
    }

    let minimized = minimize_with_config(document, first, config)?.with_terminal(terminal);

    Ok(Rewrite {
        locator: minimized.to_string(),
        resolved: matches.len(),
    })
}
