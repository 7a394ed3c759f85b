//! Contains the logic for finding the elements that carry a known value.

use crate::config::LocatorConfig;
use crate::document::{normalize_space, HtmlDocument};
use crate::error::LocatorError;
use crate::expression::{is_valid_name, Locator, Predicate, Terminal};
use crate::minimizer::minimize_with_config;
use scraper::ElementRef;
use serde::Serialize;

/// An element whose text or attribute holds the searched value.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch<'a> {
    pub element: ElementRef<'a>,
    /// `None` for a match in the element's text, otherwise the attribute name.
    pub attribute: Option<String>,
}

impl CandidateMatch<'_> {
    /// The selector appended to the element locator to reach the value.
    pub fn terminal(&self) -> Terminal {
        match &self.attribute {
            Some(name) => Terminal::Attribute(name.clone()),
            None => Terminal::Text,
        }
    }
}

/// A final locator for a value, as handed to front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedValue {
    pub locator: String,
    /// Name of the attribute the value was found in, `None` for text.
    pub attribute: Option<String>,
}

/// Finds every element whose direct text or one of whose attributes equals
/// `target` after whitespace normalization.
///
/// Text matches come first, then attribute matches, each group in document
/// order. An element with several matching attributes yields one candidate per
/// attribute, in source order. Attributes whose names a locator cannot spell
/// (`:href`, `@click`) are skipped. A target that is blank after normalization
/// matches nothing.
pub fn locate<'a>(document: &'a HtmlDocument, target: &str) -> Vec<CandidateMatch<'a>> {
    let needle = normalize_space(target);
    if needle.is_empty() {
        return Vec::new();
    }

    let text_matches = Locator::descendant_filter(Predicate::TextEquals(needle.clone()))
        .evaluate(document)
        .into_iter()
        .map(|element| CandidateMatch {
            element,
            attribute: None,
        });

    let attribute_matches = Locator::descendant_filter(Predicate::AnyAttributeEquals(
        needle.clone(),
    ))
    .evaluate(document)
    .into_iter()
    .flat_map(|element| {
        element
            .value()
            .attrs()
            .filter(|(_, value)| normalize_space(value) == needle)
            .filter(|(name, _)| {
                let spellable = is_valid_name(name);
                if !spellable {
                    log::trace!("skipping attribute {name:?}, it has no locator form");
                }
                spellable
            })
            .map(|(name, _)| CandidateMatch {
                element,
                attribute: Some(name.to_string()),
            })
            .collect::<Vec<_>>()
    });

    let candidates: Vec<_> = text_matches.chain(attribute_matches).collect();
    log::debug!("found {} candidate(s) for {target:?}", candidates.len());
    candidates
}

/// Appends the value selector for `candidate` to an element locator.
///
/// No uniqueness check happens here: the selector does not change which element
/// the locator picks.
pub fn compose(locator: &str, candidate: &CandidateMatch<'_>) -> String {
    format!("{locator}{}", candidate.terminal())
}

/// Locates `target` and builds a minimal locator for every candidate.
pub fn locate_values(
    document: &HtmlDocument,
    target: &str,
    config: &LocatorConfig,
) -> Result<Vec<LocatedValue>, LocatorError> {
    locate(document, target)
        .into_iter()
        .map(|candidate| {
            let element_locator = minimize_with_config(document, candidate.element, config)?;
            Ok(LocatedValue {
                locator: compose(&element_locator.to_string(), &candidate),
                attribute: candidate.attribute,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tag_name;

    const PRODUCT: &str = r#"<html><body>
<div class="product" data-sku="199.99">
    <span class="price" data-price="199.99" content=" 199.99 ">199.99</span>
    <meta itemprop="price" content="199.99">
</div>
<p>  199.99
</p>
</body></html>"#;

    fn describe(candidates: &[CandidateMatch<'_>]) -> Vec<(String, Option<String>)> {
        candidates
            .iter()
            .map(|c| (tag_name(&c.element).to_string(), c.attribute.clone()))
            .collect()
    }

    #[test]
    fn text_matches_precede_attribute_matches() {
        let doc = HtmlDocument::parse(PRODUCT);
        let candidates = locate(&doc, "199.99");

        assert_eq!(
            describe(&candidates),
            vec![
                ("span".to_string(), None),
                ("p".to_string(), None),
                ("div".to_string(), Some("data-sku".to_string())),
                ("span".to_string(), Some("data-price".to_string())),
                ("span".to_string(), Some("content".to_string())),
                ("meta".to_string(), Some("content".to_string())),
            ]
        );
    }

    #[test]
    fn surrounding_whitespace_in_target_is_ignored() {
        let doc = HtmlDocument::parse(PRODUCT);
        assert_eq!(locate(&doc, " 199.99 "), locate(&doc, "199.99"));
        assert_eq!(locate(&doc, "\n199.99\t"), locate(&doc, "199.99"));
    }

    #[test]
    fn partial_values_do_not_match() {
        let doc = HtmlDocument::parse(PRODUCT);
        assert!(locate(&doc, "199").is_empty());
        assert!(locate(&doc, "199.99 eur").is_empty());
    }

    #[test]
    fn blank_target_matches_nothing() {
        let doc = HtmlDocument::parse(PRODUCT);
        assert!(locate(&doc, "   ").is_empty());
    }

    #[test]
    fn compose_appends_text_or_attribute_selector() {
        let doc = HtmlDocument::parse(PRODUCT);
        let candidates = locate(&doc, "199.99");

        assert_eq!(compose("//*[@class='price']", &candidates[0]), "//*[@class='price']/text()");
        assert_eq!(
            compose("//*[@class='price']", &candidates[3]),
            "//*[@class='price']/@data-price"
        );
    }

    #[test]
    fn locate_values_builds_one_locator_per_candidate() {
        let doc = HtmlDocument::parse(PRODUCT);
        let located = locate_values(&doc, "199.99", &LocatorConfig::default()).unwrap();

        let locators: Vec<_> = located.iter().map(|v| v.locator.as_str()).collect();
        assert_eq!(
            locators,
            vec![
                "//*[@class='price']/text()",
                "/html/body/p/text()",
                "//*[@class='product']/@data-sku",
                "//*[@class='price']/@data-price",
                "//*[@class='price']/@content",
                "//*[@itemprop='price']/@content",
            ]
        );
    }

    #[test]
    fn attributes_without_a_locator_form_are_skipped() {
        let doc = HtmlDocument::parse(
            r#"<a :href="target-x" @click="target-x" data-target="target-x" id="lnk">go</a>"#,
        );

        assert_eq!(
            describe(&locate(&doc, "target-x")),
            vec![("a".to_string(), Some("data-target".to_string()))]
        );

        let located = locate_values(&doc, "target-x", &LocatorConfig::default()).unwrap();
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].locator, "//*[@id='lnk']/@data-target");
        assert!(located[0].locator.parse::<Locator>().is_ok());
    }
}
