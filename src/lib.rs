//! `genxpath` finds where a known value lives in an HTML document and
//! produces the shortest locator that selects it.
//!
//! Two operations do the work. The value locator scans a document for elements
//! whose text, or one of whose attributes, equals a target string after
//! whitespace normalization. The path minimizer turns an element into the
//! shortest locator that selects exactly that element, preferring a unique
//! identifying attribute (`id`, `data-testid`, `data-id`, `name`, `class`,
//! `itemprop`), then a uniquely identified ancestor followed by positional
//! steps, and finally the full positional path from the root.
//!
//! Locators are only guaranteed against the document snapshot they were
//! computed from.
//!
//! # Example
//!
//! ```rust
//! use std::str::FromStr;
//!
//! use genxpath::HtmlDocument;
//!
//! # fn demo() -> Result<(), genxpath::error::LocatorError> {
//! let document = HtmlDocument::from_str(
//!     r#"<div class="product"><span class="price" id="sales-price">€199.99</span></div>
//!        <div class="product"><span class="price">€299.99</span></div>"#,
//! )?;
//!
//! let located = document.locate("€199.99")?;
//! assert_eq!(located[0].locator, "//*[@id='sales-price']/text()");
//!
//! let shorter = document.rewrite("/html/body/div[1]/span/text()")?;
//! assert_eq!(shorter, "//*[@id='sales-price']/text()");
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod expression;
pub mod locator;
pub mod minimizer;
pub mod model;

pub use crate::config::LocatorConfig;
pub use crate::document::HtmlDocument;
pub use crate::error::LocatorError;
pub use crate::expression::{Locator, LocatorTarget, Terminal};
pub use crate::locator::{CandidateMatch, LocatedValue};
pub use crate::minimizer::Rewrite;
pub use crate::model::{FieldLocators, FieldModel};

use scraper::ElementRef;
use std::str::FromStr;

impl FromStr for HtmlDocument {
    type Err = LocatorError;

    /// Parses HTML markup into an [`HtmlDocument`]. HTML parsing recovers from
    /// malformed markup, so this does not fail in practice.
    fn from_str(markup: &str) -> Result<Self, Self::Err> {
        Ok(HtmlDocument::parse(markup))
    }
}

impl HtmlDocument {
    /// Returns a locator for every place `target` appears, text matches first.
    pub fn locate(&self, target: &str) -> Result<Vec<LocatedValue>, LocatorError> {
        self.locate_with_config(target, &LocatorConfig::default())
    }

    pub fn locate_with_config(
        &self,
        target: &str,
        config: &LocatorConfig,
    ) -> Result<Vec<LocatedValue>, LocatorError> {
        locator::locate_values(self, target, config)
    }

    /// Returns the raw candidate elements for `target`, without building locators.
    pub fn candidates(&self, target: &str) -> Vec<CandidateMatch<'_>> {
        locator::locate(self, target)
    }

    /// Returns the shortest locator that selects exactly `element`.
    pub fn minimize(&self, element: ElementRef<'_>) -> Result<String, LocatorError> {
        minimizer::minimize(self, element).map(|locator| locator.to_string())
    }

    pub fn minimize_with_config(
        &self,
        element: ElementRef<'_>,
        config: &LocatorConfig,
    ) -> Result<String, LocatorError> {
        minimizer::minimize_with_config(self, element, config).map(|locator| locator.to_string())
    }

    /// Rewrites an existing locator into its minimal form.
    ///
    /// Trailing `/text()` or `/@name` selectors are kept. A locator that
    /// matches nothing is returned unchanged.
    pub fn rewrite(&self, existing: &str) -> Result<String, LocatorError> {
        minimizer::rewrite(self, existing)
    }

    pub fn rewrite_with_config(
        &self,
        existing: &str,
        config: &LocatorConfig,
    ) -> Result<String, LocatorError> {
        minimizer::rewrite_checked(self, existing, config).map(|rewrite| rewrite.locator)
    }

    /// Like [`rewrite_with_config`](Self::rewrite_with_config), also reporting
    /// how many elements the input resolved to.
    pub fn rewrite_checked(
        &self,
        existing: &str,
        config: &LocatorConfig,
    ) -> Result<Rewrite, LocatorError> {
        minimizer::rewrite_checked(self, existing, config)
    }

    /// Evaluates a locator. The selected elements come back in document order
    /// together with the trailing `/text()` or `/@name` selector, if any.
    pub fn select(&self, expression: &str) -> Result<LocatorTarget<'_>, LocatorError> {
        let locator: Locator = expression.parse()?;
        Ok(locator.select(self))
    }

    /// Locates every field of `model`.
    pub fn find_locators(&self, model: &FieldModel) -> Result<FieldLocators, LocatorError> {
        model::find_locators(self, model, &LocatorConfig::default())
    }
}

/// Parses `markup` and locates every field of `model` in it.
pub fn find_locators(model: &FieldModel, markup: &str) -> Result<FieldLocators, LocatorError> {
    HtmlDocument::parse(markup).find_locators(model)
}

/// Parses `markup` and rewrites `existing` into its minimal form.
pub fn minimize_locator(markup: &str, existing: &str) -> Result<String, LocatorError> {
    HtmlDocument::parse(markup).rewrite(existing)
}
