//! A typed, deliberately small locator language.
//!
//! Only the XPath shapes this crate generates or rewrites are supported:
//! absolute child and descendant steps, tag or wildcard node tests, positional
//! predicates, attribute equality, normalized text equality, and an optional
//! trailing `text()` or `@name` selector. Anything else is rejected with
//! [`LocatorError::InvalidExpression`].

use crate::document::{child_elements, direct_text, normalize_space, tag_name, HtmlDocument};
use crate::error::LocatorError;
use regex::Regex;
use scraper::ElementRef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const NAME: &str = r"[A-Za-z_][\w.:-]*";
const LITERAL: &str = r#"(?:'([^']*)'|"([^"]*)")"#;

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//?").unwrap());
static NODE_TEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(?:\*|({NAME}))")).unwrap());
static POSITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\s*(\d+)\s*\]").unwrap());
static ATTRIBUTE_EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\[\s*@({NAME})\s*=\s*{LITERAL}\s*\]")).unwrap()
});
static TEXT_EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\[\s*normalize-space\(\s*text\(\)\s*\)\s*=\s*{LITERAL}\s*\]"
    ))
    .unwrap()
});
static ANY_ATTRIBUTE_EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\[\s*@\*\s*\[\s*normalize-space\(\s*\)\s*=\s*{LITERAL}\s*\]\s*\]"
    ))
    .unwrap()
});
static NAME_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{NAME}$")).unwrap());
static TEXT_TERMINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^text\(\)$").unwrap());
static ATTRIBUTE_TERMINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^@({NAME})$")).unwrap());

/// How a step reaches its candidates from the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/name`: children of the context node.
    Child,
    /// `//name`: children of the context node or of any of its descendants.
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    /// A tag name; HTML tag names compare case-insensitively.
    Tag(String),
}

impl NodeTest {
    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Tag(tag) => tag_name(element).eq_ignore_ascii_case(tag),
        }
    }
}

/// A filter applied to the candidates of a step, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`: the n-th (1-based) remaining candidate.
    Position(usize),
    /// `[@name='value']`: exact attribute equality.
    AttributeEquals { name: String, value: String },
    /// `[normalize-space(text())='value']`
    TextEquals(String),
    /// `[@*[normalize-space()='value']]`: any attribute, normalized.
    AnyAttributeEquals(String),
}

impl Predicate {
    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match self {
            Predicate::Position(_) => true,
            Predicate::AttributeEquals { name, value } => {
                element.value().attr(name) == Some(value.as_str())
            }
            Predicate::TextEquals(value) => {
                normalize_space(direct_text(element).unwrap_or_default()) == *value
            }
            Predicate::AnyAttributeEquals(value) => element
                .value()
                .attrs()
                .any(|(_, attr_value)| normalize_space(attr_value) == *value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

/// Trailing selector picking a value of the matched element instead of the
/// element itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// `/text()`
    Text,
    /// `/@name`
    Attribute(String),
}

/// A parsed or generated locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub steps: Vec<Step>,
    pub terminal: Option<Terminal>,
}

/// Elements selected by a locator, together with its trailing value selector.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorTarget<'a> {
    pub elements: Vec<ElementRef<'a>>,
    pub terminal: Option<Terminal>,
}

impl LocatorTarget<'_> {
    /// The values the locator points at.
    ///
    /// With `/text()` these are the direct text nodes of every element, with
    /// `/@name` the attribute values of the elements carrying it, and without a
    /// value selector the outer HTML of every element.
    pub fn values(&self) -> Vec<String> {
        match &self.terminal {
            Some(Terminal::Text) => self
                .elements
                .iter()
                .flat_map(|element| {
                    element
                        .children()
                        .filter_map(|child| child.value().as_text().map(|text| text.to_string()))
                        .collect::<Vec<_>>()
                })
                .collect(),
            Some(Terminal::Attribute(name)) => self
                .elements
                .iter()
                .filter_map(|element| element.value().attr(name).map(str::to_string))
                .collect(),
            None => self.elements.iter().map(|element| element.html()).collect(),
        }
    }
}

impl Locator {
    /// `//*[@name='value']`
    pub fn attribute_anchor(name: &str, value: &str) -> Self {
        Self::descendant_filter(Predicate::AttributeEquals {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// `//*[predicate]`
    pub fn descendant_filter(predicate: Predicate) -> Self {
        Self {
            steps: vec![Step {
                axis: Axis::Descendant,
                test: NodeTest::Any,
                predicates: vec![predicate],
            }],
            terminal: None,
        }
    }

    /// An absolute path made of the given steps.
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            terminal: None,
        }
    }

    /// Appends child steps below this locator.
    pub fn join(mut self, suffix: &[Step]) -> Self {
        self.steps.extend_from_slice(suffix);
        self
    }

    pub fn with_terminal(mut self, terminal: Option<Terminal>) -> Self {
        self.terminal = terminal;
        self
    }

    /// Separates the element part of the locator from its trailing selector.
    pub fn split_terminal(mut self) -> (Locator, Option<Terminal>) {
        let terminal = self.terminal.take();
        (self, terminal)
    }

    /// Resolves the locator, keeping its value selector alongside the elements.
    pub fn select<'a>(&self, document: &'a HtmlDocument) -> LocatorTarget<'a> {
        LocatorTarget {
            elements: self.evaluate(document),
            terminal: self.terminal.clone(),
        }
    }

    /// Resolves the element part of the locator against `document`.
    ///
    /// Predicates are applied per context node, as in XPath, so `span[2]`
    /// means the second `span` child of each parent. The result is free of
    /// duplicates and in document order. Any terminal selector is ignored.
    pub fn evaluate<'a>(&self, document: &'a HtmlDocument) -> Vec<ElementRef<'a>> {
        let mut context = vec![Context::Document];

        for step in &self.steps {
            let mut parents = Vec::new();
            let mut seen_parents = HashSet::new();
            for scope in &context {
                match step.axis {
                    Axis::Child => parents.push(*scope),
                    Axis::Descendant => {
                        for candidate in scope.descendants_or_self(document) {
                            let key = match candidate {
                                Context::Document => None,
                                Context::Element(element) => Some(element.id()),
                            };
                            if seen_parents.insert(key) {
                                parents.push(candidate);
                            }
                        }
                    }
                }
            }

            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for parent in parents {
                let candidates = parent
                    .children(document)
                    .into_iter()
                    .filter(|child| step.test.matches(child))
                    .collect();
                for matched in apply_predicates(candidates, &step.predicates) {
                    if seen.insert(matched.id()) {
                        next.push(matched);
                    }
                }
            }

            sort_document_order(document, &mut next);
            context = next.into_iter().map(Context::Element).collect();
        }

        context
            .into_iter()
            .filter_map(|scope| match scope {
                Context::Element(element) => Some(element),
                Context::Document => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Context<'a> {
    Document,
    Element(ElementRef<'a>),
}

impl<'a> Context<'a> {
    fn children(&self, document: &'a HtmlDocument) -> Vec<ElementRef<'a>> {
        match self {
            Context::Document => document.top_level_elements().collect(),
            Context::Element(element) => child_elements(element),
        }
    }

    fn descendants_or_self(&self, document: &'a HtmlDocument) -> Vec<Context<'a>> {
        match self {
            Context::Document => std::iter::once(Context::Document)
                .chain(document.elements().map(Context::Element))
                .collect(),
            Context::Element(element) => element
                .descendants()
                .filter_map(ElementRef::wrap)
                .map(Context::Element)
                .collect(),
        }
    }
}

fn apply_predicates<'a>(
    mut candidates: Vec<ElementRef<'a>>,
    predicates: &[Predicate],
) -> Vec<ElementRef<'a>> {
    for predicate in predicates {
        candidates = match predicate {
            Predicate::Position(position) => candidates
                .get(position.wrapping_sub(1))
                .copied()
                .into_iter()
                .collect(),
            other => candidates
                .into_iter()
                .filter(|candidate| other.matches(candidate))
                .collect(),
        };
    }
    candidates
}

fn sort_document_order(document: &HtmlDocument, elements: &mut [ElementRef<'_>]) {
    if elements.len() < 2 {
        return;
    }
    let order: HashMap<_, usize> = document
        .elements()
        .enumerate()
        .map(|(index, element)| (element.id(), index))
        .collect();
    elements.sort_by_key(|element| order.get(&element.id()).copied().unwrap_or(usize::MAX));
}

/// Returns `true` if `name` can appear as a tag or attribute name in a locator.
///
/// HTML accepts names such as `:href` or `@click` that this grammar cannot
/// spell; those are never emitted.
pub fn is_valid_name(name: &str) -> bool {
    NAME_ONLY.is_match(name)
}

/// Returns `true` if `value` can be written as an XPath string literal.
///
/// XPath 1.0 literals have no escape syntax, so a value holding both quote
/// characters cannot be expressed without `concat()`.
pub fn is_expressible_literal(value: &str) -> bool {
    !(value.contains('\'') && value.contains('"'))
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if value.contains('\'') {
        write!(f, "\"{value}\"")
    } else {
        write!(f, "'{value}'")
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Position(position) => write!(f, "[{position}]"),
            Predicate::AttributeEquals { name, value } => {
                write!(f, "[@{name}=")?;
                write_literal(f, value)?;
                f.write_str("]")
            }
            Predicate::TextEquals(value) => {
                f.write_str("[normalize-space(text())=")?;
                write_literal(f, value)?;
                f.write_str("]")
            }
            Predicate::AnyAttributeEquals(value) => {
                f.write_str("[@*[normalize-space()=")?;
                write_literal(f, value)?;
                f.write_str("]]")
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.axis {
            Axis::Child => f.write_str("/")?,
            Axis::Descendant => f.write_str("//")?,
        }
        match &self.test {
            NodeTest::Any => f.write_str("*")?,
            NodeTest::Tag(tag) => f.write_str(tag)?,
        }
        for predicate in &self.predicates {
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Text => f.write_str("/text()"),
            Terminal::Attribute(name) => write!(f, "/@{name}"),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        if let Some(terminal) = &self.terminal {
            write!(f, "{terminal}")?;
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        Parser::new(expression).parse()
    }
}

struct Parser<'s> {
    expression: &'s str,
    rest: &'s str,
}

impl<'s> Parser<'s> {
    fn new(expression: &'s str) -> Self {
        Self {
            expression,
            rest: expression.trim(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> LocatorError {
        LocatorError::invalid(self.expression, reason)
    }

    fn consume(&mut self, len: usize) {
        self.rest = &self.rest[len..];
    }

    fn parse(mut self) -> Result<Locator, LocatorError> {
        if self.rest.is_empty() {
            return Err(self.error("expression is empty"));
        }
        if !self.rest.starts_with('/') {
            return Err(self.error("only absolute locators starting with '/' are supported"));
        }

        let mut steps = Vec::new();
        let mut terminal = None;

        while let Some(separator) = SEPARATOR.find(self.rest) {
            let axis = if separator.len() == 2 {
                Axis::Descendant
            } else {
                Axis::Child
            };
            self.consume(separator.len());

            if let Some(found) = self.parse_terminal(axis)? {
                terminal = Some(found);
                break;
            }
            steps.push(self.parse_step(axis)?);
        }

        if !self.rest.is_empty() {
            return Err(self.error(format!("unexpected input at '{}'", self.rest)));
        }
        if steps.is_empty() {
            return Err(self.error("locator selects no element"));
        }

        Ok(Locator { steps, terminal })
    }

    fn parse_terminal(&mut self, axis: Axis) -> Result<Option<Terminal>, LocatorError> {
        let terminal = if TEXT_TERMINAL.is_match(self.rest) {
            Terminal::Text
        } else if let Some(caps) = ATTRIBUTE_TERMINAL.captures(self.rest) {
            Terminal::Attribute(caps[1].to_string())
        } else {
            return Ok(None);
        };

        if axis == Axis::Descendant {
            return Err(self.error("value selectors must follow a single '/'"));
        }
        self.rest = "";
        Ok(Some(terminal))
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, LocatorError> {
        let caps = NODE_TEST
            .captures(self.rest)
            .ok_or_else(|| self.error(format!("expected a tag name or '*' at '{}'", self.rest)))?;
        let test = match caps.get(1) {
            Some(name) => NodeTest::Tag(name.as_str().to_ascii_lowercase()),
            None => NodeTest::Any,
        };
        let len = caps[0].len();
        self.consume(len);

        let mut predicates = Vec::new();
        while self.rest.starts_with('[') {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, LocatorError> {
        if let Some(caps) = POSITION.captures(self.rest) {
            let position: usize = caps[1]
                .parse()
                .map_err(|_| self.error(format!("position '{}' is out of range", &caps[1])))?;
            if position == 0 {
                return Err(self.error("positions are 1-based"));
            }
            let len = caps[0].len();
            self.consume(len);
            return Ok(Predicate::Position(position));
        }

        if let Some(caps) = ATTRIBUTE_EQUALS.captures(self.rest) {
            let predicate = Predicate::AttributeEquals {
                name: caps[1].to_string(),
                value: literal(&caps, 2),
            };
            let len = caps[0].len();
            self.consume(len);
            return Ok(predicate);
        }

        if let Some(caps) = TEXT_EQUALS.captures(self.rest) {
            let predicate = Predicate::TextEquals(literal(&caps, 1));
            let len = caps[0].len();
            self.consume(len);
            return Ok(predicate);
        }

        if let Some(caps) = ANY_ATTRIBUTE_EQUALS.captures(self.rest) {
            let predicate = Predicate::AnyAttributeEquals(literal(&caps, 1));
            let len = caps[0].len();
            self.consume(len);
            return Ok(predicate);
        }

        Err(self.error(format!("unsupported predicate at '{}'", self.rest)))
    }
}

/// Reads a literal captured by [`LITERAL`], whose two alternatives occupy the
/// capture groups `first` and `first + 1`.
fn literal(caps: &regex::Captures<'_>, first: usize) -> String {
    caps.get(first)
        .or_else(|| caps.get(first + 1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
