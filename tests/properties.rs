use genxpath::document::{direct_text, normalize_space};
use genxpath::{HtmlDocument, LocatorConfig, Terminal};
use rstest::rstest;

const CATALOG: &str = r#"
<html><head><title>Bikes</title><meta name="description" content="Trek Fx 1"></head>
<body>
<nav id="top" class="menu"><a href="/">Home</a><a href="/bikes">Bikes</a><a href="/bikes" class="active">Bikes</a></nav>
<ul class="products">
    <li class="product" data-id="1"><h2>Trek Fx 1</h2><span class="price">300 €</span></li>
    <li class="product" data-id="2"><h2>Trek Fx 2</h2><span class="price">400 €</span></li>
    <li class="product"><h2>Trek Fx 3</h2><span class="price">300 €</span><span>17</span></li>
</ul>
<table>
    <tr><td>a</td><td>b</td></tr>
    <tr><td>c</td><td itemprop="price">d</td></tr>
</table>
<div class="dup"><p>x</p></div>
<div class="dup"><p>x</p><p>  x  </p></div>
</body></html>
"#;

const DEEP: &str = r#"
<div><div><div><span>a</span><span>a</span></div></div><div><span>a</span></div></div>
<section name="s"><div><div><b>1</b><b>2</b></div></div></section>
"#;

const TEMPLATES: &str = r#"
<div><template><span>t</span><span>u</span><p><span>v</span></p></template></div>
<template class="row"><b>1</b><b>2</b></template>
<template><i>x</i></template>
"#;

#[rstest]
#[case(CATALOG)]
#[case(DEEP)]
#[case(TEMPLATES)]
fn minimized_locator_resolves_to_the_same_single_element(#[case] markup: &str) {
    let doc = HtmlDocument::parse(markup);

    for element in doc.elements() {
        let locator = doc.minimize(element).unwrap();
        let resolved = doc.select(&locator).unwrap().elements;

        assert_eq!(resolved.len(), 1, "{locator} is ambiguous");
        assert!(resolved[0] == element, "{locator} selects another element");
    }
}

#[rstest]
#[case(CATALOG)]
#[case(DEEP)]
#[case(TEMPLATES)]
fn minimize_is_idempotent(#[case] markup: &str) {
    let doc = HtmlDocument::parse(markup);

    for element in doc.elements() {
        let first = doc.minimize(element).unwrap();
        let again = doc.minimize(doc.select(&first).unwrap().elements[0]).unwrap();
        assert_eq!(first, again);

        let full_path = doc.full_path(element);
        assert_eq!(doc.rewrite(&full_path).unwrap(), first);
    }
}

#[rstest]
#[case(CATALOG)]
#[case(DEEP)]
#[case(TEMPLATES)]
fn candidates_match_exactly(#[case] markup: &str) {
    let doc = HtmlDocument::parse(markup);

    let mut targets: Vec<String> = Vec::new();
    for element in doc.elements() {
        targets.extend(direct_text(&element).map(str::to_string));
        targets.extend(element.value().attrs().map(|(_, value)| value.to_string()));
    }
    targets.push("Trek".to_string());
    targets.push("300".to_string());

    for target in &targets {
        let needle = normalize_space(target);
        for candidate in doc.candidates(target) {
            let found = match &candidate.attribute {
                Some(name) => candidate.element.value().attr(name).unwrap_or_default(),
                None => direct_text(&candidate.element).unwrap_or_default(),
            };
            assert_eq!(normalize_space(found), needle, "false positive for {target:?}");
        }
    }
}

#[test]
fn whitespace_variants_of_target_are_equivalent() {
    let doc = HtmlDocument::parse(CATALOG);

    let plain = doc.locate("300 €").unwrap();
    assert_eq!(plain.len(), 2);
    assert_eq!(doc.locate(" 300 € ").unwrap(), plain);
    assert_eq!(doc.locate("300 \n\t €").unwrap(), plain);
}

#[test]
fn text_matches_are_listed_before_attribute_matches() {
    let doc = HtmlDocument::parse(CATALOG);

    let located = doc.locate("Trek Fx 1").unwrap();

    let attributes: Vec<_> = located.iter().map(|v| v.attribute.as_deref()).collect();
    assert_eq!(attributes, vec![None, Some("content")]);
    assert_eq!(located[1].locator, "//*[@name='description']/@content");
}

#[test]
fn id_is_preferred_when_class_is_also_unique() {
    let doc = HtmlDocument::parse(CATALOG);
    let nav = doc.select("//nav").unwrap().elements[0];
    let active = doc.select("//a[@class='active']").unwrap().elements[0];

    assert_eq!(doc.minimize(nav).unwrap(), "//*[@id='top']");
    assert_eq!(doc.minimize(active).unwrap(), "//*[@class='active']");
}

#[test]
fn repeated_minimization_does_not_depend_on_previous_calls() {
    let doc = HtmlDocument::parse(DEEP);
    let config = LocatorConfig::default();
    let element = doc.select("//section//b[2]").unwrap().elements[0];

    let first = doc.minimize_with_config(element, &config).unwrap();
    let second = doc.minimize_with_config(element, &config).unwrap();

    assert_eq!(first, "//*[@name='s']/div/div/b[2]");
    assert_eq!(first, second);
}

#[test]
fn template_contents_are_reachable_by_path() {
    let doc = HtmlDocument::parse(TEMPLATES);

    let span = doc.select("/html/body/div/template/span[2]").unwrap();
    assert_eq!(span.elements.len(), 1);
    assert_eq!(direct_text(&span.elements[0]), Some("u"));

    assert_eq!(doc.minimize(span.elements[0]).unwrap(), "/html/body/div/template/span[2]");
    assert_eq!(
        doc.rewrite("/html/body/template[1]/b[2]/text()").unwrap(),
        "//*[@class='row']/b[2]/text()"
    );
}

#[test]
fn select_reports_the_value_selector() {
    let doc = HtmlDocument::parse(CATALOG);

    let content = doc.select("//*[@name='description']/@content").unwrap();
    assert_eq!(content.terminal, Some(Terminal::Attribute("content".to_string())));
    assert_eq!(content.values(), vec!["Trek Fx 1"]);

    let prices = doc.select("//li/span[@class='price']/text()").unwrap();
    assert_eq!(prices.terminal, Some(Terminal::Text));
    assert_eq!(prices.values(), vec!["300 €", "400 €", "300 €"]);

    let rows = doc.select("//table/tbody/tr").unwrap();
    assert_eq!(rows.terminal, None);
    assert_eq!(rows.elements.len(), 2);
}

#[test]
fn rewrite_checked_reports_resolution_count() {
    let doc = HtmlDocument::parse(CATALOG);
    let config = LocatorConfig::default();

    let outcome = doc.rewrite_checked("//h2/text()", &config).unwrap();
    assert!(outcome.is_ambiguous());
    assert_eq!(outcome.resolved, 3);
    assert_eq!(outcome.locator, doc.rewrite_with_config("//h2/text()", &config).unwrap());
    assert_eq!(outcome.locator, "//*[@data-id='1']/h2/text()");
}
