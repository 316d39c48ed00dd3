//! Content extraction: raw markup + extraction rule in, snapshot out.
//!
//! Pure function of its inputs; the same markup and rule always produce
//! the same snapshot.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use sitewatch_core::{ContentSnapshot, ExtractMode, MonitorTarget, SelectorRule};

/// Subtrees that never contribute visible text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "template"];

/// Elements that introduce a line break around their content.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "nav", "figure", "figcaption", "table",
    "tr", "blockquote", "address", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Result of extracting one target's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub snapshot: ContentSnapshot,
    /// The selection rule did not match (or did not parse) and extraction
    /// fell back to the whole page. Recoverable; surfaced as a warning.
    pub degraded: bool,
}

/// Extract the target's relevant content from decoded markup.
pub fn extract_content(html: &str, target: &MonitorTarget) -> Extraction {
    let doc = Html::parse_document(html);
    match target.mode() {
        ExtractMode::FullText => Extraction {
            snapshot: ContentSnapshot::from_text(&visible_text(doc.root_element())),
            degraded: false,
        },
        ExtractMode::SubtreeText => {
            let (scope, degraded) = resolve_scope(&doc, target.rule());
            let scope = scope.unwrap_or_else(|| doc.root_element());
            Extraction {
                snapshot: ContentSnapshot::from_text(&visible_text(scope)),
                degraded,
            }
        }
        ExtractMode::LinkTextList => {
            let (scope, degraded) = resolve_scope(&doc, target.rule());
            let scope = scope.unwrap_or_else(|| doc.root_element());
            Extraction {
                snapshot: ContentSnapshot::from_labels(link_labels(scope)),
                degraded,
            }
        }
    }
}

/// Find the first element matched by the rule. The second value reports
/// degradation: a rule was configured but nothing matched.
fn resolve_scope<'a>(
    doc: &'a Html,
    rule: Option<&SelectorRule>,
) -> (Option<ElementRef<'a>>, bool) {
    let rule = match rule {
        None => return (None, false),
        Some(rule) => rule,
    };
    let selector = match rule {
        SelectorRule::ById(id) => Selector::parse(&format!("[id=\"{id}\"]")).ok(),
        SelectorRule::Css(css) => Selector::parse(css).ok(),
    };
    let matched = selector.and_then(|sel| doc.select(&sel).next());
    let degraded = matched.is_none();
    (matched, degraded)
}

/// Visible text of a subtree in document order, block elements breaking
/// lines, whitespace runs collapsed as encountered.
fn visible_text(scope: ElementRef) -> String {
    let mut builder = TextBuilder::default();
    visit_element(scope, &mut builder);
    builder.finish()
}

/// Text labels of all hyperlinks within a subtree. Empty labels are
/// dropped during snapshot normalization.
fn link_labels(scope: ElementRef) -> Vec<String> {
    let anchor = match Selector::parse("a") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    scope
        .select(&anchor)
        .map(|el| el.text().collect::<String>())
        .collect()
}

fn visit_node(node: NodeRef<'_, Node>, builder: &mut TextBuilder) {
    match node.value() {
        Node::Text(text) => builder.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, builder);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, builder);
            }
        }
    }
}

fn visit_element(element: ElementRef, builder: &mut TextBuilder) {
    let tag = element.value().name().to_ascii_lowercase();
    if SKIPPED_TAGS.contains(&tag.as_str()) {
        return;
    }
    if tag == "br" {
        builder.ensure_newline();
        return;
    }
    let block = BLOCK_TAGS.contains(&tag.as_str());
    if block {
        builder.ensure_newline();
    }
    for child in element.children() {
        visit_node(child, builder);
    }
    if block {
        builder.ensure_newline();
    }
}

#[derive(Default)]
struct TextBuilder {
    out: String,
    last_char: Option<char>,
}

impl TextBuilder {
    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char == Some(' ') || self.last_char == Some('\n') {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.out.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.out.push(ch);
        self.last_char = Some(ch);
    }

    fn finish(self) -> String {
        self.out
    }
}
