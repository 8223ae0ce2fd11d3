//! Article body extraction.
//!
//! The article pages this crate targets share one layout: a content container
//! holding a heading, a small-text metadata block (author, date), a horizontal
//! rule, the body blocks, and finally a card with the bibliography. The body is
//! everything between the rule and the card.
//!
//! Extraction walks the siblings that follow the start boundary and keeps the
//! content-bearing ones ([`BlockKind`]), rendering each to text. When the
//! layout does not match and nothing is collected, every paragraph in the
//! container is used instead.

use std::iter;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::Result;
use crate::article::ArticleRecord;
use crate::parse::{Document, Element};

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\x0B\x0C]+").unwrap());
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Selectors locating the structural markers of an article page.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Block wrapping the article. Falls back to `<body>`, then the whole document.
    pub container_selector: String,
    /// Small-text block with author/date information.
    pub metadata_selector: String,
    /// Separator following the metadata block; the body starts after it.
    pub separator_selector: String,
    /// Top-level heading, used when there is no metadata block.
    pub heading_selector: String,
    /// First element of the trailing bibliography section.
    pub end_marker_selector: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_selector: "div.container.padding1".to_string(),
            metadata_selector: "div.small".to_string(),
            separator_selector: "hr".to_string(),
            heading_selector: "h1".to_string(),
            end_marker_selector: "div.card".to_string(),
        }
    }
}

/// Element kinds that carry article content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Figure,
    UnorderedList,
    OrderedList,
    Table,
    Blockquote,
    Preformatted,
}

impl BlockKind {
    /// Maps a lowercase tag name to its block kind, or `None` for tags the walk skips.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::Paragraph),
            "figure" => Some(Self::Figure),
            "ul" => Some(Self::UnorderedList),
            "ol" => Some(Self::OrderedList),
            "table" => Some(Self::Table),
            "blockquote" => Some(Self::Blockquote),
            "pre" => Some(Self::Preformatted),
            _ => None,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

/// Start and end boundaries of the body walk on one page.
///
/// The walk covers the siblings strictly after `start` and stops before `end`.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionWindow<'a> {
    pub container: Element<'a>,
    pub start: Element<'a>,
    pub end: Option<Element<'a>>,
}

impl<'a> ExtractionWindow<'a> {
    /// Iterates over the sibling elements inside the window, in document order.
    ///
    /// A window whose start is the container itself is empty.
    pub fn siblings(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let first = if self.start.same_node(&self.container) { None } else { self.start.next_sibling_element() };
        let end = self.end;

        iter::successors(first, |el| el.next_sibling_element())
            .take_while(move |el| end.is_none_or(|end| !end.same_node(el)))
    }
}

/// Finds the content container: the configured block, else `<body>`, else the whole document.
pub fn locate_container<'a>(doc: &'a Document, config: &ExtractConfig) -> Result<Element<'a>> {
    if let Some(container) = doc.select_first(&config.container_selector)? {
        return Ok(container);
    }

    debug!("content container not found, falling back to document body");
    Ok(doc.body().unwrap_or_else(|| doc.root()))
}

/// Computes the start and end boundaries inside `container`.
///
/// Start: the first separator after the metadata block (or the block itself);
/// without a metadata block, the first separator after the first heading (or the
/// heading itself); without either, the container. End: the first end marker
/// anywhere inside the container, at any depth.
pub fn find_window<'a>(
    doc: &'a Document, container: Element<'a>, config: &ExtractConfig,
) -> Result<ExtractionWindow<'a>> {
    let start = match container.select_first(&config.metadata_selector)? {
        Some(meta) => doc.find_next(&meta, &config.separator_selector)?.unwrap_or(meta),
        None => match container.select_first(&config.heading_selector)? {
            Some(heading) => doc.find_next(&heading, &config.separator_selector)?.unwrap_or(heading),
            None => container,
        },
    };

    let end = container.select_first(&config.end_marker_selector)?;

    Ok(ExtractionWindow { container, start, end })
}

/// Renders one content block to text.
///
/// Lists become one `• item` line per `<li>` (nested items included); every
/// other kind becomes its flattened text. In both cases the non-empty `alt`
/// texts of nested images are appended, space-separated.
pub fn render_block(element: &Element<'_>, kind: BlockKind) -> Result<String> {
    let alts: Vec<String> = element
        .select("img[alt]")?
        .iter()
        .filter_map(|img| img.attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .collect();

    let base = if kind.is_list() {
        element
            .select("li")?
            .iter()
            .map(Element::flattened_text)
            .filter(|text| !text.is_empty())
            .map(|text| format!("• {}", text))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        element.flattened_text()
    };

    if alts.is_empty() {
        Ok(base)
    } else {
        Ok(format!("{} {}", base, alts.join(" ")).trim().to_string())
    }
}

/// Extracts the article body from a parsed page.
///
/// Returns an empty string when neither the sibling walk nor the paragraph
/// fallback finds any text. Blocks that fail to render are logged and skipped.
///
/// # Errors
///
/// Only invalid selectors in `config` produce an error.
pub fn extract_body(doc: &Document, config: &ExtractConfig) -> Result<String> {
    let container = locate_container(doc, config)?;
    let window = find_window(doc, container, config)?;

    let mut parts = Vec::new();
    for node in window.siblings() {
        let Some(kind) = BlockKind::from_tag(&node.tag_name()) else {
            continue;
        };

        match render_block(&node, kind) {
            Ok(text) if !text.is_empty() => parts.push(text),
            Ok(_) => {}
            Err(e) => warn!(tag = %node.tag_name(), error = %e, "skipping block that failed to render"),
        }
    }

    if parts.is_empty() {
        debug!("no blocks between boundaries, falling back to container paragraphs");
        parts = container
            .select("p")?
            .iter()
            .map(Element::flattened_text)
            .filter(|text| !text.is_empty())
            .collect();
    }

    let joined = parts
        .iter()
        .map(String::as_str)
        .filter(|part| !part.trim().is_empty())
        .map(normalize_whitespace)
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(normalize_whitespace(&joined))
}

/// Parses `html` and extracts its article body. See [`extract_body`].
///
/// # Example
///
/// ```rust
/// use gleaner_core::{ExtractConfig, extract_body_from_html};
///
/// let html = r#"
///     <div class="container padding1">
///         <h1>Title</h1>
///         <div class="small">Author, 2024</div>
///         <hr>
///         <p>First.</p>
///         <p>Second.</p>
///         <div class="card">Bibliography</div>
///     </div>
/// "#;
/// let body = extract_body_from_html(html, &ExtractConfig::default()).unwrap();
/// assert_eq!(body, "First.\n\nSecond.");
/// ```
pub fn extract_body_from_html(html: &str, config: &ExtractConfig) -> Result<String> {
    let doc = Document::parse(html)?;
    extract_body(&doc, config)
}

/// Parses an article page into a record: heading title, canonical url, and body.
///
/// `fetched_url` is used as the url when the page declares no canonical link.
pub fn extract_article(html: &str, fetched_url: &str, config: &ExtractConfig) -> Result<ArticleRecord> {
    let doc = Document::parse(html)?;
    let meta = doc.extract_page_meta(fetched_url);
    let body = extract_body(&doc, config)?;

    Ok(ArticleRecord { title: meta.title, url: meta.canonical_url, body })
}

/// Normalizes whitespace in extracted text.
///
/// Non-breaking spaces become spaces, runs of horizontal whitespace collapse to
/// one space, three or more newlines collapse to two, and the ends are trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace('\u{a0}', " ");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
