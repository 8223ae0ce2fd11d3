//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the DOM tree using CSS selectors, sibling links and
//! document order.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs[0].flattened_text(), "Paragraph");
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{GleanerError, Result};

/// Compiles a CSS selector, mapping failures to [`GleanerError::HtmlParseError`].
pub(crate) fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| GleanerError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page and provides methods for querying elements
/// using CSS selectors.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// html5ever never rejects input, so malformed markup still yields a
    /// document; the `Result` is kept for API symmetry with the rest of the crate.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Gets the root `<html>` element.
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Gets the `<body>` element, if the parser produced one.
    pub fn body(&self) -> Option<Element<'_>> {
        self.select_first("body").ok().flatten()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gleaner_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector in document order.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Finds the first element matching `selector` that comes after `anchor`
    /// in document order.
    ///
    /// The search starts with `anchor`'s own descendants and then continues
    /// through the rest of the document, so it is not limited to siblings.
    pub fn find_next(&self, anchor: &Element<'_>, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile_selector(selector)?;
        let anchor_id = anchor.element.id();

        let found = self
            .html
            .tree
            .root()
            .descendants()
            .skip_while(|node| node.id() != anchor_id)
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| sel.matches(el));

        Ok(found.map(|el| Element { element: el }))
    }
}

/// A wrapper around scraper's ElementRef for easier DOM navigation.
///
/// # Example
///
/// ```rust
/// use gleaner_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the raw text content of this element.
    ///
    /// Returns the concatenation of all text nodes within this element,
    /// with no separators and no trimming.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the flattened text content of this element.
    ///
    /// Every descendant text node is trimmed, empty ones are dropped, and the
    /// rest are joined with a single space.
    pub fn flattened_text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Checks whether `class` is one of this element's class tokens.
    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Whether `other` refers to the same node in the same tree.
    pub fn same_node(&self, other: &Element<'_>) -> bool {
        self.element.id() == other.element.id()
    }

    /// Gets the next sibling that is an element, skipping text and comments.
    pub fn next_sibling_element(&self) -> Option<Element<'a>> {
        self.element
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|el| Element { element: el })
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// The element itself is never part of the result.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first descendant matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = compile_selector(selector)?;
        Ok(self.element.select(&sel).next().map(|el| Element { element: el }))
    }
}
