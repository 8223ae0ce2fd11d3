use crate::Document;

/// Title and canonical URL of an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Flattened text of the first top-level heading; empty when there is none.
    pub title: String,
    /// `<link rel="canonical">` target, or the URL the page was fetched from.
    pub canonical_url: String,
}

impl Document {
    /// Flattened text of the first `<h1>`, or an empty string.
    ///
    /// Multiple `<h1>` elements are allowed; only the first is used.
    pub fn heading_title(&self) -> String {
        match self.select_first("h1") {
            Ok(Some(heading)) => heading.flattened_text(),
            _ => String::new(),
        }
    }

    /// Trimmed `href` of the first `<link rel="canonical">`, if present and non-empty.
    pub fn canonical_url(&self) -> Option<String> {
        let link = self.select_first("link[rel~=\"canonical\"][href]").ok().flatten()?;
        let href = link.attr("href")?.trim();

        if href.is_empty() { None } else { Some(href.to_string()) }
    }

    /// Title and canonical URL for a page fetched from `fetched_url`.
    pub fn extract_page_meta(&self, fetched_url: &str) -> PageMeta {
        PageMeta {
            title: self.heading_title(),
            canonical_url: self.canonical_url().unwrap_or_else(|| fetched_url.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_and_canonical() {
        let html = r#"
            <html><head>
                <link rel="stylesheet" href="/style.css">
                <link rel="canonical" href=" https://example.org/post/ ">
            </head><body>
                <h1>  Main <em>title</em> </h1>
                <h1>Second title</h1>
            </body></html>
        "#;
        let doc = Document::parse(html).unwrap();
        let meta = doc.extract_page_meta("https://example.org/post/?utm=1");

        assert_eq!(meta.title, "Main title");
        assert_eq!(meta.canonical_url, "https://example.org/post/");
    }

    #[test]
    fn test_canonical_falls_back_to_fetched_url() {
        let doc = Document::parse("<html><body><h1>T</h1></body></html>").unwrap();
        let meta = doc.extract_page_meta("https://example.org/x");

        assert_eq!(meta.canonical_url, "https://example.org/x");
    }

    #[test]
    fn test_empty_canonical_href_is_ignored() {
        let html = r#"<html><head><link rel="canonical" href="   "></head><body></body></html>"#;
        let doc = Document::parse(html).unwrap();

        assert_eq!(doc.canonical_url(), None);
        assert_eq!(doc.extract_page_meta("https://example.org/y").canonical_url, "https://example.org/y");
    }

    #[test]
    fn test_canonical_with_multiple_rel_tokens() {
        let html = r#"<html><head><link rel="alternate canonical" href="https://example.org/c"></head></html>"#;
        let doc = Document::parse(html).unwrap();

        assert_eq!(doc.canonical_url(), Some("https://example.org/c".to_string()));
    }

    #[test]
    fn test_missing_heading_gives_empty_title() {
        let doc = Document::parse("<html><body><p>No heading</p></body></html>").unwrap();
        assert_eq!(doc.heading_title(), "");
    }
}
