//! Library API integration tests
use gleaner_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

const ARTICLE_BODY: &str = "A hipertensão leve deve ser confirmada com medidas repetidas.\n\n\
    Mudanças no estilo de vida são a primeira abordagem.\n\n\
    • Redução do sal\n• Atividade física regular\n\n\
    Fluxograma de manejo\n\n\
    Reavalie em três meses.";

#[test]
fn test_extract_body_api() {
    let html = read_fixture("article.html");
    let body = extract_body_from_html(&html, &ExtractConfig::default()).expect("should extract");

    assert_eq!(body, ARTICLE_BODY);
    assert!(!body.contains("Bibliografia"));
    assert!(!body.contains("Compartilhe"));
    assert!(!body.contains("Rodapé"));
}

#[test]
fn test_extract_article_api() {
    let html = read_fixture("article.html");
    let record = extract_article(&html, "https://example.org/fetched", &ExtractConfig::default()).unwrap();

    assert_eq!(record.title, "Qual a conduta na hipertensão leve?");
    assert_eq!(record.url, "https://example.org/aps/qual-a-conduta-na-hipertensao-leve/");
    assert_eq!(record.body, ARTICLE_BODY);
}

#[test]
fn test_paragraph_fallback_api() {
    let html = read_fixture("article_fallback.html");
    let body = extract_body_from_html(&html, &ExtractConfig::default()).unwrap();

    assert_eq!(body, "Primeiro parágrafo solto.\n\nSegundo parágrafo solto.\n\nTerceiro parágrafo.");
}

#[test]
fn test_document_window_api() {
    let html = read_fixture("article.html");
    let doc = Document::parse(&html).unwrap();
    let config = ExtractConfig::default();

    let container = locate_container(&doc, &config).unwrap();
    let window = find_window(&doc, container, &config).unwrap();

    assert_eq!(window.start.tag_name(), "hr");
    assert_eq!(window.siblings().count(), 6);
    assert_eq!(doc.heading_title(), "Qual a conduta na hipertensão leve?");
}

#[test]
fn test_parse_index_page_api() {
    let html = read_fixture("listing.html");
    let base = url::Url::parse("https://example.org/aps").unwrap();
    let entries = parse_index_page(&html, Some(&base), &IndexConfig::default()).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].title, "Qual a conduta na hipertensão leve?");
    assert_eq!(entries[2], IndexEntry::new("Dor lombar aguda", "https://example.org/aps/dor-lombar/"));
}

#[test]
fn test_table_roundtrip_and_merge_api() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.csv");
    std::fs::copy(get_fixture_path("articles.csv"), &path).unwrap();

    let mut table = Table::load(&path).unwrap();
    assert_eq!(table.len(), 3);

    let stats = table.merge(&[
        IndexEntry::new("Alpha title", "https://example.org/a"),
        IndexEntry::new("Beta", "https://example.org/b"),
    ]);
    assert_eq!(stats, MergeStats { added: 1, titles_filled: 1 });

    let written = table.save(&path).unwrap();
    assert_eq!(written, 3);

    let reloaded = Table::load(&path).unwrap();
    assert_eq!(
        reloaded.records(),
        &[
            ArticleRecord::new("Alpha title", "https://example.org/a", ""),
            ArticleRecord::new("Beta", "https://example.org/b", ""),
            ArticleRecord::new("Zeta", "https://example.org/z", "Corpo z"),
        ]
    );
}
