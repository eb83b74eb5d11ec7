//! On-page SEO extraction.
//!
//! `PageAnalyzer` turns one HTML body into the SEO fields of a
//! [`PageRecord`] plus the page's outlink list. Extraction is best-effort
//! throughout; malformed markup and data degrade to blank fields.

mod content;
mod metadata;
pub(crate) mod readability;
mod structured;

use regex::Regex;
use scraper::Html;
use url::Url;

use crate::core::types::{Indexability, PageRecord};

pub struct PageAnalyzer {
    domain: String,
    ignore_noindex: bool,
    content_class: Regex,
}

impl PageAnalyzer {
    pub fn new(domain: &str, ignore_noindex: bool) -> Self {
        Self {
            domain: domain.to_string(),
            ignore_noindex,
            content_class: Regex::new("content|main|post|article")
                .expect("content class regex is valid"),
        }
    }

    /// Fill `record`'s SEO fields from `html` and return the page's absolute
    /// http(s) outlinks resolved against `base`.
    pub fn analyze(&self, html: &str, base: &Url, record: &mut PageRecord) -> Vec<String> {
        let document = Html::parse_document(html);
        self.extract_metadata(&document, record);
        let outlinks = self.analyze_content(&document, base, record);
        self.extract_structured_data(&document, record);
        self.apply_indexability(record);
        outlinks
    }

    fn apply_indexability(&self, record: &mut PageRecord) {
        let noindex = record.meta_robots.to_lowercase().contains("noindex");
        record.indexability = match (noindex, self.ignore_noindex) {
            (true, false) => Indexability::NonIndexable,
            (true, true) => Indexability::NonIndexableCrawledAnyway,
            (false, _) => Indexability::Indexable,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PageStatus;

    const FIXTURE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <title> Acme Widgets — Home </title>
  <meta name="description" content="Hand-built widgets since 1952.">
  <meta name="robots" content="index, follow">
  <link rel="canonical" href="https://example.com/">
  <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
  <script type="application/ld+json">[{"@type": "Product"}, {"@type": "FAQPage"}]</script>
  <script type="application/ld+json">{not json}</script>
</head>
<body>
  <header><a href="/hidden-in-header">skip me in text</a></header>
  <nav><p>Menu</p></nav>
  <main>
    <h1>Welcome to Acme</h1>
    <h2>Widgets</h2>
    <p>We build widgets. They are sturdy! Are they cheap?</p>
    <h2>History</h2>
    <h3>Early years</h3>
    <div itemscope itemtype="https://schema.org/Product"><span>Widget</span></div>
  </main>
  <a href="/about">About</a>
  <a href="pricing">Pricing</a>
  <a href="https://example.com/contact">Contact</a>
  <a href="https://other.com/partner">Partner</a>
  <a href="#section">Jump</a>
  <a href="mailto:hi@example.com">Mail</a>
  <a href="javascript:void(0)">JS</a>
  <img src="a.png" alt="A widget">
  <img src="b.png" alt="">
  <img src="c.png">
  <footer><p>Fine print</p></footer>
</body>
</html>"##;

    fn analyze_fixture(ignore_noindex: bool, html: &str) -> (PageRecord, Vec<String>) {
        let analyzer = PageAnalyzer::new("example.com", ignore_noindex);
        let base = Url::parse("https://example.com/").unwrap();
        let mut record = PageRecord {
            address: "https://example.com/".to_string(),
            status: PageStatus::Code(200),
            ..PageRecord::default()
        };
        let outlinks = analyzer.analyze(html, &base, &mut record);
        (record, outlinks)
    }

    #[test]
    fn extracts_title_and_meta() {
        let (record, _) = analyze_fixture(false, FIXTURE);
        assert_eq!(record.title, "Acme Widgets — Home");
        assert_eq!(record.title_length, record.title.chars().count());
        assert_eq!(record.meta_description, "Hand-built widgets since 1952.");
        assert_eq!(record.meta_description_length, 30);
        assert_eq!(record.canonical, "https://example.com/");
        assert_eq!(record.meta_robots, "index, follow");
    }

    #[test]
    fn counts_headings_and_validates_hierarchy() {
        let (record, _) = analyze_fixture(false, FIXTURE);
        assert_eq!(record.h1_1, "Welcome to Acme");
        assert_eq!(record.h1_count, 1);
        assert_eq!(record.h2_1, "Widgets");
        assert_eq!(record.h2_2, "History");
        assert_eq!(record.h2_count, 2);
        assert_eq!(record.h3_count, 1);
        assert_eq!(record.h4_count, 0);
        assert!(record.heading_hierarchy_valid);
    }

    #[test]
    fn flags_heading_level_jumps() {
        let html = "<html><body><h1>A</h1><h3>B</h3></body></html>";
        let (record, _) = analyze_fixture(false, html);
        assert!(!record.heading_hierarchy_valid);
    }

    #[test]
    fn hierarchy_may_start_below_h1() {
        let html = "<html><body><h2>A</h2><h3>B</h3><h2>C</h2></body></html>";
        let (record, _) = analyze_fixture(false, html);
        assert!(record.heading_hierarchy_valid);
    }

    #[test]
    fn classifies_links_and_resolves_outlinks() {
        let (record, outlinks) = analyze_fixture(false, FIXTURE);
        // /hidden-in-header, /about, pricing, same-domain absolute = internal
        assert_eq!(record.internal_links, 4);
        assert_eq!(record.external_links, 1);
        assert_eq!(record.total_links, 5);
        assert!(outlinks.contains(&"https://example.com/about".to_string()));
        assert!(outlinks.contains(&"https://example.com/pricing".to_string()));
        assert!(outlinks.contains(&"https://other.com/partner".to_string()));
        assert!(!outlinks.iter().any(|l| l.contains("mailto")));
    }

    #[test]
    fn counts_images_and_alt_coverage() {
        let (record, _) = analyze_fixture(false, FIXTURE);
        assert_eq!(record.total_images, 3);
        assert_eq!(record.images_with_alt, 1);
        assert_eq!(record.images_without_alt, 2);
        assert!((record.alt_text_coverage - 33.3).abs() < 0.01);
    }

    #[test]
    fn word_count_uses_main_content_only() {
        let (record, _) = analyze_fixture(false, FIXTURE);
        // "Menu" (nav) and "Fine print" (footer) are excluded from the text,
        // but every <p> in the document is counted.
        assert_eq!(record.word_count, 17);
        assert_eq!(record.sentence_count, 3);
        assert_eq!(record.paragraph_count, 3);
        assert!(record.flesch_score > 0.0);
        assert!(!record.readability_level.is_empty());
    }

    #[test]
    fn collects_structured_data_types() {
        let (record, _) = analyze_fixture(false, FIXTURE);
        assert_eq!(record.json_ld_count, 3);
        assert_eq!(record.microdata_count, 1);
        assert_eq!(record.schema_types, vec!["FAQPage", "Organization", "Product"]);
        assert!(record.has_structured_data);
    }

    #[test]
    fn empty_page_has_no_structured_data_and_na_readability() {
        let (record, _) = analyze_fixture(false, "<html><body></body></html>");
        assert_eq!(record.word_count, 0);
        assert_eq!(record.flesch_score, 0.0);
        assert_eq!(record.readability_level, "N/A");
        assert!(!record.has_structured_data);
        assert!(record.heading_hierarchy_valid);
        assert_eq!(record.alt_text_coverage, 0.0);
    }

    #[test]
    fn noindex_labels_follow_ignore_flag() {
        let html = r#"<html><head><meta name="robots" content="NOINDEX, nofollow"></head><body></body></html>"#;
        let (record, _) = analyze_fixture(false, html);
        assert_eq!(record.indexability, Indexability::NonIndexable);
        let (record, _) = analyze_fixture(true, html);
        assert_eq!(record.indexability, Indexability::NonIndexableCrawledAnyway);
        let (record, _) = analyze_fixture(true, "<html><body></body></html>");
        assert_eq!(record.indexability, Indexability::Indexable);
    }

    #[test]
    fn falls_back_to_body_text_without_content_containers() {
        let html = "<html><body><p>Just a plain page. Nothing fancy.</p></body></html>";
        let (record, _) = analyze_fixture(false, html);
        assert_eq!(record.word_count, 6);
        assert_eq!(record.sentence_count, 2);
    }

    #[test]
    fn prefers_content_class_div_over_body() {
        let html = r#"<html><body>
            <div class="sidebar"><p>ignore me entirely</p></div>
            <div class="post-body"><p>Only these four words.</p></div>
        </body></html>"#;
        let (record, _) = analyze_fixture(false, html);
        assert_eq!(record.word_count, 4);
    }
}
