use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::{readability, PageAnalyzer};
use crate::core::types::PageRecord;
use crate::crawler::urls;

/// Boilerplate containers excluded from readability text.
const EXCLUDED_TEXT_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

impl PageAnalyzer {
    /// Text statistics, readability, link and image analysis. Returns the
    /// page's absolute outlinks for the crawl frontier.
    pub(super) fn analyze_content(
        &self,
        document: &Html,
        base: &Url,
        record: &mut PageRecord,
    ) -> Vec<String> {
        let text = self.main_content_text(document);
        record.word_count = text.split_whitespace().count();
        record.sentence_count = text.matches(['.', '!', '?']).count();
        if let Ok(selector) = Selector::parse("p") {
            record.paragraph_count = document.select(&selector).count();
        }

        if text.is_empty() {
            record.flesch_score = 0.0;
            record.readability_level = "N/A".to_string();
        } else {
            record.flesch_score = readability::flesch_reading_ease(&text);
            record.readability_level = readability::readability_level(record.flesch_score).to_string();
        }

        let outlinks = self.analyze_links(document, base, record);
        self.analyze_images(document, record);
        outlinks
    }

    /// Readable text from the page's main content area, whitespace-collapsed.
    fn main_content_text(&self, document: &Html) -> String {
        let mut raw = String::new();
        if let Some(root) = self.find_content_root(document) {
            collect_text(*root, &mut raw);
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// First `<main>`, else `<article>`, else a `<div>` with a content-ish
    /// class, else the body.
    fn find_content_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        for name in ["main", "article"] {
            if let Ok(selector) = Selector::parse(name) {
                if let Some(element) = document.select(&selector).next() {
                    return Some(element);
                }
            }
        }
        if let Ok(selector) = Selector::parse("div") {
            for element in document.select(&selector) {
                if let Some(class) = element.value().attr("class") {
                    if self.content_class.is_match(class) {
                        return Some(element);
                    }
                }
            }
        }
        Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next())
    }

    fn analyze_links(&self, document: &Html, base: &Url, record: &mut PageRecord) -> Vec<String> {
        let mut outlinks = Vec::new();
        let Ok(selector) = Selector::parse("a") else {
            return outlinks;
        };
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("javascript:")
            {
                continue;
            }

            if href.starts_with('/') || !href.starts_with("http") {
                record.internal_links += 1;
            } else if urls::is_same_domain(&self.domain, href) {
                record.internal_links += 1;
            } else {
                record.external_links += 1;
            }

            if let Ok(resolved) = base.join(href) {
                if matches!(resolved.scheme(), "http" | "https") {
                    outlinks.push(resolved.to_string());
                }
            }
        }
        record.total_links = record.internal_links + record.external_links;
        outlinks
    }

    fn analyze_images(&self, document: &Html, record: &mut PageRecord) {
        let Ok(selector) = Selector::parse("img") else {
            return;
        };
        for image in document.select(&selector) {
            record.total_images += 1;
            if image.value().attr("alt").is_some_and(|alt| !alt.is_empty()) {
                record.images_with_alt += 1;
            }
        }
        record.images_without_alt = record.total_images - record.images_with_alt;
        record.alt_text_coverage = if record.total_images > 0 {
            let pct = record.images_with_alt as f64 / record.total_images as f64 * 100.0;
            (pct * 10.0).round() / 10.0
        } else {
            0.0
        };
    }
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            Node::Element(element) => {
                if !EXCLUDED_TEXT_TAGS.contains(&element.name()) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}
