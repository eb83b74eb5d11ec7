use scraper::{Html, Selector};

use super::PageAnalyzer;
use crate::core::types::PageRecord;

impl PageAnalyzer {
    /// Title, meta description, meta robots, canonical, headings.
    pub(super) fn extract_metadata(&self, document: &Html, record: &mut PageRecord) {
        if let Ok(selector) = Selector::parse("title") {
            if let Some(element) = document.select(&selector).next() {
                record.title = element.text().collect::<String>().trim().to_string();
            }
        }
        record.title_length = record.title.chars().count();

        if let Ok(selector) = Selector::parse("meta[name=\"description\"]") {
            if let Some(content) = document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("content"))
            {
                record.meta_description = content.trim().to_string();
            }
        }
        record.meta_description_length = record.meta_description.chars().count();

        if let Ok(selector) = Selector::parse("meta[name=\"robots\"]") {
            if let Some(content) = document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("content"))
            {
                record.meta_robots = content.trim().to_string();
            }
        }

        if let Ok(selector) = Selector::parse("link[rel=\"canonical\"]") {
            if let Some(href) = document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
            {
                record.canonical = href.trim().to_string();
            }
        }

        self.extract_headings(document, record);
    }

    fn extract_headings(&self, document: &Html, record: &mut PageRecord) {
        // One document-order pass over all heading levels.
        let mut headings: Vec<(u8, String)> = Vec::new();
        if let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") {
            for element in document.select(&selector) {
                let level = element
                    .value()
                    .name()
                    .as_bytes()
                    .get(1)
                    .map(|byte| byte.wrapping_sub(b'0'))
                    .unwrap_or(0);
                if !(1..=6).contains(&level) {
                    continue;
                }
                let text = element.text().collect::<String>().trim().to_string();
                headings.push((level, text));
            }
        }

        let texts_at = |level: u8| {
            headings
                .iter()
                .filter(move |(l, _)| *l == level)
                .map(|(_, text)| text)
        };

        if let Some(h1) = texts_at(1).next() {
            record.h1_1 = h1.clone();
        }
        record.h1_1_length = record.h1_1.chars().count();
        record.h1_count = texts_at(1).count();

        let mut h2s = texts_at(2);
        if let Some(h2) = h2s.next() {
            record.h2_1 = h2.clone();
        }
        if let Some(h2) = h2s.next() {
            record.h2_2 = h2.clone();
        }
        record.h2_1_length = record.h2_1.chars().count();
        record.h2_2_length = record.h2_2.chars().count();
        record.h2_count = texts_at(2).count();
        record.h3_count = texts_at(3).count();
        record.h4_count = texts_at(4).count();
        record.h5_count = texts_at(5).count();
        record.h6_count = texts_at(6).count();

        record.heading_hierarchy_valid = hierarchy_valid(&headings);
    }
}

/// A hierarchy is valid when no heading jumps more than one level deeper
/// than its predecessor; the first heading sets the baseline.
fn hierarchy_valid(headings: &[(u8, String)]) -> bool {
    let mut current = 0u8;
    for &(level, _) in headings {
        if current != 0 && level > current + 1 {
            return false;
        }
        current = level;
    }
    true
}
