use std::collections::BTreeSet;

use scraper::{Html, Selector};
use serde_json::Value;

use super::PageAnalyzer;
use crate::core::types::PageRecord;

impl PageAnalyzer {
    /// JSON-LD and microdata detection. Schema types are the union of both
    /// sources, sorted for stable output.
    pub(super) fn extract_structured_data(&self, document: &Html, record: &mut PageRecord) {
        let mut types = BTreeSet::new();

        if let Ok(selector) = Selector::parse("script[type=\"application/ld+json\"]") {
            for script in document.select(&selector) {
                record.json_ld_count += 1;
                if let Ok(value) = serde_json::from_str::<Value>(&script.inner_html()) {
                    collect_ld_types(&value, &mut types);
                }
            }
        }

        if let Ok(selector) = Selector::parse("[itemscope]") {
            for item in document.select(&selector) {
                record.microdata_count += 1;
                if let Some(itemtype) = item.value().attr("itemtype") {
                    if let Some(schema) = itemtype
                        .trim()
                        .rsplit('/')
                        .next()
                        .filter(|segment| !segment.is_empty())
                    {
                        types.insert(schema.to_string());
                    }
                }
            }
        }

        record.schema_types = types.into_iter().collect();
        record.has_structured_data = !record.schema_types.is_empty();
    }
}

/// `@type` values from a top-level JSON-LD object or an array of objects.
fn collect_ld_types(value: &Value, types: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(schema)) = map.get("@type") {
                types.insert(schema.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    if let Some(Value::String(schema)) = map.get("@type") {
                        types.insert(schema.clone());
                    }
                }
            }
        }
        _ => {}
    }
}
