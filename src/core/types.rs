use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Terminal state of one fetch. Serializes as a bare status code for normal
/// responses and as the strings `"Timeout"` / `"Error"` for transport
/// failures, matching the record wire format consumed by report tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Code(u16),
    Timeout,
    Error,
}

impl PageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PageStatus::Code(code) if (200..300).contains(code))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PageStatus::Timeout | PageStatus::Error)
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStatus::Code(code) => write!(f, "{code}"),
            PageStatus::Timeout => f.write_str("Timeout"),
            PageStatus::Error => f.write_str("Error"),
        }
    }
}

impl Serialize for PageStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageStatus::Code(code) => serializer.serialize_u16(*code),
            PageStatus::Timeout => serializer.serialize_str("Timeout"),
            PageStatus::Error => serializer.serialize_str("Error"),
        }
    }
}

impl<'de> Deserialize<'de> for PageStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = PageStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an HTTP status code, \"Timeout\" or \"Error\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<PageStatus, E> {
                u16::try_from(value)
                    .map(PageStatus::Code)
                    .map_err(|_| E::custom(format!("status code out of range: {value}")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<PageStatus, E> {
                u16::try_from(value)
                    .map(PageStatus::Code)
                    .map_err(|_| E::custom(format!("status code out of range: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<PageStatus, E> {
                match value {
                    "Timeout" => Ok(PageStatus::Timeout),
                    "Error" => Ok(PageStatus::Error),
                    other => other
                        .parse::<u16>()
                        .map(PageStatus::Code)
                        .map_err(|_| E::custom(format!("unknown page status: {other}"))),
                }
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// How a URL entered the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Crawling,
    Sitemap,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverySource::Crawling => f.write_str("crawling"),
            DiscoverySource::Sitemap => f.write_str("sitemap"),
        }
    }
}

/// Indexability label derived from the page's meta-robots directive.
/// The directive never suppresses link extraction, only this label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indexability {
    #[serde(rename = "Indexable")]
    Indexable,
    #[serde(rename = "Non-Indexable")]
    NonIndexable,
    #[serde(rename = "Non-Indexable (crawled anyway)")]
    NonIndexableCrawledAnyway,
}

impl fmt::Display for Indexability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indexability::Indexable => f.write_str("Indexable"),
            Indexability::NonIndexable => f.write_str("Non-Indexable"),
            Indexability::NonIndexableCrawledAnyway => {
                f.write_str("Non-Indexable (crawled anyway)")
            }
        }
    }
}

/// One crawled page. Flat record with typed defaults so non-HTML and error
/// outcomes serialize with blank SEO fields instead of a different shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub address: String,
    pub final_url: String,
    pub status: PageStatus,
    pub content_type: String,
    pub load_time_s: f64,
    pub crawl_depth: usize,
    pub discovery_source: DiscoverySource,
    pub error: String,
    pub crawled_at: String,

    pub title: String,
    pub title_length: usize,
    pub meta_description: String,
    pub meta_description_length: usize,
    pub h1_1: String,
    pub h1_1_length: usize,
    pub h1_count: usize,
    pub h2_1: String,
    pub h2_1_length: usize,
    pub h2_2: String,
    pub h2_2_length: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
    pub heading_hierarchy_valid: bool,
    pub meta_robots: String,
    pub canonical: String,
    pub word_count: usize,
    pub paragraph_count: usize,
    pub sentence_count: usize,
    pub flesch_score: f64,
    pub readability_level: String,
    pub internal_links: usize,
    pub external_links: usize,
    pub total_links: usize,
    pub total_images: usize,
    pub images_with_alt: usize,
    pub images_without_alt: usize,
    pub alt_text_coverage: f64,
    pub json_ld_count: usize,
    pub microdata_count: usize,
    pub schema_types: Vec<String>,
    pub has_structured_data: bool,
    pub indexability: Indexability,
    pub inlinks: usize,
    pub unique_inlinks: usize,
}

impl Default for PageRecord {
    fn default() -> Self {
        Self {
            address: String::new(),
            final_url: String::new(),
            status: PageStatus::Error,
            content_type: String::new(),
            load_time_s: 0.0,
            crawl_depth: 0,
            discovery_source: DiscoverySource::Crawling,
            error: String::new(),
            crawled_at: String::new(),
            title: String::new(),
            title_length: 0,
            meta_description: String::new(),
            meta_description_length: 0,
            h1_1: String::new(),
            h1_1_length: 0,
            h1_count: 0,
            h2_1: String::new(),
            h2_1_length: 0,
            h2_2: String::new(),
            h2_2_length: 0,
            h2_count: 0,
            h3_count: 0,
            h4_count: 0,
            h5_count: 0,
            h6_count: 0,
            heading_hierarchy_valid: true,
            meta_robots: String::new(),
            canonical: String::new(),
            word_count: 0,
            paragraph_count: 0,
            sentence_count: 0,
            flesch_score: 0.0,
            readability_level: String::new(),
            internal_links: 0,
            external_links: 0,
            total_links: 0,
            total_images: 0,
            images_with_alt: 0,
            images_without_alt: 0,
            alt_text_coverage: 0.0,
            json_ld_count: 0,
            microdata_count: 0,
            schema_types: Vec::new(),
            has_structured_data: false,
            indexability: Indexability::Indexable,
            inlinks: 0,
            unique_inlinks: 0,
        }
    }
}

/// Why a popped URL was rejected before fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    #[serde(rename = "Excluded by pattern")]
    ExcludedByPattern,
    #[serde(rename = "Not included by pattern")]
    NotIncludedByPattern,
    #[serde(rename = "Blocked by robots.txt")]
    BlockedByRobots,
    #[serde(rename = "Non-HTML resource")]
    NonHtmlResource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedByPattern => f.write_str("Excluded by pattern"),
            SkipReason::NotIncludedByPattern => f.write_str("Not included by pattern"),
            SkipReason::BlockedByRobots => f.write_str("Blocked by robots.txt"),
            SkipReason::NonHtmlResource => f.write_str("Non-HTML resource"),
        }
    }
}

/// Append-only log entry for filtered-out URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipRecord {
    pub url: String,
    pub reason: SkipReason,
    pub source: DiscoverySource,
}

/// Issue severity, ordered most severe first so a stable sort by severity
/// keeps detection order inside each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => f.write_str("Critical"),
            Severity::High => f.write_str("High"),
            Severity::Medium => f.write_str("Medium"),
            Severity::Low => f.write_str("Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    #[serde(rename = "Technical SEO")]
    TechnicalSeo,
    #[serde(rename = "Content")]
    Content,
    #[serde(rename = "Accessibility")]
    Accessibility,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCategory::TechnicalSeo => f.write_str("Technical SEO"),
            IssueCategory::Content => f.write_str("Content"),
            IssueCategory::Accessibility => f.write_str("Accessibility"),
        }
    }
}

/// One detected SEO issue with remediation copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub issue_type: String,
    pub url: String,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
    pub fix: String,
    pub category: IssueCategory,
}

/// Aggregated issue counts by severity and category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total_issues: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthLevel::Excellent => f.write_str("Excellent"),
            HealthLevel::Good => f.write_str("Good"),
            HealthLevel::Fair => f.write_str("Fair"),
            HealthLevel::Poor => f.write_str("Poor"),
        }
    }
}

/// Site-wide health score on a 0-100 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SiteHealth {
    pub score: u8,
    pub level: HealthLevel,
}

/// Crawl-run statistics exposed alongside the record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    pub total_pages: usize,
    pub skipped_urls: usize,
    pub robots_txt_status: String,
    pub crawl_delay_used: String,
    pub sitemap_status: String,
    pub urls_from_crawling: usize,
    pub urls_from_sitemap: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_status_serializes_as_code_or_label() {
        assert_eq!(
            serde_json::to_string(&PageStatus::Code(200)).unwrap(),
            "200"
        );
        assert_eq!(
            serde_json::to_string(&PageStatus::Timeout).unwrap(),
            "\"Timeout\""
        );
        assert_eq!(
            serde_json::to_string(&PageStatus::Error).unwrap(),
            "\"Error\""
        );
    }

    #[test]
    fn page_status_round_trips() {
        for status in [PageStatus::Code(503), PageStatus::Timeout, PageStatus::Error] {
            let json = serde_json::to_string(&status).unwrap();
            let back: PageStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn severity_orders_most_severe_first() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn indexability_labels_match_report_format() {
        assert_eq!(Indexability::Indexable.to_string(), "Indexable");
        assert_eq!(
            Indexability::NonIndexableCrawledAnyway.to_string(),
            "Non-Indexable (crawled anyway)"
        );
    }
}
