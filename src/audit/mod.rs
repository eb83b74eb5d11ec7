//! Issue detection over a crawled record set.
//!
//! Per-page rules run in record order, then cross-page duplicate detection,
//! then a stable sort by severity so detection order is preserved inside
//! each band.

use std::collections::HashMap;

use crate::core::types::{
    HealthLevel, Issue, IssueCategory, IssueSummary, PageRecord, PageStatus, Severity, SiteHealth,
};

pub fn detect_issues(records: &[PageRecord]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for record in records {
        page_issues(record, &mut issues);
    }
    duplicate_issues(records, &mut issues);
    issues.sort_by_key(|issue| issue.severity);
    issues
}

fn page_issues(record: &PageRecord, issues: &mut Vec<Issue>) {
    let url = &record.address;

    if record.title.trim().is_empty() {
        issues.push(Issue {
            issue_type: "Missing Title Tag".to_string(),
            url: url.clone(),
            severity: Severity::Critical,
            description: "Page has no title tag".to_string(),
            impact: "Blocks proper indexing and search result display".to_string(),
            fix: "Add a unique, descriptive title tag (50-60 characters)".to_string(),
            category: IssueCategory::TechnicalSeo,
        });
    }

    if matches!(record.status, PageStatus::Code(404 | 500 | 502 | 503)) {
        issues.push(Issue {
            issue_type: "Server Error".to_string(),
            url: url.clone(),
            severity: Severity::Critical,
            description: format!("HTTP {} error", record.status),
            impact: "Page cannot be indexed by search engines".to_string(),
            fix: "Fix server configuration or restore missing content".to_string(),
            category: IssueCategory::TechnicalSeo,
        });
    }

    if record.h1_count == 0 {
        issues.push(Issue {
            issue_type: "Missing H1 Tag".to_string(),
            url: url.clone(),
            severity: Severity::High,
            description: "Page has no H1 heading".to_string(),
            impact: "Reduces content structure and SEO effectiveness".to_string(),
            fix: "Add a single, descriptive H1 tag that matches the page topic".to_string(),
            category: IssueCategory::Content,
        });
    }

    if record.h1_count > 1 {
        issues.push(Issue {
            issue_type: "Multiple H1 Tags".to_string(),
            url: url.clone(),
            severity: Severity::High,
            description: format!("Page has {} H1 tags", record.h1_count),
            impact: "Confuses search engines about page topic hierarchy".to_string(),
            fix: "Use only one H1 tag per page, convert others to H2-H6".to_string(),
            category: IssueCategory::Content,
        });
    }

    if record.meta_description.trim().is_empty() {
        issues.push(Issue {
            issue_type: "Missing Meta Description".to_string(),
            url: url.clone(),
            severity: Severity::High,
            description: "Page has no meta description".to_string(),
            impact: "Search engines will generate their own snippet".to_string(),
            fix: "Add a compelling meta description (150-160 characters)".to_string(),
            category: IssueCategory::TechnicalSeo,
        });
    }

    if record.title_length > 60 {
        issues.push(Issue {
            issue_type: "Title Too Long".to_string(),
            url: url.clone(),
            severity: Severity::Medium,
            description: format!(
                "Title tag is {} characters (recommended: 50-60)",
                record.title_length
            ),
            impact: "Title may be truncated in search results".to_string(),
            fix: "Shorten title to 50-60 characters while keeping it descriptive".to_string(),
            category: IssueCategory::Content,
        });
    }

    if record.meta_description_length > 160 {
        issues.push(Issue {
            issue_type: "Meta Description Too Long".to_string(),
            url: url.clone(),
            severity: Severity::Medium,
            description: format!(
                "Meta description is {} characters (recommended: 150-160)",
                record.meta_description_length
            ),
            impact: "Description may be truncated in search results".to_string(),
            fix: "Shorten meta description to 150-160 characters".to_string(),
            category: IssueCategory::TechnicalSeo,
        });
    }

    if record.word_count < 300 {
        issues.push(Issue {
            issue_type: "Thin Content".to_string(),
            url: url.clone(),
            severity: Severity::Medium,
            description: format!("Page has only {} words", record.word_count),
            impact: "May be considered low-quality content by search engines".to_string(),
            fix: "Expand content to at least 300 words with valuable information".to_string(),
            category: IssueCategory::Content,
        });
    }

    if !record.heading_hierarchy_valid {
        issues.push(Issue {
            issue_type: "Poor Heading Hierarchy".to_string(),
            url: url.clone(),
            severity: Severity::Medium,
            description: "Heading tags skip levels (e.g., H1 to H3)".to_string(),
            impact: "Reduces content accessibility and SEO structure".to_string(),
            fix: "Use heading tags in proper order: H1 → H2 → H3 → H4".to_string(),
            category: IssueCategory::Content,
        });
    }

    if record.images_without_alt > 0 {
        issues.push(Issue {
            issue_type: "Missing Alt Text".to_string(),
            url: url.clone(),
            severity: Severity::Medium,
            description: format!("{} images missing alt text", record.images_without_alt),
            impact: "Reduces accessibility and image SEO potential".to_string(),
            fix: "Add descriptive alt text to all images".to_string(),
            category: IssueCategory::Accessibility,
        });
    }

    if record.flesch_score < 30.0 {
        issues.push(Issue {
            issue_type: "Difficult Readability".to_string(),
            url: url.clone(),
            severity: Severity::Low,
            description: format!(
                "Readability score: {} (Very Difficult)",
                record.flesch_score
            ),
            impact: "Content may be hard for users to understand".to_string(),
            fix: "Simplify language, use shorter sentences and paragraphs".to_string(),
            category: IssueCategory::Content,
        });
    }

    if record.canonical.trim().is_empty() {
        issues.push(Issue {
            issue_type: "Missing Canonical Tag".to_string(),
            url: url.clone(),
            severity: Severity::Low,
            description: "Page has no canonical tag".to_string(),
            impact: "May cause duplicate content issues".to_string(),
            fix: "Add self-referencing canonical tag or specify preferred URL".to_string(),
            category: IssueCategory::TechnicalSeo,
        });
    }
}

/// Duplicate titles (High) and meta descriptions (Medium): every URL in a
/// group of two or more gets an issue. Groups iterate in first-seen order.
fn duplicate_issues(records: &[PageRecord], issues: &mut Vec<Issue>) {
    let (titles, title_order) = group_by(records, |record| &record.title);
    for title in title_order {
        let urls = &titles[title];
        if urls.len() < 2 {
            continue;
        }
        let preview: String = title.chars().take(50).collect();
        for url in urls {
            issues.push(Issue {
                issue_type: "Duplicate Title Tag".to_string(),
                url: (*url).to_string(),
                severity: Severity::High,
                description: format!(
                    "Title \"{preview}...\" is used on {} pages",
                    urls.len()
                ),
                impact: "Search engines cannot distinguish between pages".to_string(),
                fix: "Create unique, descriptive titles for each page".to_string(),
                category: IssueCategory::TechnicalSeo,
            });
        }
    }

    let (descriptions, description_order) = group_by(records, |record| &record.meta_description);
    for description in description_order {
        let urls = &descriptions[description];
        if urls.len() < 2 {
            continue;
        }
        for url in urls {
            issues.push(Issue {
                issue_type: "Duplicate Meta Description".to_string(),
                url: (*url).to_string(),
                severity: Severity::Medium,
                description: format!("Meta description is used on {} pages", urls.len()),
                impact: "Reduces uniqueness and click-through rates".to_string(),
                fix: "Write unique meta descriptions for each page".to_string(),
                category: IssueCategory::TechnicalSeo,
            });
        }
    }
}

/// Group record addresses by a non-empty key, remembering first-seen order.
fn group_by<'a, F>(records: &'a [PageRecord], key: F) -> (HashMap<&'a str, Vec<&'a str>>, Vec<&'a str>)
where
    F: Fn(&'a PageRecord) -> &'a String,
{
    let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        let value = key(record).trim();
        if value.is_empty() {
            continue;
        }
        let entry = groups.entry(value).or_default();
        if entry.is_empty() {
            order.push(value);
        }
        entry.push(record.address.as_str());
    }
    (groups, order)
}

pub fn issue_summary(issues: &[Issue]) -> IssueSummary {
    let mut summary = IssueSummary {
        total_issues: issues.len(),
        ..IssueSummary::default()
    };
    for issue in issues {
        match issue.severity {
            Severity::Critical => summary.critical += 1,
            Severity::High => summary.high += 1,
            Severity::Medium => summary.medium += 1,
            Severity::Low => summary.low += 1,
        }
        *summary.categories.entry(issue.category.to_string()).or_insert(0) += 1;
    }
    summary
}

/// 100 minus 15 per critical, 8 per high, 3 per medium, 1 per low, clamped
/// to 0..=100.
pub fn health_score(summary: &IssueSummary) -> SiteHealth {
    let penalty = 15 * summary.critical as i64
        + 8 * summary.high as i64
        + 3 * summary.medium as i64
        + summary.low as i64;
    let score = (100 - penalty).clamp(0, 100) as u8;
    let level = if score >= 90 {
        HealthLevel::Excellent
    } else if score >= 75 {
        HealthLevel::Good
    } else if score >= 50 {
        HealthLevel::Fair
    } else {
        HealthLevel::Poor
    };
    SiteHealth { score, level }
}
