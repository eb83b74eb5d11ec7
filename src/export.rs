//! CSV export in the legacy report-column layout.

use std::io::Write;

use crate::core::types::PageRecord;

/// Column headers expected by downstream report tooling; order matters.
const HEADERS: &[&str] = &[
    "Address",
    "Content Type",
    "Status Code",
    "Indexability",
    "Title tag",
    "Title tag Length",
    "Meta Description",
    "Meta Description Length",
    "H1-1",
    "H1-1 Length",
    "H2-1",
    "H2-1 Length",
    "H2-2",
    "H2-2 Length",
    "Meta Robots 1",
    "Canonical Link Element 1",
    "Word Count",
    "Flesch Reading Ease Score",
    "Readability",
    "Crawl Depth",
    "Inlinks",
    "Unique Inlinks",
];

pub fn write_csv<W: Write>(records: &[PageRecord], writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADERS)?;
    for record in records {
        csv_writer.write_record(&[
            record.address.clone(),
            record.content_type.clone(),
            record.status.to_string(),
            record.indexability.to_string(),
            record.title.clone(),
            record.title_length.to_string(),
            record.meta_description.clone(),
            record.meta_description_length.to_string(),
            record.h1_1.clone(),
            record.h1_1_length.to_string(),
            record.h2_1.clone(),
            record.h2_1_length.to_string(),
            record.h2_2.clone(),
            record.h2_2_length.to_string(),
            record.meta_robots.clone(),
            record.canonical.clone(),
            record.word_count.to_string(),
            record.flesch_score.to_string(),
            record.readability_level.clone(),
            record.crawl_depth.to_string(),
            record.inlinks.to_string(),
            record.unique_inlinks.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PageStatus;

    #[test]
    fn writes_header_row_and_one_line_per_record() {
        let record = PageRecord {
            address: "https://example.com/".to_string(),
            content_type: "text/html; charset=utf-8".to_string(),
            status: PageStatus::Code(200),
            title: "Home".to_string(),
            title_length: 4,
            flesch_score: 72.5,
            ..PageRecord::default()
        };
        let timeout = PageRecord {
            address: "https://example.com/slow".to_string(),
            status: PageStatus::Timeout,
            ..PageRecord::default()
        };

        let mut out = Vec::new();
        write_csv(&[record, timeout], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Address,Content Type,Status Code,Indexability,Title tag"));
        assert!(lines[1].contains("200"));
        assert!(lines[1].contains("72.5"));
        assert!(lines[2].contains("Timeout"));
    }
}
