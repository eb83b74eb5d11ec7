pub mod analyzer;
pub mod audit;
pub mod core;
pub mod crawler;
pub mod export;

// --- Primary exports ---
pub use crate::core::config::{CrawlConfig, CrawlError};
pub use crate::core::types;
pub use crate::core::types::*;

pub use crate::analyzer::PageAnalyzer;
pub use crate::audit::{detect_issues, health_score, issue_summary};
pub use crate::crawler::progress::{CrawlProgress, NoProgress};
pub use crate::crawler::{CancelHandle, SeoCrawler};
pub use crate::export::write_csv;
