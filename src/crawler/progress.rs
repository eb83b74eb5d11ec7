//! Progress reporting for crawl runs.
//!
//! Callbacks fire synchronously on the scheduler's context; implementations
//! should hand work off rather than block.

/// Receives session-setup milestones and per-page completion events.
pub trait CrawlProgress: Send + Sync {
    /// Setup-phase milestone: robots fetch, sitemap resolution, crawl start.
    fn init_step(&self, _percent: u8, _status: &str) {}

    /// A page record was produced (`current` of at most `total`).
    fn page_crawled(&self, _current: usize, _total: usize, _url: &str) {}
}

/// Progress reporter that does nothing.
#[derive(Debug, Clone, Copy)]
pub struct NoProgress;

impl CrawlProgress for NoProgress {}
