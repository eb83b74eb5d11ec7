use std::fs::File;

use tracing::info;

use seoscout::{
    detect_issues, health_score, issue_summary, write_csv, CrawlConfig, CrawlProgress, SeoCrawler,
};

/// Prints crawl progress through the logging pipeline.
struct CliProgress;

impl CrawlProgress for CliProgress {
    fn init_step(&self, percent: u8, status: &str) {
        info!("[{percent:>3}%] {status}");
    }

    fn page_crawled(&self, current: usize, total: usize, url: &str) {
        info!("[{current}/{total}] {url}");
    }
}

struct CliOptions {
    config: CrawlConfig,
    csv_path: Option<String>,
    json: bool,
}

fn print_usage() {
    eprintln!(
        "Usage: seoscout <url> [options]

Options:
  --max-pages <n>       Page budget (default 50)
  --max-depth <n>       Link depth bound (default 3)
  --timeout <secs>      Per-request timeout (default 30)
  --delay <min> <max>   Politeness delay range in seconds (default 0.5 2.0)
  --include <pattern>   Include pattern (repeatable; wildcard or regex)
  --exclude <pattern>   Exclude pattern (repeatable; wildcard or regex)
  --no-robots           Do not honor robots.txt rules
  --no-sitemap          Skip sitemap discovery
  --no-redirects        Do not follow redirects
  --ignore-noindex      Crawl noindex pages, labeling them as such
  --insecure            Accept invalid TLS certificates
  --csv <path>          Write the page records as CSV
  --json                Emit records, issues and summary as JSON"
    );
}

fn parse_args() -> Option<CliOptions> {
    let mut args = std::env::args().skip(1).peekable();
    let mut url: Option<String> = None;
    let mut config = CrawlConfig::default();
    let mut csv_path = None;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max-pages" => config.max_pages = args.next()?.parse().ok()?,
            "--max-depth" => config.max_depth = args.next()?.parse().ok()?,
            "--timeout" => config.request_timeout_secs = args.next()?.parse().ok()?,
            "--delay" => {
                let min = args.next()?.parse().ok()?;
                let max = args.next()?.parse().ok()?;
                config.delay_range = (min, max);
            }
            "--include" => config.include_patterns.push(args.next()?),
            "--exclude" => config.exclude_patterns.push(args.next()?),
            "--no-robots" => config.respect_robots = false,
            "--no-sitemap" => config.use_sitemap = false,
            "--no-redirects" => config.follow_redirects = false,
            "--ignore-noindex" => config.ignore_noindex = true,
            "--insecure" => config.accept_invalid_certs = true,
            "--csv" => csv_path = Some(args.next()?),
            "--json" => json = true,
            "--help" | "-h" => return None,
            other if url.is_none() && !other.starts_with('-') => url = Some(other.to_string()),
            _ => return None,
        }
    }

    let url = url?;
    config.start_url = CrawlConfig::for_site(&url).start_url;
    Some(CliOptions {
        config,
        csv_path,
        json,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(options) = parse_args() else {
        print_usage();
        std::process::exit(2);
    };

    let mut crawler = SeoCrawler::new(options.config)?;
    let records = crawler.crawl(&CliProgress).await?;
    let issues = detect_issues(&records);
    let summary = issue_summary(&issues);
    let health = health_score(&summary);
    let stats = crawler.stats();

    if let Some(path) = &options.csv_path {
        let file = File::create(path)?;
        write_csv(&records, file)?;
        info!("wrote {} records to {path}", records.len());
    }

    if options.json {
        let report = serde_json::json!({
            "records": records,
            "issues": issues,
            "summary": summary,
            "health": health,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nCrawled {} pages ({} skipped)", stats.total_pages, stats.skipped_urls);
    println!("robots.txt: {}", stats.robots_txt_status);
    println!("sitemaps:   {}", stats.sitemap_status);
    println!(
        "\nHealth: {} ({}/100) — {} issues: {} critical, {} high, {} medium, {} low",
        health.level,
        health.score,
        summary.total_issues,
        summary.critical,
        summary.high,
        summary.medium,
        summary.low
    );
    for issue in &issues {
        println!("[{}] {} — {}", issue.severity, issue.issue_type, issue.url);
    }

    Ok(())
}
