use std::collections::{HashSet, VecDeque};
use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::urls;

const SITEMAP_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Well-known sitemap locations, tried in order until one yields URLs.
const WELL_KNOWN_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemaps.xml"];

/// Resolves sitemaps and sitemap indexes (plain or gzipped) into the set of
/// same-domain page URLs. A fetched-set keyed on the sitemap URL makes
/// self-referencing indexes terminate.
pub struct SitemapResolver<'a> {
    client: &'a Client,
    domain: String,
    fetched: HashSet<String>,
    pub urls: Vec<String>,
    pub status: String,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(client: &'a Client, domain: &str) -> Self {
        Self {
            client,
            domain: domain.to_string(),
            fetched: HashSet::new(),
            urls: Vec::new(),
            status: "Not fetched".to_string(),
        }
    }

    /// Fetch one sitemap URL, following nested sitemap-index entries
    /// breadth-first. Cycles and repeats are skipped via the fetched-set.
    pub async fn fetch_sitemap(&mut self, sitemap_url: &str) {
        let mut pending = VecDeque::from([sitemap_url.to_string()]);
        while let Some(url) = pending.pop_front() {
            if !self.fetched.insert(url.clone()) {
                continue;
            }
            match self.fetch_one(&url).await {
                Ok(bytes) => {
                    let (urls, nested) = parse_sitemap_xml(&bytes, &self.domain);
                    if !nested.is_empty() {
                        debug!("sitemap index {url} references {} child sitemaps", nested.len());
                        pending.extend(nested);
                    }
                    self.urls.extend(urls);
                    self.status = if self.urls.is_empty() {
                        "Sitemap found but no URLs extracted".to_string()
                    } else {
                        format!("Found {} URLs from sitemaps", self.urls.len())
                    };
                }
                Err(status) => {
                    debug!("sitemap fetch failed for {url}: {status}");
                    if self.urls.is_empty() {
                        self.status = status;
                    }
                }
            }
        }
    }

    /// Try the well-known locations in order, stopping as soon as any
    /// sitemap has produced URLs.
    pub async fn try_well_known(&mut self, base: &Url) {
        for url in well_known_urls(base) {
            self.fetch_sitemap(&url).await;
            if !self.urls.is_empty() {
                break;
            }
        }
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .timeout(SITEMAP_FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|err| format!("Error fetching sitemap: {err}"))?;

        let code = response.status().as_u16();
        if code != 200 {
            return Err(format!("Sitemap not found (HTTP {code})"));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let gzipped = content_type.contains("gzip") || url.ends_with(".gz");

        let bytes = response
            .bytes()
            .await
            .map_err(|err| format!("Error fetching sitemap: {err}"))?;

        if gzipped {
            Ok(maybe_gunzip(&bytes))
        } else {
            Ok(bytes.to_vec())
        }
    }
}

/// The well-known sitemap URLs for a site, in probe order.
pub(crate) fn well_known_urls(base: &Url) -> Vec<String> {
    let Some(host) = base.host_str() else {
        return Vec::new();
    };
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    WELL_KNOWN_PATHS
        .iter()
        .map(|path| format!("{}://{}{}", base.scheme(), authority, path))
        .collect()
}

/// Gunzip `bytes`, falling back to the raw input when decoding fails
/// (some servers mislabel plain XML as gzip).
pub(crate) fn maybe_gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut decoder = GzDecoder::new(bytes);
    let mut decoded = Vec::new();
    match decoder.read_to_end(&mut decoded) {
        Ok(_) => decoded,
        Err(err) => {
            warn!("gzip decode failed, using raw sitemap bytes: {err}");
            bytes.to_vec()
        }
    }
}

/// Parse sitemap XML into `(page_urls, nested_sitemap_urls)`, both filtered
/// to the crawl domain. Element names are matched on their local part, so
/// namespace prefixes and `xmlns` declarations are irrelevant. Parse errors
/// terminate the scan but keep whatever was already collected.
pub(crate) fn parse_sitemap_xml(xml: &[u8], domain: &str) -> (Vec<String>, Vec<String>) {
    let mut urls = Vec::new();
    let mut nested = Vec::new();

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(
                    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase(),
                );
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                if stack.last().map(String::as_str) == Some("loc") {
                    let loc = e
                        .unescape()
                        .map(|text| text.trim().to_string())
                        .unwrap_or_default();
                    if loc.is_empty() || !urls::is_same_domain(domain, &loc) {
                        buf.clear();
                        continue;
                    }
                    let parent = stack
                        .len()
                        .checked_sub(2)
                        .and_then(|i| stack.get(i))
                        .map(String::as_str);
                    match parent {
                        Some("sitemap") => nested.push(loc),
                        Some("url") => urls.push(loc),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!("sitemap XML parse error: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    (urls, nested)
}
