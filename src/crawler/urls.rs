use url::Url;

/// Path suffixes that never yield crawlable HTML.
const SKIP_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".exe", ".dmg", ".mp3", ".mp4", ".avi",
    ".mov", ".css", ".js", ".ico", ".xml", ".txt", ".doc", ".docx", ".xls", ".xlsx", ".ppt",
    ".pptx",
];

/// Canonicalize a URL for deduplication: fragment dropped, host lowercased
/// by the parser, trailing slash stripped everywhere except the bare root.
/// Returns `None` for anything `Url` cannot parse.
pub fn normalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    parsed.set_fragment(None);
    let mut normalized = parsed.to_string();
    if normalized.ends_with('/') && parsed.path() != "/" {
        normalized.pop();
    }
    Some(normalized)
}

/// Host with a single leading `www.` stripped; subdomains are not merged.
pub fn registrable(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Whether `url`'s host matches `domain` after www-stripping both sides.
pub fn is_same_domain(domain: &str, url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| registrable(h) == registrable(domain)))
        .unwrap_or(false)
}

/// Symmetric same-domain test over two absolute URLs.
pub fn same_domain(a: &str, b: &str) -> bool {
    let host = |u: &str| {
        Url::parse(u)
            .ok()
            .and_then(|u| u.host_str().map(|h| registrable(h).to_string()))
    };
    match (host(a), host(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Extension-based test for resources that are never HTML pages.
pub fn is_non_html_resource(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => return false,
    };
    SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("https://Example.com/About/#team").as_deref(),
            Some("https://example.com/About")
        );
        assert_eq!(
            normalize("https://example.com/a/b/").as_deref(),
            Some("https://example.com/a/b")
        );
    }

    #[test]
    fn normalize_keeps_bare_root_slash() {
        assert_eq!(
            normalize("https://example.com").as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(
            normalize("https://example.com/").as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn normalize_preserves_query() {
        assert_eq!(
            normalize("https://example.com/search?q=rust#r").as_deref(),
            Some("https://example.com/search?q=rust")
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for url in [
            "https://example.com",
            "https://example.com/a/b/?x=1#frag",
            "http://www.example.com/page/",
        ] {
            let once = normalize(url).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(normalize("not a url"), None);
    }

    #[test]
    fn same_domain_ignores_www_and_is_symmetric() {
        let a = "https://www.example.com/page";
        let b = "https://example.com/other";
        assert!(same_domain(a, b));
        assert!(same_domain(b, a));
        assert!(!same_domain(a, "https://docs.example.com/"));
        assert!(!same_domain(a, "https://other.com/"));
    }

    #[test]
    fn is_same_domain_matches_host_against_domain() {
        assert!(is_same_domain("www.example.com", "https://example.com/x"));
        assert!(is_same_domain("example.com", "https://www.example.com/x"));
        assert!(!is_same_domain("example.com", "https://sub.example.com/x"));
    }

    #[test]
    fn non_html_resources_by_extension() {
        assert!(is_non_html_resource("https://example.com/logo.PNG"));
        assert!(is_non_html_resource("https://example.com/doc.pdf"));
        assert!(is_non_html_resource("https://example.com/feed.xml"));
        assert!(!is_non_html_resource("https://example.com/about"));
        assert!(!is_non_html_resource("https://example.com/page.html"));
    }
}
