use regex::Regex;
use tracing::debug;

/// Compiled include/exclude URL patterns. A pattern containing `*` that does
/// not start with `^` is treated as a wildcard (`*` -> `.*`, `?` -> `.`,
/// anchored at both ends); anything else is used as a regex verbatim.
/// Patterns that fail to compile are dropped.
#[derive(Debug, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn compile(raw: &[String]) -> Self {
        let mut patterns = Vec::new();
        for pattern in raw {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            let source = if pattern.contains('*') && !pattern.starts_with('^') {
                format!("^{}$", pattern.replace('*', ".*").replace('?', "."))
            } else {
                pattern.to_string()
            };
            match Regex::new(&source) {
                Ok(regex) => patterns.push(regex),
                Err(err) => debug!("dropping invalid URL pattern {pattern:?}: {err}"),
            }
        }
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// OR over all patterns; an empty set matches nothing.
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> PatternSet {
        PatternSet::compile(&patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn wildcard_patterns_are_anchored() {
        let patterns = set(&["https://example.com/blog/*"]);
        assert!(patterns.matches("https://example.com/blog/post-1"));
        assert!(!patterns.matches("https://example.com/shop/blog/x"));
    }

    #[test]
    fn question_mark_matches_single_character() {
        let patterns = set(&["https://example.com/p?ge"]);
        assert!(patterns.matches("https://example.com/page"));
        assert!(!patterns.matches("https://example.com/paage"));
    }

    #[test]
    fn caret_prefixed_patterns_are_raw_regex() {
        let patterns = set(&["^https://example\\.com/(news|press)/"]);
        assert!(patterns.matches("https://example.com/news/2024"));
        assert!(patterns.matches("https://example.com/press/kit"));
        assert!(!patterns.matches("https://example.com/blog/x"));
    }

    #[test]
    fn plain_regex_uses_search_semantics() {
        let patterns = set(&["/private/"]);
        assert!(patterns.matches("https://example.com/private/x"));
    }

    #[test]
    fn invalid_and_blank_patterns_are_dropped() {
        let patterns = set(&["([unclosed", "  ", ""]);
        assert!(patterns.is_empty());
        assert!(!patterns.matches("https://example.com/anything"));
    }
}
