//! Extraction rule table for locating a media URL inside detail-page markup.
//!
//! Each matcher recognizes one embedding shape. The table order is a priority
//! policy pinned by fixture tests, not an exhaustive collection: the first
//! match wins. New markup shapes are handled by appending a matcher.

use regex::Regex;

/// One way a media URL can be embedded in page markup.
pub trait PatternMatcher: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Try to capture a candidate asset URL from the markup.
    fn attempt(&self, markup: &str) -> Option<String>;
}

struct RegexMatcher {
    name: &'static str,
    pattern: Regex,
}

impl RegexMatcher {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            // Table patterns are fixed at compile time; a bad one is a bug.
            pattern: Regex::new(pattern).expect("invalid matcher pattern"),
        }
    }
}

impl PatternMatcher for RegexMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, markup: &str) -> Option<String> {
        self.pattern
            .captures(markup)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// The fixed priority table, most common embedding first.
pub fn default_matchers() -> Vec<Box<dyn PatternMatcher>> {
    vec![
        Box::new(RegexMatcher::new(
            "video-tag",
            r#"(?i)<video[^>]+src="([^"]+)""#,
        )),
        Box::new(RegexMatcher::new("play-addr", r#"(?i)"playAddr":"([^"]+)""#)),
        Box::new(RegexMatcher::new(
            "download-addr",
            r#"(?i)"downloadAddr":"([^"]+)""#,
        )),
        Box::new(RegexMatcher::new(
            "video-src-link",
            r#"(?i)<link[^>]+?rel="video_src"[^>]+?href="([^"]+)""#,
        )),
        Box::new(RegexMatcher::new(
            "og-video",
            r#"(?i)property="og:video"\s+content="([^"]+)""#,
        )),
    ]
}
