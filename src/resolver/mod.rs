//! Asset resolution from fetched detail-page markup.
//!
//! The page/media delivery format is an undocumented third-party surface, so
//! resolution runs an ordered chain of pattern matchers rather than a fixed
//! schema. A structured-data fallback handles pages where the URL only
//! appears inside an embedded script object.

mod matchers;

pub use matchers::{default_matchers, PatternMatcher};

use regex::Regex;

use crate::models::ResolvedAsset;

/// Extracts a concrete media URL from a detail page's markup.
pub struct AssetResolver {
    matchers: Vec<Box<dyn PatternMatcher>>,
    script_object: Regex,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(default_matchers())
    }
}

impl AssetResolver {
    pub fn new(matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self {
            matchers,
            script_object: Regex::new(r#"videoData["']:\s*(\{[^}]+\})"#)
                .expect("invalid script-object pattern"),
        }
    }

    /// Resolve the markup to a media URL, or `None` if no embedding shape
    /// matched. Pure function of its inputs.
    pub fn resolve(&self, markup: &str, referer_url: &str) -> Option<ResolvedAsset> {
        for matcher in &self.matchers {
            if let Some(raw) = matcher.attempt(markup) {
                tracing::debug!(matcher = matcher.name(), "Matched asset URL");
                return Some(ResolvedAsset {
                    asset_url: unescape_url(&raw),
                    referer_url: referer_url.to_string(),
                });
            }
        }

        // Fallback: the URL may only exist inside an embedded script object.
        let object = self.script_object.captures(markup)?.get(1)?;
        let data: serde_json::Value = serde_json::from_str(object.as_str()).ok()?;
        let url = data
            .get("playAddr")
            .or_else(|| data.get("downloadAddr"))
            .and_then(|v| v.as_str())?;

        tracing::debug!("Matched asset URL in embedded script data");
        Some(ResolvedAsset {
            asset_url: unescape_url(url),
            referer_url: referer_url.to_string(),
        })
    }
}

/// Undo the encoding artifacts seen in script-embedded URLs.
fn unescape_url(raw: &str) -> String {
    raw.replace("\\u002F", "/").replace("&amp;", "&")
}
