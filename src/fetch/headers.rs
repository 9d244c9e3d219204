//! Browser-like header sets for the fetch stage.
//!
//! Detail pages and media assets are served behind bot defenses that reject
//! obviously non-browser requests, so both request shapes mimic a desktop
//! Chrome session.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Headers for fetching an item's detail page as a top-level document.
pub fn document_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        reqwest::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );
    headers.insert(
        HeaderName::from_static("dnt"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers
}

/// Headers for fetching the resolved media asset: media-biased accept plus
/// the detail page as referer.
pub fn media_headers(referer_url: &str) -> HeaderMap {
    let mut headers = document_headers();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("video/webm,video/ogg,video/*;q=0.9,application/ogg;q=0.7"),
    );
    if let Ok(referer) = HeaderValue::from_str(referer_url) {
        headers.insert(reqwest::header::REFERER, referer);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_headers_carry_referer_and_video_accept() {
        let headers = media_headers("https://host.example/@user/video/1");
        assert_eq!(
            headers.get(reqwest::header::REFERER).unwrap(),
            "https://host.example/@user/video/1"
        );
        let accept = headers.get(reqwest::header::ACCEPT).unwrap();
        assert!(accept.to_str().unwrap().starts_with("video/"));
    }

    #[test]
    fn invalid_referer_is_dropped_not_fatal() {
        let headers = media_headers("https://host.example/\u{7f}");
        assert!(headers.get(reqwest::header::REFERER).is_none());
    }
}
