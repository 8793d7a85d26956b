//! Link canonicalization.
//!
//! Two links that point at the same posting must canonicalize to the same
//! string: search-engine redirect wrappers are unwrapped, tracking parameters
//! and fragments are dropped, and the remaining query keeps first-seen order.

use std::collections::HashSet;
use url::Url;

/// Query parameters that never identify a posting (compared case-insensitively).
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "ref",
    "refsrc",
];

/// Base used to resolve protocol-relative or path-only redirect wrappers.
const REDIRECT_BASE: &str = "https://www.google.com";

/// Redirect wrappers nest at most this deep before we stop unwrapping.
const MAX_UNWRAP_DEPTH: usize = 8;

/// Canonicalize a posting link.
///
/// Empty input yields an empty string. Input that does not parse as an
/// absolute URL is returned without its fragment.
pub fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let mut target = raw.to_string();
    for _ in 0..MAX_UNWRAP_DEPTH {
        match unwrap_redirect(&target) {
            Some(inner) => target = inner,
            None => break,
        }
    }

    let mut parsed = match Url::parse(&target) {
        Ok(parsed) => parsed,
        Err(_) => return strip_fragment(&target).to_string(),
    };

    let mut seen = HashSet::new();
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, value)| !value.is_empty() && !is_tracking_param(key))
        .filter(|(key, _)| seen.insert(key.to_string()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed.set_fragment(None);
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    parsed.to_string()
}

/// Join `href` against a portal base URL and canonicalize the result.
///
/// Returns an empty string when either side cannot be parsed.
pub fn resolve(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|joined| canonicalize(joined.as_str()))
        .unwrap_or_default()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS
        .iter()
        .any(|tracked| tracked.eq_ignore_ascii_case(key))
}

fn strip_fragment(raw: &str) -> &str {
    raw.split('#').next().unwrap_or(raw)
}

/// Extract the destination of a `/url?q=<target>` style wrapper.
fn unwrap_redirect(raw: &str) -> Option<String> {
    if !raw.contains("/url?") {
        return None;
    }

    let wrapper = Url::parse(raw)
        .or_else(|_| Url::parse(REDIRECT_BASE).and_then(|base| base.join(raw)))
        .ok()?;

    if wrapper.path() != "/url" {
        return None;
    }

    wrapper
        .query_pairs()
        .find(|(key, value)| {
            (key == "q" || key == "url")
                && (value.starts_with("http://") || value.starts_with("https://"))
        })
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tracking_params() {
        assert_eq!(
            canonicalize("https://x.cl/a?utm_source=fb&id=9"),
            "https://x.cl/a?id=9"
        );
        assert_eq!(
            canonicalize("https://x.cl/a?UTM_Campaign=x&gclid=1&fbclid=2&ref=home&refsrc=z"),
            "https://x.cl/a"
        );
    }

    #[test]
    fn test_unwraps_search_redirect() {
        assert_eq!(
            canonicalize("https://www.google.com/url?q=https://jobs.example.cl/post/1&sa=U"),
            "https://jobs.example.cl/post/1"
        );
        assert_eq!(
            canonicalize("/url?q=https%3A%2F%2Fwww.laborum.cl%2Fempleos%2F42%3Futm_medium%3Dx&sa=U"),
            "https://www.laborum.cl/empleos/42"
        );
    }

    #[test]
    fn test_keeps_first_seen_order_and_first_value() {
        assert_eq!(
            canonicalize("https://x.cl/a?b=2&a=1&b=3&empty=#frag"),
            "https://x.cl/a?b=2&a=1"
        );
    }

    #[test]
    fn test_drops_fragment() {
        assert_eq!(canonicalize("https://x.cl/a#apply"), "https://x.cl/a");
        assert_eq!(canonicalize("not a url#x"), "not a url");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "https://x.cl/a?utm_source=fb&id=9",
            "https://www.google.com/url?q=https://jobs.example.cl/post/1?x=a+b&sa=U",
            "https://cl.indeed.com/viewjob?jk=abc&from=serp#top",
            "https://www.getonbrd.com/jobs/programming/dev?q=caf%C3%A9",
            "http://example.com",
            "relative/path#frag",
        ];
        for sample in samples {
            let once = canonicalize(sample);
            assert_eq!(canonicalize(&once), once, "not idempotent for {}", sample);
        }
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("https://www.chiletrabajos.cl", "/trabajo/planner-123?utm_term=a"),
            "https://www.chiletrabajos.cl/trabajo/planner-123"
        );
        assert_eq!(
            resolve("https://www.chiletrabajos.cl", "https://other.cl/x"),
            "https://other.cl/x"
        );
        assert_eq!(resolve("https://www.chiletrabajos.cl", ""), "");
        assert_eq!(resolve("not a base", "/x"), "");
    }
}
