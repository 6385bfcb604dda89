// Pure navigation logic - no Tauri imports allowed.
// Decides which top-level navigations and popups the content may perform.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;

// A grant covers the load the shell is about to start, not a later visit.
const GRANT_TTL: Duration = Duration::from_secs(30);
const MAX_GRANTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Destination is under the allowed origin.
    Allowed,
    /// Destination was loaded on purpose by the shell.
    Granted,
    Blocked,
}

impl Verdict {
    pub fn proceeds(self) -> bool {
        !matches!(self, Verdict::Blocked)
    }
}

#[derive(Clone, Copy)]
struct Grant {
    issued: Instant,
    // Issue order; `Instant`s can tie.
    seq: u64,
}

// One-shot passes for loads the shell itself starts through the bridge,
// keyed by exact URL.
#[derive(Default)]
struct Grants {
    by_url: HashMap<String, Grant>,
    next_seq: u64,
}

/// Single-entry allowlist over top-level navigations.
///
/// The check is a plain string prefix match against the home URL: no
/// subdomain or path wildcards.
pub struct NavigationPolicy {
    allowed_origin: String,
    grants: Mutex<Grants>,
    grant_ttl: Duration,
}

impl NavigationPolicy {
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self::with_grant_ttl(allowed_origin, GRANT_TTL)
    }

    pub fn with_grant_ttl(allowed_origin: impl Into<String>, grant_ttl: Duration) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
            grants: Mutex::new(Grants::default()),
            grant_ttl,
        }
    }

    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        url.starts_with(&self.allowed_origin)
    }

    fn grants(&self) -> MutexGuard<'_, Grants> {
        match self.grants.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Let the next navigation to exactly `url` through, regardless of origin.
    /// Unused grants lapse after a short while.
    pub fn grant_once(&self, url: &Url) {
        if self.is_allowed(url.as_str()) {
            return;
        }
        let now = Instant::now();
        let ttl = self.grant_ttl;
        let mut grants = self.grants();
        grants.by_url.retain(|_, g| now.duration_since(g.issued) < ttl);
        if grants.by_url.len() >= MAX_GRANTS {
            let oldest = grants.by_url.iter().min_by_key(|(_, g)| g.seq).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                grants.by_url.remove(&oldest);
            }
        }
        let seq = grants.next_seq;
        grants.next_seq += 1;
        grants.by_url.insert(url.as_str().to_string(), Grant { issued: now, seq });
    }

    /// Withdraw a grant whose load never started.
    pub fn revoke(&self, url: &Url) {
        self.grants().by_url.remove(url.as_str());
    }

    pub fn pending_grants(&self) -> usize {
        self.grants().by_url.len()
    }

    /// Evaluate a navigation attempt. Consumes a matching grant.
    pub fn check(&self, url: &Url) -> Verdict {
        if self.is_allowed(url.as_str()) {
            return Verdict::Allowed;
        }

        let granted = match self.grants().by_url.remove(url.as_str()) {
            Some(grant) => grant.issued.elapsed() < self.grant_ttl,
            None => false,
        };

        if granted {
            log::info!("[Navigation] Explicit load: {}", url);
            Verdict::Granted
        } else {
            log::warn!("[Navigation] Blocked: {}", url);
            Verdict::Blocked
        }
    }

    /// Secondary windows are never opened, whatever the target.
    pub fn allow_popup(&self, url: &Url) -> bool {
        log::info!("[Navigation] Denied popup: {}", url);
        false
    }
}

/// Classify a subresource by the extension of its path, for the filter engine.
pub fn guess_request_type(url: &str) -> &'static str {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        // Relative or malformed: drop query and fragment by hand.
        Err(_) => url.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase(),
    };

    let file = path.rsplit('/').next().unwrap_or("");
    let extension = match file.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    };

    match extension {
        "js" | "mjs" | "cjs" => "script",
        "css" => "stylesheet",
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" | "bmp" => "image",
        "woff" | "woff2" | "ttf" | "otf" | "eot" => "font",
        "mp4" | "webm" | "m3u8" | "mp3" | "ogg" | "wav" => "media",
        "json" => "xmlhttprequest",
        _ if path.contains("/api/") || path.contains("/ajax/") => "xmlhttprequest",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HOME: &str = "https://www.example.org/";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[rstest]
    #[case("https://www.example.org/")]
    #[case("https://www.example.org/watch/123")]
    #[case("https://www.example.org/search?q=rust#top")]
    fn test_navigation_under_home_proceeds(#[case] target: &str) {
        let policy = NavigationPolicy::new(HOME);
        assert_eq!(policy.check(&url(target)), Verdict::Allowed);
    }

    #[rstest]
    #[case("https://evil.example/")]
    #[case("http://www.example.org/")] // scheme differs
    #[case("https://example.org/")] // no subdomain wildcarding
    #[case("https://cdn.www.example.org/")]
    #[case("https://www.example.org.evil.com/")]
    #[case("about:blank")]
    fn test_navigation_elsewhere_is_blocked(#[case] target: &str) {
        let policy = NavigationPolicy::new(HOME);
        let verdict = policy.check(&url(target));
        assert_eq!(verdict, Verdict::Blocked);
        assert!(!verdict.proceeds());
    }

    #[test]
    fn test_grant_is_one_shot() {
        let policy = NavigationPolicy::new(HOME);
        let target = url("https://other.example/page");

        policy.grant_once(&target);
        assert_eq!(policy.check(&target), Verdict::Granted);
        // A second, content-triggered attempt is gated again.
        assert_eq!(policy.check(&target), Verdict::Blocked);
    }

    #[test]
    fn test_grant_only_matches_exact_url() {
        let policy = NavigationPolicy::new(HOME);
        policy.grant_once(&url("https://other.example/a"));
        assert_eq!(policy.check(&url("https://other.example/b")), Verdict::Blocked);
        assert_eq!(policy.check(&url("https://other.example/a")), Verdict::Granted);
    }

    #[rstest]
    #[case("https://www.example.org/popup")]
    #[case("https://ads.example/")]
    #[case("about:blank")]
    fn test_popups_always_denied(#[case] target: &str) {
        let policy = NavigationPolicy::new(HOME);
        assert!(!policy.allow_popup(&url(target)));
    }

    #[test]
    fn test_revoked_grant_does_not_bypass_gating() {
        let policy = NavigationPolicy::new(HOME);
        let target = url("https://other.example/never-loaded");

        policy.grant_once(&target);
        policy.revoke(&target);
        assert_eq!(policy.pending_grants(), 0);
        assert_eq!(policy.check(&target), Verdict::Blocked);
    }

    #[test]
    fn test_stale_grant_is_blocked() {
        let policy = NavigationPolicy::with_grant_ttl(HOME, Duration::ZERO);
        let target = url("https://other.example/redirected-away");

        policy.grant_once(&target);
        assert_eq!(policy.check(&target), Verdict::Blocked);
    }

    #[test]
    fn test_grants_are_bounded() {
        let policy = NavigationPolicy::new(HOME);
        for i in 0..(MAX_GRANTS * 3) {
            policy.grant_once(&url(&format!("https://other.example/{}", i)));
        }
        assert_eq!(policy.pending_grants(), MAX_GRANTS);
        // The newest survives, the oldest was evicted.
        let newest = url(&format!("https://other.example/{}", MAX_GRANTS * 3 - 1));
        assert_eq!(policy.check(&newest), Verdict::Granted);
        assert_eq!(policy.check(&url("https://other.example/0")), Verdict::Blocked);
    }

    #[test]
    fn test_grant_under_home_is_not_stored() {
        let policy = NavigationPolicy::new(HOME);
        policy.grant_once(&url("https://www.example.org/page"));
        assert_eq!(policy.pending_grants(), 0);
    }

    // --- guess_request_type tests ---

    #[rstest]
    #[case("https://example.com/script.js", "script")]
    #[case("https://example.com/bundle.mjs?v=3", "script")]
    #[case("https://example.com/style.css", "stylesheet")]
    #[case("https://example.com/image.png", "image")]
    #[case("https://example.com/PHOTO.JPG", "image")]
    #[case("https://example.com/icon.ico", "image")]
    #[case("https://example.com/font.woff2", "font")]
    #[case("https://example.com/video.mp4", "media")]
    #[case("https://example.com/api/data", "xmlhttprequest")]
    #[case("https://example.com/feed.json", "xmlhttprequest")]
    #[case("https://example.com/index.jsp", "other")]
    #[case("https://example.com/page.html?next=app.js", "other")]
    #[case("https://example.js.example.com/page", "other")]
    #[case("https://example.com/page.html", "other")]
    #[case("/static/app.js#main", "script")]
    fn test_guess_request_type(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(guess_request_type(url), expected);
    }
}
