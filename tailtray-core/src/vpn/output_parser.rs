//! Pattern-based URL extraction from VPN tool output
//!
//! The tool's messages are not a stable interface, so the patterns live
//! behind [`UrlMatcher`] and can be swapped without touching the controller.

use regex::Regex;

/// How much a matched URL should be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Open as soon as it is seen
    Primary,
    /// Open only when no primary URL shows up
    Fallback,
}

/// A URL found on an output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub url: String,
    pub kind: MatchKind,
}

/// Recognizes URLs in single output lines
pub trait UrlMatcher: Send + Sync {
    fn match_line(&self, line: &str) -> Option<UrlMatch>;
}

/// Matches the login link printed by `tailscale up`
#[derive(Debug, Clone)]
pub struct LoginUrlMatcher {
    prefix: String,
}

impl LoginUrlMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl UrlMatcher for LoginUrlMatcher {
    fn match_line(&self, line: &str) -> Option<UrlMatch> {
        let trimmed = line.trim();
        if !trimmed.starts_with(&self.prefix) {
            return None;
        }
        let url = trimmed.split_whitespace().next()?;
        Some(UrlMatch {
            url: url.to_string(),
            kind: MatchKind::Primary,
        })
    }
}

/// Matches the address announced by `tailscale web`
pub struct WebUrlMatcher {
    /// Pattern for "starting tailscaled web client at https://..."
    client_pattern: Regex,
    /// Pattern for "web server running on http://..."
    server_pattern: Regex,
    /// Pattern for any http(s) token
    url_pattern: Regex,
}

impl WebUrlMatcher {
    /// Create a new WebUrlMatcher with compiled regex patterns
    pub fn new() -> Self {
        Self {
            client_pattern: Regex::new(r"(?i)starting tailscaled web client")
                .expect("Failed to compile client pattern"),
            server_pattern: Regex::new(r"(?i)web server running on")
                .expect("Failed to compile server pattern"),
            url_pattern: Regex::new(r"https?://\S+").expect("Failed to compile url pattern"),
        }
    }

    /// First URL after the marker, else the last token of the line
    fn url_after(&self, line: &str, marker_end: usize) -> Option<String> {
        let url = self
            .url_pattern
            .find(&line[marker_end..])
            .map(|m| m.as_str())
            .or_else(|| line.split_whitespace().last())?;

        let url = url.trim_end_matches([',', ';', '"', '\'', ')']);
        (!url.is_empty()).then(|| url.to_string())
    }
}

impl Default for WebUrlMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlMatcher for WebUrlMatcher {
    fn match_line(&self, line: &str) -> Option<UrlMatch> {
        if let Some(marker) = self.client_pattern.find(line) {
            return self.url_after(line, marker.end()).map(|url| UrlMatch {
                url,
                kind: MatchKind::Primary,
            });
        }

        if let Some(marker) = self.server_pattern.find(line) {
            return self.url_after(line, marker.end()).map(|url| UrlMatch {
                url,
                kind: MatchKind::Fallback,
            });
        }

        None
    }
}

/// Applies primary-over-fallback precedence to a stream of lines
pub struct WebUrlScanner<'a> {
    matcher: &'a dyn UrlMatcher,
    primary_found: bool,
    fallback: Option<String>,
}

impl<'a> WebUrlScanner<'a> {
    pub fn new(matcher: &'a dyn UrlMatcher) -> Self {
        Self {
            matcher,
            primary_found: false,
            fallback: None,
        }
    }

    /// Feed one line; returns the primary URL the first time one appears
    pub fn feed(&mut self, line: &str) -> Option<String> {
        if self.primary_found {
            return None;
        }

        let found = self.matcher.match_line(line)?;
        match found.kind {
            MatchKind::Primary => {
                self.primary_found = true;
                Some(found.url)
            }
            MatchKind::Fallback => {
                self.fallback = Some(found.url);
                None
            }
        }
    }

    /// The fallback URL, if no primary URL was ever returned
    pub fn finish(self) -> Option<String> {
        if self.primary_found {
            None
        } else {
            self.fallback
        }
    }

    /// Scan captured lines: the first primary URL, else the last fallback
    pub fn scan<S: AsRef<str>>(matcher: &'a dyn UrlMatcher, lines: &[S]) -> Option<String> {
        let mut scanner = Self::new(matcher);
        for line in lines {
            if let Some(url) = scanner.feed(line.as_ref()) {
                return Some(url);
            }
        }
        scanner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_prefix_must_lead_the_line() {
        let matcher = LoginUrlMatcher::new("https://login.tailscale.com");
        assert!(matcher
            .match_line("see https://login.tailscale.com/a/123")
            .is_none());
        assert_eq!(
            matcher.match_line("\thttps://login.tailscale.com/a/123  ").map(|m| m.url),
            Some("https://login.tailscale.com/a/123".to_string())
        );
    }

    #[test]
    fn test_last_token_when_no_url_follows_marker() {
        let matcher = WebUrlMatcher::new();
        let found = matcher.match_line("web server running on 100.64.0.1:5252").unwrap();
        assert_eq!(found.url, "100.64.0.1:5252");
        assert_eq!(found.kind, MatchKind::Fallback);
    }

    #[test]
    fn test_scanner_feed_returns_primary_once() {
        let matcher = WebUrlMatcher::new();
        let mut scanner = WebUrlScanner::new(&matcher);

        assert_eq!(scanner.feed("web server running on http://localhost:5252"), None);
        assert_eq!(
            scanner.feed("starting tailscaled web client at https://100.1.2.3:1234"),
            Some("https://100.1.2.3:1234".to_string())
        );
        assert_eq!(
            scanner.feed("starting tailscaled web client at https://100.9.9.9:1"),
            None
        );
        assert_eq!(scanner.finish(), None);
    }
}
