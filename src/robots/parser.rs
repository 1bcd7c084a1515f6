//! Robots.txt rule evaluation
//!
//! Matching is delegated to the robotstxt crate (a port of Google's matcher).

use robotstxt::DefaultMatcher;

/// A robots.txt document that downloaded and decoded successfully
///
/// The document is kept verbatim and matched on demand; the matcher
/// tolerates arbitrary text, so any UTF-8 body is a valid ruleset.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
}

impl ParsedRobots {
    /// Creates a ruleset from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The full User-Agent header value or a bare product token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// `web-scraper-batch/1.0 (+https://example.com)` becomes `web-scraper-batch`.
pub fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    trimmed
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "TestBot/1.0 (+https://example.com/contact)";

    #[test]
    fn test_product_token() {
        assert_eq!(product_token(AGENT), "TestBot");
        assert_eq!(product_token("TestBot"), "TestBot");
        assert_eq!(product_token("  Spaced Bot"), "Spaced");
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("http://a.test/", AGENT));
        assert!(!robots.is_allowed("http://a.test/page", AGENT));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private");
        assert!(robots.is_allowed("http://a.test/", AGENT));
        assert!(robots.is_allowed("http://a.test/ok", AGENT));
        assert!(!robots.is_allowed("http://a.test/private", AGENT));
        assert!(!robots.is_allowed("http://a.test/private/deeper", AGENT));
    }

    #[test]
    fn test_parse_allow_overrides_longer_match() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nDisallow: /private\nAllow: /private/public",
        );
        assert!(!robots.is_allowed("http://a.test/private", AGENT));
        assert!(robots.is_allowed("http://a.test/private/public", AGENT));
    }

    #[test]
    fn test_group_selected_by_product_token() {
        let robots =
            ParsedRobots::from_content("User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(!robots.is_allowed("http://a.test/page", AGENT));
        assert!(robots.is_allowed("http://a.test/page", "OtherBot/2.0"));
    }

    #[test]
    fn test_garbage_content_allows() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed("http://a.test/any/path", AGENT));
    }

    #[test]
    fn test_empty_content_allows() {
        let robots = ParsedRobots::from_content("   \n");
        assert!(robots.is_allowed("http://a.test/any/path", AGENT));
    }
}
