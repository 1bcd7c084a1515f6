use crate::UrlError;
use std::fmt;
use url::Url;

/// The scheme, host and port that identify a policy and rate-limit domain
///
/// Default ports are omitted, so `http://a.test/x` and `http://a.test:80/y`
/// share the origin `http://a.test`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(String);

impl Origin {
    /// Derives the origin of a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use scrape_batch::url::Origin;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://Example.com:443/path?q=1").unwrap();
    /// assert_eq!(Origin::of(&url).unwrap().as_str(), "https://example.com");
    /// ```
    pub fn of(url: &Url) -> Result<Self, UrlError> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(UrlError::OpaqueOrigin(url.to_string()));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    /// The well-known robots.txt location for this origin
    pub fn robots_url(&self) -> Result<Url, UrlError> {
        Url::parse(&format!("{}/robots.txt", self.0)).map_err(|e| UrlError::Parse(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
