use crate::config::{ParserKind, SiteParserConfig};
use crate::extract::{ExtractError, ExtractResult, GenericParser, PageParser, SelectorParser};
use crate::url::{matches_host_pattern, normalize_host};
use std::sync::Arc;
use url::Url;

/// Chooses a parser for each page by hostname
///
/// Exact host patterns win over `*.suffix` patterns; among wildcards the
/// longest suffix wins. Hosts with no matching pattern get the default parser.
#[derive(Clone)]
pub struct ParserRegistry {
    default: Arc<dyn PageParser>,
    sites: Vec<(String, Arc<dyn PageParser>)>,
}

impl ParserRegistry {
    /// A registry that sends every host to `default`
    pub fn new(default: Arc<dyn PageParser>) -> Self {
        Self {
            default,
            sites: Vec::new(),
        }
    }

    /// Builds the registry described by `[[site-parser]]` entries
    ///
    /// The default parser is a [`GenericParser`].
    pub fn from_config(sites: &[SiteParserConfig]) -> ExtractResult<Self> {
        let mut registry = Self::new(Arc::new(GenericParser::new()));

        for site in sites {
            let parser: Arc<dyn PageParser> = match site.kind {
                ParserKind::Generic => Arc::new(GenericParser::new()),
                ParserKind::Selectors => Arc::new(SelectorParser::from_config(site)?),
            };
            registry.register(&site.host, parser)?;
        }

        Ok(registry)
    }

    /// Adds an override for a host pattern
    pub fn register(&mut self, pattern: &str, parser: Arc<dyn PageParser>) -> ExtractResult<()> {
        let pattern = normalize_host(pattern);
        let base = pattern.strip_prefix("*.").unwrap_or(&pattern);
        if base.is_empty() || base.contains('*') || base.contains('/') {
            return Err(ExtractError::InvalidPattern(pattern));
        }

        tracing::debug!("Registered parser {} for {}", parser.name(), pattern);
        self.sites.push((pattern, parser));
        Ok(())
    }

    /// The parser for `host`
    pub fn resolve(&self, host: &str) -> Arc<dyn PageParser> {
        let host = normalize_host(host);

        let exact = self
            .sites
            .iter()
            .find(|(pattern, _)| !pattern.starts_with("*.") && *pattern == host);

        let best = exact.or_else(|| {
            self.sites
                .iter()
                .filter(|(pattern, _)| pattern.starts_with("*.") && matches_host_pattern(pattern, &host))
                .max_by_key(|(pattern, _)| pattern.len())
        });

        best.map(|(_, parser)| parser.clone())
            .unwrap_or_else(|| self.default.clone())
    }

    /// The parser for a page URL; hostless URLs get the default
    pub fn resolve_url(&self, url: &Url) -> Arc<dyn PageParser> {
        match url.host_str() {
            Some(host) => self.resolve(host),
            None => self.default.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(Arc::new(GenericParser::new()))
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("default", &self.default.name())
            .field(
                "sites",
                &self.sites.iter().map(|(p, parser)| (p, parser.name())).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CompanyRecord;

    struct Named(&'static str);

    impl PageParser for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn parse(&self, _raw: &[u8], source_url: &Url) -> ExtractResult<CompanyRecord> {
            Ok(CompanyRecord::for_source(source_url))
        }
    }

    fn registry() -> ParserRegistry {
        let mut registry = ParserRegistry::new(Arc::new(Named("default")));
        registry.register("*.example.com", Arc::new(Named("wide"))).unwrap();
        registry.register("*.shop.example.com", Arc::new(Named("narrow"))).unwrap();
        registry.register("www.example.com", Arc::new(Named("exact"))).unwrap();
        registry
    }

    #[test]
    fn test_exact_beats_wildcard() {
        assert_eq!(registry().resolve("WWW.example.com").name(), "exact");
    }

    #[test]
    fn test_longest_wildcard_wins() {
        let registry = registry();
        assert_eq!(registry.resolve("eu.shop.example.com").name(), "narrow");
        assert_eq!(registry.resolve("blog.example.com").name(), "wide");
        assert_eq!(registry.resolve("example.com").name(), "wide");
    }

    #[test]
    fn test_unmatched_host_gets_default() {
        let registry = registry();
        assert_eq!(registry.resolve("other.test").name(), "default");
        assert_eq!(registry.resolve("notexample.com").name(), "default");
    }

    #[test]
    fn test_resolve_url() {
        let url = Url::parse("https://www.example.com/about").unwrap();
        assert_eq!(registry().resolve_url(&url).name(), "exact");
    }

    #[test]
    fn test_bad_patterns_rejected() {
        let mut registry = ParserRegistry::default();
        for pattern in ["", "*.", "a.*.com", "example.com/path"] {
            assert!(
                registry.register(pattern, Arc::new(Named("x"))).is_err(),
                "{:?} should be rejected",
                pattern
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_config() {
        let sites = vec![
            SiteParserConfig {
                host: "example.com".to_string(),
                kind: ParserKind::Selectors,
                name_selector: Some("h1.company-title".to_string()),
                description_selector: None,
            },
            SiteParserConfig {
                host: "*.plain.test".to_string(),
                kind: ParserKind::Generic,
                name_selector: None,
                description_selector: None,
            },
        ];

        let registry = ParserRegistry::from_config(&sites).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("example.com").name(), "selectors:example.com");
        assert_eq!(registry.resolve("a.plain.test").name(), "generic");
        assert_eq!(registry.resolve("else.test").name(), "generic");
    }
}
