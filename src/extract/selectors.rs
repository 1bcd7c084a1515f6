use crate::config::SiteParserConfig;
use crate::extract::{
    decode, find_emails, find_phones, parse_selector, select_text,
    CompanyRecord, ExtractResult, PageParser,
};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Site-specific extractor driven by CSS selectors
///
/// Name and description come from the configured selectors; social links
/// are the `href`s of anchors pointing at linkedin or facebook. Emails and
/// phones use the same regex scan as the generic parser.
pub struct SelectorParser {
    label: String,
    name: Option<Selector>,
    description: Option<Selector>,
    social: Vec<Selector>,
}

impl SelectorParser {
    /// Builds a parser from raw selector strings
    pub fn new(
        label: impl Into<String>,
        name_selector: Option<&str>,
        description_selector: Option<&str>,
    ) -> ExtractResult<Self> {
        Ok(Self {
            label: label.into(),
            name: name_selector.map(parse_selector).transpose()?,
            description: description_selector.map(parse_selector).transpose()?,
            social: vec![
                parse_selector(r#"a[href*="linkedin.com"]"#)?,
                parse_selector(r#"a[href*="facebook.com"]"#)?,
            ],
        })
    }

    pub fn from_config(site: &SiteParserConfig) -> ExtractResult<Self> {
        Self::new(
            format!("selectors:{}", site.host),
            site.name_selector.as_deref(),
            site.description_selector.as_deref(),
        )
    }
}

impl PageParser for SelectorParser {
    fn name(&self) -> &str {
        &self.label
    }

    fn parse(&self, raw: &[u8], source_url: &Url) -> ExtractResult<CompanyRecord> {
        let html = decode(raw)?;
        let document = Html::parse_document(&html);

        let mut record = CompanyRecord::for_source(source_url);
        record.company_name = self
            .name
            .as_ref()
            .and_then(|selector| select_text(&document, selector));
        record.description = self
            .description
            .as_ref()
            .and_then(|selector| select_text(&document, selector));
        record.email = find_emails(&html);
        record.phone = find_phones(&html);

        let mut seen = BTreeSet::new();
        record.social_links = self
            .social
            .iter()
            .flat_map(|selector| document.select(selector))
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty() && seen.insert(href.clone()))
            .collect();

        Ok(record)
    }
}
