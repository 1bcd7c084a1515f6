use crate::extract::{
    decode, find_emails, find_phones, find_social_links, parse_selector, select_attr,
    select_text, CompanyRecord, ExtractResult, PageParser,
};
use scraper::{Html, Selector};
use url::Url;

/// Heuristic extractor for arbitrary HTML pages
///
/// - company name: `og:title`, else the first `<h1>`
/// - description: `<meta name="description">`
/// - address: the first `<address>` element
/// - emails, phones and social links: regex scan over the raw markup
pub struct GenericParser {
    og_title: Selector,
    h1: Selector,
    meta_description: Selector,
    address: Selector,
}

impl GenericParser {
    pub fn new() -> Self {
        Self::build().expect("built-in selectors are valid")
    }

    fn build() -> ExtractResult<Self> {
        Ok(Self {
            og_title: parse_selector(r#"meta[property="og:title"]"#)?,
            h1: parse_selector("h1")?,
            meta_description: parse_selector(r#"meta[name="description"]"#)?,
            address: parse_selector("address")?,
        })
    }
}

impl Default for GenericParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PageParser for GenericParser {
    fn name(&self) -> &str {
        "generic"
    }

    fn parse(&self, raw: &[u8], source_url: &Url) -> ExtractResult<CompanyRecord> {
        let html = decode(raw)?;
        let document = Html::parse_document(&html);

        let mut record = CompanyRecord::for_source(source_url);
        record.company_name = select_attr(&document, &self.og_title, "content")
            .or_else(|| select_text(&document, &self.h1));
        record.description = select_attr(&document, &self.meta_description, "content");
        record.address = select_text(&document, &self.address);
        record.email = find_emails(&html);
        record.phone = find_phones(&html);
        record.social_links = find_social_links(&html);

        Ok(record)
    }
}
