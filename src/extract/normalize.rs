//! Pure clean-up functions for extracted fields

use crate::extract::{CompanyRecord, EMAIL_REGEX};
use std::collections::BTreeSet;

/// Trims and lowercases emails, dropping anything that does not look like one
///
/// Duplicates (after lowercasing) are removed; first occurrence order is kept.
pub fn normalize_emails(emails: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| EMAIL_REGEX.is_match(e))
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

/// Reduces phone numbers to digits and `+`, dropping empties
pub fn normalize_phones(phones: &[String]) -> Vec<String> {
    phones
        .iter()
        .map(|p| p.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect::<String>())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Trims text; blank becomes `None`
pub fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Trims and lowercases a website; blank becomes `None`
pub fn normalize_website(url: Option<&str>) -> Option<String> {
    normalize_text(url).map(|u| u.to_lowercase())
}

/// Applies every field normalizer to a record
pub fn normalize_record(record: CompanyRecord) -> CompanyRecord {
    CompanyRecord {
        company_name: normalize_text(record.company_name.as_deref()),
        description: normalize_text(record.description.as_deref()),
        email: normalize_emails(&record.email),
        phone: normalize_phones(&record.phone),
        social_links: record
            .social_links
            .iter()
            .filter_map(|link| normalize_text(Some(link.as_str())))
            .collect(),
        website: normalize_website(record.website.as_deref()),
        address: normalize_text(record.address.as_deref()),
        category: normalize_text(record.category.as_deref()),
        source_url: record.source_url,
    }
}
