//! Per-page extraction pipeline
//!
//! Locates product elements, resolves each configured field locator
//! independently, normalizes values, validates the result, and discovers
//! the pagination link. One misbehaving element never fails the page;
//! one missing field never fails its record.

use crate::config::{Locator, Selectors};
use crate::extract::normalize::{normalize_price, normalize_text, resolve_url};
use crate::extract::ExtractedRecord;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Everything harvested from one page
#[derive(Debug, Clone)]
pub struct PageHarvest {
    /// Validated records in DOM encounter order
    pub records: Vec<ExtractedRecord>,

    /// Resolved pagination target, when one was configured and found
    pub next_page: Option<Url>,

    /// Elements that matched the product locator but yielded neither
    /// title nor price
    pub rejected: u64,
}

/// Runs the extraction pipeline over one fetched document
///
/// # Arguments
///
/// * `html` - The page content
/// * `page_url` - The page's own URL, base for relative resolution
/// * `selectors` - The configured field locators
///
/// # Returns
///
/// * `Ok(PageHarvest)` - Records, rejection count, and pagination link
/// * `Err(String)` - The product locator itself could not be parsed
pub fn extract_page(
    html: &str,
    page_url: &Url,
    selectors: &Selectors,
) -> Result<PageHarvest, String> {
    let document = Html::parse_document(html);

    let product_selector = Selector::parse(&selectors.product)
        .map_err(|e| format!("invalid product selector '{}': {:?}", selectors.product, e))?;

    let mut records = Vec::new();
    let mut rejected = 0u64;

    for element in document.select(&product_selector) {
        match extract_record(&element, page_url, selectors) {
            Ok(record) => {
                if record.is_valid() {
                    records.push(record);
                } else {
                    rejected += 1;
                    tracing::debug!(url = %page_url, "dropping element with neither title nor price");
                }
            }
            Err(e) => {
                // One bad element never aborts the page
                tracing::warn!(url = %page_url, error = %e, "element extraction failed, skipping");
            }
        }
    }

    let next_page = selectors
        .next_page
        .as_ref()
        .and_then(|locator| resolve_next_page(&document, locator, page_url));

    Ok(PageHarvest {
        records,
        next_page,
        rejected,
    })
}

/// Resolves every configured field for one product element
///
/// A missing sub-element yields None for that field only.
fn extract_record(
    element: &ElementRef,
    page_url: &Url,
    selectors: &Selectors,
) -> Result<ExtractedRecord, String> {
    let title = match &selectors.title {
        Some(locator) => resolve_field(element, locator, None)?
            .as_deref()
            .and_then(normalize_text),
        None => None,
    };

    let price = match &selectors.price {
        Some(locator) => resolve_field(element, locator, None)?
            .as_deref()
            .and_then(normalize_price),
        None => None,
    };

    let image_url = match &selectors.image {
        Some(locator) => {
            resolve_field(element, locator, Some("src"))?.map(|raw| resolve_url(&raw, page_url))
        }
        None => None,
    };

    let mut custom_fields = BTreeMap::new();
    for (name, locator) in &selectors.custom {
        let value = resolve_field(element, locator, None)?
            .as_deref()
            .and_then(normalize_text);
        custom_fields.insert(name.clone(), value);
    }

    Ok(ExtractedRecord {
        title,
        price,
        image_url,
        custom_fields,
        scraped_at: Utc::now(),
        source_url: page_url.to_string(),
    })
}

/// Resolves one locator inside a product element
///
/// Returns the raw attribute value or joined text content of the first
/// matching descendant, or None when nothing matches.
fn resolve_field(
    element: &ElementRef,
    locator: &Locator,
    default_attr: Option<&str>,
) -> Result<Option<String>, String> {
    let selector = Selector::parse(locator.selector())
        .map_err(|e| format!("invalid selector '{}': {:?}", locator.selector(), e))?;

    let Some(target) = element.select(&selector).next() else {
        return Ok(None);
    };

    let raw = match locator.attr().or(default_attr) {
        Some(attr) => target.value().attr(attr).map(str::to_string),
        None => Some(target.text().collect::<String>()),
    };

    Ok(raw)
}

/// Locates and resolves the pagination link for the whole document
fn resolve_next_page(document: &Html, locator: &Locator, page_url: &Url) -> Option<Url> {
    let selector = match Selector::parse(locator.selector()) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!(error = ?e, "invalid next-page selector");
            return None;
        }
    };

    let target = document.select(&selector).next()?;
    let raw = match locator.attr() {
        Some(attr) => target.value().attr(attr).map(str::to_string),
        None => target.value().attr("href").map(str::to_string),
    }?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match page_url.join(trimmed) {
        Ok(next) => Some(next),
        Err(e) => {
            tracing::debug!(raw = trimmed, error = %e, "discovered next-page URL does not resolve");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locator;

    fn page_url() -> Url {
        Url::parse("https://x/list").unwrap()
    }

    fn listing_selectors() -> Selectors {
        Selectors {
            product: "li.product".to_string(),
            title: Some(Locator::Css("h2".to_string())),
            price: Some(Locator::Css(".price".to_string())),
            image: Some(Locator::Css("img".to_string())),
            custom: BTreeMap::new(),
            next_page: Some(Locator::Css("a.next".to_string())),
        }
    }

    const LISTING: &str = r#"
        <html><body><ul>
            <li class="product">
                <h2>Oak Table</h2>
                <span class="price">$1,234.56</span>
                <img src="/img/1.png" />
            </li>
            <li class="product">
                <span class="blurb">no title, no price</span>
            </li>
            <li class="product">
                <h2>  Walnut   Chair </h2>
                <span class="price">N/A</span>
            </li>
        </ul>
        <a class="next" href="/list?page=2">Next</a>
        </body></html>
    "#;

    #[test]
    fn test_invalid_element_dropped_others_kept() {
        let harvest = extract_page(LISTING, &page_url(), &listing_selectors()).unwrap();

        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.rejected, 1);

        let first = &harvest.records[0];
        assert_eq!(first.title.as_deref(), Some("Oak Table"));
        assert_eq!(first.price, Some(1234.56));
        assert_eq!(first.image_url.as_deref(), Some("https://x/img/1.png"));
        assert_eq!(first.source_url, "https://x/list");

        // Unparsable price is null, but the title keeps the record valid
        let second = &harvest.records[1];
        assert_eq!(second.title.as_deref(), Some("Walnut Chair"));
        assert_eq!(second.price, None);
        assert_eq!(second.image_url, None);
    }

    #[test]
    fn test_dom_encounter_order() {
        let harvest = extract_page(LISTING, &page_url(), &listing_selectors()).unwrap();
        let titles: Vec<_> = harvest
            .records
            .iter()
            .map(|r| r.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, vec!["Oak Table", "Walnut Chair"]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let selectors = listing_selectors();
        let first = extract_page(LISTING, &page_url(), &selectors).unwrap();
        let second = extract_page(LISTING, &page_url(), &selectors).unwrap();

        assert_eq!(first.records.len(), second.records.len());
        for (a, b) in first.records.iter().zip(second.records.iter()) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.price, b.price);
            assert_eq!(a.image_url, b.image_url);
            assert_eq!(a.custom_fields, b.custom_fields);
        }
    }

    #[test]
    fn test_next_page_resolved_against_page_url() {
        let harvest = extract_page(LISTING, &page_url(), &listing_selectors()).unwrap();
        assert_eq!(
            harvest.next_page.unwrap().as_str(),
            "https://x/list?page=2"
        );
    }

    #[test]
    fn test_no_next_page_locator_is_single_page() {
        let mut selectors = listing_selectors();
        selectors.next_page = None;
        let harvest = extract_page(LISTING, &page_url(), &selectors).unwrap();
        assert!(harvest.next_page.is_none());
    }

    #[test]
    fn test_missing_next_page_element() {
        let html = r#"<html><body><li class="product"><h2>One</h2></li></body></html>"#;
        let harvest = extract_page(html, &page_url(), &listing_selectors()).unwrap();
        assert!(harvest.next_page.is_none());
        assert_eq!(harvest.records.len(), 1);
    }

    #[test]
    fn test_empty_next_page_href_dropped() {
        let html = r#"<html><body>
            <li class="product"><h2>One</h2></li>
            <a class="next" href="   ">Next</a>
        </body></html>"#;
        let harvest = extract_page(html, &page_url(), &listing_selectors()).unwrap();
        assert!(harvest.next_page.is_none());
    }

    #[test]
    fn test_custom_fields_with_attr_descriptor() {
        let mut selectors = listing_selectors();
        selectors.custom.insert(
            "seller".to_string(),
            Locator::Css(".seller".to_string()),
        );
        selectors.custom.insert(
            "sku".to_string(),
            Locator::Detailed {
                selector: ".sku".to_string(),
                attr: Some("data-sku".to_string()),
            },
        );

        let html = r#"<html><body>
            <li class="product">
                <h2>Oak Table</h2>
                <span class="seller">  North   Antiques </span>
                <span class="sku" data-sku="SKU-99">ignored text</span>
            </li>
        </body></html>"#;

        let harvest = extract_page(html, &page_url(), &selectors).unwrap();
        let record = &harvest.records[0];
        assert_eq!(
            record.custom_fields.get("seller").unwrap().as_deref(),
            Some("North Antiques")
        );
        assert_eq!(
            record.custom_fields.get("sku").unwrap().as_deref(),
            Some("SKU-99")
        );
    }

    #[test]
    fn test_missing_custom_field_is_null() {
        let mut selectors = listing_selectors();
        selectors
            .custom
            .insert("seller".to_string(), Locator::Css(".seller".to_string()));

        let html = r#"<html><body><li class="product"><h2>One</h2></li></body></html>"#;
        let harvest = extract_page(html, &page_url(), &selectors).unwrap();
        assert_eq!(harvest.records[0].custom_fields.get("seller"), Some(&None));
    }

    #[test]
    fn test_no_products_is_empty_not_error() {
        let html = r#"<html><body><p>nothing for sale</p></body></html>"#;
        let harvest = extract_page(html, &page_url(), &listing_selectors()).unwrap();
        assert!(harvest.records.is_empty());
        assert_eq!(harvest.rejected, 0);
    }

    #[test]
    fn test_invalid_product_selector_is_page_error() {
        let mut selectors = listing_selectors();
        selectors.product = "li..[".to_string();
        assert!(extract_page(LISTING, &page_url(), &selectors).is_err());
    }
}
