use crate::config::types::{Config, CrawlOptions, Locator, Selectors, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(&config.site)?;
    validate_crawl_options(&config.crawl)?;
    Ok(())
}

/// Validates the site description
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&site.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url '{}': {}", site.start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url must use the http or https scheme, got '{}'",
            url.scheme()
        )));
    }

    if let Some(wait) = &site.wait_condition {
        validate_selector("wait-condition", wait)?;
    }

    validate_selectors(&site.selectors)
}

/// Validates the field locators
///
/// Every selector is parsed here so malformed CSS fails at load time
/// rather than on every element of every page.
fn validate_selectors(selectors: &Selectors) -> Result<(), ConfigError> {
    if selectors.product.trim().is_empty() {
        return Err(ConfigError::Validation(
            "product selector cannot be empty".to_string(),
        ));
    }
    validate_selector("product", &selectors.product)?;

    if selectors.title.is_none() && selectors.price.is_none() {
        return Err(ConfigError::Validation(
            "at least one of the title and price selectors must be configured".to_string(),
        ));
    }

    validate_locator("title", selectors.title.as_ref())?;
    validate_locator("price", selectors.price.as_ref())?;
    validate_locator("image", selectors.image.as_ref())?;
    validate_locator("next-page", selectors.next_page.as_ref())?;

    for (name, locator) in &selectors.custom {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "custom field names cannot be empty".to_string(),
            ));
        }
        validate_locator(name, Some(locator))?;
    }

    Ok(())
}

fn validate_locator(name: &str, locator: Option<&Locator>) -> Result<(), ConfigError> {
    let Some(locator) = locator else {
        return Ok(());
    };

    validate_selector(name, locator.selector())?;

    if let Some(attr) = locator.attr() {
        if attr.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "locator '{}' has an empty attribute name",
                name
            )));
        }
    }

    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        name: name.to_string(),
        message: format!("{:?}", e),
    })?;
    Ok(())
}

/// Validates crawl behavior options
fn validate_crawl_options(options: &CrawlOptions) -> Result<(), ConfigError> {
    // delay-ms has no lower bound: zero is a valid politeness delay

    if options.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            options.max_retries
        )));
    }

    if options.timeout_ms < 1000 || options.timeout_ms > 300_000 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be between 1000 and 300000, got {}",
            options.timeout_ms
        )));
    }

    if options.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(proxy) = &options.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn base_config() -> Config {
        Config {
            site: SiteConfig {
                start_url: "https://shop.example.com/listings".to_string(),
                selectors: Selectors {
                    product: "li.product".to_string(),
                    title: Some(Locator::Css("h2.title".to_string())),
                    price: Some(Locator::Css(".price".to_string())),
                    image: None,
                    custom: BTreeMap::new(),
                    next_page: None,
                },
                wait_condition: None,
            },
            crawl: CrawlOptions {
                delay_ms: 1000,
                max_retries: 3,
                timeout_ms: 30_000,
                user_agent: "gleaner/1.0".to_string(),
                proxy: None,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_http_start_url_allowed() {
        let mut config = base_config();
        config.site.start_url = "http://127.0.0.1:8080/listings".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = base_config();
        config.site.start_url = "ftp://shop.example.com/listings".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_rejects_unparsable_start_url() {
        let mut config = base_config();
        config.site.start_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_rejects_missing_title_and_price() {
        let mut config = base_config();
        config.site.selectors.title = None;
        config.site.selectors.price = None;
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_title_only_is_enough() {
        let mut config = base_config();
        config.site.selectors.price = None;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_malformed_selector() {
        let mut config = base_config();
        config.site.selectors.title = Some(Locator::Css("h2..[".to_string()));
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidSelector { .. }
        ));
    }

    #[test]
    fn test_rejects_empty_custom_attr() {
        let mut config = base_config();
        config.site.selectors.custom.insert(
            "sku".to_string(),
            Locator::Detailed {
                selector: ".sku".to_string(),
                attr: Some("  ".to_string()),
            },
        );
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_zero_delay_allowed() {
        let mut config = base_config();
        config.crawl.delay_ms = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_excessive_retries() {
        let mut config = base_config();
        config.crawl.max_retries = 11;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_tiny_timeout() {
        let mut config = base_config();
        config.crawl.timeout_ms = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_invalid_proxy() {
        let mut config = base_config();
        config.crawl.proxy = Some("not a proxy".to_string());
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }
}
