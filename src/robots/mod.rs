//! Crawl-politeness gate
//!
//! Fetches the target site's robots.txt once per run and evaluates its
//! directives for every frontier URL. Politeness is best effort: any
//! failure to fetch or read the file degrades to allow-all rather than
//! blocking the crawl.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Bounded time allowed for the robots.txt fetch
const POLICY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Evaluates crawl-politeness directives for one site
///
/// An absent directive set means every URL is allowed.
pub struct PolicyGate {
    robots: Option<ParsedRobots>,
    user_agent: String,
}

impl PolicyGate {
    /// Creates a permissive gate with no loaded policy
    pub fn allow_all(user_agent: &str) -> Self {
        Self {
            robots: None,
            user_agent: user_agent.to_string(),
        }
    }

    /// Fetches and parses robots.txt relative to the start URL
    ///
    /// Fail-open by construction: network errors, non-success statuses,
    /// and unreadable bodies are logged at warn and yield a permissive
    /// gate. This method never returns an error.
    pub async fn load(client: &Client, start_url: &Url, user_agent: &str) -> Self {
        let robots_url = match start_url.join("/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "cannot derive robots.txt URL, allowing all");
                return Self::allow_all(user_agent);
            }
        };

        let response = client
            .get(robots_url.clone())
            .timeout(POLICY_FETCH_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => {
                    tracing::debug!(url = %robots_url, bytes = body.len(), "loaded robots.txt");
                    Self {
                        robots: Some(ParsedRobots::from_content(&body)),
                        user_agent: user_agent.to_string(),
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %robots_url, error = %e, "failed to read robots.txt body, allowing all");
                    Self::allow_all(user_agent)
                }
            },
            Ok(resp) => {
                tracing::warn!(url = %robots_url, status = resp.status().as_u16(), "robots.txt fetch failed, allowing all");
                Self::allow_all(user_agent)
            }
            Err(e) => {
                tracing::warn!(url = %robots_url, error = %e, "robots.txt fetch failed, allowing all");
                Self::allow_all(user_agent)
            }
        }
    }

    /// Checks whether a URL may be requested
    ///
    /// Returns true when no policy is loaded.
    pub fn is_allowed(&self, url: &Url) -> bool {
        match &self.robots {
            None => true,
            Some(robots) => robots.is_allowed(url.as_str(), &self.user_agent),
        }
    }

    /// Crawl-delay declared for the configured user agent, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots
            .as_ref()
            .and_then(|robots| robots.crawl_delay(&self.user_agent))
            .map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_gate() {
        let gate = PolicyGate::allow_all("TestBot");
        let url = Url::parse("https://example.com/anything").unwrap();
        assert!(gate.is_allowed(&url));
        assert_eq!(gate.crawl_delay(), None);
    }

    #[test]
    fn test_gate_with_directives() {
        let gate = PolicyGate {
            robots: Some(ParsedRobots::from_content(
                "User-agent: *\nDisallow: /admin\nCrawl-delay: 2",
            )),
            user_agent: "TestBot".to_string(),
        };

        let allowed = Url::parse("https://example.com/listings").unwrap();
        let denied = Url::parse("https://example.com/admin/panel").unwrap();
        assert!(gate.is_allowed(&allowed));
        assert!(!gate.is_allowed(&denied));
        assert_eq!(gate.crawl_delay(), Some(Duration::from_secs(2)));
    }
}
