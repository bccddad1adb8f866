//! Connection configuration
//!
//! The endpoint is always `ws://<page host>/ws/`. In the browser the page
//! host comes from `window.location`; natively it comes from a page URL
//! given through the environment.

use std::time::Duration;
use tracing::debug;
use url::Url;

use super::Ruleset;
use crate::error::{Result, TrackerError};

/// Path the tracker server upgrades to WebSocket on
pub const WS_PATH: &str = "/ws/";

/// Fixed delay between a close and the next connection attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Address the tracker server binds to by default
pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:4224/";

/// The parts of a page URL the tracker cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLocation {
    /// `host[:port]`
    pub host: String,
    /// Raw query string without the leading `?`, empty if absent
    pub query: String,
}

impl PageLocation {
    pub fn new(host: impl Into<String>, query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            host: host.into(),
            query: query.trim_start_matches('?').to_string(),
        }
    }

    /// Take host, port and query out of a full page URL.
    pub fn parse(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)
            .map_err(|e| TrackerError::InvalidUrl(format!("{page_url}: {e}")))?;

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(TrackerError::InvalidUrl(format!("missing host: {page_url}"))),
        };
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self::new(host, url.query().unwrap_or_default()))
    }

    /// `ws://<host>/ws/`
    pub fn endpoint(&self) -> String {
        format!("ws://{}{}", self.host, WS_PATH)
    }

    pub fn ruleset(&self) -> Ruleset {
        Ruleset::from_query(&self.query)
    }
}

/// Everything a tracker client needs to run.
#[derive(Clone, Debug)]
pub struct TrackerConfig<S> {
    pub endpoint: String,
    pub retry_delay: Duration,
    pub ruleset: Ruleset,
    /// Value the stats cell starts with and resets to on `Connecting`
    pub default_stats: S,
}

impl<S> TrackerConfig<S> {
    pub fn for_location(location: &PageLocation, default_stats: S) -> Self {
        Self {
            endpoint: location.endpoint(),
            retry_delay: DEFAULT_RETRY_DELAY,
            ruleset: location.ruleset(),
            default_stats,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Build from the environment:
    ///
    /// - `TRACKER_PAGE_URL`: page URL providing host and `?ruleset=`
    /// - `TRACKER_WS`: full endpoint override
    /// - `TRACKER_RETRY_MS`: retry delay override in milliseconds
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env(default_stats: S) -> Result<Self> {
        let page_url =
            std::env::var("TRACKER_PAGE_URL").unwrap_or_else(|_| DEFAULT_PAGE_URL.to_string());
        let location = PageLocation::parse(&page_url)?;
        let mut config = Self::for_location(&location, default_stats);

        if let Ok(endpoint) = std::env::var("TRACKER_WS") {
            config.endpoint = endpoint;
        }

        if let Ok(retry) = std::env::var("TRACKER_RETRY_MS") {
            let ms: u64 = retry.parse().map_err(|_| {
                TrackerError::InvalidUrl(format!("TRACKER_RETRY_MS is not a number: {retry}"))
            })?;
            config.retry_delay = Duration::from_millis(ms);
        }

        debug!(
            endpoint = %config.endpoint,
            retry_ms = config.retry_delay.as_millis() as u64,
            ruleset = config.ruleset.as_u8(),
            "Loaded tracker config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_url() {
        let loc = PageLocation::parse("http://127.0.0.1:4224/?ruleset=1").unwrap();
        assert_eq!(loc.host, "127.0.0.1:4224");
        assert_eq!(loc.query, "ruleset=1");
        assert_eq!(loc.endpoint(), "ws://127.0.0.1:4224/ws/");
        assert_eq!(loc.ruleset(), Ruleset::One);
    }

    #[test]
    fn test_parse_page_url_variants() {
        let loc = PageLocation::parse("https://tracker.local").unwrap();
        assert_eq!(loc.host, "tracker.local");
        assert_eq!(loc.query, "");
        assert_eq!(loc.ruleset(), Ruleset::Two);

        let loc = PageLocation::parse("http://host:8080?ruleset=5#top").unwrap();
        assert_eq!(loc.host, "host:8080");
        assert_eq!(loc.query, "ruleset=5");

        let loc = PageLocation::parse("http://host/overlay/index.html?ruleset=1#x").unwrap();
        assert_eq!(loc.host, "host");
        assert_eq!(loc.ruleset(), Ruleset::One);
    }

    #[test]
    fn test_parse_page_url_errors() {
        assert!(matches!(
            PageLocation::parse("127.0.0.1:4224"),
            Err(TrackerError::InvalidUrl(_))
        ));
        assert!(matches!(
            PageLocation::parse("mailto:tracker@example.com"),
            Err(TrackerError::InvalidUrl(_))
        ));
        assert!(matches!(
            PageLocation::parse("http://"),
            Err(TrackerError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_page_url_encoded_query() {
        let loc = PageLocation::parse("http://127.0.0.1:4224/?rule%73et=%31").unwrap();
        assert_eq!(loc.ruleset(), Ruleset::One);

        // Default port is dropped, like `location.host`
        let loc = PageLocation::parse("http://tracker.local:80/").unwrap();
        assert_eq!(loc.host, "tracker.local");
    }

    #[test]
    fn test_location_from_browser_parts() {
        let loc = PageLocation::new("localhost:4224", "?ruleset=1");
        assert_eq!(loc.query, "ruleset=1");
        assert_eq!(loc.endpoint(), "ws://localhost:4224/ws/");
    }

    #[test]
    fn test_config_defaults() {
        let loc = PageLocation::parse(DEFAULT_PAGE_URL).unwrap();
        let config = TrackerConfig::for_location(&loc, 0u8);
        assert_eq!(config.endpoint, "ws://127.0.0.1:4224/ws/");
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.ruleset, Ruleset::Two);

        let config = config
            .with_endpoint("ws://other/ws/")
            .with_retry_delay(Duration::from_millis(50));
        assert_eq!(config.endpoint, "ws://other/ws/");
        assert_eq!(config.retry_delay, Duration::from_millis(50));
    }
}
