//! Best-effort IP geolocation for login notifications.
//!
//! Lookups never fail from the caller's point of view: any problem yields
//! an empty [`GeoResult`] and a warning in the logs.

use crate::models::GeoResult;
use async_trait::async_trait;
use core_config::{env_flag, env_or_default, env_parse, ConfigError, FromEnv};
use reqwest::Client;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";
pub const DEFAULT_GEO_TIMEOUT_MS: u64 = 2_500;

/// Geo lookup settings.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Base URL; the IP is appended as a path segment.
    pub endpoint: String,
    pub timeout: Duration,
    pub enabled: bool,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_GEO_TIMEOUT_MS),
            enabled: true,
        }
    }
}

impl GeoConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

impl FromEnv for GeoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: env_or_default("GEO_LOOKUP_URL", DEFAULT_GEO_ENDPOINT),
            timeout: Duration::from_millis(env_parse("GEO_LOOKUP_TIMEOUT_MS", DEFAULT_GEO_TIMEOUT_MS)?),
            enabled: env_flag("GEO_LOOKUP_ENABLED", true),
        })
    }
}

/// Resolves an IP address to an approximate location.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Look up `ip`. Returns [`GeoResult::default`] when nothing is known.
    async fn lookup(&self, ip: &str) -> GeoResult;
}

/// Locator that never knows anything. Used when lookups are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocator;

#[async_trait]
impl GeoLocator for NoopLocator {
    async fn lookup(&self, _ip: &str) -> GeoResult {
        GeoResult::default()
    }
}

/// Locator backed by the ip-api.com JSON API (no key required).
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpApiLocator {
    /// Create a locator; the HTTP client is built once and reused.
    pub fn new(config: &GeoConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, ip: &str) -> Result<IpApiResponse, reqwest::Error> {
        self.client
            .get(format!("{}/{}", self.endpoint, ip))
            .query(&[("fields", "status,message,country,city,lat,lon")])
            .send()
            .await?
            .error_for_status()?
            .json::<IpApiResponse>()
            .await
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn lookup(&self, ip: &str) -> GeoResult {
        match self.fetch(ip).await {
            Ok(response) if response.status == "success" => {
                debug!(ip = %ip, city = ?response.city, country = ?response.country, "Geo lookup succeeded");
                GeoResult {
                    city: response.city,
                    country: response.country,
                    latitude: response.lat,
                    longitude: response.lon,
                }
            }
            Ok(response) => {
                warn!(ip = %ip, status = %response.status, message = ?response.message, "Geo lookup returned no location");
                GeoResult::default()
            }
            Err(e) => {
                warn!(ip = %ip, error = %e, "Geo lookup failed");
                GeoResult::default()
            }
        }
    }
}

/// The client address from a raw header value such as `X-Forwarded-For`
/// (`"203.0.113.7, 10.0.0.1"` -> `203.0.113.7`).
pub fn client_ip(raw: &str) -> Option<IpAddr> {
    raw.split(',').next()?.trim().parse().ok()
}

/// Whether looking up `raw` could return anything useful.
///
/// `"Unknown"`, unparsable, loopback, private, shared (CGNAT), link-local
/// and unspecified addresses are skipped. IPv4-mapped IPv6 addresses are
/// judged by the IPv4 address they carry.
pub fn is_routable(raw: &str) -> bool {
    match client_ip(raw) {
        Some(IpAddr::V4(ip)) => is_routable_v4(ip),
        Some(IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
            Some(mapped) => is_routable_v4(mapped),
            None => {
                let first = ip.segments()[0];
                let unique_local = first & 0xfe00 == 0xfc00;
                let link_local = first & 0xffc0 == 0xfe80;
                !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
            }
        },
        None => false,
    }
}

fn is_routable_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    // 100.64.0.0/10
    let shared = a == 100 && b & 0xc0 == 64;
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || shared)
}
