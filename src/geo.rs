//! Best-effort IP geolocation.
//!
//! Providers are tried in a fixed order, each call bounded by the configured
//! timeout. The first well-formed answer wins. Every failure is absorbed: the
//! caller only ever sees `Some(location)` or `None`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::net::IpAddr;

use crate::config::GeoConfig;
use crate::models::GeoLocation;

/// IP address to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIp {
    Known(String),
    /// Unknown or loopback client: look up the server's own public IP first
    Detect,
}

impl ClientIp {
    /// Classify a candidate address taken from the request. Anything that is
    /// not a literal IP address is ignored.
    pub fn from_candidate(candidate: Option<&str>) -> Self {
        let Some(raw) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
            return ClientIp::Detect;
        };

        let ip = match raw.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                tracing::debug!("Ignoring client address that is not an IP: {:?}", raw);
                return ClientIp::Detect;
            }
        };

        let is_loopback = match ip {
            IpAddr::V4(v4) => v4.is_loopback(),
            IpAddr::V6(v6) => {
                v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
            }
        };

        if is_loopback {
            ClientIp::Detect
        } else {
            ClientIp::Known(ip.to_string())
        }
    }

    /// The address worth storing when no lookup succeeds
    pub fn known(&self) -> Option<&str> {
        match self {
            ClientIp::Known(ip) => Some(ip),
            ClientIp::Detect => None,
        }
    }
}

/// Lookup services in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoProvider {
    IpApi,
    GeoJs,
    IpApiCo,
}

impl GeoProvider {
    pub fn name(&self) -> &'static str {
        match self {
            GeoProvider::IpApi => "ip-api.com",
            GeoProvider::GeoJs => "geojs.io",
            GeoProvider::IpApiCo => "ipapi.co",
        }
    }

    fn url(&self, base: &str, ip: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            GeoProvider::IpApi => format!(
                "{base}/{ip}?fields=status,message,country,countryCode,region,regionName,city,lat,lon,timezone,query"
            ),
            GeoProvider::GeoJs => format!("{base}/{ip}.json"),
            GeoProvider::IpApiCo => format!("{base}/{ip}/json/"),
        }
    }

    /// Interpret a provider body; `None` when the provider reported a failure
    pub fn parse(&self, body: serde_json::Value) -> Option<GeoLocation> {
        match self {
            GeoProvider::IpApi => serde_json::from_value::<IpApiResponse>(body).ok()?.into_location(),
            GeoProvider::GeoJs => serde_json::from_value::<GeoJsResponse>(body).ok()?.into_location(),
            GeoProvider::IpApiCo => {
                serde_json::from_value::<IpApiCoResponse>(body).ok()?.into_location()
            }
        }
    }
}

/// Some providers send coordinates as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => Some(n),
            Coordinate::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|n| n.is_finite())
    }
}

fn coordinate(c: Option<Coordinate>) -> Option<f64> {
    c.and_then(Coordinate::value)
}

fn text(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    query: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    lat: Option<Coordinate>,
    lon: Option<Coordinate>,
    timezone: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Option<GeoLocation> {
        if self.status != "success" {
            return None;
        }
        Some(GeoLocation {
            ip: text(self.query),
            city: text(self.city),
            region: text(self.region_name),
            country: text(self.country),
            country_code: text(self.country_code),
            latitude: coordinate(self.lat),
            longitude: coordinate(self.lon),
            timezone: text(self.timezone),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeoJsResponse {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    latitude: Option<Coordinate>,
    longitude: Option<Coordinate>,
    timezone: Option<String>,
}

impl GeoJsResponse {
    fn into_location(self) -> Option<GeoLocation> {
        Some(GeoLocation {
            ip: text(self.ip),
            city: text(self.city),
            region: text(self.region),
            country: text(self.country),
            country_code: text(self.country_code),
            latitude: coordinate(self.latitude),
            longitude: coordinate(self.longitude),
            timezone: text(self.timezone),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    #[serde(default)]
    error: bool,
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    latitude: Option<Coordinate>,
    longitude: Option<Coordinate>,
    timezone: Option<String>,
}

impl IpApiCoResponse {
    fn into_location(self) -> Option<GeoLocation> {
        if self.error {
            return None;
        }
        Some(GeoLocation {
            ip: text(self.ip),
            city: text(self.city),
            region: text(self.region),
            country: text(self.country_name).or(text(self.country)),
            country_code: text(self.country_code),
            latitude: coordinate(self.latitude),
            longitude: coordinate(self.longitude),
            timezone: text(self.timezone),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PublicIpResponse {
    ip: String,
}

/// Runs the provider chain
#[derive(Debug, Clone)]
pub struct GeoResolver {
    client: reqwest::Client,
    config: GeoConfig,
}

impl GeoResolver {
    pub fn new(config: GeoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn providers(&self) -> Vec<(GeoProvider, &str)> {
        [
            (GeoProvider::IpApi, self.config.ip_api_url.as_deref()),
            (GeoProvider::GeoJs, self.config.geojs_url.as_deref()),
            (GeoProvider::IpApiCo, self.config.ipapi_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(provider, base)| base.map(|b| (provider, b)))
        .collect()
    }

    /// Look up `ip`. Never fails; `None` means no provider produced data.
    pub async fn resolve(&self, ip: &ClientIp) -> Option<GeoLocation> {
        let ip = match ip {
            ClientIp::Known(ip) => ip.clone(),
            ClientIp::Detect => self.detect_public_ip().await?,
        };

        for (provider, base) in self.providers() {
            let url = provider.url(base, &ip);
            tracing::debug!("Geolocation lookup via {}: {}", provider.name(), url);

            let Some(body) = self.fetch_json::<serde_json::Value>(&url).await else {
                continue;
            };

            match provider.parse(body) {
                Some(location) => {
                    tracing::info!("Geolocation resolved by {}", provider.name());
                    return Some(location);
                }
                None => tracing::warn!("{} returned no usable data for {}", provider.name(), ip),
            }
        }

        tracing::warn!("All geolocation providers failed for {}", ip);
        None
    }

    async fn detect_public_ip(&self) -> Option<String> {
        let detected = self
            .fetch_json::<PublicIpResponse>(&self.config.ip_detect_url)
            .await
            .map(|r| r.ip)
            .filter(|ip| !ip.trim().is_empty());

        match &detected {
            Some(ip) => tracing::info!("Public IP detected: {}", ip),
            None => tracing::warn!("Could not detect public IP, skipping geolocation"),
        }
        detected
    }

    /// GET `url` and decode JSON, bounded by the configured timeout
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let request = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.json::<T>().await
        };

        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(body)) => Some(body),
            Ok(Err(e)) => {
                tracing::warn!("Geolocation request to {} failed: {}", url, e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Geolocation request to {} timed out after {:?}",
                    url,
                    self.config.timeout
                );
                None
            }
        }
    }
}
