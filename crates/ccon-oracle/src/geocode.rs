//! # Geocoding
//!
//! Resolves a free-text request location to coordinates for the map pin
//! shown next to goods requests and fill offers.
//!
//! [`MapboxGeocoder`] calls
//! `GET {base}/geocoding/v5/mapbox.places/{query}.json?access_token=…` and
//! reads the first feature's `center`, which Mapbox orders
//! `[longitude, latitude]`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::config::{http_client, OracleConfig};
use crate::error::OracleError;

const SERVICE: &str = "geocoder";

/// Zoom level of rendered pins.
pub const PIN_ZOOM: u8 = 15;
/// Marker symbol of rendered pins.
pub const PIN_MARKER: &str = "car";

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A titled map pin, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    /// The looked-up location text.
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub marker: &'static str,
}

impl MapPin {
    pub fn new(title: impl Into<String>, at: Coordinates) -> Self {
        Self {
            title: title.into(),
            latitude: at.latitude,
            longitude: at.longitude,
            zoom: PIN_ZOOM,
            marker: PIN_MARKER,
        }
    }
}

/// Free-text address lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the best match for `address`.
    async fn lookup(&self, address: &str) -> Result<Coordinates, OracleError>;

    /// A map pin titled with `address`.
    async fn pin(&self, address: &str) -> Result<MapPin, OracleError> {
        let at = self.lookup(address).await?;
        Ok(MapPin::new(address, at))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    center: Vec<f64>,
}

/// Geocoder backed by the Mapbox places API.
#[derive(Clone)]
pub struct MapboxGeocoder {
    http: reqwest::Client,
    base_url: Url,
    token: Zeroizing<String>,
}

impl std::fmt::Debug for MapboxGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxGeocoder")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl MapboxGeocoder {
    pub fn new(base_url: Url, token: Zeroizing<String>, timeout_secs: u64) -> Result<Self, OracleError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url,
            token,
        })
    }

    /// Build from configuration. `Ok(None)` when no Mapbox token is set.
    pub fn from_config(config: &OracleConfig) -> Result<Option<Self>, OracleError> {
        config
            .mapbox_token
            .clone()
            .map(|token| Self::new(config.mapbox_url.clone(), token, config.timeout_secs))
            .transpose()
    }

    fn url(&self, address: &str) -> Result<Url, OracleError> {
        let file = format!("{address}.json");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OracleError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);
        url.query_pairs_mut()
            .append_pair("access_token", self.token.as_str());
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn lookup(&self, address: &str) -> Result<Coordinates, OracleError> {
        let resp = self
            .http
            .get(self.url(address)?)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable {
                service: SERVICE,
                reason: e.without_url().to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(OracleError::Unavailable {
                service: SERVICE,
                reason: format!("HTTP {}", resp.status().as_u16()),
            });
        }

        let body: GeocodeResponse = resp.json().await.map_err(|e| OracleError::MalformedUpstreamData {
            service: SERVICE,
            reason: e.without_url().to_string(),
        })?;

        let feature = body.features.first().ok_or_else(|| OracleError::MalformedUpstreamData {
            service: SERVICE,
            reason: format!("no features for {address:?}"),
        })?;
        match feature.center.as_slice() {
            [longitude, latitude] => {
                tracing::debug!(address, latitude, longitude, "geocoded");
                Ok(Coordinates {
                    latitude: *latitude,
                    longitude: *longitude,
                })
            }
            other => Err(OracleError::MalformedUpstreamData {
                service: SERVICE,
                reason: format!("center has {} components, expected 2", other.len()),
            }),
        }
    }
}
