use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use addrfill_core::{Coordinate, LocationConfig, LocationHint, LocationMode};

use crate::error::{GeocodeError, Result};
use crate::http::{RateLimitedClient, parse_base_url};

/// A source of the device's current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn current_position(&self) -> Result<Coordinate>;
}

/// Position known up front (command line or config).
pub struct StaticPosition(pub Coordinate);

#[async_trait]
impl GeolocationProvider for StaticPosition {
    fn name(&self) -> &str {
        "static"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        Ok(self.0)
    }
}

/// Geolocation switched off.
pub struct Unavailable;

#[async_trait]
impl GeolocationProvider for Unavailable {
    fn name(&self) -> &str {
        "off"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        Err(GeocodeError::Location("geolocation disabled".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from an IP geolocation service (ip-api.com format).
pub struct IpGeolocation {
    client: RateLimitedClient,
    endpoint: String,
}

impl IpGeolocation {
    pub fn new(endpoint: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(Duration::ZERO, user_agent, Duration::from_secs(5))?,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    fn name(&self) -> &str {
        "ip"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        let url = parse_base_url(&self.endpoint)?;
        let body: IpApiResponse = self.client.get_json(&url).await?;

        match body.status.as_deref() {
            Some(status) if status != "success" => {
                return Err(GeocodeError::Location(
                    body.message.unwrap_or_else(|| status.to_string()),
                ));
            }
            _ => {}
        }
        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)?),
            _ => Err(GeocodeError::Location("response has no coordinates".to_string())),
        }
    }
}

/// Pick the provider configured in `config`; `near` overrides it.
pub fn provider_from_config(
    config: &LocationConfig,
    near: Option<Coordinate>,
    user_agent: &str,
) -> Result<Box<dyn GeolocationProvider>> {
    if let Some(position) = near {
        return Ok(Box::new(StaticPosition(position)));
    }
    Ok(match config.mode {
        LocationMode::Ip => Box::new(IpGeolocation::new(&config.ip_endpoint, user_agent)?),
        LocationMode::Static => match config.static_position()? {
            Some(position) => Box::new(StaticPosition(position)),
            None => Box::new(Unavailable),
        },
        LocationMode::Off => Box::new(Unavailable),
    })
}

/// Ask `provider` once; any failure yields the fallback hint.
pub async fn resolve_location_hint(
    provider: &dyn GeolocationProvider,
    fallback: Coordinate,
) -> LocationHint {
    match provider.current_position().await {
        Ok(position) => LocationHint::device(position),
        Err(e) => {
            debug!(provider = provider.name(), error = %e, "geolocation not available, using fallback");
            LocationHint::fallback(fallback)
        }
    }
}
