use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use addrfill_core::{Address, Candidate, Coordinate, GeocoderConfig, LocationHint};

use crate::error::{GeocodeError, Result};
use crate::geocoder::Geocoder;
use crate::http::{RateLimitedClient, parse_base_url};

const BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Fixed parameters sent with every search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub country_codes: String,
    pub language: String,
    pub limit: u32,
    /// Half-width of the bias box around a location hint, in degrees.
    pub bias_degrees: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            country_codes: "au".to_string(),
            language: "en".to_string(),
            limit: 5,
            bias_degrees: 1.0,
        }
    }
}

/// One element of the `/search?format=json` response array.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub display_name: String,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
    #[serde(default)]
    pub address: Address,
}

impl From<NominatimPlace> for Candidate {
    fn from(place: NominatimPlace) -> Self {
        let position = match (place.lat.as_deref(), place.lon.as_deref()) {
            (Some(lat), Some(lon)) => lat
                .parse::<f64>()
                .ok()
                .zip(lon.parse::<f64>().ok())
                .and_then(|(lat, lon)| Coordinate::new(lat, lon).ok()),
            _ => None,
        };
        Candidate {
            label: place.display_name,
            address: place.address,
            position,
        }
    }
}

pub struct NominatimClient {
    client: RateLimitedClient,
    base_url: String,
    options: SearchOptions,
}

impl NominatimClient {
    pub fn new() -> Result<Self> {
        Self::with_params(BASE_URL, Duration::from_secs(1), SearchOptions::default())
    }

    pub fn from_config(config: &GeocoderConfig, bias_degrees: f64) -> Result<Self> {
        let client = RateLimitedClient::new(
            config.min_interval(),
            &config.user_agent,
            config.timeout(),
        )?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            options: SearchOptions {
                country_codes: config.country_codes.clone(),
                language: config.language.clone(),
                limit: config.limit,
                bias_degrees,
            },
        })
    }

    pub fn with_params(base_url: &str, min_interval: Duration, options: SearchOptions) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(
                min_interval,
                concat!("addrfill/", env!("CARGO_PKG_VERSION")),
                Duration::from_secs(10),
            )?,
            base_url: base_url.to_string(),
            options,
        })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Build the `/search` request URL for `query`.
    pub fn search_url(&self, query: &str, hint: Option<LocationHint>) -> Result<Url> {
        let mut url = parse_base_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Parse("invalid Nominatim base URL".to_string()))?
            .pop_if_empty()
            .push("search");

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query)
                .append_pair("format", "json")
                .append_pair("addressdetails", "1")
                .append_pair("limit", &self.options.limit.to_string())
                .append_pair("countrycodes", &self.options.country_codes)
                .append_pair("accept-language", &self.options.language);

            if let Some(hint) = hint {
                let viewbox = hint.viewbox(self.options.bias_degrees);
                pairs
                    .append_pair("viewbox", &viewbox.to_string())
                    .append_pair("bounded", "1");
            }
        }
        Ok(url)
    }

    pub async fn search_places(
        &self,
        query: &str,
        hint: Option<LocationHint>,
    ) -> Result<Vec<NominatimPlace>> {
        let url = self.search_url(query, hint)?;
        let places: Vec<NominatimPlace> = self.client.get_json(&url).await?;
        debug!(query, count = places.len(), biased = hint.is_some(), "nominatim search");
        Ok(places)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn search(&self, query: &str, hint: Option<LocationHint>) -> Result<Vec<Candidate>> {
        let places = self.search_places(query, hint).await?;
        Ok(places.into_iter().map(Candidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> NominatimClient {
        NominatimClient::with_params(&server.url(), Duration::from_millis(1), SearchOptions::default())
            .unwrap()
    }

    fn base_params(q: &str) -> Vec<Matcher> {
        vec![
            Matcher::UrlEncoded("q".into(), q.into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("addressdetails".into(), "1".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
            Matcher::UrlEncoded("countrycodes".into(), "au".into()),
            Matcher::UrlEncoded("accept-language".into(), "en".into()),
        ]
    }

    #[tokio::test]
    async fn search_parses_candidates_in_order() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(base_params("123 Main")))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "place_id": 1,
                        "display_name": "123 Main St, Springfield",
                        "lat": "-27.4698",
                        "lon": "153.0251",
                        "address": {
                            "house_number": "123",
                            "road": "Main St",
                            "suburb": "Springfield",
                            "postcode": "4000",
                            "country": "Australia"
                        }
                    },
                    {
                        "display_name": "Main Rd, Shelbyville",
                        "address": {"road": "Main Rd", "town": "Shelbyville", "state": "Queensland"}
                    }
                ]"#,
            )
            .create_async()
            .await;

        let candidates = client_for(&server).search("123 Main", None).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, "123 Main St, Springfield");
        assert_eq!(candidates[0].address.house_number(), Some("123"));
        assert_eq!(candidates[0].address.locality(), Some("Springfield"));
        let pos = candidates[0].position.unwrap();
        assert_eq!(pos.lat, -27.4698);
        assert_eq!(candidates[1].address.locality(), Some("Shelbyville"));
        assert_eq!(candidates[1].position, None);
    }

    #[tokio::test]
    async fn hint_adds_bounded_viewbox() {
        let mut server = Server::new_async().await;
        let fallback = Coordinate::new(-25.2744, 133.7751).unwrap();
        let hint = LocationHint::fallback(fallback);
        let expected_viewbox = format!(
            "{},{},{},{}",
            133.7751 - 1.0,
            -25.2744 - 1.0,
            133.7751 + 1.0,
            -25.2744 + 1.0
        );

        let mut params = base_params("Bay Rd");
        params.push(Matcher::UrlEncoded("viewbox".into(), expected_viewbox));
        params.push(Matcher::UrlEncoded("bounded".into(), "1".into()));
        let _m = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(params))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let candidates = client_for(&server).search("Bay Rd", Some(hint)).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn url_without_hint_has_no_bias() {
        let client = NominatimClient::with_params(
            "https://nominatim.example.org",
            Duration::from_millis(1),
            SearchOptions::default(),
        )
        .unwrap();
        let url = client.search_url("12 Bay", None).unwrap();

        assert_eq!(url.path(), "/search");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            ["q", "format", "addressdetails", "limit", "countrycodes", "accept-language"]
        );
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server).search("Main", None).await.unwrap_err();
        assert!(matches!(err, GeocodeError::ApiError(_, _)));
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": "not an array"}"#)
            .create_async()
            .await;

        let err = client_for(&server).search("Main", None).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }
}
