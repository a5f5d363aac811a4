//! addrfill geocode — Nominatim search and startup location hints.

pub mod error;
pub mod geocoder;
pub mod http;
pub mod location;
pub mod nominatim;

pub use error::{GeocodeError, Result};
pub use geocoder::Geocoder;
pub use location::{
    GeolocationProvider, IpGeolocation, StaticPosition, Unavailable, provider_from_config,
    resolve_location_hint,
};
pub use nominatim::{NominatimClient, SearchOptions};
