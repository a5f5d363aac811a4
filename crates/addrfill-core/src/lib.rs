pub mod config;
pub mod error;
pub mod models;
pub mod widget;

pub use config::{AppConfig, AutocompleteConfig, GeocoderConfig, LocationConfig, LocationMode};
pub use error::{AddrfillError, Result};
pub use models::*;
pub use widget::{AddressWidget, LookupDisposition, LookupRequest, NavKey};
