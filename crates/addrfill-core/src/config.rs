use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AddrfillError, Result};
use crate::models::Coordinate;

/// Root application configuration, loaded from `~/.config/addrfill/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub geocoder: GeocoderConfig,
    pub autocomplete: AutocompleteConfig,
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub country_codes: String,
    pub language: String,
    pub limit: u32,
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    pub min_query_chars: usize,
    pub debounce_ms: u64,
    pub blur_grace_ms: u64,
}

/// Where the startup location hint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    Ip,
    Static,
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub mode: LocationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    pub fallback: [f64; 2],
    pub bias_degrees: f64,
    pub ip_endpoint: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            country_codes: "au".to_string(),
            language: "en".to_string(),
            limit: 5,
            user_agent: concat!("addrfill/", env!("CARGO_PKG_VERSION")).to_string(),
            min_interval_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 3,
            debounce_ms: 300,
            blur_grace_ms: 200,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::Ip,
            position: None,
            // Geographic centre of Australia.
            fallback: [-25.2744, 133.7751],
            bias_degrees: 1.0,
            ip_endpoint: "http://ip-api.com/json".to_string(),
        }
    }
}

impl AutocompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

impl GeocoderConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LocationConfig {
    pub fn fallback_coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.fallback[0], self.fallback[1])
    }

    pub fn static_position(&self) -> Result<Option<Coordinate>> {
        self.position
            .map(|[lat, lon]| Coordinate::new(lat, lon))
            .transpose()
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/addrfill/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ADDRFILL_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("addrfill")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Reject values the widget cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.autocomplete.min_query_chars == 0 {
            return Err(AddrfillError::ConfigError(
                "autocomplete.min_query_chars must be at least 1".to_string(),
            ));
        }
        if self.geocoder.limit == 0 {
            return Err(AddrfillError::ConfigError(
                "geocoder.limit must be at least 1".to_string(),
            ));
        }
        if !(self.location.bias_degrees.is_finite() && self.location.bias_degrees > 0.0) {
            return Err(AddrfillError::ConfigError(format!(
                "location.bias_degrees must be positive, got {}",
                self.location.bias_degrees
            )));
        }
        if self.location.mode == LocationMode::Static && self.location.position.is_none() {
            return Err(AddrfillError::ConfigError(
                "location.mode = \"static\" requires location.position".to_string(),
            ));
        }
        self.location.fallback_coordinate()?;
        self.location.static_position()?;
        Ok(())
    }

    /// Path to the log file used while the TUI owns the terminal.
    pub fn log_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("addrfill")
            .join("addrfill.log")
    }
}
