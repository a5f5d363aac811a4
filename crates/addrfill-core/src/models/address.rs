use serde::{Deserialize, Serialize};

use super::location::Coordinate;

/// Structured address parts of a geocode result. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl Address {
    /// Locality with fallback: suburb, city district, town, village.
    pub fn locality(&self) -> Option<&str> {
        [&self.suburb, &self.city_district, &self.town, &self.village]
            .into_iter()
            .find_map(|part| non_empty(part))
    }

    pub fn house_number(&self) -> Option<&str> {
        non_empty(&self.house_number)
    }

    pub fn road(&self) -> Option<&str> {
        non_empty(&self.road)
    }

    pub fn state(&self) -> Option<&str> {
        non_empty(&self.state)
    }

    pub fn postcode(&self) -> Option<&str> {
        non_empty(&self.postcode)
    }
}

fn non_empty(part: &Option<String>) -> Option<&str> {
    part.as_deref().filter(|s| !s.is_empty())
}

/// One geocoded address suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,
}

impl Candidate {
    pub fn new(label: impl Into<String>, address: Address) -> Self {
        Self {
            label: label.into(),
            address,
            position: None,
        }
    }
}
