use async_trait::async_trait;

use addrfill_core::{Candidate, LocationHint};

use crate::error::Result;

/// Free-text address search against some geocoding backend.
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &str;

    /// Look up `query`, biased toward `hint` when present. Candidates come
    /// back in the backend's order.
    async fn search(&self, query: &str, hint: Option<LocationHint>) -> Result<Vec<Candidate>>;
}
