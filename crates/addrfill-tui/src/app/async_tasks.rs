use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use addrfill_core::{Candidate, Coordinate, LocationHint, LookupRequest};
use addrfill_geocode::{Geocoder, GeolocationProvider, resolve_location_hint};

use crate::event::AppEvent;

/// Represents the result of an asynchronous background task.
#[derive(Debug)]
pub enum AsyncResult {
    /// A geocode lookup finished.
    LookupFinished {
        seq: u64,
        result: Result<Vec<Candidate>, String>,
    },
    /// The startup location hint is known.
    LocationResolved(LocationHint),
}

pub fn spawn_lookup(
    handle: &Handle,
    tx: UnboundedSender<AppEvent>,
    geocoder: Arc<dyn Geocoder>,
    request: LookupRequest,
    hint: Option<LocationHint>,
) {
    handle.spawn(async move {
        let result = geocoder
            .search(&request.query, hint)
            .await
            .map_err(|e| e.to_string());

        let _ = tx.send(AppEvent::AsyncResult(AsyncResult::LookupFinished {
            seq: request.seq,
            result,
        }));
    });
}

pub fn spawn_geolocate(
    handle: &Handle,
    tx: UnboundedSender<AppEvent>,
    provider: Box<dyn GeolocationProvider>,
    fallback: Coordinate,
) {
    handle.spawn(async move {
        let hint = resolve_location_hint(provider.as_ref(), fallback).await;
        let _ = tx.send(AppEvent::AsyncResult(AsyncResult::LocationResolved(hint)));
    });
}
