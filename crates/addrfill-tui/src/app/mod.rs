pub mod async_tasks;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use addrfill_core::{AddressWidget, AppConfig, Coordinate, FormFieldId, HintSource, LookupDisposition};
use addrfill_geocode::{Geocoder, GeolocationProvider};

use crate::event::AppEvent;
use crate::theme::NordTheme;
use async_tasks::AsyncResult;

/// Which input currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Field(FormFieldId),
}

/// Screen regions recorded during the last draw, for mouse hit-testing.
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    pub search: Option<Rect>,
    /// Inner area of the dropdown; row `i` is at `y + i`.
    pub dropdown_rows: Option<Rect>,
    pub fields: Vec<(FormFieldId, Rect)>,
}

impl LayoutCache {
    pub fn dropdown_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.dropdown_rows?;
        contains(area, column, row).then(|| (row - area.y) as usize)
    }

    pub fn field_at(&self, column: u16, row: u16) -> Option<FormFieldId> {
        self.fields
            .iter()
            .find(|(_, area)| contains(*area, column, row))
            .map(|(id, _)| *id)
    }

    pub fn search_contains(&self, column: u16, row: u16) -> bool {
        self.search.is_some_and(|area| contains(area, column, row))
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub widget: AddressWidget,
    pub focus: Focus,
    pub status_message: String,
    pub theme: NordTheme,
    pub layout: LayoutCache,
    /// Lookups dispatched whose responses have not arrived yet.
    pub in_flight: usize,
    geocoder: Arc<dyn Geocoder>,
    handle: Handle,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(config: &AppConfig, geocoder: Arc<dyn Geocoder>, handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            should_quit: false,
            widget: AddressWidget::new(config.autocomplete.clone()),
            focus: Focus::Search,
            status_message: String::new(),
            theme: NordTheme::default(),
            layout: LayoutCache::default(),
            in_flight: 0,
            geocoder,
            handle,
            tx,
            rx,
        }
    }

    /// Kick off the one-shot location lookup.
    pub fn start_geolocation(&self, provider: Box<dyn GeolocationProvider>, fallback: Coordinate) {
        async_tasks::spawn_geolocate(&self.handle, self.tx.clone(), provider, fallback);
    }

    pub fn geocoder_name(&self) -> &str {
        self.geocoder.name()
    }

    // ── Event plumbing ─────────────────────────────────────

    /// Collect background results that arrived since the last call.
    pub fn drain_async(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn handle_async(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::LookupFinished { seq, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match self.widget.complete_lookup(seq, result) {
                    LookupDisposition::Applied(0) => self.status_message = "No matches".to_string(),
                    LookupDisposition::Applied(_) | LookupDisposition::Failed => {
                        self.status_message.clear()
                    }
                    LookupDisposition::Stale => {}
                }
            }
            AsyncResult::LocationResolved(hint) => {
                if self.widget.set_location_hint(hint) {
                    debug!(?hint, "location hint resolved");
                }
            }
        }
    }

    /// Advance widget timers and dispatch a due lookup.
    pub fn tick(&mut self, now: Instant) {
        if let Some(request) = self.widget.poll(now) {
            self.in_flight += 1;
            async_tasks::spawn_lookup(
                &self.handle,
                self.tx.clone(),
                Arc::clone(&self.geocoder),
                request,
                self.widget.location_hint(),
            );
        }
    }

    /// How long the event loop may sleep before the widget needs a tick.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.widget
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    // ── Focus ──────────────────────────────────────────────

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Search];
        order.extend(
            self.widget
                .form()
                .fields()
                .filter(|f| f.visible && f.enabled)
                .map(|f| Focus::Field(f.id)),
        );
        order
    }

    pub fn set_focus(&mut self, focus: Focus, now: Instant) {
        if focus == self.focus {
            return;
        }
        match (self.focus, focus) {
            (Focus::Search, _) => self.widget.blur(now),
            (_, Focus::Search) => self.widget.focus(),
            _ => {}
        }
        self.focus = focus;
    }

    pub fn focus_next(&mut self, now: Instant) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(order[(pos + 1) % order.len()], now);
    }

    pub fn focus_prev(&mut self, now: Instant) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let prev = if pos == 0 { order.len() - 1 } else { pos - 1 };
        self.set_focus(order[prev], now);
    }

    /// Short description of the current location hint for the status bar.
    pub fn location_label(&self) -> String {
        match self.widget.location_hint() {
            Some(hint) => {
                let source = match hint.source {
                    HintSource::Device => "device",
                    HintSource::Fallback => "fallback",
                };
                format!("near {} ({source})", hint.coordinate)
            }
            None => "locating…".to_string(),
        }
    }
}
