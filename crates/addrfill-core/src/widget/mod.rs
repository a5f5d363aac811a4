//! Headless address-autocomplete widget.
//!
//! The host owns the event loop: it forwards edits, navigation keys,
//! pointer and focus events, calls [`AddressWidget::poll`] when
//! [`AddressWidget::next_deadline`] passes, runs the returned lookups and
//! hands their outcome back through [`AddressWidget::complete_lookup`].

mod controller;
mod dropdown;

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::AutocompleteConfig;
use crate::models::{AddressForm, Candidate, LocationHint, TextInput};

pub use controller::{InputController, LookupRequest};
pub use dropdown::Dropdown;

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Escape,
}

/// What happened to a finished lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupDisposition {
    /// Candidates were handed to the dropdown (zero hides it).
    Applied(usize),
    /// A newer lookup superseded this one, or it was invalidated.
    Stale,
    /// The lookup failed; the dropdown was hidden.
    Failed,
}

/// One autocomplete widget instance: search input, dropdown and host form.
#[derive(Debug)]
pub struct AddressWidget {
    config: AutocompleteConfig,
    input: TextInput,
    controller: InputController,
    dropdown: Dropdown,
    form: AddressForm,
    location: Option<LocationHint>,
    blur_hide_at: Option<Instant>,
}

impl AddressWidget {
    pub fn new(config: AutocompleteConfig) -> Self {
        let controller = InputController::new(config.min_query_chars, config.debounce());
        Self {
            config,
            input: TextInput::new(),
            controller,
            dropdown: Dropdown::new(),
            form: AddressForm::new(),
            location: None,
            blur_hide_at: None,
        }
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn dropdown(&self) -> &Dropdown {
        &self.dropdown
    }

    pub fn form(&self) -> &AddressForm {
        &self.form
    }

    /// Manual edits to form fields go through here.
    pub fn form_mut(&mut self) -> &mut AddressForm {
        &mut self.form
    }

    pub fn location_hint(&self) -> Option<LocationHint> {
        self.location
    }

    pub fn is_dropdown_visible(&self) -> bool {
        self.dropdown.is_visible()
    }

    // ── Search input editing ───────────────────────────────

    pub fn insert_char(&mut self, c: char, now: Instant) {
        self.input.insert_char(c);
        self.on_input_changed(now);
    }

    pub fn delete_back(&mut self, now: Instant) {
        if self.input.delete_back() {
            self.on_input_changed(now);
        }
    }

    pub fn delete_word_back(&mut self, now: Instant) {
        if self.input.delete_word_back() {
            self.on_input_changed(now);
        }
    }

    /// Replace the whole search text, e.g. on paste.
    pub fn set_query(&mut self, text: &str, now: Instant) {
        self.input.set(text);
        self.on_input_changed(now);
    }

    pub fn cursor_left(&mut self) {
        self.input.move_left();
    }

    pub fn cursor_right(&mut self) {
        self.input.move_right();
    }

    pub fn cursor_home(&mut self) {
        self.input.home();
    }

    pub fn cursor_end(&mut self) {
        self.input.end();
    }

    fn on_input_changed(&mut self, now: Instant) {
        if !self.controller.on_text_changed(&self.input.value, now) {
            self.dropdown.hide();
        }
    }

    // ── Dropdown interaction ───────────────────────────────

    /// Returns `true` when the key was consumed by the dropdown.
    pub fn handle_nav(&mut self, key: NavKey) -> bool {
        if !self.dropdown.is_visible() {
            return false;
        }
        match key {
            NavKey::Down => self.dropdown.move_down(),
            NavKey::Up => self.dropdown.move_up(),
            NavKey::Enter => match self.dropdown.selected() {
                Some(index) => {
                    self.commit(index);
                }
                None => return false,
            },
            NavKey::Escape => self.dropdown.hide(),
        }
        true
    }

    pub fn pointer_enter(&mut self, index: usize) {
        if self.dropdown.is_visible() {
            self.dropdown.hover(index);
        }
    }

    pub fn click(&mut self, index: usize) -> bool {
        self.dropdown.is_visible() && self.commit(index)
    }

    /// Copy candidate `index` into the form. Out-of-range indices are a no-op.
    pub fn commit(&mut self, index: usize) -> bool {
        let Some(candidate) = self.dropdown.candidate(index).cloned() else {
            debug!(index, len = self.dropdown.len(), "ignoring out-of-range selection");
            return false;
        };

        self.form.reveal();
        self.form.fill(&candidate.address);
        self.input.set(candidate.label);
        self.dropdown.hide();
        self.controller.cancel_pending();
        self.controller.invalidate();
        true
    }

    // ── Focus ──────────────────────────────────────────────

    /// The search input lost focus; hide after the grace delay.
    pub fn blur(&mut self, now: Instant) {
        self.blur_hide_at = Some(now + self.config.blur_grace());
    }

    pub fn focus(&mut self) {
        self.blur_hide_at = None;
    }

    // ── Timers and lookups ─────────────────────────────────

    /// Advance timers. Returns a lookup to dispatch, if one is due.
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        if self.blur_hide_at.is_some_and(|at| at <= now) {
            self.blur_hide_at = None;
            self.dropdown.hide();
        }
        self.controller.poll(now)
    }

    /// Earliest instant at which [`Self::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.controller.next_deadline(), self.blur_hide_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_pending_lookup(&self) -> bool {
        self.controller.has_pending()
    }

    /// Apply the outcome of lookup `seq`.
    pub fn complete_lookup(
        &mut self,
        seq: u64,
        result: Result<Vec<Candidate>, String>,
    ) -> LookupDisposition {
        if !self.controller.accepts(seq) {
            debug!(seq, "discarding stale lookup response");
            return LookupDisposition::Stale;
        }
        match result {
            Ok(candidates) => {
                let n = candidates.len();
                self.dropdown.show_results(candidates);
                LookupDisposition::Applied(n)
            }
            Err(e) => {
                warn!(seq, error = %e, "error fetching addresses");
                self.dropdown.hide();
                LookupDisposition::Failed
            }
        }
    }

    /// Store the startup location hint. Later calls are ignored.
    pub fn set_location_hint(&mut self, hint: LocationHint) -> bool {
        if self.location.is_some() {
            debug!("location hint already set, ignoring");
            return false;
        }
        self.location = Some(hint);
        true
    }
}
