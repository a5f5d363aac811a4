use std::time::{Duration, Instant};

use tracing::debug;

/// A lookup the host should dispatch to the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
struct PendingLookup {
    query: String,
    due: Instant,
}

/// Debounces query changes into lookups and tracks which lookup is current.
///
/// Sequence numbers grow strictly; only the most recently dispatched lookup
/// may be applied, and only until it is invalidated.
#[derive(Debug)]
pub struct InputController {
    min_query_chars: usize,
    debounce: Duration,
    pending: Option<PendingLookup>,
    last_seq: u64,
    live_seq: Option<u64>,
}

impl InputController {
    pub fn new(min_query_chars: usize, debounce: Duration) -> Self {
        Self {
            min_query_chars,
            debounce,
            pending: None,
            last_seq: 0,
            live_seq: None,
        }
    }

    /// React to a text change. Returns `false` when the query is too short,
    /// in which case nothing is pending and in-flight lookups are void.
    pub fn on_text_changed(&mut self, raw: &str, now: Instant) -> bool {
        let query = raw.trim();
        if query.chars().count() < self.min_query_chars {
            self.pending = None;
            self.invalidate();
            return false;
        }

        self.pending = Some(PendingLookup {
            query: query.to_string(),
            due: now + self.debounce,
        });
        true
    }

    /// Dispatch the pending lookup once its quiet period has passed.
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        if self.pending.as_ref().is_none_or(|p| p.due > now) {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_seq += 1;
        self.live_seq = Some(self.last_seq);
        debug!(seq = self.last_seq, query = %pending.query, "dispatching lookup");
        Some(LookupRequest {
            seq: self.last_seq,
            query: pending.query,
        })
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Make every already-dispatched lookup stale.
    pub fn invalidate(&mut self) {
        self.live_seq = None;
    }

    /// Whether a response for `seq` may still be applied.
    pub fn accepts(&self, seq: u64) -> bool {
        self.live_seq == Some(seq)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn controller() -> InputController {
        InputController::new(3, DEBOUNCE)
    }

    #[test]
    fn short_queries_never_schedule() {
        let mut c = controller();
        let t0 = Instant::now();
        for q in ["", "a", "ab", "  ab  ", "éü"] {
            assert!(!c.on_text_changed(q, t0), "{q:?}");
            assert!(c.poll(t0 + DEBOUNCE * 10).is_none());
        }
    }

    #[test]
    fn only_last_query_in_quiet_period_is_dispatched() {
        let mut c = controller();
        let t0 = Instant::now();
        c.on_text_changed("123", t0);
        c.on_text_changed("123 M", t0 + Duration::from_millis(100));
        c.on_text_changed("123 Main", t0 + Duration::from_millis(250));

        assert!(c.poll(t0 + Duration::from_millis(400)).is_none());
        let req = c.poll(t0 + Duration::from_millis(550)).unwrap();
        assert_eq!(req.query, "123 Main");
        assert!(c.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn query_is_trimmed() {
        let mut c = controller();
        let t0 = Instant::now();
        c.on_text_changed("  12 Bay  ", t0);
        assert_eq!(c.poll(t0 + DEBOUNCE).unwrap().query, "12 Bay");
    }

    #[test]
    fn newer_dispatch_makes_older_stale() {
        let mut c = controller();
        let t0 = Instant::now();
        c.on_text_changed("first", t0);
        let first = c.poll(t0 + DEBOUNCE).unwrap();
        c.on_text_changed("second", t0 + DEBOUNCE);
        let second = c.poll(t0 + DEBOUNCE * 2).unwrap();

        assert!(second.seq > first.seq);
        assert!(!c.accepts(first.seq));
        assert!(c.accepts(second.seq));
    }

    #[test]
    fn shortening_invalidates_in_flight() {
        let mut c = controller();
        let t0 = Instant::now();
        c.on_text_changed("Main", t0);
        let req = c.poll(t0 + DEBOUNCE).unwrap();
        c.on_text_changed("Ma", t0 + DEBOUNCE);
        assert!(!c.accepts(req.seq));
    }

    #[test]
    fn typing_keeps_in_flight_lookup_live_until_next_dispatch() {
        let mut c = controller();
        let t0 = Instant::now();
        c.on_text_changed("Main", t0);
        let req = c.poll(t0 + DEBOUNCE).unwrap();
        c.on_text_changed("Main S", t0 + DEBOUNCE);
        assert!(c.accepts(req.seq));
        assert_eq!(c.next_deadline(), Some(t0 + DEBOUNCE * 2));
    }
}
