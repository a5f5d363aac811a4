use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};

use crate::app::async_tasks::AsyncResult;

/// Events that the TUI can handle.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press event.
    Key(KeyEvent),
    /// Mouse movement or button press.
    Mouse(MouseEvent),
    /// Text pasted into the terminal.
    Paste(String),
    /// The terminal window gained focus.
    FocusGained,
    /// The terminal window lost focus.
    FocusLost,
    /// Terminal was resized.
    Resize(u16, u16),
    /// Nothing happened before the timeout.
    Tick,
    /// A background task finished.
    AsyncResult(AsyncResult),
}

/// Polls for terminal events, waiting at most the tick rate.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Block until the next terminal event or until `timeout` (capped at the
    /// tick rate) elapses.
    pub fn next(&self, timeout: Option<Duration>) -> Result<AppEvent> {
        let wait = timeout.map_or(self.tick_rate, |t| t.min(self.tick_rate));
        if event::poll(wait)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Ok(AppEvent::Key(key)),
                CrosstermEvent::Mouse(mouse) => Ok(AppEvent::Mouse(mouse)),
                CrosstermEvent::Paste(text) => Ok(AppEvent::Paste(text)),
                CrosstermEvent::FocusGained => Ok(AppEvent::FocusGained),
                CrosstermEvent::FocusLost => Ok(AppEvent::FocusLost),
                CrosstermEvent::Resize(w, h) => Ok(AppEvent::Resize(w, h)),
                _ => Ok(AppEvent::Tick),
            }
        } else {
            Ok(AppEvent::Tick)
        }
    }
}
