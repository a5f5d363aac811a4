pub mod app;
pub mod event;
pub mod keys;
pub mod theme;
pub mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{
    DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
    EnableFocusChange, EnableMouseCapture,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use app::App;
use event::{AppEvent, EventHandler};

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(DisableBracketedPaste)?;
    stdout.execute(DisableFocusChange)?;
    stdout.execute(DisableMouseCapture)?;
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the interactive address widget until the user quits.
pub fn run_tui(app: &mut App) -> Result<()> {
    // Install panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    stdout.execute(EnableFocusChange)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let event_handler = EventHandler::new(Duration::from_millis(100));

    // Main loop
    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::render(frame, app)) {
            break Err(e.into());
        }

        let timeout = app.next_timeout(Instant::now());
        let event = match event_handler.next(timeout) {
            Ok(event) => event,
            Err(e) => break Err(e),
        };

        let mut events = vec![event];
        events.extend(app.drain_async());
        for event in events {
            dispatch(app, event, Instant::now());
        }
        app.tick(Instant::now());

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    restore_terminal()?;
    result
}

/// Apply one event to the app.
pub fn dispatch(app: &mut App, event: AppEvent, now: Instant) {
    match event {
        AppEvent::Key(key) => keys::handle_key(app, key.code, key.modifiers, now),
        AppEvent::Mouse(mouse) => keys::handle_mouse(app, mouse, now),
        AppEvent::Paste(text) => keys::handle_paste(app, &text, now),
        AppEvent::FocusLost => {
            if app.focus == app::Focus::Search {
                app.widget.blur(now);
            }
        }
        AppEvent::FocusGained => {
            if app.focus == app::Focus::Search {
                app.widget.focus();
            }
        }
        AppEvent::AsyncResult(result) => app.handle_async(result),
        AppEvent::Resize(_, _) | AppEvent::Tick => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use addrfill_core::{Address, AppConfig, Candidate, Coordinate, HintSource, LocationHint};
    use addrfill_geocode::{StaticPosition, Unavailable};

    use super::*;
    use crate::app::test_support::ScriptedGeocoder;

    /// Pump the app until `done` holds or a second passes.
    fn pump(app: &mut App, mut done: impl FnMut(&App) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(1);
        while !done(app) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            for event in app.drain_async() {
                dispatch(app, event, Instant::now());
            }
        }
    }

    #[test]
    fn lookup_round_trip_through_background_task() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut answers = HashMap::new();
        answers.insert(
            "123 Main".to_string(),
            vec![Candidate::new(
                "123 Main St, Springfield",
                Address {
                    road: Some("Main St".into()),
                    ..Address::default()
                },
            )],
        );
        let geocoder = Arc::new(ScriptedGeocoder {
            answers,
            ..ScriptedGeocoder::default()
        });
        let mut app = App::new(&AppConfig::default(), geocoder.clone(), rt.handle().clone());

        let t0 = Instant::now();
        app.widget.set_query("123 Main", t0);
        app.tick(t0 + Duration::from_millis(100));
        assert_eq!(app.in_flight, 0, "debounce not elapsed yet");
        app.tick(t0 + Duration::from_millis(300));
        assert_eq!(app.in_flight, 1);

        pump(&mut app, |app| app.widget.is_dropdown_visible());
        assert_eq!(app.in_flight, 0);
        assert_eq!(app.widget.dropdown().len(), 1);
        assert_eq!(geocoder.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_lookup_hides_dropdown_without_panicking() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = App::new(
            &AppConfig::default(),
            Arc::new(ScriptedGeocoder::default()),
            rt.handle().clone(),
        );
        let t0 = Instant::now();
        app.widget.set_query("Nowhere", t0);
        app.tick(t0 + Duration::from_millis(300));

        pump(&mut app, |app| app.in_flight == 0);
        assert_eq!(app.in_flight, 0);
        assert!(!app.widget.is_dropdown_visible());
    }

    #[test]
    fn denied_geolocation_biases_next_search_with_fallback() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let geocoder = Arc::new(ScriptedGeocoder::default());
        let mut app = App::new(&AppConfig::default(), geocoder.clone(), rt.handle().clone());
        let fallback = Coordinate::new(-25.2744, 133.7751).unwrap();

        app.start_geolocation(Box::new(Unavailable), fallback);
        pump(&mut app, |app| app.widget.location_hint().is_some());
        assert_eq!(app.widget.location_hint(), Some(LocationHint::fallback(fallback)));

        let t0 = Instant::now();
        app.widget.set_query("Bay Rd", t0);
        app.tick(t0 + Duration::from_millis(300));
        pump(&mut app, |app| app.in_flight == 0);

        let calls = geocoder.calls.lock().unwrap();
        let (query, hint) = calls[0].clone();
        assert_eq!(query, "Bay Rd");
        assert_eq!(hint.map(|h| h.source), Some(HintSource::Fallback));
    }

    #[test]
    fn device_position_is_used_when_available() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = App::new(
            &AppConfig::default(),
            Arc::new(ScriptedGeocoder::default()),
            rt.handle().clone(),
        );
        let here = Coordinate::new(-27.47, 153.02).unwrap();
        app.start_geolocation(
            Box::new(StaticPosition(here)),
            Coordinate::new(-25.2744, 133.7751).unwrap(),
        );
        pump(&mut app, |app| app.widget.location_hint().is_some());
        assert_eq!(app.widget.location_hint(), Some(LocationHint::device(here)));
    }

    #[test]
    fn terminal_focus_loss_hides_after_grace() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = App::new(
            &AppConfig::default(),
            Arc::new(ScriptedGeocoder::default()),
            rt.handle().clone(),
        );
        let t0 = Instant::now();
        app.widget.set_query("Bay", t0);
        let req = app.widget.poll(t0 + Duration::from_millis(300)).unwrap();
        app.handle_async(app::async_tasks::AsyncResult::LookupFinished {
            seq: req.seq,
            result: Ok(vec![Candidate::new("Bay Rd", Address::default())]),
        });

        let t1 = t0 + Duration::from_secs(1);
        dispatch(&mut app, AppEvent::FocusLost, t1);
        app.tick(t1 + Duration::from_millis(50));
        assert!(app.widget.is_dropdown_visible());
        app.tick(t1 + Duration::from_millis(200));
        assert!(!app.widget.is_dropdown_visible());
    }
}
