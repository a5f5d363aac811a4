use std::time::Instant;

use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use addrfill_core::{FormFieldId, NavKey};

use crate::app::{App, Focus};

/// Route a key press to the focused input.
pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers, now: Instant) {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.focus {
        Focus::Search => handle_search_key(app, code, modifiers, now),
        Focus::Field(id) => handle_field_key(app, id, code, modifiers, now),
    }
}

fn handle_search_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers, now: Instant) {
    let nav = match code {
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Esc => Some(NavKey::Escape),
        _ => None,
    };
    if nav.is_some_and(|nav| app.widget.handle_nav(nav)) {
        return;
    }

    match code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => {
            if !app.widget.form().is_revealed() {
                app.status_message = "Pick a suggestion with ↑/↓ and Enter".to_string();
            }
        }
        KeyCode::Tab => app.focus_next(now),
        KeyCode::BackTab => app.focus_prev(now),
        KeyCode::Char('w') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.widget.delete_word_back(now)
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.widget.set_query("", now)
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.widget.insert_char(c, now)
        }
        KeyCode::Backspace => app.widget.delete_back(now),
        KeyCode::Left => app.widget.cursor_left(),
        KeyCode::Right => app.widget.cursor_right(),
        KeyCode::Home => app.widget.cursor_home(),
        KeyCode::End => app.widget.cursor_end(),
        _ => {}
    }
}

fn handle_field_key(
    app: &mut App,
    id: FormFieldId,
    code: KeyCode,
    modifiers: KeyModifiers,
    now: Instant,
) {
    match code {
        KeyCode::Tab | KeyCode::Down | KeyCode::Enter => app.focus_next(now),
        KeyCode::BackTab | KeyCode::Up => app.focus_prev(now),
        KeyCode::Esc => app.set_focus(Focus::Search, now),
        _ => {
            let field = app.widget.form_mut().field_mut(id);
            if !field.enabled {
                return;
            }
            let input = &mut field.input;
            match code {
                KeyCode::Char('w') if modifiers.contains(KeyModifiers::CONTROL) => {
                    input.delete_word_back();
                }
                KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
                KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    input.insert_char(c)
                }
                KeyCode::Backspace => {
                    input.delete_back();
                }
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                KeyCode::Home => input.home(),
                KeyCode::End => input.end(),
                _ => {}
            }
        }
    }
}

/// Pointer hover and clicks over the dropdown and inputs.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Moved => {
            if let Some(index) = app.layout.dropdown_row_at(column, row) {
                app.widget.pointer_enter(index);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = app.layout.dropdown_row_at(column, row) {
                app.widget.click(index);
            } else if app.layout.search_contains(column, row) {
                app.set_focus(Focus::Search, now);
            } else if let Some(id) = app.layout.field_at(column, row) {
                app.set_focus(Focus::Field(id), now);
            }
        }
        _ => {}
    }
}

/// Bracketed paste goes into the focused input as typed text.
pub fn handle_paste(app: &mut App, text: &str, now: Instant) {
    let text = text.replace(['\r', '\n'], " ");
    match app.focus {
        Focus::Search => {
            for c in text.chars() {
                app.widget.insert_char(c, now);
            }
        }
        Focus::Field(id) => {
            let field = app.widget.form_mut().field_mut(id);
            if field.enabled {
                for c in text.chars() {
                    field.input.insert_char(c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;

    use addrfill_core::{Address, AppConfig, Candidate};

    use super::*;
    use crate::app::async_tasks::AsyncResult;
    use crate::app::test_support::ScriptedGeocoder;

    fn create_app(rt: &tokio::runtime::Runtime) -> App {
        App::new(
            &AppConfig::default(),
            Arc::new(ScriptedGeocoder::default()),
            rt.handle().clone(),
        )
    }

    fn type_keys(app: &mut App, s: &str, now: Instant) {
        for c in s.chars() {
            handle_key(app, KeyCode::Char(c), KeyModifiers::NONE, now);
        }
    }

    fn show(app: &mut App, now: Instant, labels: &[&str]) {
        type_keys(app, "Bay", now);
        app.widget.poll(now + Duration::from_millis(300)).unwrap();
        let seq = 1;
        app.handle_async(AsyncResult::LookupFinished {
            seq,
            result: Ok(labels
                .iter()
                .map(|l| Candidate::new(*l, Address {
                    road: Some(format!("{l} Rd")),
                    ..Address::default()
                }))
                .collect()),
        });
    }

    #[test]
    fn typing_updates_search_input() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();
        type_keys(&mut app, "12 Ba", now);
        handle_key(&mut app, KeyCode::Backspace, KeyModifiers::NONE, now);
        assert_eq!(app.widget.input().value, "12 B");
        assert!(app.widget.has_pending_lookup());
    }

    #[test]
    fn arrows_and_enter_commit_selection() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();
        show(&mut app, now, &["Alpha", "Beta"]);

        handle_key(&mut app, KeyCode::Down, KeyModifiers::NONE, now);
        handle_key(&mut app, KeyCode::Down, KeyModifiers::NONE, now);
        handle_key(&mut app, KeyCode::Enter, KeyModifiers::NONE, now);

        assert_eq!(app.widget.input().value, "Beta");
        assert_eq!(app.widget.form().value(FormFieldId::Route), "Beta Rd");
        assert!(!app.should_quit);
    }

    #[test]
    fn escape_closes_dropdown_then_quits() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();
        show(&mut app, now, &["Alpha"]);

        handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE, now);
        assert!(!app.widget.is_dropdown_visible());
        assert!(!app.should_quit);
        handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE, now);
        assert!(app.should_quit);
    }

    #[test]
    fn tab_blurs_search_and_walks_revealed_fields() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();

        handle_key(&mut app, KeyCode::Tab, KeyModifiers::NONE, now);
        assert_eq!(app.focus, Focus::Search, "hidden fields are not focusable");

        show(&mut app, now, &["Alpha"]);
        app.widget.commit(0);
        handle_key(&mut app, KeyCode::Tab, KeyModifiers::NONE, now);
        assert_eq!(app.focus, Focus::Field(FormFieldId::StreetNumber));
        type_keys(&mut app, "9A", now);
        assert_eq!(app.widget.form().value(FormFieldId::StreetNumber), "9A");

        handle_key(&mut app, KeyCode::BackTab, KeyModifiers::NONE, now);
        assert_eq!(app.focus, Focus::Search);
    }

    #[test]
    fn control_keys_in_field_edit_instead_of_inserting() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();
        show(&mut app, now, &["Alpha"]);
        app.widget.commit(0);
        handle_key(&mut app, KeyCode::Tab, KeyModifiers::NONE, now);
        handle_key(&mut app, KeyCode::Tab, KeyModifiers::NONE, now);
        assert_eq!(app.focus, Focus::Field(FormFieldId::Route));
        assert_eq!(app.widget.form().value(FormFieldId::Route), "Alpha Rd");

        handle_key(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL, now);
        assert_eq!(app.widget.form().value(FormFieldId::Route), "Alpha ");
        handle_key(&mut app, KeyCode::Char('x'), KeyModifiers::CONTROL, now);
        assert_eq!(app.widget.form().value(FormFieldId::Route), "Alpha ");
        handle_key(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL, now);
        assert_eq!(app.widget.form().value(FormFieldId::Route), "");
        assert!(!app.should_quit);
    }

    #[test]
    fn mouse_hover_and_click_on_dropdown_rows() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        let now = Instant::now();
        show(&mut app, now, &["Alpha", "Beta", "Gamma"]);
        app.layout.dropdown_rows = Some(Rect::new(2, 5, 40, 3));

        let moved = MouseEvent {
            kind: MouseEventKind::Moved,
            column: 10,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, moved, now);
        assert_eq!(app.widget.dropdown().selected(), Some(2));

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: 6,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, click, now);
        assert_eq!(app.widget.input().value, "Beta");
    }

    #[test]
    fn paste_flattens_newlines() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = create_app(&rt);
        handle_paste(&mut app, "1 Queen St\nBrisbane", Instant::now());
        assert_eq!(app.widget.input().value, "1 Queen St Brisbane");
    }
}
