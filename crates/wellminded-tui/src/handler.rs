use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, Instant::now()),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse, Instant::now()),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(Instant::now()),
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // An open alert swallows everything until it is dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Landing, _) => handle_landing(app, key, now),
        (Screen::Capture, InputMode::Normal) => handle_capture_normal(app, key, now),
        (Screen::Capture, InputMode::Editing) => handle_capture_editing(app, key),
    }
}

fn handle_landing(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('g') => app.landing.start(now),
        KeyCode::Char('m') => app.landing.toggle_menu(now),
        _ => {}
    }
}

fn handle_capture_normal(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Camera
        KeyCode::Char(' ') | KeyCode::Char('c') => app.capture(now),
        KeyCode::Char('r') => app.retry(),

        // Message
        KeyCode::Char('i') | KeyCode::Tab | KeyCode::Enter => {
            app.message_cursor = app.session.message().chars().count();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('s') => app.send(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_up(app.chat_height / 2);
        }
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Home => app.chat_scroll = 0,
        _ => {}
    }
}

fn handle_capture_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send(),
        KeyCode::Backspace => {
            if app.message_cursor > 0 {
                app.message_cursor -= 1;
                let message = app.session.message_mut();
                let byte_pos = char_to_byte_index(message, app.message_cursor);
                message.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let message = app.session.message_mut();
            if app.message_cursor < message.chars().count() {
                let byte_pos = char_to_byte_index(message, app.message_cursor);
                message.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.message_cursor = app.message_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.message().chars().count();
            app.message_cursor = (app.message_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.message_cursor = 0;
        }
        KeyCode::End => {
            app.message_cursor = app.session.message().chars().count();
        }
        KeyCode::Char(c) => {
            let message = app.session.message_mut();
            let byte_pos = char_to_byte_index(message, app.message_cursor);
            message.insert(byte_pos, c);
            app.message_cursor += 1;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

pub fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    if app.alert.is_some() || app.screen != Screen::Capture {
        return;
    }

    let x = mouse.column;
    let y = mouse.row;
    let in_video = app.video_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp if in_chat => app.scroll_chat_up(3),
        // Clicking the video pane acts like its capture / retry icon
        MouseEventKind::Down(MouseButton::Left) if in_video => {
            if app.session.captured().is_some() && !app.session.is_flashing() {
                app.retry();
            } else {
                app.capture(now);
            }
        }
        _ => {}
    }
}
