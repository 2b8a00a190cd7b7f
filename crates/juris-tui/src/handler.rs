use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use juris_core::Mode;
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_query().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_mode_picker {
        handle_mode_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_mode_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.show_mode_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.mode_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.mode_picker_nav_up(),
        KeyCode::Enter => app.select_mode(),
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.focus = FocusPane::Input;
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = app.half_page();
            app.scroll_chat_down(half);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = app.half_page();
            app.scroll_chat_up(half);
        }
        KeyCode::Char('g') => app.scroll_chat_to_top(),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        // Details pane
        KeyCode::Char('n') => app.select_next_detail(),
        KeyCode::Char('p') => app.select_prev_detail(),
        KeyCode::Char('J') => app.scroll_details_down(1),
        KeyCode::Char('K') => app.scroll_details_up(1),
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Chat => FocusPane::Details,
                FocusPane::Details | FocusPane::Input => FocusPane::Chat,
            };
        }

        // Mode selection
        KeyCode::Char('m') => app.open_mode_picker(),
        KeyCode::Char('1') => app.conversation.set_mode(Mode::Naive),
        KeyCode::Char('2') => app.conversation.set_mode(Mode::Advanced),
        KeyCode::Char('3') => app.conversation.set_mode(Mode::Compare),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let input = &mut app.conversation.input;
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Chat;
        }
        KeyCode::Enter => app.send_query(),
        KeyCode::Backspace => {
            if app.query_cursor > 0 {
                app.query_cursor -= 1;
                let byte_pos = char_to_byte_index(input, app.query_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if app.query_cursor < char_count {
                let byte_pos = char_to_byte_index(input, app.query_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.query_cursor = app.query_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            app.query_cursor = (app.query_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.query_cursor = 0;
        }
        KeyCode::End => {
            app.query_cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, app.query_cursor);
            input.insert(byte_pos, c);
            app.query_cursor += 1;
        }
        _ => {}
    }
}

/// Pasted text lands at the cursor on a single line.
fn handle_paste(app: &mut App, text: &str) {
    if app.input_mode != InputMode::Editing {
        return;
    }
    let flattened: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let byte_pos = char_to_byte_index(&app.conversation.input, app.query_cursor);
    app.conversation.input.insert_str(byte_pos, &flattened);
    app.query_cursor += flattened.chars().count();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Position-based scrolling
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_details = app.details_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_details {
                app.scroll_details_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_details {
                app.scroll_details_up(3);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use juris_core::{AnswerClient, ChatResponse, ClientError};
    use std::sync::Arc;

    struct NeverCalled;

    #[async_trait]
    impl AnswerClient for NeverCalled {
        async fn send(&self, _query: &str, _mode: Mode) -> Result<ChatResponse, ClientError> {
            Err(ClientError::Decode("unexpected call".into()))
        }
    }

    fn app() -> App {
        App::new(Arc::new(NeverCalled), "http://test".to_string(), Mode::Advanced)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "décret";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_editing_inserts_at_cursor() {
        let mut app = app();
        type_str(&mut app, "garntie");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        type_str(&mut app, "a");
        assert_eq!(app.conversation.input, "garantie");
        assert_eq!(app.query_cursor, 4);
    }

    #[test]
    fn test_backspace_and_delete_handle_accents() {
        let mut app = app();
        type_str(&mut app, "préavis");
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.conversation.input, "pravis");
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.conversation.input, "prvis");
        press(&mut app, KeyCode::End);
        assert_eq!(app.query_cursor, 5);
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let mut app = app();
        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.conversation.len(), 1);
        assert!(!app.is_loading());
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_number_keys_switch_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.conversation.mode(), Mode::Compare);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.conversation.mode(), Mode::Naive);
    }

    #[test]
    fn test_mode_picker_swallows_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('m'));
        assert!(app.show_mode_picker);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_mode_picker);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let mut app = app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut app = app();
        type_str(&mut app, "ab");
        press(&mut app, KeyCode::Left);
        handle_paste(&mut app, "x\ny");
        assert_eq!(app.conversation.input, "ax yb");
        assert_eq!(app.query_cursor, 4);
    }
}
