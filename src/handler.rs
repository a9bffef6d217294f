use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, FocusPane, InputMode};
use crate::reminders::{self, AMOUNT_REQUIRED, GENERATION_FAILED};
use crate::situation::Mode;
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
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Mode tabs
        KeyCode::Char('1') => app.select_mode(Mode::Collect),
        KeyCode::Char('2') => app.select_mode(Mode::Negotiate),

        // Focus between form and results
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Form if app.reminders.is_some() => FocusPane::Results,
                _ => FocusPane::Form,
            };
        }

        KeyCode::Char('g') => trigger_generation(app),

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Form => app.field_down(),
            FocusPane::Results => app.output_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Form => app.field_up(),
            FocusPane::Results => app.output_up(),
        },

        // Select rows cycle, text rows open the editor
        KeyCode::Char('h') | KeyCode::Left => {
            if app.focus == FocusPane::Form {
                app.cycle_field(false);
            }
        }
        KeyCode::Char('l') | KeyCode::Right => {
            if app.focus == FocusPane::Form {
                app.cycle_field(true);
            }
        }
        KeyCode::Enter | KeyCode::Char('i') => match app.focus {
            FocusPane::Form => {
                let field = app.focused_field();
                if field.is_select() {
                    app.cycle_field(true);
                } else {
                    app.edit_cursor = app.field_value(field).chars().count();
                    app.input_mode = InputMode::Editing;
                }
            }
            FocusPane::Results => copy_selected_output(app),
        },

        KeyCode::Char('c') => {
            if app.focus == FocusPane::Results {
                copy_selected_output(app);
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let field = app.focused_field();

    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            if app.edit_cursor > 0 {
                let cursor = app.edit_cursor - 1;
                if let Some(value) = app.field_value_mut(field) {
                    let byte_pos = char_to_byte_index(value, cursor);
                    value.remove(byte_pos);
                }
                app.edit_cursor = cursor;
            }
        }
        KeyCode::Delete => {
            let cursor = app.edit_cursor;
            if let Some(value) = app.field_value_mut(field) {
                if cursor < value.chars().count() {
                    let byte_pos = char_to_byte_index(value, cursor);
                    value.remove(byte_pos);
                }
            }
        }
        KeyCode::Left => {
            app.edit_cursor = app.edit_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let len = app.field_value(field).chars().count();
            app.edit_cursor = (app.edit_cursor + 1).min(len);
        }
        KeyCode::Home => {
            app.edit_cursor = 0;
        }
        KeyCode::End => {
            app.edit_cursor = app.field_value(field).chars().count();
        }
        KeyCode::Char(c) => {
            let cursor = app.edit_cursor;
            if let Some(value) = app.field_value_mut(field) {
                let byte_pos = char_to_byte_index(value, cursor);
                value.insert(byte_pos, c);
                app.edit_cursor = cursor + 1;
            }
        }
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_api_key_input = false;
            app.api_key_input.clear();
            app.api_key_cursor = 0;
        }
        KeyCode::Enter => {
            let entered = app.api_key_input.trim().to_string();
            if !entered.is_empty() {
                app.set_api_key(&entered);
                app.show_api_key_input = false;
                app.api_key_input.clear();
                app.api_key_cursor = 0;
            }
        }
        KeyCode::Backspace => {
            if app.api_key_cursor > 0 {
                app.api_key_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.api_key_cursor = app.api_key_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let len = app.api_key_input.chars().count();
            app.api_key_cursor = (app.api_key_cursor + 1).min(len);
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_cursor += 1;
        }
        _ => {}
    }
}

/// Kick off one generation. Ignored while a request is in flight; the
/// missing-amount check happens here so no task is ever spawned for it.
fn trigger_generation(app: &mut App) {
    if app.loading {
        return;
    }

    if app.details.amount.trim().is_empty() {
        app.error = Some(AMOUNT_REQUIRED.to_string());
        return;
    }

    // No key yet: ask for one instead of failing the request
    let Some(client) = app.client.clone() else {
        app.show_api_key_input = true;
        return;
    };

    app.error = None;
    app.loading = true;
    app.animation_frame = 0;

    let model = app.model.clone();
    let details = app.details.clone();
    app.generate_task = Some(tokio::spawn(async move {
        reminders::generate(&client, &model, &details).await
    }));
}

/// Collect the outcome of a finished generation task, if any.
pub async fn settle_generation(app: &mut App) {
    if !app
        .generate_task
        .as_ref()
        .is_some_and(|task| task.is_finished())
    {
        return;
    }

    let Some(task) = app.generate_task.take() else {
        return;
    };
    app.loading = false;

    match task.await {
        Ok(Ok(set)) => {
            app.error = None;
            app.selected_output = 0;
            app.reminders = Some(set);
            app.focus = FocusPane::Results;
        }
        Ok(Err(_)) => {
            // Specifics were logged by the adapter; the user gets one message.
            app.error = Some(GENERATION_FAILED.to_string());
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "generation task aborted");
            app.error = Some(GENERATION_FAILED.to_string());
        }
    }
}

fn copy_selected_output(app: &mut App) {
    if let Some(slot) = app.selected_slot() {
        if let Some(text) = app.slot_text(slot) {
            if copy_to_clipboard(&text) {
                app.mark_copied(slot);
            }
        }
    }
}

/// Pipe the text through the first clipboard utility that spawns:
/// pbcopy (macOS), wl-copy (Wayland), xclip (X11).
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let candidates: [(&str, &[&str]); 3] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    for (cmd, args) in candidates {
        if let Ok(mut child) = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                if stdin.write_all(text.as_bytes()).is_ok() {
                    return true;
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn app() -> App {
        App::with_config(Config::default())
    }

    #[test]
    fn test_generate_with_empty_amount_sets_validation_error() {
        let mut app = app();
        trigger_generation(&mut app);

        assert_eq!(app.error.as_deref(), Some(AMOUNT_REQUIRED));
        assert!(!app.loading);
        assert!(app.generate_task.is_none());
    }

    #[test]
    fn test_generate_without_key_opens_key_popup() {
        let mut app = app();
        app.client = None;
        app.details.amount = "₹500".to_string();

        trigger_generation(&mut app);

        assert!(app.show_api_key_input);
        assert!(!app.loading);
        assert!(app.generate_task.is_none());
    }

    #[test]
    fn test_editing_inserts_at_cursor() {
        let mut app = app();
        app.details.amount = "₹50".to_string();
        app.input_mode = InputMode::Editing;
        app.edit_cursor = 3; // after "₹50"

        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Char('0')));
        assert_eq!(app.details.amount, "₹500");
        assert_eq!(app.edit_cursor, 4);

        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Backspace));
        assert_eq!(app.details.amount, "₹50");
    }

    #[test]
    fn test_char_to_byte_index_is_utf8_safe() {
        assert_eq!(char_to_byte_index("₹500", 1), 3);
        assert_eq!(char_to_byte_index("abc", 5), 3);
    }
}
