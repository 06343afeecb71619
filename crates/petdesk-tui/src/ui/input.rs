//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_email_char, can_add_password_char, can_add_text_char, App, AppState, FormField,
    LoginFocus, RegisterFocus, Screen, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_delete().await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.screen {
        Screen::Login => handle_login_input(app, key).await,
        Screen::Register => handle_register_input(app, key).await,
        Screen::Dogs => handle_dogs_input(app, key).await,
        Screen::DogForm => handle_form_input(app, key).await,
        Screen::Cats => handle_cats_input(app, key).await,
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Submit => app.attempt_login().await,
            LoginFocus::Register => app.navigate(Screen::Register).await,
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Submit | LoginFocus::Register => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Submit | LoginFocus::Register => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.navigate(Screen::Login).await,
        KeyCode::Tab | KeyCode::Down => {
            app.register_focus = app.register_focus.next();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.register_focus = app.register_focus.prev();
        }
        KeyCode::Enter => match app.register_focus {
            RegisterFocus::Name | RegisterFocus::Email => {
                app.register_focus = app.register_focus.next();
            }
            RegisterFocus::Password | RegisterFocus::Submit => app.attempt_register().await,
            RegisterFocus::Back => app.navigate(Screen::Login).await,
        },
        KeyCode::Backspace => {
            if let Some(field) = register_field_mut(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let allowed = match app.register_focus {
                RegisterFocus::Name => can_add_text_char(app.register_name.chars().count(), c),
                RegisterFocus::Email => can_add_email_char(app.register_email.chars().count(), c),
                RegisterFocus::Password => {
                    can_add_password_char(app.register_password.chars().count(), c)
                }
                RegisterFocus::Submit | RegisterFocus::Back => false,
            };
            if allowed {
                if let Some(field) = register_field_mut(app) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

fn register_field_mut(app: &mut App) -> Option<&mut String> {
    match app.register_focus {
        RegisterFocus::Name => Some(&mut app.register_name),
        RegisterFocus::Email => Some(&mut app.register_email),
        RegisterFocus::Password => Some(&mut app.register_password),
        RegisterFocus::Submit | RegisterFocus::Back => None,
    }
}

async fn handle_dogs_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.dog_selection = 0,
        KeyCode::End => app.select_next(app.dogs.len()),
        KeyCode::Char('n') | KeyCode::Char('a') => app.open_create_form(),
        KeyCode::Enter | KeyCode::Char('e') => app.open_edit_form().await,
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('r') | KeyCode::Char('u') => {
            app.status_message = None;
            app.refresh_dogs().await;
        }
        KeyCode::Char('c') => app.navigate(Screen::Cats).await,
        KeyCode::Char('l') => app.logout(),
        _ => {}
    }
    Ok(false)
}

async fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Tab | KeyCode::Down => {
            app.form.focus = app.form.focus.next();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.form.focus = app.form.focus.prev();
        }
        KeyCode::Enter => match app.form.focus {
            FormField::Name | FormField::Breed | FormField::Age => {
                app.form.focus = app.form.focus.next();
            }
            FormField::Active => app.form.toggle_active(),
            FormField::Submit => app.submit_form().await,
            FormField::Cancel => app.cancel_form(),
        },
        KeyCode::Char(' ') if app.form.focus == FormField::Active => {
            app.form.toggle_active();
        }
        KeyCode::Backspace => {
            if let Some(field) = app.form.focused_text_mut() {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            if app.form.can_add_char(c) {
                if let Some(field) = app.form.focused_text_mut() {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_cats_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('g') => {
            app.navigate(Screen::Dogs).await;
        }
        KeyCode::Char('r') | KeyCode::Char('u') => app.load_cats().await,
        KeyCode::Char('l') => app.logout(),
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use petdesk_core::auth::MemoryCredentialStore;
    use petdesk_core::Config;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(store: MemoryCredentialStore) -> App {
        let config = Config {
            api_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        App::with_store(config, Arc::new(store)).unwrap()
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_login_typing_and_focus() {
        let mut app = app(MemoryCredentialStore::new());
        app.start_login();
        type_text(&mut app, "a@b.com").await;
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "secret1").await;
        handle_input(&mut app, key(KeyCode::Backspace)).await.unwrap();

        assert_eq!(app.login_email, "a@b.com");
        assert_eq!(app.login_password, "secret");
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_login_register_link() {
        let mut app = app(MemoryCredentialStore::new());
        app.start_login();
        app.login_focus = LoginFocus::Register;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.screen, Screen::Register);

        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.screen, Screen::Login);
    }

    #[tokio::test]
    async fn test_form_age_accepts_digits_only() {
        let mut app = app(MemoryCredentialStore::with_token("tok"));
        app.open_create_form();
        app.form.focus = FormField::Age;
        type_text(&mut app, "1x2-").await;
        assert_eq!(app.form.age, "12");

        app.form.focus = FormField::Active;
        handle_input(&mut app, key(KeyCode::Char(' '))).await.unwrap();
        assert!(!app.form.active());
    }

    #[tokio::test]
    async fn test_form_escape_returns_to_list() {
        let mut app = app(MemoryCredentialStore::with_token("tok"));
        app.open_create_form();
        type_text(&mut app, "Fido").await;
        assert_eq!(app.form.name, "Fido");
        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.screen, Screen::Dogs);
        assert!(app.form.name.is_empty());
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = app(MemoryCredentialStore::with_token("tok"));
        app.screen = Screen::Dogs;
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_logout_key_clears_session() {
        let mut app = app(MemoryCredentialStore::with_token("tok"));
        app.screen = Screen::Cats;
        handle_input(&mut app, key(KeyCode::Char('l'))).await.unwrap();
        assert!(!app.is_authenticated());
        assert_eq!(app.screen, Screen::Login);
    }
}
