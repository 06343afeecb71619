use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, FormField, LoginFocus, RegisterFocus, Screen};

use super::styles;

/// Visible width of text input fields
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(8),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    match app.screen {
        Screen::Login => render_login(frame, app, chunks[1]),
        Screen::Register => render_register(frame, app, chunks[1]),
        Screen::Dogs => render_dogs(frame, app, chunks[1]),
        Screen::DogForm => render_dog_form(frame, app, chunks[1]),
        Screen::Cats => render_cats(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  petdesk · {}", app.screen.title());
    let right = match app.user {
        Some(ref user) => format!("{}  [?] Help", user.display_name()),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.screen {
        Screen::Login => "[Tab] next field | [Enter] submit | [Esc] quit",
        Screen::Register => "[Tab] next field | [Enter] submit | [Esc] back",
        Screen::Dogs => "[n]ew | [e]dit | [d]elete | [c]ats | [r]efresh | [l]ogout | [q]uit",
        Screen::DogForm => "[Tab] next field | [Space] toggle | [Esc] cancel",
        Screen::Cats => "[b]ack | [r]efresh | [l]ogout | [q]uit",
    };

    let left_text = app
        .status_message
        .as_ref()
        .map(|msg| format!(" {} ", msg))
        .unwrap_or_default();
    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

/// A labelled `[value▌]` input line.
fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let shown: String = value
        .chars()
        .skip(value.chars().count().saturating_sub(FIELD_WIDTH))
        .collect();
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::styled(format!("  {:>9} [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

fn button_line(labels: &[(&str, bool)]) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (label, focused) in labels {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!(" {} ", label), styles::button_style(*focused)));
    }
    Line::from(spans)
}

fn error_lines(lines: &mut Vec<Line<'static>>, error: Option<&String>) {
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }
}

fn render_dialog(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(52, height, area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        field_line("Email", &app.login_email, app.login_focus == LoginFocus::Email),
        field_line(
            "Password",
            &masked(&app.login_password),
            app.login_focus == LoginFocus::Password,
        ),
        Line::from(""),
        button_line(&[
            ("Sign in", app.login_focus == LoginFocus::Submit),
            ("Create account", app.login_focus == LoginFocus::Register),
        ]),
    ];
    error_lines(&mut lines, app.auth_error.as_ref());

    render_dialog(frame, area, "Sign in", lines);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let focus = app.register_focus;
    let mut lines = vec![
        Line::from(""),
        field_line("Name", &app.register_name, focus == RegisterFocus::Name),
        field_line("Email", &app.register_email, focus == RegisterFocus::Email),
        field_line(
            "Password",
            &masked(&app.register_password),
            focus == RegisterFocus::Password,
        ),
        Line::from(Span::styled(
            "             at least 6 characters",
            styles::muted_style(),
        )),
        Line::from(""),
        button_line(&[
            ("Create account", focus == RegisterFocus::Submit),
            ("Back to sign in", focus == RegisterFocus::Back),
        ]),
    ];
    error_lines(&mut lines, app.auth_error.as_ref());

    render_dialog(frame, area, "Create account", lines);
}

fn render_dogs(frame: &mut Frame, app: &App, area: Rect) {
    let mut constraints = vec![Constraint::Min(3)];
    if app.dogs_error.is_some() {
        constraints.insert(0, Constraint::Length(1));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let list_area = if let Some(ref error) = app.dogs_error {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", error), styles::error_style())),
            chunks[0],
        );
        chunks[1]
    } else {
        chunks[0]
    };

    let block = Block::default()
        .title(format!(" Dogs ({}) ", app.dogs.len()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.dogs.is_empty() {
        let empty = Paragraph::new(Span::styled(
            " No dogs found. Press [n] to add your first dog!",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(empty, list_area);
        return;
    }

    let items: Vec<ListItem> = app
        .dogs
        .iter()
        .map(|dog| {
            let mut spans = vec![
                Span::styled(format!(" {:<20}", dog.name), styles::list_item_style()),
                Span::styled(format!("{:<20}", dog.breed), styles::muted_style()),
                Span::styled(
                    format!("{:<10}", dog.age_display().unwrap_or_default()),
                    styles::muted_style(),
                ),
            ];
            if let (Some(label), Some(active)) = (dog.status_label(), dog.is_active) {
                spans.push(Span::styled(label, styles::status_style(active)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style())
        .highlight_symbol("▶");

    let mut state = ListState::default().with_selected(Some(app.dog_selection));
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn render_dog_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.form;
    let checkbox = if form.active() { "[x] Active" } else { "[ ] Active" };
    let active_style = if form.focus == FormField::Active {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let mut lines = vec![
        Line::from(""),
        field_line("Name *", &form.name, form.focus == FormField::Name),
        field_line("Breed *", &form.breed, form.focus == FormField::Breed),
        field_line("Age", &form.age, form.focus == FormField::Age),
        Line::from(vec![
            Span::raw("             "),
            Span::styled(checkbox, active_style),
        ]),
        Line::from(""),
        button_line(&[
            ("Save", form.focus == FormField::Submit),
            ("Cancel", form.focus == FormField::Cancel),
        ]),
    ];
    error_lines(&mut lines, form.error.as_ref());

    render_dialog(frame, area, &form.heading(), lines);
}

fn render_cats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Cats ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = match (&app.cats_error, &app.cats) {
        (Some(error), _) => Paragraph::new(Span::styled(format!(" {}", error), styles::error_style())),
        (None, Some(text)) => Paragraph::new(text.clone()).style(styles::list_item_style()),
        (None, None) => Paragraph::new(Span::styled(" Loading...", styles::muted_style())),
    };

    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Dogs", styles::highlight_style())),
        key("↑/↓ j/k", "Navigate list"),
        key("n", "Add a dog"),
        key("Enter/e", "Edit selected dog"),
        key("d", "Delete selected dog"),
        key("r", "Reload from server"),
        key("c", "View cats"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        key("l", "Log out"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let area = frame.area();
    render_dialog(frame, area, "Help", lines);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let name = app
        .selected_dog()
        .map(|d| d.name.clone())
        .unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Are you sure you want to delete {}?", name),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];
    let area = frame.area();
    render_dialog(frame, area, "Delete dog", lines);
}

fn render_quit_overlay(frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];
    let area = frame.area();
    render_dialog(frame, area, "Quit", lines);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use petdesk_core::auth::MemoryCredentialStore;
    use petdesk_core::models::Dog;
    use petdesk_core::Config;
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let r = centered_rect_fixed(52, 10, Rect::new(0, 0, 40, 5));
        assert_eq!(r.width, 40);
        assert_eq!(r.height, 5);
        let r = centered_rect_fixed(10, 4, Rect::new(0, 0, 30, 10));
        assert_eq!((r.x, r.y), (10, 3));
    }

    #[test]
    fn test_render_dog_list() {
        let config = Config {
            api_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let mut app =
            App::with_store(config, Arc::new(MemoryCredentialStore::with_token("tok"))).unwrap();
        app.screen = Screen::Dogs;
        app.dogs = vec![Dog {
            id: 1,
            name: "Rex".to_string(),
            breed: "Collie".to_string(),
            age: Some(1),
            is_active: Some(false),
        }];

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Rex"));
        assert!(text.contains("1 year"));
        assert!(text.contains("Inactive"));
    }
}
