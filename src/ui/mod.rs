pub mod components;
mod renderfns;
mod views;

use crate::app::{App, Focus};
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    app.database_label(),
    app.worker_status(),
    app.is_loading(),
  );

  let columns = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Length(36), Constraint::Min(20)])
    .split(chunks[1]);

  views::draw_form(frame, columns[0], app);

  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(1)])
    .split(columns[1]);

  views::draw_filter_bar(frame, right[0], app);
  views::draw_records(frame, right[1], app);

  renderfns::draw_footer(frame, chunks[2], &footer_hints(app));

  if let Some(modal) = app.modal() {
    views::draw_modal(frame, chunks[1], modal);
  }
  views::draw_toasts(frame, chunks[1], app.controller().toasts());
}

fn footer_hints(app: &App) -> Vec<(&'static str, &'static str)> {
  if app.modal().is_some() {
    return vec![("y", "confirm"), ("n", "cancel")];
  }

  match app.focus() {
    Focus::Table => {
      let mut hints = vec![
        ("a", "add"),
        ("e", "edit"),
        ("d", "delete"),
        ("/", "search"),
        ("f", "min age"),
        ("r", "reload"),
      ];
      if app.install_available() {
        hints.push(("i", "install"));
      }
      hints.push(("q", "quit"));
      hints
    }
    Focus::Form => vec![("Enter", "save"), ("Tab", "next field"), ("Esc", "reset")],
    Focus::Search | Focus::AgeFilter => vec![("Enter", "done"), ("Esc", "clear")],
  }
}
