use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::truncate;
use crate::app::WorkerStatus;

/// Draw the header bar with name, database, and offline status
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  database: &str,
  worker: &WorkerStatus,
  loading: bool,
) {
  let (status, color) = worker_label(worker);

  let mut spans = vec![
    Span::styled(" rollbook ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", database), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", status), Style::default().fg(color)),
  ];

  if loading {
    spans.push(Span::styled(
      " loading... ",
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn worker_label(worker: &WorkerStatus) -> (String, Color) {
  match worker {
    WorkerStatus::Disabled => ("offline cache off".to_string(), Color::DarkGray),
    WorkerStatus::Registering => ("registering...".to_string(), Color::Yellow),
    WorkerStatus::Ready(registration) => (
      format!("cached {} ({})", registration.generation, registration.cached),
      Color::Green,
    ),
    WorkerStatus::Failed(reason) => (
      format!("offline cache unavailable: {}", truncate(reason, 40)),
      Color::Red,
    ),
  }
}
