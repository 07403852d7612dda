use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, Focus, FormField};
use crate::ui::components::TextInput;

/// Add/edit panel. The record id is never shown; only the title tells
/// whether submitting creates or updates.
pub fn draw_form(frame: &mut Frame, area: Rect, app: &App) {
  let focused = app.focus() == Focus::Form;
  let title = if app.editing().is_some() {
    " Edit student "
  } else {
    " New student "
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(border_style(focused));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Name label
      Constraint::Length(1), // Name input
      Constraint::Length(1),
      Constraint::Length(1), // Age label
      Constraint::Length(1), // Age input
      Constraint::Length(1),
      Constraint::Min(0), // Hint
    ])
    .split(inner);

  let name_active = focused && app.field() == FormField::Name;
  let age_active = focused && app.field() == FormField::Age;

  draw_field(frame, rows[0], rows[1], "Name", app.name_input(), name_active);
  draw_field(frame, rows[3], rows[4], "Age", app.age_input(), age_active);

  let hint = if focused {
    "Enter: save  Tab: next field  Esc: reset"
  } else {
    "a: new  e: edit selected"
  };
  frame.render_widget(
    Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
    rows[6],
  );
}

fn draw_field(
  frame: &mut Frame,
  label_area: Rect,
  input_area: Rect,
  label: &str,
  input: &TextInput,
  active: bool,
) {
  let label_style = if active {
    Style::default().fg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::White)
  };
  frame.render_widget(Paragraph::new(label).style(label_style), label_area);

  let line = Line::from(vec![
    Span::styled("> ", Style::default().fg(Color::DarkGray)),
    Span::raw(input.value()),
  ]);
  frame.render_widget(Paragraph::new(line), input_area);

  if active {
    frame.set_cursor_position((
      input_area.x + 2 + input.cursor_position() as u16,
      input_area.y,
    ));
  }
}

pub(super) fn border_style(focused: bool) -> Style {
  if focused {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::Blue)
  }
}
