use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use super::form::border_style;
use crate::app::{App, Focus};
use crate::ui::renderfns::truncate;

/// Name search and minimum age inputs above the table
pub fn draw_filter_bar(frame: &mut Frame, area: Rect, app: &App) {
  let search_active = app.focus() == Focus::Search;
  let age_active = app.focus() == Focus::AgeFilter;

  let label = |text: &'static str, active: bool| {
    let style = if active {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    Span::styled(text, style)
  };

  let search = app.search_input().value();
  let min_age = app.age_filter_input().value();

  let line = Line::from(vec![
    label(" / name: ", search_active),
    Span::raw(search.to_string()),
    Span::raw("   "),
    label("f min age: ", age_active),
    Span::raw(min_age.to_string()),
  ]);
  frame.render_widget(Paragraph::new(line), area);

  // " / name: " is 9 columns, "f min age: " is 11
  if search_active {
    let x = area.x + 9 + app.search_input().cursor_position() as u16;
    frame.set_cursor_position((x, area.y));
  } else if age_active {
    let offset = 9 + search.chars().count() as u16 + 3 + 11;
    let x = area.x + offset + app.age_filter_input().cursor_position() as u16;
    frame.set_cursor_position((x, area.y));
  }
}

/// Student table, one row per record in id order
pub fn draw_records(frame: &mut Frame, area: Rect, app: &App) {
  let rows = app.controller().rows();
  let focused = app.focus() == Focus::Table;

  let title = if app.is_loading() {
    " Students (loading...) ".to_string()
  } else if !app.controller().is_available() {
    " Students (database unavailable) ".to_string()
  } else {
    format!(" Students ({}) ", rows.len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(border_style(focused));

  if rows.is_empty() && !app.is_loading() {
    let content = if app.controller().filter().is_empty() {
      "No data available"
    } else {
      "No records match the filter"
    };
    let paragraph = Paragraph::new(content)
      .alignment(Alignment::Center)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let header = Row::new(vec!["ID", "Name", "Age"])
    .style(Style::default().fg(Color::Yellow).bold());

  let name_width = area.width.saturating_sub(20) as usize;
  let body: Vec<Row> = rows
    .iter()
    .map(|record| {
      Row::new(vec![
        Cell::from(record.id.to_string()).style(Style::default().fg(Color::DarkGray)),
        Cell::from(truncate(&record.name, name_width)),
        Cell::from(record.age.to_string()).style(Style::default().fg(Color::Cyan)),
      ])
    })
    .collect();

  let widths = [
    Constraint::Length(6),
    Constraint::Min(10),
    Constraint::Length(5),
  ];

  let table = Table::new(body, widths)
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = TableState::default();
  if !rows.is_empty() {
    state.select(Some(app.selected().min(rows.len() - 1)));
  }
  frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::controller::{Confirmation, FormState, RecordController};
  use crate::store::SqliteRecordStore;
  use ratatui::backend::TestBackend;

  #[tokio::test]
  async fn test_table_shows_record_ids() {
    let mut controller = RecordController::new(SqliteRecordStore::open_in_memory().unwrap());
    for (name, age) in [("Ana", "21"), ("Budi", "30")] {
      controller.submit(&FormState::new(name, age)).await.unwrap();
    }
    controller
      .request_delete(1, Confirmation::Accepted)
      .await
      .unwrap();
    let app = App::new(&Config::default(), controller, None);

    let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
    terminal
      .draw(|frame| draw_records(frame, frame.area(), &app))
      .unwrap();

    // Border, header, then the only remaining row
    let buffer = terminal.backend().buffer();
    let row: String = (0..40u16).map(|x| buffer[(x, 2)].symbol()).collect();
    assert!(row.contains("Budi"));
    assert!(row.contains('2'));
    assert!(!row.contains('1'));
  }
}
