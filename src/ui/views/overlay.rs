use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Modal;
use crate::notify::ToastQueue;
use crate::ui::renderfns::{centered, toast_color, truncate};

const TOAST_WIDTH: u16 = 40;

/// Stack toasts in the top-right corner, newest on top
pub fn draw_toasts(frame: &mut Frame, area: Rect, toasts: &ToastQueue) {
  if toasts.is_empty() {
    return;
  }

  let width = TOAST_WIDTH.min(area.width);
  let mut y = area.y;

  let newest_first: Vec<_> = toasts.iter().collect();
  for toast in newest_first.into_iter().rev() {
    if y + 3 > area.y + area.height {
      break;
    }
    let rect = Rect::new(area.x + area.width - width, y, width, 3);
    let color = toast_color(toast.kind);

    frame.render_widget(Clear, rect);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(color));
    let text = truncate(&toast.message, width.saturating_sub(2) as usize);
    frame.render_widget(
      Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(color)),
      rect,
    );
    y += 3;
  }
}

pub fn draw_modal(frame: &mut Frame, area: Rect, modal: &Modal) {
  let (title, question) = match modal {
    Modal::ConfirmDelete(_) => (" Delete ", "Are you sure you want to delete this record?".to_string()),
    Modal::ConfirmInstall(prompt) => (
      " Install ",
      format!(
        "Install rollbook for offline use ({})?",
        prompt.offer().generation
      ),
    ),
  };

  let rect = centered(area, 50, 6);
  frame.render_widget(Clear, rect);

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  let text = vec![
    Line::from(question),
    Line::from(""),
    Line::from(vec![
      Span::styled("<y>", Style::default().fg(Color::Cyan)),
      Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
      Span::styled("<n>", Style::default().fg(Color::Cyan)),
      Span::styled(" no", Style::default().fg(Color::DarkGray)),
    ]),
  ];

  frame.render_widget(
    Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
    rect,
  );
}
