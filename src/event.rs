use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::offline::Registration;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for toast expiry
  Tick,
  /// Report from the offline worker's context
  Worker(WorkerEvent),
}

#[derive(Debug)]
pub enum WorkerEvent {
  Registered(Registration),
  RegistrationFailed(String),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    let input_tx = tx.clone();

    // Terminal polling blocks, so it gets a blocking thread
    tokio::task::spawn_blocking(move || loop {
      let event = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
          _ => continue,
        }
      } else {
        Event::Tick
      };

      if input_tx.send(event).is_err() {
        break;
      }
    });

    Self { tx, rx }
  }

  /// Sender for tasks that report back into the event loop
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
