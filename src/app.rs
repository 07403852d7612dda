use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::controller::{Confirmation, FormState, RecordController, RecordFilter};
use crate::event::{Event, EventHandler, WorkerEvent};
use crate::install::{DeferredPrompt, InstallChoice, InstallOffer, PendingPrompt};
use crate::offline::{Registration, WorkerHandle};
use crate::record::RecordId;
use crate::store::SqliteRecordStore;
use crate::ui;
use crate::ui::components::{InputResult, TextInput};

/// Which part of the screen receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Table,
  Form,
  Search,
  AgeFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  Name,
  Age,
}

/// Dialog that captures all keys until answered
#[derive(Debug)]
pub enum Modal {
  ConfirmDelete(RecordId),
  ConfirmInstall(PendingPrompt),
}

/// Storage work queued by a key press, run before the next event is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
  Load,
  Submit,
  Delete(RecordId, Confirmation),
  Edit(RecordId),
}

#[derive(Debug, Clone)]
pub enum WorkerStatus {
  Disabled,
  Registering,
  Ready(Registration),
  Failed(String),
}

/// Open the record database for the UI. Without a data directory the records
/// live in memory for this session only, and the user is told so.
pub async fn open_controller(
  database: Result<PathBuf>,
  toast_ttl: Duration,
) -> RecordController<SqliteRecordStore> {
  let (opened, transient) = match database {
    Ok(path) => (SqliteRecordStore::open(path).await, false),
    Err(e) => {
      warn!(error = %e, "no data directory, keeping records in memory");
      (SqliteRecordStore::open_in_memory(), true)
    }
  };

  let mut controller = RecordController::from_open(opened).with_toast_ttl(toast_ttl);
  if transient && controller.is_available() {
    controller
      .toasts_mut()
      .warning("No data directory; records will not be saved");
  }
  controller
}

/// Main application state
pub struct App {
  controller: RecordController<SqliteRecordStore>,
  database_label: String,

  focus: Focus,
  field: FormField,
  /// Hidden id of the record being edited
  editing: Option<RecordId>,
  name_input: TextInput,
  age_input: TextInput,
  search_input: TextInput,
  age_filter_input: TextInput,
  selected: usize,

  modal: Option<Modal>,
  pending: Option<Pending>,

  install_prompt: DeferredPrompt,
  worker: Option<WorkerHandle>,
  worker_status: WorkerStatus,

  should_quit: bool,
}

impl App {
  pub fn new(
    config: &Config,
    controller: RecordController<SqliteRecordStore>,
    worker: Option<WorkerHandle>,
  ) -> Self {
    let worker_status = if worker.is_some() {
      WorkerStatus::Registering
    } else {
      WorkerStatus::Disabled
    };

    Self {
      controller,
      database_label: config.database.name.clone(),
      focus: Focus::Table,
      field: FormField::Name,
      editing: None,
      name_input: TextInput::new(),
      age_input: TextInput::numeric(),
      search_input: TextInput::new(),
      age_filter_input: TextInput::numeric(),
      selected: 0,
      modal: None,
      pending: Some(Pending::Load),
      install_prompt: DeferredPrompt::new(),
      worker,
      worker_status,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.register_worker(&events);

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Run queued storage work after the loading state has been drawn
      if let Some(pending) = self.pending.take() {
        self.perform(pending).await;
        continue;
      }

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn register_worker(&self, events: &EventHandler) {
    let Some(worker) = self.worker.clone() else {
      return;
    };
    let tx = events.sender();

    tokio::spawn(async move {
      let event = match worker.register().await {
        Ok(registration) => WorkerEvent::Registered(registration),
        Err(e) => {
          warn!(error = %e, "offline worker registration failed");
          WorkerEvent::RegistrationFailed(e.to_string())
        }
      };
      let _ = tx.send(Event::Worker(event));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.controller.toasts_mut().expire(Instant::now()),
      Event::Worker(event) => self.handle_worker_event(event),
    }
  }

  fn handle_worker_event(&mut self, event: WorkerEvent) {
    match event {
      WorkerEvent::Registered(registration) => {
        // A ready shell is installable; keep the offer until asked for
        self
          .install_prompt
          .defer(InstallOffer::new(registration.generation.clone()));
        self.worker_status = WorkerStatus::Ready(registration);
      }
      WorkerEvent::RegistrationFailed(reason) => {
        self.worker_status = WorkerStatus::Failed(reason);
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if let Some(modal) = self.modal.take() {
      self.handle_modal_key(modal, key);
      return;
    }

    match self.focus {
      Focus::Table => self.handle_table_key(key),
      Focus::Form => self.handle_form_key(key),
      Focus::Search | Focus::AgeFilter => self.handle_filter_key(key),
    }
  }

  fn handle_table_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Char('a') | KeyCode::Char('n') => {
        self.reset_form();
        self.focus = Focus::Form;
      }
      KeyCode::Enter | KeyCode::Char('e') => {
        if let Some(id) = self.selected_id() {
          self.pending = Some(Pending::Edit(id));
        }
      }
      KeyCode::Delete | KeyCode::Char('d') => {
        if let Some(id) = self.selected_id() {
          self.modal = Some(Modal::ConfirmDelete(id));
        }
      }
      KeyCode::Char('/') => self.focus = Focus::Search,
      KeyCode::Char('f') => self.focus = Focus::AgeFilter,
      KeyCode::Char('r') => self.pending = Some(Pending::Load),
      KeyCode::Char('i') => {
        if let Some(prompt) = self.install_prompt.prompt() {
          self.modal = Some(Modal::ConfirmInstall(prompt));
        }
      }
      _ => {}
    }
  }

  fn handle_form_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.field = match self.field {
          FormField::Name => FormField::Age,
          FormField::Age => FormField::Name,
        };
      }
      KeyCode::Enter => self.pending = Some(Pending::Submit),
      KeyCode::Esc => {
        self.reset_form();
        self.focus = Focus::Table;
      }
      _ => {
        let input = match self.field {
          FormField::Name => &mut self.name_input,
          FormField::Age => &mut self.age_input,
        };
        input.handle_key(key);
      }
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    let input = if self.focus == Focus::Search {
      &mut self.search_input
    } else {
      &mut self.age_filter_input
    };

    match input.handle_key(key) {
      InputResult::Changed => self.pending = Some(Pending::Load),
      InputResult::Cancelled => {
        if !input.is_empty() {
          input.clear();
          self.pending = Some(Pending::Load);
        }
        self.focus = Focus::Table;
      }
      InputResult::Submitted => self.focus = Focus::Table,
      InputResult::NotHandled if key.code == KeyCode::Tab => self.focus = Focus::Table,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) {
    let answer = match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(true),
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
      _ => None,
    };

    let Some(accepted) = answer else {
      // Not an answer; keep asking
      self.modal = Some(modal);
      return;
    };

    match modal {
      Modal::ConfirmDelete(id) => {
        let confirmation = if accepted {
          Confirmation::Accepted
        } else {
          Confirmation::Declined
        };
        self.pending = Some(Pending::Delete(id, confirmation));
      }
      Modal::ConfirmInstall(prompt) => {
        let choice = if accepted {
          InstallChoice::Accepted
        } else {
          InstallChoice::Dismissed
        };
        prompt.resolve(choice);
      }
    }
  }

  async fn perform(&mut self, pending: Pending) {
    match pending {
      Pending::Load => {
        let filter = self.current_filter();
        let _ = self.controller.load(&filter).await;
      }
      Pending::Submit => {
        let form = self.form_state();
        if let Ok(outcome) = self.controller.submit(&form).await {
          info!(?outcome, "form submitted");
          self.reset_form();
          self.search_input.clear();
          self.age_filter_input.clear();
          self.focus = Focus::Table;
        }
      }
      Pending::Delete(id, confirmation) => {
        let _ = self.controller.request_delete(id, confirmation).await;
      }
      Pending::Edit(id) => {
        if let Ok(Some(form)) = self.controller.begin_edit(id).await {
          self.fill_form(&form);
          // Bring the form into focus, the way a page scrolls to it
          self.focus = Focus::Form;
          self.field = FormField::Name;
        }
      }
    }
    self.clamp_selection();
  }

  fn current_filter(&self) -> RecordFilter {
    RecordFilter::new(self.search_input.value(), self.age_filter_input.value())
  }

  fn form_state(&self) -> FormState {
    let form = FormState::new(self.name_input.value(), self.age_input.value());
    match self.editing {
      Some(id) => form.with_id(id),
      None => form,
    }
  }

  fn fill_form(&mut self, form: &FormState) {
    self.editing = form.id.parse().ok();
    self.name_input.set_value(&form.name);
    self.age_input.set_value(&form.age);
  }

  fn reset_form(&mut self) {
    self.editing = None;
    self.name_input.clear();
    self.age_input.clear();
    self.field = FormField::Name;
  }

  fn selected_id(&self) -> Option<RecordId> {
    self.controller.rows().get(self.selected).map(|r| r.id)
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.controller.rows().len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn clamp_selection(&mut self) {
    let len = self.controller.rows().len();
    if self.selected >= len {
      self.selected = len.saturating_sub(1);
    }
  }

  // Accessors for UI rendering
  pub fn controller(&self) -> &RecordController<SqliteRecordStore> {
    &self.controller
  }

  pub fn database_label(&self) -> &str {
    &self.database_label
  }

  pub fn focus(&self) -> Focus {
    self.focus
  }

  pub fn field(&self) -> FormField {
    self.field
  }

  pub fn editing(&self) -> Option<RecordId> {
    self.editing
  }

  pub fn name_input(&self) -> &TextInput {
    &self.name_input
  }

  pub fn age_input(&self) -> &TextInput {
    &self.age_input
  }

  pub fn search_input(&self) -> &TextInput {
    &self.search_input
  }

  pub fn age_filter_input(&self) -> &TextInput {
    &self.age_filter_input
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn modal(&self) -> Option<&Modal> {
    self.modal.as_ref()
  }

  /// True while queued storage work has not run yet
  pub fn is_loading(&self) -> bool {
    self.pending.is_some()
  }

  pub fn worker_status(&self) -> &WorkerStatus {
    &self.worker_status
  }

  pub fn install_available(&self) -> bool {
    self.install_prompt.is_available()
  }
}
