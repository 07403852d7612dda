//! Record controller: turns UI requests into store operations.
//!
//! The displayed rows are always `filter.apply(store.list())` for the last
//! filter that was loaded. Every failure is logged and turned into a toast;
//! nothing is retried.

mod filter;
mod form;

pub use filter::RecordFilter;
pub use form::{FormState, ValidForm, ValidationError};

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::notify::ToastQueue;
use crate::record::{Record, RecordId};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
  Created(RecordId),
  Updated(RecordId),
}

/// Answer to a "really delete?" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
  Accepted,
  Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted(RecordId),
  Declined,
}

pub struct RecordController<S: RecordStore> {
  /// Err when the store never opened
  store: Result<Arc<S>, StoreError>,
  rows: Vec<Record>,
  filter: RecordFilter,
  toasts: ToastQueue,
}

impl<S: RecordStore> RecordController<S> {
  pub fn new(store: S) -> Self {
    Self {
      store: Ok(Arc::new(store)),
      rows: Vec::new(),
      filter: RecordFilter::default(),
      toasts: ToastQueue::default(),
    }
  }

  /// Controller for a store that failed to open. The failure is reported
  /// once here; later operations fail quietly.
  pub fn unavailable(err: StoreError) -> Self {
    error!(error = %err, "failed to initialize database");
    let mut toasts = ToastQueue::default();
    toasts.error("Failed to initialize database");

    Self {
      store: Err(err),
      rows: Vec::new(),
      filter: RecordFilter::default(),
      toasts,
    }
  }

  pub fn from_open(result: Result<S, StoreError>) -> Self {
    match result {
      Ok(store) => Self::new(store),
      Err(e) => Self::unavailable(e),
    }
  }

  pub fn with_toast_ttl(mut self, ttl: Duration) -> Self {
    let pending: Vec<_> = self.toasts.iter().cloned().collect();
    self.toasts = ToastQueue::new(ttl);
    for toast in pending {
      self.toasts.push(toast.kind, toast.message);
    }
    self
  }

  fn store(&self) -> Result<Arc<S>, ControllerError> {
    match &self.store {
      Ok(store) => Ok(Arc::clone(store)),
      Err(e) => Err(ControllerError::Store(e.clone())),
    }
  }

  pub fn is_available(&self) -> bool {
    self.store.is_ok()
  }

  /// Fetch all records and keep the ones matching `filter`.
  pub async fn load(&mut self, filter: &RecordFilter) -> Result<&[Record], ControllerError> {
    let store = self.store()?;
    self.filter = filter.clone();

    match store.list().await {
      Ok(records) => {
        self.rows = filter.apply(records);
        debug!(shown = self.rows.len(), "records loaded");
        Ok(&self.rows)
      }
      Err(e) => {
        error!(error = %e, "error loading records");
        self.toasts.error("Error retrieving records");
        Err(e.into())
      }
    }
  }

  /// Reload with the filter that was last applied.
  pub async fn reload(&mut self) -> Result<&[Record], ControllerError> {
    let filter = self.filter.clone();
    self.load(&filter).await
  }

  /// Validate the form and create or update a record from it.
  ///
  /// On success the rows are reloaded with the filters cleared; the caller is
  /// expected to reset its form and filter inputs.
  pub async fn submit(&mut self, form: &FormState) -> Result<SubmitOutcome, ControllerError> {
    let valid = match form.validate() {
      Ok(valid) => valid,
      Err(e) => {
        warn!(error = %e, "form rejected");
        self.toasts.error("Name and age must be filled in correctly");
        return Err(e.into());
      }
    };

    let store = self.store()?;

    let outcome = match valid {
      ValidForm::Create(record) => match store.add(record).await {
        Ok(id) => {
          self.toasts.success("Record added");
          SubmitOutcome::Created(id)
        }
        Err(e) => {
          error!(error = %e, "error adding record");
          self.toasts.error("Error adding record");
          return Err(e.into());
        }
      },
      ValidForm::Update(record) => {
        let id = record.id;
        match store.update(record).await {
          Ok(()) => {
            self.toasts.success("Record updated");
            SubmitOutcome::Updated(id)
          }
          Err(StoreError::NotFound(id)) => {
            warn!(id, "update of missing record rejected");
            self
              .toasts
              .error(format!("Record {} no longer exists", id));
            return Err(StoreError::NotFound(id).into());
          }
          Err(e) => {
            error!(error = %e, "error updating record");
            self.toasts.error("Error updating record");
            return Err(e.into());
          }
        }
      }
    };

    // A failed reload is already reported by load()
    let _ = self.load(&RecordFilter::default()).await;

    Ok(outcome)
  }

  /// Delete a record once the user has confirmed it.
  pub async fn request_delete(
    &mut self,
    id: RecordId,
    confirmation: Confirmation,
  ) -> Result<DeleteOutcome, ControllerError> {
    if confirmation == Confirmation::Declined {
      debug!(id, "delete declined");
      return Ok(DeleteOutcome::Declined);
    }

    let store = self.store()?;

    if let Err(e) = store.delete(id).await {
      error!(error = %e, id, "error deleting record");
      self.toasts.error("Error deleting record");
      return Err(e.into());
    }

    self.toasts.success("Record deleted");
    let _ = self.reload().await;

    Ok(DeleteOutcome::Deleted(id))
  }

  /// Look up a record and return it as a pre-filled form.
  pub async fn begin_edit(&mut self, id: RecordId) -> Result<Option<FormState>, ControllerError> {
    let store = self.store()?;

    match store.get(id).await {
      Ok(Some(record)) => Ok(Some(FormState::from_record(&record))),
      Ok(None) => {
        warn!(id, "record to edit not found");
        self
          .toasts
          .warning(format!("Record {} no longer exists", id));
        Ok(None)
      }
      Err(e) => {
        error!(error = %e, id, "error retrieving record");
        self.toasts.error("Error retrieving record");
        Err(e.into())
      }
    }
  }

  pub fn rows(&self) -> &[Record] {
    &self.rows
  }

  pub fn filter(&self) -> &RecordFilter {
    &self.filter
  }

  pub fn toasts(&self) -> &ToastQueue {
    &self.toasts
  }

  pub fn toasts_mut(&mut self) -> &mut ToastQueue {
    &mut self.toasts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notify::ToastKind;
  use crate::record::NewRecord;
  use crate::store::SqliteRecordStore;
  use async_trait::async_trait;

  fn controller() -> RecordController<SqliteRecordStore> {
    RecordController::new(SqliteRecordStore::open_in_memory().unwrap())
  }

  async fn seeded() -> RecordController<SqliteRecordStore> {
    let mut c = controller();
    for (name, age) in [("Alice", "19"), ("Budi", "25"), ("Khalid", "20")] {
      c.submit(&FormState::new(name, age)).await.unwrap();
    }
    c
  }

  fn names(rows: &[Record]) -> Vec<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
  }

  /// Store whose every operation fails
  struct BrokenStore;

  #[async_trait]
  impl RecordStore for BrokenStore {
    async fn add(&self, _record: NewRecord) -> Result<RecordId, StoreError> {
      Err(StoreError::Write("quota exceeded".to_string()))
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
      Err(StoreError::Read("disk error".to_string()))
    }

    async fn get(&self, _id: RecordId) -> Result<Option<Record>, StoreError> {
      Err(StoreError::Read("disk error".to_string()))
    }

    async fn update(&self, _record: Record) -> Result<(), StoreError> {
      Err(StoreError::Write("quota exceeded".to_string()))
    }

    async fn delete(&self, _id: RecordId) -> Result<(), StoreError> {
      Err(StoreError::Write("quota exceeded".to_string()))
    }
  }

  #[tokio::test]
  async fn test_submit_new_record_shows_one_row() {
    let mut c = controller();
    let outcome = c.submit(&FormState::new("Ana", "21")).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Created(1));
    assert_eq!(
      c.rows(),
      &[Record {
        id: 1,
        name: "Ana".to_string(),
        age: 21
      }]
    );
    assert_eq!(c.toasts().latest().map(|t| t.kind), Some(ToastKind::Success));
  }

  #[tokio::test]
  async fn test_submit_with_id_updates_in_place() {
    let mut c = controller();
    c.submit(&FormState::new("Ana", "21")).await.unwrap();

    let outcome = c
      .submit(&FormState::new("Ana", "22").with_id(1))
      .await
      .unwrap();

    assert_eq!(outcome, SubmitOutcome::Updated(1));
    assert_eq!(c.rows().len(), 1);
    assert_eq!(c.rows()[0].id, 1);
    assert_eq!(c.rows()[0].age, 22);
  }

  #[tokio::test]
  async fn test_submit_clears_filters() {
    let mut c = seeded().await;
    c.load(&RecordFilter::by_name("budi")).await.unwrap();
    assert_eq!(names(c.rows()), vec!["Budi"]);

    c.submit(&FormState::new("Dewi", "30")).await.unwrap();
    assert_eq!(c.filter(), &RecordFilter::default());
    assert_eq!(c.rows().len(), 4);
  }

  #[tokio::test]
  async fn test_invalid_form_makes_no_store_call() {
    let mut c = RecordController::new(BrokenStore);
    let result = c.submit(&FormState::new("", "21")).await;

    assert_eq!(
      result,
      Err(ControllerError::Validation(ValidationError::MissingName))
    );
    // BrokenStore would have produced a write error
    assert_eq!(c.toasts().len(), 1);
    assert_eq!(
      c.toasts().latest().map(|t| t.message.as_str()),
      Some("Name and age must be filled in correctly")
    );
  }

  #[tokio::test]
  async fn test_load_filters() {
    let mut c = seeded().await;

    let all = c.load(&RecordFilter::new("", "")).await.unwrap();
    assert_eq!(names(all), vec!["Alice", "Budi", "Khalid"]);

    let al = c.load(&RecordFilter::by_name("al")).await.unwrap();
    assert_eq!(names(al), vec!["Alice", "Khalid"]);

    let adults = c.load(&RecordFilter::by_min_age("20")).await.unwrap();
    assert_eq!(names(adults), vec!["Budi", "Khalid"]);

    let ignored = c.load(&RecordFilter::by_min_age("twenty")).await.unwrap();
    assert_eq!(ignored.len(), 3);
  }

  #[tokio::test]
  async fn test_delete_requires_confirmation() {
    let mut c = seeded().await;

    let declined = c.request_delete(1, Confirmation::Declined).await.unwrap();
    assert_eq!(declined, DeleteOutcome::Declined);
    assert_eq!(c.reload().await.unwrap().len(), 3);

    let deleted = c.request_delete(1, Confirmation::Accepted).await.unwrap();
    assert_eq!(deleted, DeleteOutcome::Deleted(1));
    assert!(c.rows().iter().all(|r| r.id != 1));

    // Second delete of the same id is not an error
    c.request_delete(1, Confirmation::Accepted).await.unwrap();
  }

  #[tokio::test]
  async fn test_delete_keeps_current_filter() {
    let mut c = seeded().await;
    c.load(&RecordFilter::by_name("al")).await.unwrap();

    c.request_delete(1, Confirmation::Accepted).await.unwrap();
    assert_eq!(names(c.rows()), vec!["Khalid"]);
  }

  #[tokio::test]
  async fn test_begin_edit_populates_form() {
    let mut c = seeded().await;

    let form = c.begin_edit(2).await.unwrap().unwrap();
    assert_eq!(form, FormState::new("Budi", "25").with_id(2));

    assert_eq!(c.begin_edit(99).await.unwrap(), None);
    assert_eq!(c.toasts().latest().map(|t| t.kind), Some(ToastKind::Warning));
  }

  #[tokio::test]
  async fn test_update_of_deleted_record_is_reported() {
    let mut c = seeded().await;
    c.request_delete(3, Confirmation::Accepted).await.unwrap();

    let result = c.submit(&FormState::new("Khalid", "21").with_id(3)).await;
    assert_eq!(result, Err(ControllerError::Store(StoreError::NotFound(3))));
    assert_eq!(c.reload().await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_store_failures_become_error_toasts() {
    let mut c = RecordController::new(BrokenStore);

    assert!(c.load(&RecordFilter::default()).await.is_err());
    assert!(c.submit(&FormState::new("Ana", "21")).await.is_err());
    assert!(c.request_delete(1, Confirmation::Accepted).await.is_err());

    let kinds: Vec<_> = c.toasts().iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![ToastKind::Error; 3]);
  }

  #[tokio::test]
  async fn test_unavailable_store_reports_once() {
    let mut c: RecordController<SqliteRecordStore> =
      RecordController::unavailable(StoreError::Unavailable("denied".to_string()));
    assert!(!c.is_available());
    assert_eq!(c.toasts().len(), 1);

    let result = c.load(&RecordFilter::default()).await;
    assert!(matches!(
      result,
      Err(ControllerError::Store(StoreError::Unavailable(_)))
    ));
    assert!(c.submit(&FormState::new("Ana", "21")).await.is_err());
    assert_eq!(c.toasts().len(), 1);
  }
}
