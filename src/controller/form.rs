use thiserror::Error;

use crate::record::{NewRecord, Record, RecordId};

/// Raw form contents as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
  /// Hidden id; empty when creating a new record
  pub id: String,
  pub name: String,
  pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("name is required")]
  MissingName,
  #[error("age must be a positive whole number, got {0:?}")]
  InvalidAge(String),
  #[error("record id {0:?} is not a number")]
  InvalidId(String),
}

/// A form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidForm {
  Create(NewRecord),
  Update(Record),
}

impl FormState {
  pub fn new(name: impl Into<String>, age: impl Into<String>) -> Self {
    Self {
      id: String::new(),
      name: name.into(),
      age: age.into(),
    }
  }

  /// Form pre-filled from a stored record
  pub fn from_record(record: &Record) -> Self {
    Self {
      id: record.id.to_string(),
      name: record.name.clone(),
      age: record.age.to_string(),
    }
  }

  pub fn with_id(mut self, id: RecordId) -> Self {
    self.id = id.to_string();
    self
  }

  pub fn validate(&self) -> Result<ValidForm, ValidationError> {
    let name = self.name.trim();
    if name.is_empty() {
      return Err(ValidationError::MissingName);
    }

    let age = self
      .age
      .trim()
      .parse::<u32>()
      .ok()
      .filter(|age| *age > 0)
      .ok_or_else(|| ValidationError::InvalidAge(self.age.clone()))?;

    let record = NewRecord::new(name, age);

    let id = self.id.trim();
    if id.is_empty() {
      return Ok(ValidForm::Create(record));
    }

    let id: RecordId = id
      .parse()
      .map_err(|_| ValidationError::InvalidId(self.id.clone()))?;
    Ok(ValidForm::Update(record.with_id(id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_record_form() {
    let form = FormState::new("  Ana ", "21");
    assert_eq!(
      form.validate(),
      Ok(ValidForm::Create(NewRecord::new("Ana", 21)))
    );
  }

  #[test]
  fn test_edit_form_carries_id() {
    let form = FormState::new("Ana", "22").with_id(1);
    assert_eq!(form.id, "1");
    assert_eq!(
      form.validate(),
      Ok(ValidForm::Update(Record {
        id: 1,
        name: "Ana".to_string(),
        age: 22,
      }))
    );
  }

  #[test]
  fn test_blank_name_is_rejected() {
    assert_eq!(
      FormState::new("   ", "21").validate(),
      Err(ValidationError::MissingName)
    );
  }

  #[test]
  fn test_age_must_be_positive_integer() {
    for age in ["", "0", "-3", "abc", "2.5"] {
      assert_eq!(
        FormState::new("Ana", age).validate(),
        Err(ValidationError::InvalidAge(age.to_string())),
        "age {:?}",
        age
      );
    }
  }

  #[test]
  fn test_garbage_id_is_rejected() {
    let form = FormState {
      id: "x1".to_string(),
      name: "Ana".to_string(),
      age: "21".to_string(),
    };
    assert_eq!(
      form.validate(),
      Err(ValidationError::InvalidId("x1".to_string()))
    );
  }

  #[test]
  fn test_round_trip_from_record() {
    let record = Record {
      id: 7,
      name: "Citra".to_string(),
      age: 19,
    };
    let form = FormState::from_record(&record);
    assert_eq!(form.validate(), Ok(ValidForm::Update(record)));
  }
}
