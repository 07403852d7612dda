use serde::{Deserialize, Serialize};

/// Primary key assigned by the store
pub type RecordId = i64;

/// A stored student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id: RecordId,
  pub name: String,
  pub age: u32,
}

/// A record that has not been stored yet (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  pub name: String,
  pub age: u32,
}

impl NewRecord {
  pub fn new(name: impl Into<String>, age: u32) -> Self {
    Self {
      name: name.into(),
      age,
    }
  }

  /// Attach a store-assigned id
  pub fn with_id(self, id: RecordId) -> Record {
    Record {
      id,
      name: self.name,
      age: self.age,
    }
  }
}
