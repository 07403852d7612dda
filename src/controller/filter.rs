use crate::record::Record;

/// Client-side row filter, held as the raw text the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  /// Case-insensitive substring of the name; empty matches everything
  pub name: String,
  /// Minimum age; ignored unless it parses as a non-negative integer
  pub min_age: String,
}

impl RecordFilter {
  pub fn new(name: impl Into<String>, min_age: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      min_age: min_age.into(),
    }
  }

  #[cfg(test)]
  pub fn by_name(name: impl Into<String>) -> Self {
    Self::new(name, "")
  }

  #[cfg(test)]
  pub fn by_min_age(min_age: impl Into<String>) -> Self {
    Self::new("", min_age)
  }

  /// The minimum age, if the input is usable
  pub fn min_age(&self) -> Option<u32> {
    self.min_age.trim().parse().ok()
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_empty() && self.min_age().is_none()
  }

  pub fn matches(&self, record: &Record) -> bool {
    let name_ok = self.name.is_empty()
      || record
        .name
        .to_lowercase()
        .contains(&self.name.to_lowercase());
    let age_ok = self.min_age().map_or(true, |min| record.age >= min);
    name_ok && age_ok
  }

  /// Keep matching records, preserving their order.
  pub fn apply(&self, mut records: Vec<Record>) -> Vec<Record> {
    records.retain(|r| self.matches(r));
    records
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn records() -> Vec<Record> {
    vec![
      Record {
        id: 1,
        name: "Alice".to_string(),
        age: 19,
      },
      Record {
        id: 2,
        name: "Budi".to_string(),
        age: 25,
      },
      Record {
        id: 3,
        name: "Khalid".to_string(),
        age: 20,
      },
    ]
  }

  fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
  }

  #[test]
  fn test_empty_filter_keeps_everything() {
    let filter = RecordFilter::default();
    assert!(filter.is_empty());
    assert_eq!(ids(&filter.apply(records())), vec![1, 2, 3]);
  }

  #[test]
  fn test_name_filter_is_case_insensitive() {
    let filter = RecordFilter::by_name("AL");
    assert_eq!(ids(&filter.apply(records())), vec![1, 3]);
  }

  #[test]
  fn test_min_age_is_inclusive() {
    let filter = RecordFilter::by_min_age("20");
    assert_eq!(ids(&filter.apply(records())), vec![2, 3]);
  }

  #[test]
  fn test_non_numeric_min_age_is_ignored() {
    for input in ["abc", "-5", "2.5", " "] {
      let filter = RecordFilter::by_min_age(input);
      assert_eq!(filter.min_age(), None, "input {:?}", input);
      assert_eq!(ids(&filter.apply(records())), vec![1, 2, 3]);
    }
  }

  #[test]
  fn test_filters_combine() {
    let filter = RecordFilter::new("al", "20");
    assert_eq!(ids(&filter.apply(records())), vec![3]);
  }
}
