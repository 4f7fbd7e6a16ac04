use chrono::{NaiveDate, NaiveDateTime};

use uuid::Uuid;

use crate::error::*;

// query-param <-> chrono/uuid util functions.

pub fn parse_date(val: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d").ok()
}

pub fn day_start(date: NaiveDate) -> NaiveDateTime {
  date.and_hms(0, 0, 0)
}

// date range upper bounds are inclusive through the whole day.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
  date.and_hms(23, 59, 59)
}

/// Parse a path id, rejecting anything that is not a UUID before it
/// reaches the database.
pub fn parse_id(val: &str) -> Result<Uuid> {
  Uuid::parse_str(val.trim())
    .map_err(|_| Error::validation(format!("'{}' is not a valid UUID", val)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_parsing() {
    assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(parse_date(" 2024-03-01 "), NaiveDate::from_ymd_opt(2024, 3, 1));
    assert!(parse_date("03/01/2024").is_none());
    assert!(parse_date("not-a-date").is_none());
  }

  #[test]
  fn day_bounds() {
    let d = NaiveDate::from_ymd(2024, 3, 1);
    assert_eq!(day_start(d).to_string(), "2024-03-01 00:00:00");
    assert_eq!(day_end(d).to_string(), "2024-03-01 23:59:59");
  }

  #[test]
  fn id_parsing() {
    assert!(parse_id("b9e7dd8a-3f67-4cfa-90dd-12f1c34f6f6b").is_ok());
    assert!(parse_id("42").is_err());
    assert!(parse_id("'; DROP TABLE articles; --").is_err());
  }
}
