use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  Extra,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

/// Database-managed column: selected, never inserted.
pub fn extra(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::Extra,
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  pub fn get_columns(&self, all_columns: bool) -> String {
    self.columns.iter().filter_map(|col| {
      if all_columns || col.note != ColumnNote::Extra {
        Some(col.column.clone())
      } else {
        None
      }
    }).collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self, all_columns: bool) -> String {
    let mut buf = Vec::new();
    let mut first = true;
    write!(buf, "SELECT ").unwrap();
    for col in self.columns.iter() {
      if all_columns || col.note != ColumnNote::Extra {
        if first {
          write!(buf, "{}", col.column).unwrap();
          first = false;
        } else {
          write!(buf, ", {}", col.column).unwrap();
        }
      }
    }
    write!(buf, " FROM {}", self.table_name).unwrap();
    String::from_utf8_lossy(&buf).to_string()
  }

  pub fn build_insert_query(&self, all_columns: bool) -> String {
    let mut buf = Vec::new();
    let mut idx = 0;
    let mut values = Vec::new();
    write!(buf, "INSERT INTO {}(", self.table_name).unwrap();
    for col in self.columns.iter() {
      if all_columns || col.note != ColumnNote::Extra {
        if idx > 0 {
          write!(buf, ",").unwrap();
        }
        idx += 1;
        values.push(format!("${}", idx));
        write!(buf, "{}", col.column).unwrap();
      }
    }
    write!(buf, ") VALUES({})", values.join(", ")).unwrap();
    String::from_utf8_lossy(&buf).to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mappers() -> ColumnMappers {
    ColumnMappers {
      table_name: "topics",
      columns: vec![
        column("id"),
        column("name"),
        extra("created_at"),
      ],
    }
  }

  #[test]
  fn select_and_insert_text() {
    let m = mappers();
    assert_eq!(m.build_select_query(true), "SELECT id, name, created_at FROM topics");
    assert_eq!(m.build_select_query(false), "SELECT id, name FROM topics");
    assert_eq!(m.build_insert_query(false), "INSERT INTO topics(id,name) VALUES($1, $2)");
    assert_eq!(m.get_columns(true), "id, name, created_at");
  }
}
