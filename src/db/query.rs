use chrono::NaiveDateTime;

use tokio_postgres::types::ToSql;

use crate::forms::article::ArticleFilters;
use crate::util::{day_end, day_start};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

pub fn clamp_limit(limit: Option<i64>) -> i64 {
  limit.unwrap_or(DEFAULT_LIMIT).max(1).min(MAX_LIMIT)
}

pub fn clamp_offset(offset: Option<i64>) -> i64 {
  offset.unwrap_or(0).max(0)
}

/// Owned parameter value bound to one predicate clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
  Bool(bool),
  Int(i64),
  Text(String),
  TextArray(Vec<String>),
  Timestamp(NaiveDateTime),
}

impl SqlValue {
  pub fn as_param(&self) -> &(dyn ToSql + Sync) {
    match self {
      SqlValue::Bool(ref v) => v,
      SqlValue::Int(ref v) => v,
      SqlValue::Text(ref v) => v,
      SqlValue::TextArray(ref v) => v,
      SqlValue::Timestamp(ref v) => v,
    }
  }
}

/// Sort fields are interpolated into the ORDER BY clause, so they go
/// through this allow-list.  Anything unrecognized falls back to
/// created_at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortField {
  Title,
  CreatedAt,
  UpdatedAt,
  PublishedDate,
  Views,
  Topics,
}

impl SortField {
  pub fn parse(val: Option<&str>) -> SortField {
    match val {
      Some("title") => SortField::Title,
      Some("createdAt") => SortField::CreatedAt,
      Some("updatedAt") => SortField::UpdatedAt,
      Some("publishedDate") => SortField::PublishedDate,
      Some("views") => SortField::Views,
      Some("topics") => SortField::Topics,
      _ => SortField::CreatedAt,
    }
  }

  fn column(&self) -> &'static str {
    match self {
      SortField::Title => "title",
      SortField::CreatedAt => "created_at",
      SortField::UpdatedAt => "updated_at",
      SortField::PublishedDate => "published_date",
      SortField::Views => "views",
      SortField::Topics => "topics",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn parse(val: Option<&str>) -> SortOrder {
    match val {
      Some(v) if v.eq_ignore_ascii_case("ASC") => SortOrder::Asc,
      _ => SortOrder::Desc,
    }
  }

  fn keyword(&self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Assembles the predicate/order/limit portions of the article
/// queries.  Every clause owns its positional parameter, so clause
/// text and parameter order cannot drift apart.  `select_sql` and
/// `count_sql` render from the same clause state: pagination totals
/// always agree with the rows.
pub struct ArticleQuery {
  clauses: Vec<String>,
  params: Vec<SqlValue>,
  sort_by: SortField,
  sort_order: SortOrder,
  limit: i64,
  offset: i64,
}

impl ArticleQuery {
  pub fn from_filters(filters: &ArticleFilters) -> ArticleQuery {
    let mut q = ArticleQuery {
      clauses: Vec::new(),
      params: Vec::new(),
      sort_by: SortField::parse(filters.sort_by.as_deref()),
      sort_order: SortOrder::parse(filters.sort_order.as_deref()),
      limit: clamp_limit(filters.limit),
      offset: clamp_offset(filters.offset),
    };

    if let Some(published) = filters.published {
      let n = q.bind(SqlValue::Bool(published));
      q.clauses.push(format!("published = ${}", n));
    }
    if !filters.topics.is_empty() {
      // overlap against the stored topic-id array.
      let n = q.bind(SqlValue::TextArray(filters.topics.clone()));
      q.clauses.push(format!("topics && ${}", n));
    }
    if let Some(ref search) = filters.search {
      // one parameter, referenced from both sides of the OR.
      let n = q.bind(SqlValue::Text(format!("%{}%", search)));
      q.clauses.push(format!("(title ILIKE ${} OR content ILIKE ${})", n, n));
    }
    if let Some(min_views) = filters.min_views {
      let n = q.bind(SqlValue::Int(min_views));
      q.clauses.push(format!("views >= ${}", n));
    }
    if let Some(max_views) = filters.max_views {
      let n = q.bind(SqlValue::Int(max_views));
      q.clauses.push(format!("views <= ${}", n));
    }
    if let Some(start_date) = filters.start_date {
      let n = q.bind(SqlValue::Timestamp(day_start(start_date)));
      q.clauses.push(format!("created_at >= ${}", n));
    }
    if let Some(end_date) = filters.end_date {
      // inclusive through the end of the day.
      let n = q.bind(SqlValue::Timestamp(day_end(end_date)));
      q.clauses.push(format!("created_at <= ${}", n));
    }
    q
  }

  fn bind(&mut self, value: SqlValue) -> usize {
    self.params.push(value);
    self.params.len()
  }

  pub fn where_sql(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!(" WHERE {}", self.clauses.join(" AND "))
    }
  }

  /// Row query.  The tie-break on id keeps page boundaries stable when
  /// the sort key has duplicates.  Limit/offset are clamped integers,
  /// interpolated so the parameter list stays identical to the count
  /// query's.
  pub fn select_sql(&self, columns: &str) -> String {
    format!(
      "SELECT {} FROM articles{} ORDER BY {} {}, id {} LIMIT {} OFFSET {}",
      columns,
      self.where_sql(),
      self.sort_by.column(),
      self.sort_order.keyword(),
      self.sort_order.keyword(),
      self.limit,
      self.offset,
    )
  }

  pub fn count_sql(&self) -> String {
    format!("SELECT COUNT(*) FROM articles{}", self.where_sql())
  }

  pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
    self.params.iter().map(|v| v.as_param()).collect()
  }

  pub fn limit(&self) -> i64 {
    self.limit
  }

  pub fn offset(&self) -> i64 {
    self.offset
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::NaiveDate;

  fn full_filters() -> ArticleFilters {
    ArticleFilters {
      search: Some("εκλογές".to_string()),
      topics: vec!["id-1".to_string(), "id-2".to_string()],
      published: Some(true),
      min_views: Some(10),
      max_views: Some(1000),
      start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
      end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
      limit: Some(20),
      offset: Some(40),
      sort_by: Some("views".to_string()),
      sort_order: Some("ASC".to_string()),
    }
  }

  #[test]
  fn empty_filters() {
    let q = ArticleQuery::from_filters(&ArticleFilters::default());
    assert_eq!(q.where_sql(), "");
    assert_eq!(q.count_sql(), "SELECT COUNT(*) FROM articles");
    assert_eq!(
      q.select_sql("id"),
      "SELECT id FROM articles ORDER BY created_at DESC, id DESC LIMIT 50 OFFSET 0"
    );
    assert!(q.params().is_empty());
  }

  #[test]
  fn all_filters_in_positional_order() {
    let q = ArticleQuery::from_filters(&full_filters());
    assert_eq!(
      q.where_sql(),
      " WHERE published = $1 AND topics && $2 AND \
       (title ILIKE $3 OR content ILIKE $3) AND views >= $4 AND views <= $5 \
       AND created_at >= $6 AND created_at <= $7"
    );
    assert_eq!(q.params().len(), 7);
    assert_eq!(q.params.get(2), Some(&SqlValue::Text("%εκλογές%".to_string())));
    // end date is inclusive through the end of the day.
    assert_eq!(
      q.params.get(6),
      Some(&SqlValue::Timestamp(
        NaiveDate::from_ymd(2024, 6, 30).and_hms(23, 59, 59)
      ))
    );
  }

  #[test]
  fn count_and_select_share_predicates() {
    let q = ArticleQuery::from_filters(&full_filters());
    let select = q.select_sql("id");
    let count = q.count_sql();
    assert!(select.contains(&q.where_sql()));
    assert!(count.contains(&q.where_sql()));
    assert!(!count.contains("ORDER BY"));
    assert!(!count.contains("LIMIT"));
  }

  #[test]
  fn sort_field_allow_list() {
    let mut filters = ArticleFilters::default();
    filters.sort_by = Some("'; DROP TABLE articles; --".to_string());
    let q = ArticleQuery::from_filters(&filters);
    let sql = q.select_sql("id");
    assert!(sql.contains("ORDER BY created_at DESC"));
    assert!(!sql.contains("DROP TABLE"));

    filters.sort_by = Some("publishedDate".to_string());
    filters.sort_order = Some("asc".to_string());
    let q = ArticleQuery::from_filters(&filters);
    assert!(q.select_sql("id").contains("ORDER BY published_date ASC, id ASC"));
  }

  #[test]
  fn limit_and_offset_bounds() {
    let mut filters = ArticleFilters::default();
    filters.limit = Some(100_000);
    filters.offset = Some(-5);
    let q = ArticleQuery::from_filters(&filters);
    assert_eq!(q.limit(), MAX_LIMIT);
    assert_eq!(q.offset(), 0);

    filters.limit = Some(0);
    let q = ArticleQuery::from_filters(&filters);
    assert_eq!(q.limit(), 1);

    assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
  }
}
