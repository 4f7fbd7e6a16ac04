use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
  pub id: Uuid,
  pub slug: String,
  pub title: String,
  pub content: String,
  pub summary: Option<String>,
  pub author: Option<String>,
  pub cover_photo: Option<String>,
  pub cover_photo_caption: Option<String>,
  /// Topic ids as stored; replaced with topic names before serving.
  pub topics: Vec<String>,
  pub tags: Vec<String>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
  pub published_date: Option<NaiveDateTime>,
  pub views: i64,
  pub published: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: i64,
  pub limit: i64,
  pub total: i64,
  pub total_pages: i64,
  pub has_more: bool,
}

impl Pagination {
  pub fn new(page: i64, limit: i64, total: i64) -> Self {
    let total_pages = if limit > 0 {
      (total + limit - 1) / limit
    } else {
      0
    };
    Pagination {
      page,
      limit,
      total,
      total_pages,
      has_more: page < total_pages,
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticlePage {
  pub data: Vec<Article>,
  pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pagination_math() {
    let p = Pagination::new(1, 10, 25);
    assert_eq!(p.total_pages, 3);
    assert!(p.has_more);

    let p = Pagination::new(3, 10, 25);
    assert_eq!(p.total_pages, 3);
    assert!(!p.has_more);

    let p = Pagination::new(1, 10, 0);
    assert_eq!(p.total_pages, 0);
    assert!(!p.has_more);
  }
}
