use chrono::NaiveDate;

use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::slug::is_valid_slug;
use crate::util::parse_date;

use crate::db::query::clamp_limit;

/// Public article listing params.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ArticleRequest {
  pub limit: Option<i64>,
  pub offset: Option<i64>,
  pub topic: Option<String>,
  pub search: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewRequest {
  pub track_view: Option<bool>,
}

/// Admin article listing params: full filter set, page-based.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminArticleRequest {
  pub page: Option<i64>,
  pub limit: Option<i64>,
  pub topic: Option<String>,
  pub published: Option<bool>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
  pub search: Option<String>,
  pub min_views: Option<i64>,
  pub max_views: Option<i64>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
}

/// Filter value object consumed by the query builder.  The same value
/// shapes both the row query and the count query.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArticleFilters {
  pub search: Option<String>,
  /// Resolved topic ids (not names).
  pub topics: Vec<String>,
  pub published: Option<bool>,
  pub min_views: Option<i64>,
  pub max_views: Option<i64>,
  pub start_date: Option<NaiveDate>,
  pub end_date: Option<NaiveDate>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
}

fn non_empty(val: &Option<String>) -> Option<String> {
  val
    .as_ref()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

impl AdminArticleRequest {
  /// Validate and convert to filters.  All problems are reported
  /// together as one 400.
  pub fn to_filters(&self) -> Result<ArticleFilters> {
    let mut errors = Vec::new();

    let start_date = match non_empty(&self.start_date) {
      Some(ref val) => match parse_date(val) {
        Some(date) => Some(date),
        None => {
          errors.push(format!("startDate '{}' must be formatted as YYYY-MM-DD", val));
          None
        },
      },
      None => None,
    };
    let end_date = match non_empty(&self.end_date) {
      Some(ref val) => match parse_date(val) {
        Some(date) => Some(date),
        None => {
          errors.push(format!("endDate '{}' must be formatted as YYYY-MM-DD", val));
          None
        },
      },
      None => None,
    };
    if let (Some(start), Some(end)) = (start_date, end_date) {
      if start > end {
        errors.push("startDate cannot be after endDate".to_string());
      }
    }
    if let (Some(min), Some(max)) = (self.min_views, self.max_views) {
      if min > max {
        errors.push("minViews cannot exceed maxViews".to_string());
      }
    }
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }

    let page = self.page.unwrap_or(1).max(1);
    let limit = clamp_limit(self.limit);

    Ok(ArticleFilters {
      search: non_empty(&self.search),
      topics: Vec::new(),
      published: self.published,
      min_views: self.min_views,
      max_views: self.max_views,
      start_date,
      end_date,
      limit: Some(limit),
      offset: Some(page.saturating_sub(1).saturating_mul(limit)),
      sort_by: non_empty(&self.sort_by),
      sort_order: non_empty(&self.sort_order),
    })
  }

  pub fn page(&self) -> i64 {
    self.page.unwrap_or(1).max(1)
  }
}

impl ArticleRequest {
  /// Public listings are always published-only, newest first.
  pub fn to_filters(&self) -> ArticleFilters {
    ArticleFilters {
      search: non_empty(&self.search),
      topics: Vec::new(),
      published: Some(true),
      limit: self.limit,
      offset: self.offset,
      ..Default::default()
    }
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticle {
  pub title: String,
  pub content: String,
  #[serde(default)]
  pub slug: Option<String>,
  #[serde(default)]
  pub summary: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub cover_photo: Option<String>,
  #[serde(default)]
  pub cover_photo_caption: Option<String>,
  /// Topic names as shown in the admin UI.
  #[serde(default)]
  pub topics: Vec<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub published: Option<bool>,
}

impl CreateArticle {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.title.trim().is_empty() {
      errors.push("title is required".to_string());
    }
    if self.content.trim().is_empty() {
      errors.push("content is required".to_string());
    }
    if let Some(ref slug) = self.slug {
      if !is_valid_slug(slug) {
        errors.push(format!("'{}' is not a valid slug", slug));
      }
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(errors))
    }
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticle {
  pub title: Option<String>,
  pub content: Option<String>,
  pub slug: Option<String>,
  pub summary: Option<String>,
  pub author: Option<String>,
  pub cover_photo: Option<String>,
  pub cover_photo_caption: Option<String>,
  pub topics: Option<Vec<String>>,
  pub tags: Option<Vec<String>>,
  pub published: Option<bool>,
}

impl UpdateArticle {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if let Some(ref title) = self.title {
      if title.trim().is_empty() {
        errors.push("title cannot be empty".to_string());
      }
    }
    if let Some(ref content) = self.content {
      if content.trim().is_empty() {
        errors.push("content cannot be empty".to_string());
      }
    }
    if let Some(ref slug) = self.slug {
      if !is_valid_slug(slug) {
        errors.push(format!("'{}' is not a valid slug", slug));
      }
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(errors))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admin_request_bad_dates_collected() {
    let req = AdminArticleRequest {
      start_date: Some("01/03/2024".to_string()),
      end_date: Some("bogus".to_string()),
      ..Default::default()
    };
    match req.to_filters() {
      Err(Error::Validation(errors)) => assert_eq!(errors.len(), 2),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn admin_request_inverted_bounds() {
    let req = AdminArticleRequest {
      min_views: Some(100),
      max_views: Some(10),
      start_date: Some("2024-06-01".to_string()),
      end_date: Some("2024-01-01".to_string()),
      ..Default::default()
    };
    match req.to_filters() {
      Err(Error::Validation(errors)) => assert_eq!(errors.len(), 2),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn admin_request_page_to_offset() {
    let req = AdminArticleRequest {
      page: Some(3),
      limit: Some(20),
      ..Default::default()
    };
    let filters = req.to_filters().unwrap();
    assert_eq!(filters.limit, Some(20));
    assert_eq!(filters.offset, Some(40));

    // page floors at 1.
    let req = AdminArticleRequest {
      page: Some(-5),
      ..Default::default()
    };
    let filters = req.to_filters().unwrap();
    assert_eq!(filters.offset, Some(0));

    // a huge page saturates instead of overflowing.
    let req = AdminArticleRequest {
      page: Some(i64::MAX),
      ..Default::default()
    };
    let filters = req.to_filters().unwrap();
    assert_eq!(filters.offset, Some(i64::MAX));
  }

  #[test]
  fn public_request_forces_published() {
    let req = ArticleRequest {
      search: Some("  εκλογές ".to_string()),
      ..Default::default()
    };
    let filters = req.to_filters();
    assert_eq!(filters.published, Some(true));
    assert_eq!(filters.search.as_deref(), Some("εκλογές"));
  }

  #[test]
  fn create_article_validation() {
    let form = CreateArticle {
      title: " ".to_string(),
      content: "".to_string(),
      slug: Some("Bad Slug!".to_string()),
      ..Default::default()
    };
    match form.validate() {
      Err(Error::Validation(errors)) => assert_eq!(errors.len(), 3),
      other => panic!("expected validation error, got {:?}", other),
    }

    let form = CreateArticle {
      title: "Καλημέρα".to_string(),
      content: "<p>σώμα</p>".to_string(),
      ..Default::default()
    };
    assert!(form.validate().is_ok());
  }
}
