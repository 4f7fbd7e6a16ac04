use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_articles: i64,
  pub published_articles: i64,
  pub draft_articles: i64,
  pub total_views: i64,
  pub total_topics: i64,
}
