use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicList {
  pub topics: Vec<Topic>,
}
