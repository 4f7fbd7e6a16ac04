use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::slug::is_valid_slug;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateTopic {
  pub name: String,
  #[serde(default)]
  pub slug: Option<String>,
}

impl CreateTopic {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.name.trim().is_empty() {
      errors.push("name is required".to_string());
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
pub struct UpdateTopic {
  pub name: Option<String>,
  pub slug: Option<String>,
}

impl UpdateTopic {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if let Some(ref name) = self.name {
      if name.trim().is_empty() {
        errors.push("name cannot be empty".to_string());
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
  fn create_topic_validation() {
    assert!(CreateTopic {
      name: "Πολιτική".to_string(),
      slug: None,
    }
    .validate()
    .is_ok());

    match (CreateTopic {
      name: "".to_string(),
      slug: Some("-bad-".to_string()),
    })
    .validate()
    {
      Err(Error::Validation(errors)) => assert_eq!(errors.len(), 2),
      other => panic!("expected validation error, got {:?}", other),
    }
  }
}
