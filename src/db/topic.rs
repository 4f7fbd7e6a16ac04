use std::collections::HashMap;

use tokio_postgres::Row;

use uuid::Uuid;

use crate::error::*;

use crate::models::*;
use crate::forms::topic::*;
use crate::slug::derive_slug;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct TopicRepository {
  // get topics
  all_topics: VersionedStatement,
  topic_by_id: VersionedStatement,

  // store/update/delete
  insert_topic: VersionedStatement,
  update_topic: VersionedStatement,
  delete_topic: VersionedStatement,

  // uniqueness probes
  name_exists: VersionedStatement,
  name_exists_other: VersionedStatement,
  slug_exists: VersionedStatement,
  slug_exists_other: VersionedStatement,

  // referential-integrity check before delete
  articles_referencing: VersionedStatement,
}

lazy_static! {
  static ref TOPIC_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "topics",
      columns: vec![
        column("id"),
        column("name"),
        column("slug"),
      ],
    }
  };
}

fn topic_from_row(row: &Row) -> Topic {
  Topic {
    id: row.get(0),
    name: row.get(1),
    slug: row.get(2),
  }
}

impl TopicRepository {
  pub fn new(cl: SharedClient) -> Result<TopicRepository> {
    let select = TOPIC_COLUMNS.build_select_query(true);
    let returning = TOPIC_COLUMNS.get_columns(true);

    let all_topics = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY name"#, select))?;
    let topic_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select))?;

    let insert_topic = VersionedStatement::new(cl.clone(),
        &format!(r#"{} RETURNING {}"#,
        TOPIC_COLUMNS.build_insert_query(true), returning))?;
    let update_topic = VersionedStatement::new(cl.clone(),
        &format!(r#"UPDATE topics SET name = $2, slug = $3
        WHERE id = $1 RETURNING {}"#, returning))?;
    let delete_topic = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM topics WHERE id = $1"#)?;

    let name_exists = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM topics WHERE name = $1"#)?;
    let name_exists_other = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM topics WHERE name = $1 AND id <> $2"#)?;
    let slug_exists = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM topics WHERE slug = $1"#)?;
    let slug_exists_other = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM topics WHERE slug = $1 AND id <> $2"#)?;

    let articles_referencing = VersionedStatement::new(cl.clone(),
        r#"SELECT COUNT(*) FROM articles WHERE $1 = ANY(topics)"#)?;

    Ok(TopicRepository {
      all_topics,
      topic_by_id,

      insert_topic,
      update_topic,
      delete_topic,

      name_exists,
      name_exists_other,
      slug_exists,
      slug_exists_other,

      articles_referencing,
    })
  }

  pub async fn prepare(&self) -> Result<()> {
    self.all_topics.prepare().await?;
    self.topic_by_id.prepare().await?;

    self.insert_topic.prepare().await?;
    self.update_topic.prepare().await?;
    self.delete_topic.prepare().await?;

    self.name_exists.prepare().await?;
    self.name_exists_other.prepare().await?;
    self.slug_exists.prepare().await?;
    self.slug_exists_other.prepare().await?;

    self.articles_referencing.prepare().await?;
    Ok(())
  }

  pub async fn all(&self) -> Result<Vec<Topic>> {
    let rows = self.all_topics.query(&[]).await?;
    Ok(rows.iter().map(topic_from_row).collect())
  }

  pub async fn get_by_id(&self, topic_id: Uuid) -> Result<Option<Topic>> {
    let row = self.topic_by_id.query_opt(&[&topic_id]).await?;
    Ok(row.as_ref().map(topic_from_row))
  }

  /// Name and slug are checked independently; both must be free.
  pub async fn store(&self, topic: &CreateTopic) -> Result<Topic> {
    if self.name_exists.query_opt(&[&topic.name]).await?.is_some() {
      return Err(Error::conflict(format!("topic '{}' already exists", topic.name)));
    }
    let slug = match topic.slug {
      Some(ref slug) => slug.clone(),
      None => derive_slug(&topic.name)?,
    };
    if self.slug_exists.query_opt(&[&slug]).await?.is_some() {
      return Err(Error::conflict(format!("slug '{}' already exists", slug)));
    }

    let topic_id = Uuid::new_v4();
    let row = self.insert_topic.query_one(&[&topic_id, &topic.name, &slug]).await?;
    Ok(topic_from_row(&row))
  }

  /// No-op-safe partial patch: only supplied fields change.
  pub async fn update(&self, topic_id: Uuid, req: &UpdateTopic) -> Result<Topic> {
    let mut topic = self.get_by_id(topic_id).await?
      .ok_or_else(|| Error::not_found(format!("topic '{}' not found", topic_id)))?;

    if let Some(ref name) = req.name {
      if *name != topic.name
          && self.name_exists_other.query_opt(&[&name, &topic_id]).await?.is_some() {
        return Err(Error::conflict(format!("topic '{}' already exists", name)));
      }
      topic.name = name.clone();
    }
    if let Some(ref slug) = req.slug {
      if *slug != topic.slug
          && self.slug_exists_other.query_opt(&[&slug, &topic_id]).await?.is_some() {
        return Err(Error::conflict(format!("slug '{}' already exists", slug)));
      }
      topic.slug = slug.clone();
    }

    let row = self.update_topic.query_one(&[&topic.id, &topic.name, &topic.slug]).await?;
    Ok(topic_from_row(&row))
  }

  /// Delete fails while any article still references the topic, so
  /// references never orphan.
  pub async fn delete(&self, topic_id: Uuid) -> Result<()> {
    let topic = self.get_by_id(topic_id).await?
      .ok_or_else(|| Error::not_found(format!("topic '{}' not found", topic_id)))?;

    let key = topic.id.to_string();
    let row = self.articles_referencing.query_one(&[&key]).await?;
    let referencing: i64 = row.get(0);
    if referencing > 0 {
      return Err(Error::conflict(format!(
        "topic '{}' is referenced by {} article(s)", topic.name, referencing)));
    }

    self.delete_topic.execute(&[&topic_id]).await?;
    Ok(())
  }

  /// id -> name lookup over all topics, loaded in one query.
  pub async fn name_map(&self) -> Result<HashMap<String, String>> {
    let topics = self.all().await?;
    Ok(topics.into_iter().map(|t| (t.id.to_string(), t.name)).collect())
  }

  /// Resolve topic names (as the admin UI sends them) to stored ids.
  /// An unknown name is passed through as-is; no id matches it, so the
  /// overlap filter correctly selects nothing instead of everything.
  pub async fn ids_for_names(&self, names: &[String]) -> Result<Vec<String>> {
    let topics = self.all().await?;
    Ok(names.iter().map(|name| {
      topics.iter()
        .find(|t| t.name == *name || t.slug == *name)
        .map(|t| t.id.to_string())
        .unwrap_or_else(|| name.clone())
    }).collect())
  }

  /// Strict resolution for article writes: every name must exist.
  pub async fn resolve_ids(&self, names: &[String]) -> Result<Vec<String>> {
    let topics = self.all().await?;
    let mut ids = Vec::with_capacity(names.len());
    let mut errors = Vec::new();
    for name in names {
      match topics.iter().find(|t| t.name == *name || t.slug == *name) {
        Some(topic) => ids.push(topic.id.to_string()),
        None => errors.push(format!("unknown topic '{}'", name)),
      }
    }
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }
    Ok(ids)
  }

  /// Swap stored topic ids for display names with one batch topic
  /// load, never a per-article query.
  pub async fn populate_names(&self, articles: &mut [Article]) -> Result<()> {
    if articles.is_empty() {
      return Ok(());
    }
    let names = self.name_map().await?;
    for article in articles.iter_mut() {
      article.topics = article.topics.iter().map(|id| {
        names.get(id).cloned().unwrap_or_else(|| id.clone())
      }).collect();
    }
    Ok(())
  }
}
