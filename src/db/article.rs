use chrono::Utc;

use tokio_postgres::Row;

use uuid::Uuid;

use crate::error::*;

use crate::models::*;
use crate::forms::article::*;
use crate::slug::generate_unique_slug;

use crate::db::*;
use crate::db::query::ArticleQuery;
use crate::db::util::*;

#[derive(Clone)]
pub struct ArticleRepository {
  // get one article
  article_by_id: VersionedStatement,
  article_by_slug: VersionedStatement,

  // store article
  insert_article: VersionedStatement,

  // update article
  update_article: VersionedStatement,

  // delete article
  delete_article: VersionedStatement,

  // atomic view counter
  track_view: VersionedStatement,

  // slug uniqueness probes
  slug_exists: VersionedStatement,
  slug_exists_other: VersionedStatement,

  // admin dashboard
  dashboard_stats: VersionedStatement,

  // dynamically built filter queries go through the shared client.
  shared_cl: SharedClient,
}

lazy_static! {
  static ref ARTICLE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "articles",
      columns: vec![
        column("id"),
        column("slug"),
        column("title"),
        column("content"),
        column("summary"),
        column("author"),
        column("cover_photo"),
        column("cover_photo_caption"),
        column("topics"),
        column("tags"),
        column("published"),
        column("published_date"),
        extra("created_at"),
        extra("updated_at"),
        extra("views"),
      ],
    }
  };
}

fn article_from_row(row: &Row) -> Article {
  Article {
    id: row.get(0),
    slug: row.get(1),
    title: row.get(2),
    content: row.get(3),
    summary: row.get(4),
    author: row.get(5),
    cover_photo: row.get(6),
    cover_photo_caption: row.get(7),
    topics: row.get(8),
    tags: row.get(9),
    published: row.get(10),
    published_date: row.get(11),
    created_at: row.get(12),
    updated_at: row.get(13),
    views: row.get(14),
  }
}

fn article_from_opt_row(row: &Option<Row>) -> Option<Article> {
  if let Some(ref row) = row {
    Some(article_from_row(row))
  } else {
    None
  }
}

impl ArticleRepository {
  pub fn new(cl: SharedClient) -> Result<ArticleRepository> {
    let select = ARTICLE_COLUMNS.build_select_query(true);
    let returning = ARTICLE_COLUMNS.get_columns(true);

    // Build article_by_* queries
    let article_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select))?;
    let article_by_slug = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE slug = $1 AND published"#, select))?;

    // store article query
    let insert_article = VersionedStatement::new(cl.clone(),
        &format!(r#"{} RETURNING {}"#,
        ARTICLE_COLUMNS.build_insert_query(false), returning))?;

    // update article query.  updated_at always refreshes.
    let update_article = VersionedStatement::new(cl.clone(),
        &format!(r#"UPDATE articles SET slug = $2, title = $3, content = $4,
        summary = $5, author = $6, cover_photo = $7, cover_photo_caption = $8,
        topics = $9, tags = $10, published = $11, published_date = $12,
        updated_at = NOW()
        WHERE id = $1 RETURNING {}"#, returning))?;

    // delete article query
    let delete_article = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM articles WHERE id = $1"#)?;

    // views only move through this statement, never through update.
    let track_view = VersionedStatement::new(cl.clone(),
        &format!(r#"UPDATE articles SET views = views + 1
        WHERE slug = $1 AND published RETURNING {}"#, returning))?;

    // slug uniqueness probes
    let slug_exists = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM articles WHERE slug = $1"#)?;
    let slug_exists_other = VersionedStatement::new(cl.clone(),
        r#"SELECT 1 FROM articles WHERE slug = $1 AND id <> $2"#)?;

    let dashboard_stats = VersionedStatement::new(cl.clone(),
        r#"SELECT COUNT(*),
          COUNT(*) FILTER (WHERE published),
          COUNT(*) FILTER (WHERE NOT published),
          COALESCE(SUM(views), 0)::bigint,
          (SELECT COUNT(*) FROM topics)
        FROM articles"#)?;

    Ok(ArticleRepository {
      article_by_id,
      article_by_slug,

      insert_article,
      update_article,
      delete_article,

      track_view,

      slug_exists,
      slug_exists_other,

      dashboard_stats,

      shared_cl: cl,
    })
  }

  pub async fn prepare(&self) -> Result<()> {
    self.article_by_id.prepare().await?;
    self.article_by_slug.prepare().await?;

    self.insert_article.prepare().await?;
    self.update_article.prepare().await?;
    self.delete_article.prepare().await?;

    self.track_view.prepare().await?;

    self.slug_exists.prepare().await?;
    self.slug_exists_other.prepare().await?;

    self.dashboard_stats.prepare().await?;
    Ok(())
  }

  pub async fn get_by_id(&self, article_id: Uuid) -> Result<Option<Article>> {
    let row = self.article_by_id.query_opt(&[&article_id]).await?;
    Ok(article_from_opt_row(&row))
  }

  /// Fetch a published article by slug.  With `track` the fetch goes
  /// through the atomic increment, so concurrent readers never lose a
  /// view.
  pub async fn get_by_slug(&self, slug: &str, track: bool) -> Result<Option<Article>> {
    let row = if track {
      self.track_view.query_opt(&[&slug]).await?
    } else {
      self.article_by_slug.query_opt(&[&slug]).await?
    };
    Ok(article_from_opt_row(&row))
  }

  pub async fn slug_taken(&self, slug: &str) -> Result<bool> {
    Ok(self.slug_exists.query_opt(&[&slug]).await?.is_some())
  }

  async fn slug_taken_by_other(&self, slug: &str, article_id: Uuid) -> Result<bool> {
    Ok(self.slug_exists_other.query_opt(&[&slug, &article_id]).await?.is_some())
  }

  /// Store a new article.  A supplied slug must be free; a missing one
  /// is derived from the title with collision suffixes.  Both checks
  /// are best-effort, the UNIQUE constraint on articles.slug is the
  /// backstop.
  pub async fn store(&self, article: &CreateArticle, topic_ids: Vec<String>) -> Result<Article> {
    let slug = match article.slug {
      Some(ref slug) => {
        if self.slug_taken(slug).await? {
          return Err(Error::conflict(format!("slug '{}' already exists", slug)));
        }
        slug.clone()
      },
      None => {
        generate_unique_slug(&article.title, |candidate| {
          let repo = self.clone();
          async move { repo.slug_taken(&candidate).await }
        }).await?
      },
    };

    let published = article.published.unwrap_or(false);
    let published_date = if published {
      Some(Utc::now().naive_utc())
    } else {
      None
    };

    let article_id = Uuid::new_v4();
    let row = self.insert_article.query_one(&[
        &article_id, &slug, &article.title, &article.content,
        &article.summary, &article.author,
        &article.cover_photo, &article.cover_photo_caption,
        &topic_ids, &article.tags,
        &published, &published_date,
      ]).await?;
    Ok(article_from_row(&row))
  }

  /// Partial update: only supplied fields change.  A new title without
  /// an explicit slug re-derives the slug; published_date is stamped
  /// the first time an article goes live.
  pub async fn update(&self, article_id: Uuid, req: &UpdateArticle,
      topic_ids: Option<Vec<String>>) -> Result<Article> {
    let mut article = self.get_by_id(article_id).await?
      .ok_or_else(|| Error::not_found(format!("article '{}' not found", article_id)))?;

    if let Some(ref title) = req.title {
      article.title = title.clone();
      if req.slug.is_none() {
        article.slug = generate_unique_slug(title, |candidate| {
          let repo = self.clone();
          async move { repo.slug_taken_by_other(&candidate, article_id).await }
        }).await?;
      }
    }
    if let Some(ref slug) = req.slug {
      if *slug != article.slug && self.slug_taken_by_other(slug, article_id).await? {
        return Err(Error::conflict(format!("slug '{}' already exists", slug)));
      }
      article.slug = slug.clone();
    }
    if let Some(ref content) = req.content {
      article.content = content.clone();
    }
    if req.summary.is_some() {
      article.summary = req.summary.clone();
    }
    if req.author.is_some() {
      article.author = req.author.clone();
    }
    if req.cover_photo.is_some() {
      article.cover_photo = req.cover_photo.clone();
    }
    if req.cover_photo_caption.is_some() {
      article.cover_photo_caption = req.cover_photo_caption.clone();
    }
    if let Some(topic_ids) = topic_ids {
      article.topics = topic_ids;
    }
    if let Some(ref tags) = req.tags {
      article.tags = tags.clone();
    }
    if let Some(published) = req.published {
      if published && article.published_date.is_none() {
        article.published_date = Some(Utc::now().naive_utc());
      }
      article.published = published;
    }

    let row = self.update_article.query_one(&[
        &article.id, &article.slug, &article.title, &article.content,
        &article.summary, &article.author,
        &article.cover_photo, &article.cover_photo_caption,
        &article.topics, &article.tags,
        &article.published, &article.published_date,
      ]).await?;
    Ok(article_from_row(&row))
  }

  pub async fn delete(&self, article_id: Uuid) -> Result<u64> {
    Ok(self.delete_article.execute(&[&article_id]).await?)
  }

  /// Filtered row fetch.  Built from the same `ArticleQuery` logic as
  /// `count`, so pagination totals always match the rows.
  pub async fn find(&self, filters: &ArticleFilters) -> Result<Vec<Article>> {
    let query = ArticleQuery::from_filters(filters);
    let sql = query.select_sql(&ARTICLE_COLUMNS.get_columns(true));
    let rows = self.shared_cl.query_dyn(&sql, &query.params()).await?;
    Ok(rows.iter().map(article_from_row).collect())
  }

  pub async fn count(&self, filters: &ArticleFilters) -> Result<i64> {
    let query = ArticleQuery::from_filters(filters);
    let row = self.shared_cl.query_one_dyn(&query.count_sql(), &query.params()).await?;
    Ok(row.get(0))
  }

  pub async fn stats(&self) -> Result<DashboardStats> {
    let row = self.dashboard_stats.query_one(&[]).await?;
    Ok(DashboardStats {
      total_articles: row.get(0),
      published_articles: row.get(1),
      draft_articles: row.get(2),
      total_views: row.get(3),
      total_topics: row.get(4),
    })
  }
}
