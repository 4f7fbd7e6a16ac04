use actix_web::{
  get, web, HttpResponse,
  Error
};

use crate::error::Error as ApiError;
use crate::app::*;
use crate::models::*;
use crate::forms::article::*;
use crate::db::DbService;
use crate::db::query::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};

/// Public article listing: published only, newest first.
#[get("/articles")]
async fn list(
  cfg: web::Data<ArticleService>,
  db: web::Data<DbService>,
  req: web::Query<ArticleRequest>
) -> Result<HttpResponse, Error> {
  let req = req.into_inner();
  let mut filters = req.to_filters();
  filters.limit = Some(
    filters.limit.unwrap_or(cfg.default_limit).min(cfg.max_limit));

  if let Some(ref topic) = req.topic {
    filters.topics = db.topic.ids_for_names(&[topic.clone()]).await?;
  }

  let total = db.article.count(&filters).await?;
  let mut articles = db.article.find(&filters).await?;
  db.topic.populate_names(&mut articles).await?;

  let limit = clamp_limit(filters.limit);
  let page = clamp_offset(filters.offset) / limit + 1;
  Ok(HttpResponse::Ok().json(ArticlePage {
    data: articles,
    pagination: Pagination::new(page, limit, total),
  }))
}

/// Fetch a published article by slug.  trackView defaults to true and
/// routes the read through the atomic view increment.
#[get("/articles/{slug}")]
async fn get_article(
  db: web::Data<DbService>,
  slug: web::Path<String>,
  req: web::Query<TrackViewRequest>,
) -> Result<HttpResponse, Error> {
  let track = req.track_view.unwrap_or(true);
  let article = db.article.get_by_slug(&slug, track).await?
    .ok_or_else(|| ApiError::not_found(format!("article '{}' not found", slug)))?;

  let mut articles = vec![article];
  db.topic.populate_names(&mut articles).await?;
  Ok(HttpResponse::Ok().json(articles.remove(0)))
}

#[derive(Debug, Clone)]
pub struct ArticleService {
  pub default_limit: i64,
  pub max_limit: i64,
}

impl Default for ArticleService {
  fn default() -> Self {
    ArticleService {
      default_limit: DEFAULT_LIMIT,
      max_limit: MAX_LIMIT,
    }
  }
}

impl super::Service for ArticleService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<(), crate::Error> {
    if let Some(limit) = config.get_int("Article.default_limit")? {
      self.default_limit = limit;
    }
    if let Some(limit) = config.get_int("Article.max_limit")? {
      self.max_limit = limit;
    }
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(list)
      .service(get_article);
  }
}

pub fn new_factory() -> ArticleService {
  Default::default()
}
