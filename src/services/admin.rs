use actix_web::{
  get, post, put, delete, web, HttpResponse,
  Error
};

use crate::error::Error as ApiError;
use crate::app::*;
use crate::models::*;
use crate::forms::article::*;
use crate::db::DbService;
use crate::db::query::clamp_limit;
use crate::util::parse_id;

/// Admin article listing: unpublished-inclusive, full filter set.
#[get("/articles")]
async fn list(
  db: web::Data<DbService>,
  req: web::Query<AdminArticleRequest>
) -> Result<HttpResponse, Error> {
  let req = req.into_inner();
  let mut filters = req.to_filters()?;

  if let Some(ref topic) = req.topic {
    filters.topics = db.topic.ids_for_names(&[topic.clone()]).await?;
  }

  // count and rows come from the same filter value, so the total
  // matches the page contents.
  let total = db.article.count(&filters).await?;
  let mut articles = db.article.find(&filters).await?;
  db.topic.populate_names(&mut articles).await?;

  let limit = clamp_limit(filters.limit);
  Ok(HttpResponse::Ok().json(ArticlePage {
    data: articles,
    pagination: Pagination::new(req.page(), limit, total),
  }))
}

#[get("/articles/{id}")]
async fn get_article(
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let article_id = parse_id(&id)?;
  let article = db.article.get_by_id(article_id).await?
    .ok_or_else(|| ApiError::not_found(format!("article '{}' not found", article_id)))?;

  let mut articles = vec![article];
  db.topic.populate_names(&mut articles).await?;
  Ok(HttpResponse::Ok().json(articles.remove(0)))
}

#[post("/articles")]
async fn store_article(
  db: web::Data<DbService>,
  article: web::Json<CreateArticle>,
) -> Result<HttpResponse, Error> {
  let article = article.into_inner();
  article.validate()?;

  let topic_ids = db.topic.resolve_ids(&article.topics).await?;
  let stored = db.article.store(&article, topic_ids).await?;

  let mut articles = vec![stored];
  db.topic.populate_names(&mut articles).await?;
  Ok(HttpResponse::Created().json(articles.remove(0)))
}

#[put("/articles/{id}")]
async fn update_article(
  db: web::Data<DbService>,
  id: web::Path<String>,
  article: web::Json<UpdateArticle>,
) -> Result<HttpResponse, Error> {
  let article_id = parse_id(&id)?;
  let article = article.into_inner();
  article.validate()?;

  let topic_ids = match article.topics {
    Some(ref names) => Some(db.topic.resolve_ids(names).await?),
    None => None,
  };
  let updated = db.article.update(article_id, &article, topic_ids).await?;

  let mut articles = vec![updated];
  db.topic.populate_names(&mut articles).await?;
  Ok(HttpResponse::Ok().json(articles.remove(0)))
}

/// Hard delete.  Soft delete goes through PUT with published=false.
#[delete("/articles/{id}")]
async fn delete_article(
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let article_id = parse_id(&id)?;
  let deleted = db.article.delete(article_id).await?;
  if deleted == 0 {
    return Err(ApiError::not_found(format!("article '{}' not found", article_id)).into());
  }
  Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Clone, Default)]
pub struct AdminArticleService {
}

impl super::Service for AdminArticleService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<(), crate::Error> {
    Ok(())
  }

  fn admin_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(list)
      .service(get_article)
      .service(store_article)
      .service(update_article)
      .service(delete_article);
  }
}

pub fn new_factory() -> AdminArticleService {
  Default::default()
}
