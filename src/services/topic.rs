use actix_web::{
  get, post, put, delete, web, HttpResponse,
  Error
};

use crate::app::*;
use crate::models::*;
use crate::forms::topic::*;
use crate::db::DbService;
use crate::util::parse_id;

/// Get list of topics
#[get("/topics")]
async fn list(
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  let topics = db.topic.all().await?;
  Ok(HttpResponse::Ok().json(TopicList {
    topics,
  }))
}

#[post("/topics")]
async fn store_topic(
  db: web::Data<DbService>,
  topic: web::Json<CreateTopic>,
) -> Result<HttpResponse, Error> {
  let topic = topic.into_inner();
  topic.validate()?;

  let stored = db.topic.store(&topic).await?;
  Ok(HttpResponse::Created().json(stored))
}

#[put("/topics/{id}")]
async fn update_topic(
  db: web::Data<DbService>,
  id: web::Path<String>,
  topic: web::Json<UpdateTopic>,
) -> Result<HttpResponse, Error> {
  let topic_id = parse_id(&id)?;
  let topic = topic.into_inner();
  topic.validate()?;

  let updated = db.topic.update(topic_id, &topic).await?;
  Ok(HttpResponse::Ok().json(updated))
}

/// Delete fails with 409 while any article references the topic.
#[delete("/topics/{id}")]
async fn delete_topic(
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let topic_id = parse_id(&id)?;
  db.topic.delete(topic_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Clone, Default)]
pub struct TopicService {
}

impl super::Service for TopicService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<(), crate::Error> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(list);
  }

  fn admin_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(store_topic)
      .service(update_topic)
      .service(delete_topic);
  }
}

pub fn new_factory() -> TopicService {
  Default::default()
}
