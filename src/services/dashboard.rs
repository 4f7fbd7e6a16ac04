use actix_web::{
  get, web, HttpResponse,
  Error
};

use crate::app::*;
use crate::db::DbService;

/// Admin dashboard stats: article/topic counts and total views.
#[get("/dashboard")]
async fn stats(
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  let stats = db.article.stats().await?;
  Ok(HttpResponse::Ok().json(stats))
}

#[derive(Debug, Clone, Default)]
pub struct DashboardService {
}

impl super::Service for DashboardService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<(), crate::Error> {
    Ok(())
  }

  fn admin_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(stats);
  }
}

pub fn new_factory() -> DashboardService {
  Default::default()
}
