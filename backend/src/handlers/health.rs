use actix_web::{web, HttpResponse};

use crate::database::Database;
use crate::error::AppError;

#[actix_web::get("/health")]
pub async fn health_check(database: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let database_healthy = database.health_check().await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": if database_healthy { "ok" } else { "degraded" },
        "database": database_healthy,
    })))
}
