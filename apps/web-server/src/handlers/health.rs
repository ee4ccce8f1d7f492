//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::observability::RequestId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

/// GET /health
///
/// 503 when the database does not answer a ping.
pub async fn health_check(state: web::Data<AppState>, request_id: RequestId) -> HttpResponse {
    let database_up = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            false
        }
    };

    let response = HealthResponse {
        status: if database_up { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_up { "up" } else { "down" },
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: request_id.as_str().to_string(),
    };

    if database_up {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
