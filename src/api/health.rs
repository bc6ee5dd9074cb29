use actix_web::{HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        service: "webcur".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Landing page pointing at the API documentation.
pub async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/html").body(
        "<h2>WebCur backend started successfully! / WebCur backend démarré avec succès!</h2>\
         <p>Go to <a href=\"/swagger-ui/\" target=\"_blank\">/swagger-ui/</a> for the API \
         documentation.<br>Allez sur <a href=\"/swagger-ui/\" target=\"_blank\">/swagger-ui/</a> \
         pour la documentation API.</p>",
    )
}
