use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::services::{auth_service, UserService};
use crate::utils::{AppError, Config};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub mot_de_passe: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub id: String,
    pub nom_utilisateur: String,
}

#[utoipa::path(
    post,
    path = "/connexion",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    users: web::Data<UserService>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /connexion - email: {}", request.email);

    let user = users
        .authenticate(&request.email, &request.mot_de_passe)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Identifiants invalides".to_string()))?;

    let access_token = auth_service::generate_jwt(&user.id, &config.jwt_secret)?;

    log::info!("✅ Login successful: {}", request.email);
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        id: user.id,
        nom_utilisateur: user.nom_utilisateur,
    }))
}

/// Logout is handled client-side by discarding the token; the endpoint
/// only acknowledges it.
#[utoipa::path(
    post,
    path = "/deconnexion",
    tag = "Auth",
    responses(
        (status = 200, description = "Logout acknowledged")
    )
)]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Déconnexion réussie"
    }))
}
