use actix_web::{web, HttpResponse};

use crate::models::UtilisateurView;
use crate::services::{RegisterUserRequest, UpdateUserRequest, UserService};
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/utilisateurs",
    tag = "Utilisateurs",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UtilisateurView),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    service: web::Data<UserService>,
    request: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /utilisateurs - email: {}", request.email);
    let user = service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/utilisateurs",
    tag = "Utilisateurs",
    responses(
        (status = 200, description = "All registered users", body = [UtilisateurView])
    )
)]
pub async fn list(service: web::Data<UserService>) -> Result<HttpResponse, AppError> {
    let users = service.get_all().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/utilisateurs/{id}",
    tag = "Utilisateurs",
    responses(
        (status = 200, description = "User found", body = UtilisateurView),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_by_id(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = service
        .get_by_id(&path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Utilisateur non trouvé".to_string()))?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    put,
    path = "/utilisateurs/{id}",
    tag = "Utilisateurs",
    request_body = UpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "No field to update"),
        (status = 404, description = "No such user")
    )
)]
pub async fn update(
    service: web::Data<UserService>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let updated = service
        .update(&path.into_inner(), request.into_inner())
        .await?;
    if updated {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Utilisateur mis à jour"
        })))
    } else {
        Err(AppError::NotFound("Utilisateur non trouvé".to_string()))
    }
}

#[utoipa::path(
    delete,
    path = "/utilisateurs/{id}",
    tag = "Utilisateurs",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let deleted = service.delete(&path.into_inner()).await?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound("Utilisateur non trouvé".to_string()))
    }
}
