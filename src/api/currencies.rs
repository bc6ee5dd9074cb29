use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::models::{ConversionResult, DeviseView};
use crate::services::{auth_service::Claims, CurrencyService};
use crate::utils::AppError;

use super::{non_empty_or_not_found, HistoriqueQuery};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ConversionRequest {
    pub code_source: String,
    pub code_cible: String,
    pub montant: f64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FavoriDeviseRequest {
    pub nom_devise: String,
}

#[utoipa::path(
    get,
    path = "/devises/{nom}",
    tag = "Devises",
    responses(
        (status = 200, description = "Today's snapshot for the currency", body = DeviseView),
        (status = 404, description = "Unknown currency code"),
        (status = 502, description = "Rate provider unavailable")
    )
)]
pub async fn get_devise(
    service: web::Data<CurrencyService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let nom = path.into_inner().to_uppercase();
    log::info!("💱 GET /devises/{}", nom);
    let devise = service.get_currency(&nom).await?;
    Ok(HttpResponse::Ok().json(devise))
}

#[utoipa::path(
    post,
    path = "/devises/conversion",
    tag = "Devises",
    request_body = ConversionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Converted amount", body = ConversionResult),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Rate not available")
    )
)]
pub async fn convert(
    service: web::Data<CurrencyService>,
    request: web::Json<ConversionRequest>,
) -> Result<HttpResponse, AppError> {
    let code_source = request.code_source.to_uppercase();
    let code_cible = request.code_cible.to_uppercase();
    log::info!(
        "💱 POST /devises/conversion - {} {} -> {}",
        request.montant,
        code_source,
        code_cible
    );
    let result = service
        .convert(&code_source, &code_cible, request.montant)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    get,
    path = "/devises/populaires",
    tag = "Devises",
    responses(
        (status = 200, description = "Today's snapshots for the configured popular codes", body = [DeviseView])
    )
)]
pub async fn populaires(service: web::Data<CurrencyService>) -> HttpResponse {
    HttpResponse::Ok().json(service.populaires().await)
}

#[utoipa::path(
    get,
    path = "/devises/{nom}/historique",
    tag = "Devises",
    params(HistoriqueQuery),
    responses(
        (status = 200, description = "Stored snapshots for the period", body = [DeviseView]),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 404, description = "No data for the period")
    )
)]
pub async fn historique(
    service: web::Data<CurrencyService>,
    path: web::Path<String>,
    query: web::Query<HistoriqueQuery>,
) -> Result<HttpResponse, AppError> {
    let nom = path.into_inner().to_uppercase();

    let result = if let Some(jours) = query.jours {
        if jours < 1 {
            return Err(AppError::InvalidArgument(
                "Le nombre de jours doit être au moins 1.".to_string(),
            ));
        }
        service.history_last_days(&nom, jours).await?
    } else if let (Some(debut), Some(fin)) = (&query.date_debut, &query.date_fin) {
        service.history_range(&nom, debut, fin).await?
    } else {
        return Err(AppError::InvalidArgument(
            "Paramètres manquants ou invalides.".to_string(),
        ));
    };

    Ok(HttpResponse::Ok().json(non_empty_or_not_found(result)?))
}

#[utoipa::path(
    get,
    path = "/devises/favoris",
    tag = "Devises",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's favorite currency codes"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn read_favoris(
    service: web::Data<CurrencyService>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let favoris = service.read_favorites(&user.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "favoris": favoris })))
}

#[utoipa::path(
    post,
    path = "/devises/favoris",
    tag = "Devises",
    request_body = FavoriDeviseRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Currency added to favorites"),
        (status = 400, description = "Missing currency code")
    )
)]
pub async fn add_favori(
    service: web::Data<CurrencyService>,
    user: web::ReqData<Claims>,
    request: web::Json<FavoriDeviseRequest>,
) -> Result<HttpResponse, AppError> {
    if request.nom_devise.is_empty() {
        return Err(AppError::InvalidArgument(
            "Nom de devise requis.".to_string(),
        ));
    }
    service
        .add_favorite(&user.sub, &request.nom_devise.to_uppercase())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Devise ajoutée aux favoris."
    })))
}

#[utoipa::path(
    delete,
    path = "/devises/favoris",
    tag = "Devises",
    request_body = FavoriDeviseRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Currency removed from favorites")
    )
)]
pub async fn remove_favori(
    service: web::Data<CurrencyService>,
    user: web::ReqData<Claims>,
    request: web::Json<FavoriDeviseRequest>,
) -> Result<HttpResponse, AppError> {
    service
        .remove_favorite(&user.sub, &request.nom_devise.to_uppercase())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Devise supprimée des favoris."
    })))
}
