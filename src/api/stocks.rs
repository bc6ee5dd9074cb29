use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::models::{ActionView, CoutAchat};
use crate::services::{auth_service::Claims, StockService};
use crate::utils::AppError;

use super::{non_empty_or_not_found, HistoriqueQuery};

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CalculerAchatRequest {
    pub symbole: String,
    pub date: String,
    pub quantite: f64,
    pub code_devise: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FavoriActionRequest {
    pub symbole: String,
}

#[utoipa::path(
    get,
    path = "/actions/{symbole}",
    tag = "Actions",
    responses(
        (status = 200, description = "Daily bar for the symbol", body = ActionView),
        (status = 404, description = "No data for the symbol"),
        (status = 502, description = "Bar provider unavailable")
    )
)]
pub async fn get_action(
    service: web::Data<StockService>,
    path: web::Path<String>,
    query: web::Query<ActionQuery>,
) -> Result<HttpResponse, AppError> {
    let symbole = path.into_inner().to_uppercase();
    log::info!("📈 GET /actions/{} (date: {:?})", symbole, query.date);
    let action = service.get_stock(&symbole, query.date.as_deref()).await?;
    Ok(HttpResponse::Ok().json(action))
}

#[utoipa::path(
    post,
    path = "/actions/calculer",
    tag = "Actions",
    request_body = CalculerAchatRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Purchase cost in the requested currency", body = CoutAchat),
        (status = 404, description = "No data for the symbol or rate unavailable")
    )
)]
pub async fn calculer_achat(
    service: web::Data<StockService>,
    request: web::Json<CalculerAchatRequest>,
) -> Result<HttpResponse, AppError> {
    if request.symbole.is_empty() || request.date.is_empty() || request.code_devise.is_empty() {
        return Err(AppError::InvalidArgument(
            "Tous les champs sont requis.".to_string(),
        ));
    }
    let symbole = request.symbole.to_uppercase();
    log::info!(
        "🧮 POST /actions/calculer - {} x{} in {}",
        symbole,
        request.quantite,
        request.code_devise
    );
    let cout = service
        .calculate_purchase_cost(&symbole, &request.date, request.quantite, &request.code_devise)
        .await?;
    Ok(HttpResponse::Ok().json(cout))
}

#[utoipa::path(
    get,
    path = "/actions/populaires",
    tag = "Actions",
    responses(
        (status = 200, description = "Latest bars for the configured popular symbols", body = [ActionView])
    )
)]
pub async fn populaires(service: web::Data<StockService>) -> HttpResponse {
    HttpResponse::Ok().json(service.populaires().await)
}

#[utoipa::path(
    get,
    path = "/actions/{symbole}/historique",
    tag = "Actions",
    params(HistoriqueQuery),
    responses(
        (status = 200, description = "Stored bars for the period", body = [ActionView]),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 404, description = "No data for the period")
    )
)]
pub async fn historique(
    service: web::Data<StockService>,
    path: web::Path<String>,
    query: web::Query<HistoriqueQuery>,
) -> Result<HttpResponse, AppError> {
    let symbole = path.into_inner().to_uppercase();

    let result = if let Some(jours) = query.jours {
        if jours < 1 {
            return Err(AppError::InvalidArgument(
                "Le nombre de jours doit être au moins 1.".to_string(),
            ));
        }
        service.history_last_days(&symbole, jours).await?
    } else if let (Some(debut), Some(fin)) = (&query.date_debut, &query.date_fin) {
        service.history_range(&symbole, debut, fin).await?
    } else {
        return Err(AppError::InvalidArgument(
            "Paramètres manquants ou invalides.".to_string(),
        ));
    };

    Ok(HttpResponse::Ok().json(non_empty_or_not_found(result)?))
}

#[utoipa::path(
    get,
    path = "/actions/favoris",
    tag = "Actions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's favorite stock symbols"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn read_favoris(
    service: web::Data<StockService>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let favoris = service.read_favorites(&user.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "favoris": favoris })))
}

#[utoipa::path(
    post,
    path = "/actions/favoris",
    tag = "Actions",
    request_body = FavoriActionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stock added to favorites"),
        (status = 400, description = "Missing symbol")
    )
)]
pub async fn add_favori(
    service: web::Data<StockService>,
    user: web::ReqData<Claims>,
    request: web::Json<FavoriActionRequest>,
) -> Result<HttpResponse, AppError> {
    if request.symbole.is_empty() {
        return Err(AppError::InvalidArgument("Symbole requis.".to_string()));
    }
    service
        .add_favorite(&user.sub, &request.symbole.to_uppercase())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Action ajoutée aux favoris."
    })))
}

#[utoipa::path(
    delete,
    path = "/actions/favoris",
    tag = "Actions",
    request_body = FavoriActionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stock removed from favorites")
    )
)]
pub async fn remove_favori(
    service: web::Data<StockService>,
    user: web::ReqData<Claims>,
    request: web::Json<FavoriActionRequest>,
) -> Result<HttpResponse, AppError> {
    if request.symbole.is_empty() {
        return Err(AppError::InvalidArgument("Symbole requis.".to_string()));
    }
    service
        .remove_favorite(&user.sub, &request.symbole.to_uppercase())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Action supprimée des favoris."
    })))
}
