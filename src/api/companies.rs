use actix_web::{web, HttpResponse};

use crate::models::SocieteView;
use crate::services::CompanyService;
use crate::utils::AppError;

use super::{non_empty_or_not_found, HistoriqueQuery};

#[utoipa::path(
    get,
    path = "/societes/{symbole}",
    tag = "Sociétés",
    responses(
        (status = 200, description = "Company profile for the symbol", body = SocieteView),
        (status = 404, description = "Unknown symbol"),
        (status = 502, description = "Profile provider returned an error"),
        (status = 503, description = "Profile provider unreachable")
    )
)]
pub async fn get_societe(
    service: web::Data<CompanyService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let symbole = path.into_inner().to_uppercase();
    log::info!("🏢 GET /societes/{}", symbole);
    match service.get_company(&symbole).await? {
        Some(societe) => Ok(HttpResponse::Ok().json(societe)),
        None => Err(AppError::NotFound("Société non trouvée.".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/societes/populaires",
    tag = "Sociétés",
    responses(
        (status = 200, description = "Today's profiles for the configured popular symbols", body = [SocieteView])
    )
)]
pub async fn populaires(service: web::Data<CompanyService>) -> HttpResponse {
    HttpResponse::Ok().json(service.populaires().await)
}

#[utoipa::path(
    get,
    path = "/societes/{symbole}/historique",
    tag = "Sociétés",
    params(HistoriqueQuery),
    responses(
        (status = 200, description = "Stored profile snapshots for the period", body = [SocieteView]),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 404, description = "No data for the period")
    )
)]
pub async fn historique(
    service: web::Data<CompanyService>,
    path: web::Path<String>,
    query: web::Query<HistoriqueQuery>,
) -> Result<HttpResponse, AppError> {
    let symbole = path.into_inner().to_uppercase();

    let result = if let Some(jours) = query.jours {
        if jours < 2 {
            return Err(AppError::InvalidArgument(
                "Le nombre de jours doit être au moins 2.".to_string(),
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
