use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WebCur API",
        version = "1.0.0",
        description = "REST API for currency exchange rates, stock daily bars and company profiles. \n\n**Authentication:** Conversion, purchase-cost and favorites endpoints require a JWT Bearer token obtained via `/connexion`.\n\n**Caching:** External providers are queried at most once per day per resource; same-day snapshots are served from the database.",
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::logout,

        // Health
        crate::api::health::health_check,

        // Users
        crate::api::users::register,
        crate::api::users::list,
        crate::api::users::get_by_id,
        crate::api::users::update,
        crate::api::users::delete,

        // Currencies
        crate::api::currencies::get_devise,
        crate::api::currencies::convert,
        crate::api::currencies::populaires,
        crate::api::currencies::historique,
        crate::api::currencies::read_favoris,
        crate::api::currencies::add_favori,
        crate::api::currencies::remove_favori,

        // Stocks
        crate::api::stocks::get_action,
        crate::api::stocks::calculer_achat,
        crate::api::stocks::populaires,
        crate::api::stocks::historique,
        crate::api::stocks::read_favoris,
        crate::api::stocks::add_favori,
        crate::api::stocks::remove_favori,

        // Companies
        crate::api::companies::get_societe,
        crate::api::companies::populaires,
        crate::api::companies::historique,
    ),
    components(
        schemas(
            // Auth
            crate::api::auth::LoginRequest,
            crate::api::auth::LoginResponse,

            // Health
            crate::api::health::HealthResponse,

            // Users
            crate::services::user_service::RegisterUserRequest,
            crate::services::user_service::UpdateUserRequest,
            crate::models::UtilisateurView,

            // Currencies
            crate::api::currencies::ConversionRequest,
            crate::api::currencies::FavoriDeviseRequest,
            crate::models::DeviseView,
            crate::models::ConversionResult,

            // Stocks
            crate::api::stocks::CalculerAchatRequest,
            crate::api::stocks::FavoriActionRequest,
            crate::models::ActionView,
            crate::models::CoutAchat,

            // Companies
            crate::models::SocieteView,
            crate::models::ProfilSociete,
        )
    ),
    tags(
        (name = "Auth", description = "Login and logout. Issues 24h JWT tokens."),
        (name = "Health", description = "Service health check."),
        (name = "Utilisateurs", description = "User account management."),
        (name = "Devises", description = "Exchange rate snapshots, conversion, history and favorites."),
        (name = "Actions", description = "Stock daily bars, purchase cost calculation, history and favorites."),
        (name = "Sociétés", description = "Company profile snapshots and history."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
