mod api;
mod database;
mod middleware;
mod models;
mod repositories;
mod services;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use middleware::AuthMiddleware;
use repositories::{CompanyRepository, CurrencyRepository, StockRepository, UserRepository};
use services::{CompanyService, CurrencyService, StockService, UserService};
use utils::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Invalid configuration");
    let config = Arc::new(config);

    log::info!("🚀 Starting WebCur...");

    // Initialize MongoDB connection (also creates the unique indexes)
    let db = database::MongoDB::new(&config.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");

    log::info!("✅ MongoDB connected successfully");

    // Shared HTTP client for the external rate/bar/profile providers
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    // Explicit service construction, injected via app_data
    let user_service = UserService::new(UserRepository::new(&db));
    let currency_service = CurrencyService::new(
        CurrencyRepository::new(&db),
        http.clone(),
        config.clone(),
    );
    let stock_service = StockService::new(
        StockRepository::new(&db),
        currency_service.clone(),
        http.clone(),
        config.clone(),
    );
    let company_service =
        CompanyService::new(CompanyRepository::new(&db), http.clone(), config.clone());

    let user_data = web::Data::new(user_service);
    let currency_data = web::Data::new(currency_service);
    let stock_data = web::Data::new(stock_service);
    let company_data = web::Data::new(company_service);
    let config_data = web::Data::new(config.as_ref().clone());

    let host = config.host.clone();
    let port = config.port.clone();
    let jwt_secret = config.jwt_secret.clone();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!(
        "📚 Swagger UI available at: http://{}:{}/swagger-ui/",
        host,
        port
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(user_data.clone())
            .app_data(currency_data.clone())
            .app_data(stock_data.clone())
            .app_data(company_data.clone())
            .app_data(config_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi),
            )
            .route("/", web::get().to(api::health::index))
            .route("/health", web::get().to(api::health::health_check))
            // Auth
            .route("/connexion", web::post().to(api::auth::login))
            .route("/deconnexion", web::post().to(api::auth::logout))
            // Users: reads and registration are open, mutations need a token
            .service(
                web::scope("/utilisateurs")
                    .route("", web::post().to(api::users::register))
                    .route("", web::get().to(api::users::list)),
            )
            .service(
                web::resource("/utilisateurs/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(api::users::get_by_id)),
            )
            .service(
                web::resource("/utilisateurs/{id}")
                    .guard(guard::Any(guard::Put()).or(guard::Delete()))
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .route(web::put().to(api::users::update))
                    .route(web::delete().to(api::users::delete)),
            )
            // Currencies: protected endpoints registered before the
            // `/{nom}` catch-all
            .service(
                web::resource("/devises/conversion")
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .route(web::post().to(api::currencies::convert)),
            )
            .service(
                web::scope("/devises/favoris")
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .route("", web::get().to(api::currencies::read_favoris))
                    .route("", web::post().to(api::currencies::add_favori))
                    .route("", web::delete().to(api::currencies::remove_favori)),
            )
            .service(
                web::scope("/devises")
                    .route("/populaires", web::get().to(api::currencies::populaires))
                    .route(
                        "/{nom}/historique",
                        web::get().to(api::currencies::historique),
                    )
                    .route("/{nom}", web::get().to(api::currencies::get_devise)),
            )
            // Stocks
            .service(
                web::resource("/actions/calculer")
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .route(web::post().to(api::stocks::calculer_achat)),
            )
            .service(
                web::scope("/actions/favoris")
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .route("", web::get().to(api::stocks::read_favoris))
                    .route("", web::post().to(api::stocks::add_favori))
                    .route("", web::delete().to(api::stocks::remove_favori)),
            )
            .service(
                web::scope("/actions")
                    .route("/populaires", web::get().to(api::stocks::populaires))
                    .route(
                        "/{symbole}/historique",
                        web::get().to(api::stocks::historique),
                    )
                    .route("/{symbole}", web::get().to(api::stocks::get_action)),
            )
            // Companies
            .service(
                web::scope("/societes")
                    .route("/populaires", web::get().to(api::companies::populaires))
                    .route(
                        "/{symbole}/historique",
                        web::get().to(api::companies::historique),
                    )
                    .route("/{symbole}", web::get().to(api::companies::get_societe)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
