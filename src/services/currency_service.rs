use crate::{
    models::{ConversionResult, Devise, DeviseView},
    repositories::CurrencyRepository,
    utils::{AppError, Config},
};
use chrono::DateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{last_n_dates, today_str};

/// Rate-table provider response:
/// GET {base_url}/{api_key}/latest/{base}
#[derive(Debug, Deserialize)]
pub struct RateTableResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub conversion_rates: HashMap<String, f64>,
    pub time_last_update_utc: Option<String>,
    pub base_code: Option<String>,
}

/// Derives the snapshot date from the provider's RFC-2822-style date
/// header, defaulting to today when it does not parse.
fn derive_snapshot_date(raw: Option<&str>) -> String {
    raw.and_then(|s| DateTime::parse_from_rfc2822(s).ok())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(today_str)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Projects the view of `code` out of a stored snapshot: same table, same
/// date, rate read from the table. No second write happens for non-base
/// codes.
fn project_view(code: &str, snapshot: &Devise) -> Result<DeviseView, AppError> {
    if code == snapshot.nom {
        return Ok(DeviseView::from(snapshot));
    }
    let taux = snapshot
        .conversion_rates
        .get(code)
        .copied()
        .ok_or_else(|| AppError::NotFound("Devise non trouvée après mise à jour.".to_string()))?;
    Ok(DeviseView {
        id: None,
        nom: code.to_string(),
        taux,
        date_maj: snapshot.date_maj.clone(),
        base_code: snapshot.base_code.clone(),
        conversion_rates: snapshot.conversion_rates.clone(),
    })
}

/// Projects a run of base snapshots onto `code`, one view per day. Days
/// whose table does not carry the code are dropped, so an unknown code
/// yields an empty history.
fn project_history(code: &str, snapshots: &[Devise]) -> Vec<DeviseView> {
    snapshots
        .iter()
        .filter_map(|snapshot| project_view(code, snapshot).ok())
        .collect()
}

/// Conversion arithmetic over a snapshot's rate table. Both codes must be
/// table keys; the result is `montant / taux_source * taux_cible`, which
/// collapses to `montant * taux_cible` when the snapshot is denominated in
/// the source currency.
fn compute_conversion(
    snapshot: &Devise,
    code_source: &str,
    code_cible: &str,
    montant: f64,
) -> Result<ConversionResult, AppError> {
    let rates = &snapshot.conversion_rates;
    let (taux_source, taux_cible) = match (rates.get(code_source), rates.get(code_cible)) {
        (Some(source), Some(cible)) => (*source, *cible),
        _ => {
            return Err(AppError::NotFound(
                "Devise source ou cible non trouvée.".to_string(),
            ))
        }
    };

    Ok(ConversionResult {
        code_source: code_source.to_string(),
        code_cible: code_cible.to_string(),
        montant_source: montant,
        montant_converti: round4(montant / taux_source * taux_cible),
        taux_source,
        taux_cible,
        date_maj: snapshot.date_maj.clone(),
    })
}

/// Fetches the full rate table for `base` from the upstream provider.
pub(crate) async fn fetch_rate_table(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    base: &str,
) -> Result<RateTableResponse, AppError> {
    let url = format!("{}/{}/latest/{}", base_url, api_key, base);

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| {
            log::error!("❌ ExchangeRate API unreachable: {}", e);
            AppError::UpstreamUnavailable(
                "Erreur lors de la récupération des taux de change.".to_string(),
            )
        })?;

    if !response.status().is_success() {
        log::error!("❌ ExchangeRate API returned {}", response.status());
        return Err(AppError::UpstreamUnavailable(
            "Erreur lors de la récupération des taux de change.".to_string(),
        ));
    }

    let data: RateTableResponse = response.json().await.map_err(|e| {
        log::error!("❌ Failed to parse ExchangeRate response: {}", e);
        AppError::Internal("Erreur de traitement de la réponse de l'API externe.".to_string())
    })?;

    if data.result != "success" {
        return Err(AppError::UpstreamUnavailable(
            "Réponse API ExchangeRate invalide.".to_string(),
        ));
    }

    Ok(data)
}

/// Cache-through currency service: one snapshot per day, stored under the
/// configured base currency with its full conversion table.
#[derive(Clone)]
pub struct CurrencyService {
    repo: CurrencyRepository,
    http: reqwest::Client,
    config: Arc<Config>,
}

impl CurrencyService {
    pub fn new(repo: CurrencyRepository, http: reqwest::Client, config: Arc<Config>) -> Self {
        Self { repo, http, config }
    }

    /// Fetches today's table from the provider and persists the single
    /// base-currency snapshot.
    async fn fetch_and_store(&self) -> Result<Devise, AppError> {
        let base = &self.config.base_currency;
        let data = fetch_rate_table(
            &self.http,
            &self.config.exchangerate_api_url,
            &self.config.exchangerate_api_key,
            base,
        )
        .await?;

        let date_maj = derive_snapshot_date(data.time_last_update_utc.as_deref());
        let base_code = data.base_code.unwrap_or_else(|| base.clone());
        let taux = data.conversion_rates.get(&base_code).copied().unwrap_or(1.0);

        let devise = Devise {
            id: None,
            nom: base_code.clone(),
            taux,
            date_maj,
            base_code,
            conversion_rates: data.conversion_rates,
        };
        self.repo.upsert_snapshot(&devise).await?;

        log::info!(
            "💱 Stored {} rate snapshot for {} ({} rates)",
            devise.nom,
            devise.date_maj,
            devise.conversion_rates.len()
        );
        Ok(devise)
    }

    /// Today's base snapshot, fetching from the provider on a cache miss.
    async fn base_snapshot_for_today(&self) -> Result<Devise, AppError> {
        let today = today_str();
        if let Some(devise) = self
            .repo
            .find_by_code_and_date(&self.config.base_currency, &today)
            .await?
        {
            return Ok(devise);
        }
        self.fetch_and_store().await
    }

    /// Today's snapshot view for a currency code, from the store or the
    /// provider. Non-base codes are reconstructed from the base snapshot.
    pub async fn get_currency(&self, code: &str) -> Result<DeviseView, AppError> {
        let today = today_str();
        if let Some(devise) = self.repo.find_by_code_and_date(code, &today).await? {
            return Ok(DeviseView::from(&devise));
        }
        let base = self.base_snapshot_for_today().await?;
        project_view(code, &base)
    }

    /// Converts an amount between two currencies using today's table.
    pub async fn convert(
        &self,
        code_source: &str,
        code_cible: &str,
        montant: f64,
    ) -> Result<ConversionResult, AppError> {
        if !montant.is_finite() || montant < 0.0 {
            return Err(AppError::InvalidArgument("Montant invalide.".to_string()));
        }

        let today = today_str();
        let base = match self
            .repo
            .find_by_code_and_date(&self.config.base_currency, &today)
            .await?
        {
            Some(devise) => devise,
            None => match self.fetch_and_store().await {
                Ok(devise) => devise,
                Err(e) => {
                    log::warn!("⚠️  Rate fetch failed during conversion: {}", e);
                    return Err(AppError::NotFound(
                        "Taux de change non disponible.".to_string(),
                    ));
                }
            },
        };

        compute_conversion(&base, code_source, code_cible, montant)
    }

    /// History for the last `jours` calendar days. Only base snapshots are
    /// ever stored, so the query runs against the base code and each day is
    /// projected onto the requested one.
    pub async fn history_last_days(
        &self,
        code: &str,
        jours: i64,
    ) -> Result<Vec<DeviseView>, AppError> {
        let snapshots = self
            .repo
            .find_history_by_dates(&self.config.base_currency, &last_n_dates(jours))
            .await?;
        Ok(project_history(code, &snapshots))
    }

    pub async fn history_range(
        &self,
        code: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<DeviseView>, AppError> {
        let snapshots = self
            .repo
            .find_history_in_range(&self.config.base_currency, date_debut, date_fin)
            .await?;
        Ok(project_history(code, &snapshots))
    }

    /// Resolves the configured popular codes, dropping any that fail.
    pub async fn populaires(&self) -> Vec<DeviseView> {
        let mut results = Vec::new();
        for code in &self.config.popular_currencies {
            match self.get_currency(code).await {
                Ok(view) => results.push(view),
                Err(e) => log::debug!("Skipping popular currency {}: {}", code, e),
            }
        }
        results
    }

    /// Add is permissive: the code is not checked against any rate table.
    pub async fn add_favorite(&self, user_id: &str, nom_devise: &str) -> Result<(), AppError> {
        self.repo.add_favorite(user_id, nom_devise).await
    }

    pub async fn remove_favorite(&self, user_id: &str, nom_devise: &str) -> Result<(), AppError> {
        self.repo.remove_favorite(user_id, nom_devise).await
    }

    pub async fn read_favorites(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        self.repo.read_favorites(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_snapshot() -> Devise {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 1.0);
        rates.insert("EUR".to_string(), 0.9);
        rates.insert("GBP".to_string(), 0.8);
        Devise {
            id: None,
            nom: "USD".to_string(),
            taux: 1.0,
            date_maj: "2025-06-10".to_string(),
            base_code: "USD".to_string(),
            conversion_rates: rates,
        }
    }

    #[test]
    fn conversion_from_base_multiplies_by_target_rate() {
        let result = compute_conversion(&usd_snapshot(), "USD", "EUR", 100.0).unwrap();
        assert_eq!(result.montant_converti, 90.0);
        assert_eq!(result.taux_cible, 0.9);
        assert_eq!(result.taux_source, 1.0);
        assert_eq!(result.date_maj, "2025-06-10");
    }

    #[test]
    fn cross_conversion_uses_rate_ratio() {
        // 50 EUR -> GBP: 50 / 0.9 * 0.8, rounded to 4 decimals
        let result = compute_conversion(&usd_snapshot(), "EUR", "GBP", 50.0).unwrap();
        assert_eq!(result.montant_converti, 44.4444);
    }

    #[test]
    fn unknown_code_is_not_found() {
        let err = compute_conversion(&usd_snapshot(), "USD", "XXX", 10.0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = compute_conversion(&usd_snapshot(), "XXX", "EUR", 10.0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn projection_reuses_table_and_date() {
        let view = project_view("EUR", &usd_snapshot()).unwrap();
        assert_eq!(view.nom, "EUR");
        assert_eq!(view.taux, 0.9);
        assert_eq!(view.date_maj, "2025-06-10");
        assert_eq!(view.base_code, "USD");
        assert!(view.id.is_none());
        assert_eq!(view.conversion_rates.len(), 3);
    }

    #[test]
    fn projection_of_base_keeps_identity() {
        let view = project_view("USD", &usd_snapshot()).unwrap();
        assert_eq!(view.nom, "USD");
        assert_eq!(view.taux, 1.0);
    }

    #[test]
    fn projection_of_unknown_code_fails() {
        assert!(project_view("XXX", &usd_snapshot()).is_err());
    }

    fn usd_snapshot_for(date: &str) -> Devise {
        let mut snapshot = usd_snapshot();
        snapshot.date_maj = date.to_string();
        snapshot
    }

    #[test]
    fn history_projects_non_base_codes_from_base_snapshots() {
        let snapshots = [
            usd_snapshot_for("2025-06-09"),
            usd_snapshot_for("2025-06-10"),
        ];
        let views = project_history("EUR", &snapshots);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].nom, "EUR");
        assert_eq!(views[0].taux, 0.9);
        assert_eq!(views[0].date_maj, "2025-06-09");
        assert_eq!(views[1].date_maj, "2025-06-10");
    }

    #[test]
    fn history_of_the_base_code_keeps_identity() {
        let snapshots = [usd_snapshot_for("2025-06-09")];
        let views = project_history("USD", &snapshots);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].nom, "USD");
        assert_eq!(views[0].taux, 1.0);
    }

    #[test]
    fn history_of_an_unknown_code_is_empty() {
        let snapshots = [
            usd_snapshot_for("2025-06-09"),
            usd_snapshot_for("2025-06-10"),
        ];
        assert!(project_history("XXX", &snapshots).is_empty());
    }

    #[test]
    fn snapshot_date_parses_provider_header() {
        assert_eq!(
            derive_snapshot_date(Some("Fri, 27 Jun 2025 00:00:01 +0000")),
            "2025-06-27"
        );
    }

    #[test]
    fn snapshot_date_defaults_to_today() {
        assert_eq!(derive_snapshot_date(Some("not a date")), today_str());
        assert_eq!(derive_snapshot_date(None), today_str());
    }

    #[test]
    fn round4_behaviour() {
        assert_eq!(round4(44.44444444), 44.4444);
        assert_eq!(round4(0.00005), 0.0001);
        assert_eq!(round4(90.0), 90.0);
    }

    // Needs both a live database and a mock provider; no-ops when
    // MONGODB_URI is not set.
    mod cache {
        use super::super::*;
        use crate::database::MongoDB;
        use crate::repositories::CurrencyRepository;
        use mongodb::bson::{doc, Document};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn test_config(provider_url: &str, base: &str) -> Arc<Config> {
            Arc::new(Config {
                host: "127.0.0.1".to_string(),
                port: "0".to_string(),
                mongodb_uri: String::new(),
                jwt_secret: "test-secret".to_string(),
                exchangerate_api_url: provider_url.to_string(),
                exchangerate_api_key: "test-key".to_string(),
                base_currency: base.to_string(),
                alphavantage_api_url: String::new(),
                alphavantage_function: "TIME_SERIES_DAILY".to_string(),
                alphavantage_api_key: String::new(),
                fmp_profile_api_url: String::new(),
                fmp_api_key: String::new(),
                popular_currencies: vec![],
                popular_stocks: vec![],
                popular_companies: vec![],
            })
        }

        #[tokio::test]
        async fn same_day_lookups_hit_the_provider_once() {
            let Some(uri) = std::env::var("MONGODB_URI").ok() else { return };
            let Ok(db) = MongoDB::new(&uri).await else { return };

            // A code nothing else writes, so the snapshot starts cold.
            let base = format!("T{}", uuid::Uuid::new_v4().simple());
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(format!("/test-key/latest/{}", base)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": "success",
                    "base_code": base,
                    "conversion_rates": { "EUR": 0.9 }
                })))
                .expect(1)
                .mount(&server)
                .await;

            let service = CurrencyService::new(
                CurrencyRepository::new(&db),
                reqwest::Client::new(),
                test_config(&server.uri(), &base),
            );

            let first = service.get_currency(&base).await.unwrap();
            let second = service.get_currency(&base).await.unwrap();
            assert_eq!(first.nom, second.nom);
            assert_eq!(first.taux, second.taux);
            assert_eq!(first.date_maj, second.date_maj);

            db.collection::<Document>("devises")
                .delete_many(doc! { "nom": &base })
                .await
                .unwrap();
        }
    }

    mod provider {
        use super::super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn fetches_and_parses_a_rate_table() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/test-key/latest/USD"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": "success",
                    "base_code": "USD",
                    "time_last_update_utc": "Fri, 27 Jun 2025 00:00:01 +0000",
                    "conversion_rates": { "USD": 1.0, "EUR": 0.9 }
                })))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let data = fetch_rate_table(&client, &server.uri(), "test-key", "USD")
                .await
                .unwrap();
            assert_eq!(data.base_code.as_deref(), Some("USD"));
            assert_eq!(data.conversion_rates.get("EUR"), Some(&0.9));
        }

        #[tokio::test]
        async fn non_success_marker_is_upstream_unavailable() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": "error",
                    "error-type": "invalid-key"
                })))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let err = fetch_rate_table(&client, &server.uri(), "k", "USD")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        }

        #[tokio::test]
        async fn provider_error_status_is_upstream_unavailable() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let err = fetch_rate_table(&client, &server.uri(), "k", "USD")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        }
    }
}
