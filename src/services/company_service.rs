use crate::{
    models::{ProfilSociete, Societe, SocieteView},
    repositories::CompanyRepository,
    utils::{AppError, Config},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{last_n_dates, today_str};

/// First element of the company-profile provider's response array.
#[derive(Debug, Deserialize)]
pub struct FmpProfile {
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub profil: ProfilSociete,
}

/// Interprets the provider payload. `Ok(None)` covers every "ticker does
/// not exist" shape: empty body, non-list body, or a first element without
/// a `symbol` field. A first element that has a symbol but does not
/// deserialize is a processing failure instead.
fn profile_from_response(value: &Value) -> Result<Option<FmpProfile>, AppError> {
    let first = match value.as_array().and_then(|items| items.first()) {
        Some(first) => first,
        None => return Ok(None),
    };
    match first.get("symbol").and_then(Value::as_str) {
        Some(symbol) if !symbol.is_empty() => {}
        _ => return Ok(None),
    }
    serde_json::from_value(first.clone()).map(Some).map_err(|e| {
        log::error!("❌ Failed to deserialize company profile: {}", e);
        AppError::Internal("Erreur de traitement de la réponse de l'API externe.".to_string())
    })
}

/// Fetches the profile for a symbol. `Ok(None)` means the ticker does not
/// exist upstream; transport and HTTP failures keep their own statuses.
pub(crate) async fn fetch_company_profile(
    client: &reqwest::Client,
    base_url: &str,
    symbole: &str,
    api_key: &str,
) -> Result<Option<FmpProfile>, AppError> {
    let url = format!("{}/{}?apikey={}", base_url, symbole, api_key);

    let response = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| {
            log::error!("❌ FMP API unreachable for {}: {}", symbole, e);
            AppError::UpstreamConnection("Erreur de connexion à l'API externe.".to_string())
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        log::error!("❌ FMP API returned {} for {}", status, symbole);
        return Err(AppError::UpstreamUnavailable(format!(
            "Erreur de l'API externe (HTTP {}).",
            status.as_u16()
        )));
    }

    let data: Value = response.json().await.map_err(|e| {
        log::error!("❌ Failed to parse FMP response for {}: {}", symbole, e);
        AppError::Internal("Erreur de traitement de la réponse de l'API externe.".to_string())
    })?;

    profile_from_response(&data)
}

/// Cache-through company profile service, keyed by (symbole, today).
#[derive(Clone)]
pub struct CompanyService {
    repo: CompanyRepository,
    http: reqwest::Client,
    config: Arc<Config>,
}

impl CompanyService {
    pub fn new(repo: CompanyRepository, http: reqwest::Client, config: Arc<Config>) -> Self {
        Self { repo, http, config }
    }

    /// Today's profile snapshot for a symbol. `Ok(None)` means the ticker
    /// does not exist, which the handler turns into a 404.
    pub async fn get_company(&self, symbole: &str) -> Result<Option<SocieteView>, AppError> {
        let today = today_str();
        if let Some(societe) = self.repo.find_by_symbol_and_date(symbole, &today).await? {
            return Ok(Some(SocieteView::from(&societe)));
        }

        let profile = match fetch_company_profile(
            &self.http,
            &self.config.fmp_profile_api_url,
            symbole,
            &self.config.fmp_api_key,
        )
        .await?
        {
            Some(profile) => profile,
            None => return Ok(None),
        };

        let societe = Societe {
            id: None,
            symbole: profile.symbol.unwrap_or_else(|| symbole.to_string()),
            date_maj: today,
            profil: profile.profil,
        };
        self.repo.upsert_snapshot(&societe).await?;

        log::info!("🏢 Stored profile snapshot for {} ({})", societe.symbole, societe.date_maj);
        Ok(Some(SocieteView::from(&societe)))
    }

    pub async fn history_last_days(
        &self,
        symbole: &str,
        jours: i64,
    ) -> Result<Vec<SocieteView>, AppError> {
        let snapshots = self
            .repo
            .find_history_by_dates(symbole, &last_n_dates(jours))
            .await?;
        Ok(snapshots.iter().map(SocieteView::from).collect())
    }

    pub async fn history_range(
        &self,
        symbole: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<SocieteView>, AppError> {
        let snapshots = self
            .repo
            .find_history_in_range(symbole, date_debut, date_fin)
            .await?;
        Ok(snapshots.iter().map(SocieteView::from).collect())
    }

    /// Resolves the configured popular symbols, silently dropping the ones
    /// that fail or do not exist. Never raises.
    pub async fn populaires(&self) -> Vec<SocieteView> {
        let mut results = Vec::new();
        for symbole in &self.config.popular_companies {
            match self.get_company(symbole).await {
                Ok(Some(view)) => results.push(view),
                Ok(None) => log::debug!("Popular company {} not found upstream", symbole),
                Err(e) => log::debug!("Skipping popular company {}: {}", symbole, e),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_or_non_list_payloads_mean_not_found() {
        assert!(profile_from_response(&json!([])).unwrap().is_none());
        assert!(profile_from_response(&json!({"message": "Invalid API call"}))
            .unwrap()
            .is_none());
        assert!(profile_from_response(&json!(null)).unwrap().is_none());
    }

    #[test]
    fn first_element_without_symbol_means_not_found() {
        let payload = json!([{ "companyName": "Mystery Corp" }]);
        assert!(profile_from_response(&payload).unwrap().is_none());
    }

    #[test]
    fn valid_payload_parses_the_profile() {
        let payload = json!([{
            "symbol": "AAPL",
            "companyName": "Apple Inc.",
            "price": 231.0,
            "marketCap": 3456000000000.0,
            "sector": "Technology",
            "isEtf": false
        }]);
        let profile = profile_from_response(&payload).unwrap().unwrap();
        assert_eq!(profile.symbol.as_deref(), Some("AAPL"));
        assert_eq!(profile.profil.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.profil.price, Some(231.0));
        assert_eq!(profile.profil.is_etf, Some(false));
    }

    mod provider {
        use super::super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn fetches_an_existing_profile() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/AAPL"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                    "symbol": "AAPL",
                    "companyName": "Apple Inc.",
                    "price": 231.0
                }])))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let profile = fetch_company_profile(&client, &server.uri(), "AAPL", "k")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(profile.symbol.as_deref(), Some("AAPL"));
        }

        #[tokio::test]
        async fn upstream_404_means_not_found() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let profile = fetch_company_profile(&client, &server.uri(), "NOPE", "k")
                .await
                .unwrap();
            assert!(profile.is_none());
        }

        #[tokio::test]
        async fn upstream_500_is_a_gateway_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let err = fetch_company_profile(&client, &server.uri(), "AAPL", "k")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        }

        #[tokio::test]
        async fn unreachable_provider_is_service_unavailable() {
            // Nothing listens on this port.
            let client = reqwest::Client::new();
            let err = fetch_company_profile(&client, "http://127.0.0.1:1", "AAPL", "k")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UpstreamConnection(_)));
        }
    }
}
