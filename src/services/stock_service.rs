use crate::{
    models::{Action, ActionView, CoutAchat},
    repositories::StockRepository,
    utils::{AppError, Config},
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{last_n_dates, today_str, CurrencyService};

/// Daily-bar provider response:
/// GET {base_url}?function=TIME_SERIES_DAILY&symbol=...&apikey=...
#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<HashMap<String, RawDailyBar>>,
}

#[derive(Debug, Deserialize)]
pub struct RawDailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

impl RawDailyBar {
    /// The provider reports every field as a string; rows that do not
    /// parse are dropped from the ingest.
    fn to_action(&self, symbole: &str, date: &str) -> Option<Action> {
        Some(Action {
            id: None,
            symbole: symbole.to_string(),
            date: date.to_string(),
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self.volume.parse().ok()?,
        })
    }
}

/// Bars present in the provider series but not yet stored for the symbol.
fn bars_to_ingest(
    symbole: &str,
    series: &HashMap<String, RawDailyBar>,
    existing_dates: &[String],
) -> Vec<Action> {
    let existing: HashSet<&str> = existing_dates.iter().map(String::as_str).collect();
    series
        .iter()
        .filter(|(date, _)| !existing.contains(date.as_str()))
        .filter_map(|(date, raw)| raw.to_action(symbole, date))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fetches the entire available daily series for a symbol in one call.
/// `Ok(None)` means the provider has no series for the symbol.
pub(crate) async fn fetch_daily_series(
    client: &reqwest::Client,
    base_url: &str,
    function: &str,
    symbole: &str,
    api_key: &str,
) -> Result<Option<HashMap<String, RawDailyBar>>, AppError> {
    let response = client
        .get(base_url)
        .query(&[
            ("function", function),
            ("symbol", symbole),
            ("apikey", api_key),
        ])
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| {
            log::error!("❌ Alpha Vantage API unreachable: {}", e);
            AppError::UpstreamUnavailable(
                "Erreur lors de la récupération des données boursières.".to_string(),
            )
        })?;

    if !response.status().is_success() {
        log::error!("❌ Alpha Vantage API returned {}", response.status());
        return Err(AppError::UpstreamUnavailable(
            "Erreur lors de la récupération des données boursières.".to_string(),
        ));
    }

    let data: DailySeriesResponse = response.json().await.map_err(|e| {
        log::error!("❌ Failed to parse Alpha Vantage response: {}", e);
        AppError::Internal("Erreur de traitement de la réponse de l'API externe.".to_string())
    })?;

    Ok(data.time_series.filter(|series| !series.is_empty()))
}

/// Cache-through stock service: daily bars keyed by (symbole, date), filled
/// by ingesting the provider's whole series on a miss, with a fallback to
/// the most recent stored bar.
#[derive(Clone)]
pub struct StockService {
    repo: StockRepository,
    currency_service: CurrencyService,
    http: reqwest::Client,
    config: Arc<Config>,
}

impl StockService {
    pub fn new(
        repo: StockRepository,
        currency_service: CurrencyService,
        http: reqwest::Client,
        config: Arc<Config>,
    ) -> Self {
        Self {
            repo,
            currency_service,
            http,
            config,
        }
    }

    /// Ingests every bar the provider reports that is not yet stored, then
    /// returns how many were new.
    async fn ingest_series(
        &self,
        symbole: &str,
        series: &HashMap<String, RawDailyBar>,
    ) -> Result<usize, AppError> {
        let dates: Vec<String> = series.keys().cloned().collect();
        let existing = self.repo.find_existing_dates(symbole, &dates).await?;
        let new_bars = bars_to_ingest(symbole, series, &existing);
        self.repo.insert_many_bars(&new_bars).await?;
        Ok(new_bars.len())
    }

    /// Bar for (symbole, date), today when no date is given. On a cache
    /// miss the full provider series is ingested; when the requested date
    /// is still absent afterwards (non-trading day, or older than the
    /// provider's history) the most recent stored bar is returned instead,
    /// with its own date in the view.
    pub async fn get_stock(
        &self,
        symbole: &str,
        date: Option<&str>,
    ) -> Result<ActionView, AppError> {
        let requested = date.map(str::to_string).unwrap_or_else(today_str);

        if let Some(action) = self.repo.find_by_symbol_and_date(symbole, &requested).await? {
            return Ok(ActionView::from(&action));
        }

        if self.config.alphavantage_api_key.is_empty() {
            log::warn!("⚠️  API_KEY_AV is not configured");
            return Err(AppError::NotFound(
                "Données d'action non disponibles.".to_string(),
            ));
        }

        let series = fetch_daily_series(
            &self.http,
            &self.config.alphavantage_api_url,
            &self.config.alphavantage_function,
            symbole,
            &self.config.alphavantage_api_key,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Données d'action non disponibles.".to_string()))?;

        let ingested = self.ingest_series(symbole, &series).await?;
        log::info!("📈 Ingested {} new bars for {}", ingested, symbole);

        if let Some(action) = self.repo.find_by_symbol_and_date(symbole, &requested).await? {
            return Ok(ActionView::from(&action));
        }

        // Requested day has no bar even after ingest, fall back to the
        // latest one. The substituted date travels in the response.
        self.repo
            .find_latest_for_symbol(symbole)
            .await?
            .map(|action| ActionView::from(&action))
            .ok_or_else(|| AppError::NotFound("Données d'action non disponibles.".to_string()))
    }

    /// Purchase cost of `quantite` shares at the close of (symbole, date),
    /// converted into `code_devise`. Quantity is taken as-is, a negative
    /// quantity yields a negative cost.
    pub async fn calculate_purchase_cost(
        &self,
        symbole: &str,
        date: &str,
        quantite: f64,
        code_devise: &str,
    ) -> Result<CoutAchat, AppError> {
        let bar = self.get_stock(symbole, Some(date)).await?;
        let montant_usd = bar.close * quantite;
        let devise = code_devise.to_uppercase();

        if devise == "USD" {
            return Ok(CoutAchat {
                symbole: symbole.to_string(),
                date: bar.date,
                quantite,
                devise,
                cout_total: round2(montant_usd),
                taux: None,
            });
        }

        let conversion = self
            .currency_service
            .convert("USD", &devise, montant_usd)
            .await?;

        Ok(CoutAchat {
            symbole: symbole.to_string(),
            date: bar.date,
            quantite,
            devise,
            cout_total: conversion.montant_converti,
            taux: Some(conversion.taux_cible),
        })
    }

    pub async fn history_last_days(
        &self,
        symbole: &str,
        jours: i64,
    ) -> Result<Vec<ActionView>, AppError> {
        let bars = self
            .repo
            .find_history_by_dates(symbole, &last_n_dates(jours))
            .await?;
        Ok(bars.iter().map(ActionView::from).collect())
    }

    pub async fn history_range(
        &self,
        symbole: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<ActionView>, AppError> {
        let bars = self
            .repo
            .find_history_in_range(symbole, date_debut, date_fin)
            .await?;
        Ok(bars.iter().map(ActionView::from).collect())
    }

    pub async fn populaires(&self) -> Vec<ActionView> {
        let mut results = Vec::new();
        for symbole in &self.config.popular_stocks {
            match self.get_stock(symbole, None).await {
                Ok(view) => results.push(view),
                Err(e) => log::debug!("Skipping popular stock {}: {}", symbole, e),
            }
        }
        results
    }

    pub async fn add_favorite(&self, user_id: &str, symbole: &str) -> Result<(), AppError> {
        self.repo.add_favorite(user_id, symbole).await
    }

    pub async fn remove_favorite(&self, user_id: &str, symbole: &str) -> Result<(), AppError> {
        self.repo.remove_favorite(user_id, symbole).await
    }

    pub async fn read_favorites(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        self.repo.read_favorites(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_bar(open: &str, close: &str) -> RawDailyBar {
        RawDailyBar {
            open: open.to_string(),
            high: "230.0".to_string(),
            low: "225.0".to_string(),
            close: close.to_string(),
            volume: "48000".to_string(),
        }
    }

    #[test]
    fn ingest_diff_skips_stored_dates() {
        let mut series = HashMap::new();
        series.insert("2025-06-09".to_string(), raw_bar("228.0", "229.5"));
        series.insert("2025-06-10".to_string(), raw_bar("229.5", "231.0"));
        let existing = vec!["2025-06-09".to_string()];

        let bars = bars_to_ingest("AAPL", &series, &existing);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, "2025-06-10");
        assert_eq!(bars[0].symbole, "AAPL");
        assert_eq!(bars[0].close, 231.0);
        assert_eq!(bars[0].volume, 48_000);
    }

    #[test]
    fn unparsable_rows_are_dropped() {
        let mut series = HashMap::new();
        series.insert("2025-06-10".to_string(), raw_bar("not-a-number", "231.0"));
        assert!(bars_to_ingest("AAPL", &series, &[]).is_empty());
    }

    #[test]
    fn cost_rounding_and_sign() {
        assert_eq!(round2(228.509 * 3.0), 685.53);
        // No sign validation: a negative quantity yields a negative cost.
        assert_eq!(round2(100.0 * -2.0), -200.0);
    }

    mod provider {
        use super::super::*;
        use wiremock::matchers::{method, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn fetches_the_whole_daily_series() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(query_param("function", "TIME_SERIES_DAILY"))
                .and(query_param("symbol", "AAPL"))
                .and(query_param("apikey", "test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "Time Series (Daily)": {
                        "2025-06-10": {
                            "1. open": "229.5", "2. high": "231.9", "3. low": "229.1",
                            "4. close": "231.0", "5. volume": "49000000"
                        },
                        "2025-06-09": {
                            "1. open": "228.0", "2. high": "230.0", "3. low": "227.5",
                            "4. close": "229.5", "5. volume": "51000000"
                        }
                    }
                })))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let series = fetch_daily_series(
                &client,
                &server.uri(),
                "TIME_SERIES_DAILY",
                "AAPL",
                "test-key",
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(series.len(), 2);
            assert_eq!(series["2025-06-10"].close, "231.0");
        }

        #[tokio::test]
        async fn missing_series_means_unknown_symbol() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "Error Message": "Invalid API call."
                })))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let series = fetch_daily_series(&client, &server.uri(), "TIME_SERIES_DAILY", "NOPE", "k")
                .await
                .unwrap();
            assert!(series.is_none());
        }

        #[tokio::test]
        async fn provider_error_status_is_upstream_unavailable() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let client = reqwest::Client::new();
            let err = fetch_daily_series(&client, &server.uri(), "TIME_SERIES_DAILY", "AAPL", "k")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        }
    }
}
