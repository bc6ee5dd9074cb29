pub mod auth;
pub mod companies;
pub mod currencies;
pub mod health;
pub mod stocks;
pub mod swagger;
pub mod users;

use serde::Deserialize;

use crate::utils::AppError;

/// Query parameters shared by the three `/historique` endpoints: either
/// the last `jours` calendar days, or an explicit inclusive date range.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoriqueQuery {
    pub jours: Option<i64>,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
}

/// An empty history result (no snapshots, unknown code, inverted range)
/// surfaces as 404.
pub(crate) fn non_empty_or_not_found<T>(items: Vec<T>) -> Result<Vec<T>, AppError> {
    if items.is_empty() {
        return Err(AppError::NotFound(
            "Aucune donnée disponible pour cette période.".to_string(),
        ));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn empty_history_maps_to_not_found() {
        let err = non_empty_or_not_found(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Aucune donnée disponible pour cette période.");
    }

    #[test]
    fn non_empty_history_passes_through() {
        let items = non_empty_or_not_found(vec![1, 2]).unwrap();
        assert_eq!(items, vec![1, 2]);
    }
}
