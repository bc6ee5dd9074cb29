use crate::{database::MongoDB, models::Devise, utils::AppError};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::Collection;

/// Gateway over the `devises` snapshot collection and the per-user
/// `favoris_devises` set collection.
#[derive(Clone)]
pub struct CurrencyRepository {
    snapshots: Collection<Devise>,
    favorites: Collection<Document>,
}

impl CurrencyRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            snapshots: db.collection("devises"),
            favorites: db.collection("favoris_devises"),
        }
    }

    pub async fn find_by_code_and_date(
        &self,
        nom: &str,
        date_maj: &str,
    ) -> Result<Option<Devise>, AppError> {
        self.snapshots
            .find_one(doc! { "nom": nom, "date_maj": date_maj })
            .await
            .map_err(AppError::database)
    }

    /// Writes a snapshot keyed by (nom, date_maj). Upsert on the unique key
    /// so two requests racing on the same cold day converge on one document.
    pub async fn upsert_snapshot(&self, devise: &Devise) -> Result<(), AppError> {
        let rates = to_bson(&devise.conversion_rates)
            .map_err(|e| AppError::Internal(format!("Invalid rate table: {}", e)))?;
        self.snapshots
            .update_one(
                doc! { "nom": &devise.nom, "date_maj": &devise.date_maj },
                doc! { "$set": {
                    "taux": devise.taux,
                    "base_code": &devise.base_code,
                    "conversion_rates": rates,
                }},
            )
            .upsert(true)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    /// Snapshots for an explicit set of dates; days without one are absent.
    pub async fn find_history_by_dates(
        &self,
        nom: &str,
        dates: &[String],
    ) -> Result<Vec<Devise>, AppError> {
        let cursor = self
            .snapshots
            .find(doc! { "nom": nom, "date_maj": { "$in": dates.to_vec() } })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    /// Snapshots over an inclusive date range, ascending.
    pub async fn find_history_in_range(
        &self,
        nom: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<Devise>, AppError> {
        let cursor = self
            .snapshots
            .find(doc! { "nom": nom, "date_maj": { "$gte": date_debut, "$lte": date_fin } })
            .sort(doc! { "date_maj": 1 })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    pub async fn add_favorite(&self, user_id: &str, nom_devise: &str) -> Result<(), AppError> {
        self.favorites
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$addToSet": { "devises": nom_devise } },
            )
            .upsert(true)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    /// Removing a non-member is a no-op that still succeeds.
    pub async fn remove_favorite(&self, user_id: &str, nom_devise: &str) -> Result<(), AppError> {
        self.favorites
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$pull": { "devises": nom_devise } },
            )
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    pub async fn read_favorites(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let doc = self
            .favorites
            .find_one(doc! { "user_id": user_id })
            .await
            .map_err(AppError::database)?;
        Ok(doc
            .and_then(|d| d.get_array("devises").ok().cloned())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}

// Contract tests against a live database; they no-op when MONGODB_URI is
// not set.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Devise;
    use std::collections::HashMap;

    async fn test_db() -> Option<MongoDB> {
        let uri = std::env::var("MONGODB_URI").ok()?;
        MongoDB::new(&uri).await.ok()
    }

    fn snapshot(nom: &str, date_maj: &str) -> Devise {
        let mut rates = HashMap::new();
        rates.insert(nom.to_string(), 1.0);
        rates.insert("EUR".to_string(), 0.9);
        Devise {
            id: None,
            nom: nom.to_string(),
            taux: 1.0,
            date_maj: date_maj.to_string(),
            base_code: nom.to_string(),
            conversion_rates: rates,
        }
    }

    #[tokio::test]
    async fn favorites_round_trip_keeps_set_semantics() {
        let Some(db) = test_db().await else { return };
        let repo = CurrencyRepository::new(&db);
        let user_id = format!("test-{}", uuid::Uuid::new_v4());

        repo.add_favorite(&user_id, "EUR").await.unwrap();
        repo.add_favorite(&user_id, "GBP").await.unwrap();
        // Re-adding a member must not duplicate it.
        repo.add_favorite(&user_id, "EUR").await.unwrap();
        assert_eq!(repo.read_favorites(&user_id).await.unwrap(), vec!["EUR", "GBP"]);

        repo.remove_favorite(&user_id, "EUR").await.unwrap();
        assert_eq!(repo.read_favorites(&user_id).await.unwrap(), vec!["GBP"]);

        // Removing a non-member is a succeeding no-op.
        repo.remove_favorite(&user_id, "JPY").await.unwrap();
        assert_eq!(repo.read_favorites(&user_id).await.unwrap(), vec!["GBP"]);

        db.collection::<Document>("favoris_devises")
            .delete_one(doc! { "user_id": &user_id })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inverted_range_yields_no_snapshots() {
        let Some(db) = test_db().await else { return };
        let repo = CurrencyRepository::new(&db);
        let nom = format!("T{}", uuid::Uuid::new_v4().simple());

        repo.upsert_snapshot(&snapshot(&nom, "2025-06-09")).await.unwrap();
        repo.upsert_snapshot(&snapshot(&nom, "2025-06-10")).await.unwrap();

        let forward = repo
            .find_history_in_range(&nom, "2025-06-09", "2025-06-10")
            .await
            .unwrap();
        assert_eq!(forward.len(), 2);

        let inverted = repo
            .find_history_in_range(&nom, "2025-06-10", "2025-06-09")
            .await
            .unwrap();
        assert!(inverted.is_empty());

        db.collection::<Document>("devises")
            .delete_many(doc! { "nom": &nom })
            .await
            .unwrap();
    }
}
