use crate::{database::MongoDB, models::Action, utils::AppError};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;

/// Gateway over the `actions` bar collection and the per-user
/// `favoris_actions` set collection.
#[derive(Clone)]
pub struct StockRepository {
    bars: Collection<Action>,
    favorites: Collection<Document>,
}

impl StockRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            bars: db.collection("actions"),
            favorites: db.collection("favoris_actions"),
        }
    }

    pub async fn find_by_symbol_and_date(
        &self,
        symbole: &str,
        date: &str,
    ) -> Result<Option<Action>, AppError> {
        self.bars
            .find_one(doc! { "symbole": symbole, "date": date })
            .await
            .map_err(AppError::database)
    }

    /// Dates already stored for a symbol, restricted to the given set.
    pub async fn find_existing_dates(
        &self,
        symbole: &str,
        dates: &[String],
    ) -> Result<Vec<String>, AppError> {
        let cursor = self
            .bars
            .clone_with_type::<Document>()
            .find(doc! { "symbole": symbole, "date": { "$in": dates.to_vec() } })
            .projection(doc! { "date": 1, "_id": 0 })
            .await
            .map_err(AppError::database)?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(AppError::database)?;
        Ok(docs
            .iter()
            .filter_map(|d| d.get_str("date").ok().map(String::from))
            .collect())
    }

    /// Bulk-inserts new bars for a backfill. Unordered, so a concurrent
    /// ingest racing on the unique (symbole, date) index only loses its
    /// duplicate rows, not the whole batch.
    pub async fn insert_many_bars(&self, bars: &[Action]) -> Result<(), AppError> {
        if bars.is_empty() {
            return Ok(());
        }
        match self.bars.insert_many(bars).ordered(false).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("E11000") => {
                log::warn!("⚠️  Concurrent bar ingest hit duplicate keys: {}", e);
                Ok(())
            }
            Err(e) => Err(AppError::database(e)),
        }
    }

    /// Most recent stored bar for a symbol, if any.
    pub async fn find_latest_for_symbol(&self, symbole: &str) -> Result<Option<Action>, AppError> {
        let mut cursor = self
            .bars
            .find(doc! { "symbole": symbole })
            .sort(doc! { "date": -1 })
            .limit(1)
            .await
            .map_err(AppError::database)?;
        cursor.try_next().await.map_err(AppError::database)
    }

    pub async fn find_history_by_dates(
        &self,
        symbole: &str,
        dates: &[String],
    ) -> Result<Vec<Action>, AppError> {
        let cursor = self
            .bars
            .find(doc! { "symbole": symbole, "date": { "$in": dates.to_vec() } })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    pub async fn find_history_in_range(
        &self,
        symbole: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<Action>, AppError> {
        let cursor = self
            .bars
            .find(doc! { "symbole": symbole, "date": { "$gte": date_debut, "$lte": date_fin } })
            .sort(doc! { "date": 1 })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    pub async fn add_favorite(&self, user_id: &str, symbole: &str) -> Result<(), AppError> {
        self.favorites
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$addToSet": { "actions": symbole } },
            )
            .upsert(true)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: &str, symbole: &str) -> Result<(), AppError> {
        self.favorites
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$pull": { "actions": symbole } },
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
            .and_then(|d| d.get_array("actions").ok().cloned())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}
