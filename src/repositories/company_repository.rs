use crate::{database::MongoDB, models::Societe, utils::AppError};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_document};
use mongodb::Collection;

/// Gateway over the `societes` profile snapshot collection.
#[derive(Clone)]
pub struct CompanyRepository {
    snapshots: Collection<Societe>,
}

impl CompanyRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            snapshots: db.collection("societes"),
        }
    }

    pub async fn find_by_symbol_and_date(
        &self,
        symbole: &str,
        date_maj: &str,
    ) -> Result<Option<Societe>, AppError> {
        self.snapshots
            .find_one(doc! { "symbole": symbole, "date_maj": date_maj })
            .await
            .map_err(AppError::database)
    }

    /// Upsert on the unique (symbole, date_maj) key, same race handling as
    /// the currency snapshots.
    pub async fn upsert_snapshot(&self, societe: &Societe) -> Result<(), AppError> {
        let mut fields = to_document(societe)
            .map_err(|e| AppError::Internal(format!("Invalid profile document: {}", e)))?;
        fields.remove("_id");
        self.snapshots
            .update_one(
                doc! { "symbole": &societe.symbole, "date_maj": &societe.date_maj },
                doc! { "$set": fields },
            )
            .upsert(true)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    pub async fn find_history_by_dates(
        &self,
        symbole: &str,
        dates: &[String],
    ) -> Result<Vec<Societe>, AppError> {
        let cursor = self
            .snapshots
            .find(doc! { "symbole": symbole, "date_maj": { "$in": dates.to_vec() } })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    pub async fn find_history_in_range(
        &self,
        symbole: &str,
        date_debut: &str,
        date_fin: &str,
    ) -> Result<Vec<Societe>, AppError> {
        let cursor = self
            .snapshots
            .find(doc! { "symbole": symbole, "date_maj": { "$gte": date_debut, "$lte": date_fin } })
            .sort(doc! { "date_maj": 1 })
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }
}
