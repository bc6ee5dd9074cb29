use crate::{database::MongoDB, models::Utilisateur, utils::AppError};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Collection;

/// Typed gateway over the `utilisateurs` collection.
#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<Utilisateur>,
}

impl UserRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            collection: db.collection("utilisateurs"),
        }
    }

    pub async fn create(&self, mut user: Utilisateur) -> Result<Utilisateur, AppError> {
        let result = self
            .collection
            .insert_one(&user)
            .await
            .map_err(AppError::database)?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    pub async fn find_all(&self) -> Result<Vec<Utilisateur>, AppError> {
        use futures::stream::TryStreamExt;
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(AppError::database)?;
        cursor.try_collect().await.map_err(AppError::database)
    }

    pub async fn find_by_id(&self, user_id: &ObjectId) -> Result<Option<Utilisateur>, AppError> {
        self.collection
            .find_one(doc! { "_id": user_id })
            .await
            .map_err(AppError::database)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Utilisateur>, AppError> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(AppError::database)
    }

    pub async fn update(&self, user_id: &ObjectId, fields: Document) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(doc! { "_id": user_id }, doc! { "$set": fields })
            .await
            .map_err(AppError::database)?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, user_id: &ObjectId) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": user_id })
            .await
            .map_err(AppError::database)?;
        Ok(result.deleted_count > 0)
    }
}
