use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// User account as stored in the `utilisateurs` collection. The password
/// field holds a bcrypt hash, never the plain value.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Utilisateur {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub mot_de_passe: String,
    pub nom_utilisateur: String,
}

/// Serialized user view. The credential hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct UtilisateurView {
    pub id: String,
    pub email: String,
    pub nom_utilisateur: String,
}

impl From<&Utilisateur> for UtilisateurView {
    fn from(user: &Utilisateur) -> Self {
        UtilisateurView {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email.clone(),
            nom_utilisateur: user.nom_utilisateur.clone(),
        }
    }
}
