use crate::{
    models::{Utilisateur, UtilisateurView},
    repositories::UserRepository,
    utils::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use mongodb::bson::{oid::ObjectId, Document};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterUserRequest {
    pub email: String,
    pub mot_de_passe: String,
    pub nom_utilisateur: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub mot_de_passe: Option<String>,
    pub nom_utilisateur: Option<String>,
}

fn email_is_valid(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    match parts.next() {
        Some(domain) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Registers a new account. Email uniqueness is enforced here, before
    /// the insert; the password is stored as a bcrypt hash.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UtilisateurView, AppError> {
        if !email_is_valid(&request.email) {
            return Err(AppError::InvalidArgument("Adresse email invalide.".to_string()));
        }
        if request.mot_de_passe.is_empty() || request.nom_utilisateur.is_empty() {
            return Err(AppError::InvalidArgument(
                "Tous les champs sont requis.".to_string(),
            ));
        }

        if self.repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(
                "Un utilisateur avec cet email existe déjà.".to_string(),
            ));
        }

        let hashed = hash(&request.mot_de_passe, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = self
            .repo
            .create(Utilisateur {
                id: None,
                email: request.email,
                mot_de_passe: hashed,
                nom_utilisateur: request.nom_utilisateur,
            })
            .await?;

        log::info!("✅ User registered: {}", user.email);
        Ok(UtilisateurView::from(&user))
    }

    /// Checks credentials; `None` means invalid email or password.
    pub async fn authenticate(
        &self,
        email: &str,
        mot_de_passe: &str,
    ) -> Result<Option<UtilisateurView>, AppError> {
        let user = match self.repo.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let valid = verify(mot_de_passe, &user.mot_de_passe)
            .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

        Ok(valid.then(|| UtilisateurView::from(&user)))
    }

    pub async fn get_all(&self) -> Result<Vec<UtilisateurView>, AppError> {
        let users = self.repo.find_all().await?;
        Ok(users.iter().map(UtilisateurView::from).collect())
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<UtilisateurView>, AppError> {
        let oid = match ObjectId::parse_str(user_id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };
        Ok(self
            .repo
            .find_by_id(&oid)
            .await?
            .as_ref()
            .map(UtilisateurView::from))
    }

    pub async fn update(&self, user_id: &str, request: UpdateUserRequest) -> Result<bool, AppError> {
        let oid = match ObjectId::parse_str(user_id) {
            Ok(oid) => oid,
            Err(_) => return Ok(false),
        };

        let mut fields = Document::new();
        if let Some(email) = request.email {
            if !email_is_valid(&email) {
                return Err(AppError::InvalidArgument("Adresse email invalide.".to_string()));
            }
            fields.insert("email", email);
        }
        if let Some(mot_de_passe) = request.mot_de_passe {
            let hashed = hash(&mot_de_passe, DEFAULT_COST)
                .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
            fields.insert("mot_de_passe", hashed);
        }
        if let Some(nom_utilisateur) = request.nom_utilisateur {
            fields.insert("nom_utilisateur", nom_utilisateur);
        }
        if fields.is_empty() {
            return Err(AppError::InvalidArgument(
                "Aucun champ à mettre à jour.".to_string(),
            ));
        }

        self.repo.update(&oid, fields).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<bool, AppError> {
        let oid = match ObjectId::parse_str(user_id) {
            Ok(oid) => oid,
            Err(_) => return Ok(false),
        };
        self.repo.delete(&oid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(email_is_valid("alice@example.com"));
        assert!(email_is_valid("a.b+c@sub.domain.org"));
        assert!(!email_is_valid("alice"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("alice@localhost"));
        assert!(!email_is_valid("alice@.com"));
    }

    #[test]
    fn bcrypt_round_trip() {
        // Low cost to keep the test fast.
        let hashed = hash("s3cret", 4).unwrap();
        assert!(verify("s3cret", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
